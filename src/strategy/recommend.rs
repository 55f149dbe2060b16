//! Per-segment marketing recommendations.

use crate::analysis::{FilteredView, aggregate};
use crate::domain::{FilterCriteria, Recommendation};
use crate::strategy::book::StrategyBook;

pub const TOP_CITIES: usize = 3;

/// Build the recommendation for one segment.
///
/// `rows` must already be narrowed to `segment` (see `FilteredView::for_segment`);
/// a `FilteredView` is never empty, so the count is always positive.
pub fn recommend(book: &StrategyBook, segment: &str, rows: &FilteredView<'_>, top_n: usize) -> Recommendation {
    let (profile, is_placeholder) = book.profile_for(segment);
    let summary = aggregate::scalar_summary(rows.iter());

    let top_cities = aggregate::city_counts(rows.iter())
        .into_iter()
        .take(top_n)
        .map(|c| c.label)
        .collect();

    Recommendation {
        segment: segment.to_string(),
        profile,
        is_placeholder,
        customer_count: summary.count,
        avg_total_sales: summary.total_sales_mean,
        top_cities,
        area_breakdown: aggregate::area_counts(rows.iter()),
    }
}

/// Recommendations for every selected segment present in the view.
///
/// Segments follow the order of `segment_order`; selected segments with no
/// rows in the view are skipped.
pub fn recommend_all<'s, I>(
    book: &StrategyBook,
    segment_order: I,
    criteria: &FilterCriteria,
    view: &FilteredView<'_>,
    top_n: usize,
) -> Vec<Recommendation>
where
    I: IntoIterator<Item = &'s str>,
{
    segment_order
        .into_iter()
        .filter(|name| criteria.segments.contains(*name))
        .filter_map(|name| view.for_segment(name).map(|rows| recommend(book, name, &rows, top_n)))
        .collect()
}
