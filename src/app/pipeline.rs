//! Shared dashboard pipeline used by every command and the interactive shell.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! cached table -> filter -> aggregates / recommendations / campaign projection
//!
//! The front-ends can then focus on presentation (printing vs exporting).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{self, FilterOutcome, FilteredView};
use crate::data::CachedTable;
use crate::domain::{
    ActionItem, CampaignParams, CampaignProjection, CategoryTotals, CityAggregate, Contingency, FilterCriteria,
    Histogram, LabelCount, Recommendation, ScalarSummary, SegmentMeans, UNCLASSIFIED_LABEL,
};
use crate::segment::SegmentTable;
use crate::strategy::{self, StrategyBook};

/// The static lookup tables, built once per process and passed down explicitly.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub segments: SegmentTable,
    pub strategies: StrategyBook,
    pub campaign: CampaignParams,
}

/// Tunables that shape the computed views.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub histogram_bins: usize,
    pub top_cities: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            histogram_bins: analysis::DEFAULT_BINS,
            top_cities: strategy::TOP_CITIES,
        }
    }
}

/// Provenance of the table a snapshot was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct LoadInfo {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub rows_read: usize,
    pub rows_used: usize,
    pub field_issues: usize,
    pub unclassified: usize,
}

/// Every computed view over a non-empty filtered selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardViews {
    pub summary: ScalarSummary,
    pub segment_counts: Vec<LabelCount>,
    pub area_counts: Vec<LabelCount>,
    pub category_totals: CategoryTotals,
    pub segment_means: Vec<SegmentMeans>,
    pub sales_histogram: Option<Histogram>,
    pub city_table: Vec<CityAggregate>,
    pub contingency: Contingency,
    pub recommendations: Vec<Recommendation>,
    pub campaign: CampaignProjection,
    pub action_items: Vec<ActionItem>,
}

/// Output of one dashboard computation.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub load: LoadInfo,
    pub criteria: FilterCriteria,
    /// `None` when no rows match the criteria.
    pub views: Option<DashboardViews>,
}

impl DashboardSnapshot {
    pub fn matched_rows(&self) -> usize {
        self.views.as_ref().map_or(0, |v| v.summary.count)
    }
}

/// Segment labels in display order: table order, then the unclassified bucket.
pub fn segment_order<'c>(catalog: &'c Catalog, criteria: &FilterCriteria) -> Vec<&'c str> {
    let mut order: Vec<&str> = catalog
        .segments
        .names()
        .filter(|name| criteria.segments.contains(*name))
        .collect();
    if criteria.include_unclassified {
        order.push(UNCLASSIFIED_LABEL);
    }
    order
}

/// Compute all views for `criteria` over the cached table.
pub fn build_snapshot(
    catalog: &Catalog,
    cached: &CachedTable,
    source: &str,
    criteria: &FilterCriteria,
    options: ViewOptions,
) -> DashboardSnapshot {
    let table = &cached.table;
    let load = LoadInfo {
        source: source.to_string(),
        loaded_at: cached.loaded_at,
        rows_read: table.rows_read,
        rows_used: table.rows_used(),
        field_issues: table.issues.len(),
        unclassified: table.unclassified,
    };

    let outcome = analysis::apply(criteria, &table.records);
    let views = match &outcome {
        FilterOutcome::Empty => None,
        FilterOutcome::Matched(view) => Some(compute_views(catalog, criteria, view, options)),
    };

    DashboardSnapshot {
        generated_at: Utc::now(),
        load,
        criteria: criteria.clone(),
        views,
    }
}

/// Compute every view over a non-empty selection.
pub fn compute_views(
    catalog: &Catalog,
    criteria: &FilterCriteria,
    view: &FilteredView<'_>,
    options: ViewOptions,
) -> DashboardViews {
    let order = segment_order(catalog, criteria);
    // Recommendations follow the segment order; the projection reports every
    // selected segment, even those with no rows in the view.
    let recommendations =
        strategy::recommend_all(&catalog.strategies, order.iter().copied(), criteria, view, options.top_cities);
    let unclassified_rec = if criteria.include_unclassified {
        view.for_segment(UNCLASSIFIED_LABEL)
            .map(|rows| strategy::recommend(&catalog.strategies, UNCLASSIFIED_LABEL, &rows, options.top_cities))
    } else {
        None
    };

    DashboardViews {
        summary: analysis::scalar_summary(view.iter()),
        segment_counts: analysis::segment_counts(view.iter()),
        area_counts: analysis::area_counts(view.iter()),
        category_totals: analysis::category_totals(view.iter()),
        segment_means: analysis::segment_means(view.iter()),
        sales_histogram: analysis::total_sales_histogram(view.iter(), options.histogram_bins),
        city_table: analysis::city_table(view.iter()),
        contingency: analysis::contingency(view.iter()),
        recommendations: recommendations.into_iter().chain(unclassified_rec).collect(),
        campaign: strategy::project(&catalog.campaign, order.iter().copied(), view),
        action_items: strategy::action_items(criteria),
    }
}
