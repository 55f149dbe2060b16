//! Equal-width binning for the sales distribution view.

use crate::domain::{CustomerRecord, Histogram};

pub const DEFAULT_BINS: usize = 30;

/// Bin the present values into `bins` equal-width buckets over `[min, max]`.
///
/// Returns `None` when there are no values. A zero-width range collapses to a
/// single bucket holding everything.
pub fn histogram<I>(values: I, bins: usize) -> Option<Histogram>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let values: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let span = max - min;
    if span <= 0.0 {
        return Some(Histogram {
            min,
            max,
            bin_width: 0.0,
            counts: vec![values.len()],
        });
    }

    let bins = bins.max(1);
    let bin_width = span / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        // The maximum lands in the last (closed) bucket.
        let idx = (((v - min) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram {
        min,
        max,
        bin_width,
        counts,
    })
}

/// Distribution of `total_sales` over the given records.
pub fn total_sales_histogram<'a, I>(records: I, bins: usize) -> Option<Histogram>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    histogram(records.into_iter().map(|r| r.total_sales), bins)
}
