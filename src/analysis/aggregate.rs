//! Grouped descriptive statistics.
//!
//! Every function accepts any iterator of record references, so the same code
//! serves the full table (`&[CustomerRecord]`) and filtered views. Missing
//! values are skipped: they count toward group sizes but never toward sums or
//! means. No rounding happens here.

use std::collections::HashMap;

use crate::domain::{
    CategoryTotals, CityAggregate, Contingency, CustomerRecord, LabelCount, SalesCategory, ScalarSummary,
    SegmentMeans,
};

/// Running sum/count over the non-missing values of one column.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    pub(crate) fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }

    /// `None` when no value was present.
    pub(crate) fn mean(&self) -> Option<f64> {
        if self.n == 0 { None } else { Some(self.sum / self.n as f64) }
    }
}

/// Mean of the present values; `None` if all are missing.
pub fn mean_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut acc = MeanAcc::default();
    for v in values {
        acc.push(v);
    }
    acc.mean()
}

pub fn scalar_summary<'a, I>(records: I) -> ScalarSummary
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut count = 0;
    let mut total = MeanAcc::default();
    let mut cities: Vec<&str> = Vec::new();
    for r in records {
        count += 1;
        total.push(r.total_sales);
        if !cities.contains(&r.outlet_city.as_str()) {
            cities.push(&r.outlet_city);
        }
    }
    ScalarSummary {
        count,
        total_sales_sum: total.sum(),
        total_sales_mean: total.mean(),
        distinct_cities: cities.len(),
    }
}

pub fn category_totals<'a, I>(records: I) -> CategoryTotals
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut totals = CategoryTotals {
        luxury: 0.0,
        fresh: 0.0,
        dry: 0.0,
    };
    for r in records {
        totals.luxury += r.luxury_sales.unwrap_or_default();
        totals.fresh += r.fresh_sales.unwrap_or_default();
        totals.dry += r.dry_sales.unwrap_or_default();
    }
    totals
}

/// Per-segment category means, groups in order of first appearance.
pub fn segment_means<'a, I>(records: I) -> Vec<SegmentMeans>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, (usize, [MeanAcc; 3])> = HashMap::new();

    for r in records {
        let label = r.segment_label();
        let entry = groups.entry(label).or_insert_with(|| {
            order.push(label);
            (0, [MeanAcc::default(); 3])
        });
        entry.0 += 1;
        for (acc, category) in entry.1.iter_mut().zip(SalesCategory::ALL) {
            acc.push(category.value(r));
        }
    }

    order
        .into_iter()
        .filter_map(|label| {
            let (count, accs) = groups.get(label)?;
            Some(SegmentMeans {
                segment: label.to_string(),
                count: *count,
                avg_luxury: accs[0].mean(),
                avg_fresh: accs[1].mean(),
                avg_dry: accs[2].mean(),
            })
        })
        .collect()
}

#[derive(Default)]
struct CityAcc {
    count: usize,
    total: MeanAcc,
    luxury: MeanAcc,
    fresh: MeanAcc,
    dry: MeanAcc,
}

/// Per-city performance table, highest revenue first.
///
/// Ties keep the order in which cities were first seen.
pub fn city_table<'a, I>(records: I) -> Vec<CityAggregate>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, CityAcc> = HashMap::new();

    for r in records {
        let city = r.outlet_city.as_str();
        let acc = groups.entry(city).or_insert_with(|| {
            order.push(city);
            CityAcc::default()
        });
        acc.count += 1;
        acc.total.push(r.total_sales);
        acc.luxury.push(r.luxury_sales);
        acc.fresh.push(r.fresh_sales);
        acc.dry.push(r.dry_sales);
    }

    let mut rows: Vec<CityAggregate> = order
        .into_iter()
        .filter_map(|city| {
            let acc = groups.get(city)?;
            Some(CityAggregate {
                city: city.to_string(),
                customer_count: acc.count,
                total_revenue: acc.total.sum(),
                avg_sales: acc.total.mean(),
                avg_luxury: acc.luxury.mean(),
                avg_fresh: acc.fresh.mean(),
                avg_dry: acc.dry.mean(),
            })
        })
        .collect();

    // `sort_by` is stable, which keeps discovery order on ties.
    rows.sort_by(|a, b| {
        b.total_revenue
            .partial_cmp(&a.total_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Record counts per (city, segment) pair.
pub fn contingency<'a, I>(records: I) -> Contingency
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut table = Contingency::default();
    for r in records {
        let segment = r.segment_label();
        if !table.cities.iter().any(|c| c == &r.outlet_city) {
            table.cities.push(r.outlet_city.clone());
        }
        if !table.segments.iter().any(|s| s == segment) {
            table.segments.push(segment.to_string());
        }
        *table
            .counts
            .entry(r.outlet_city.clone())
            .or_default()
            .entry(segment.to_string())
            .or_insert(0) += 1;
    }
    table
}

/// Records per segment label, largest first.
pub fn segment_counts<'a, I>(records: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    value_counts(records.into_iter().map(CustomerRecord::segment_label))
}

/// Records per area, largest first.
pub fn area_counts<'a, I>(records: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    value_counts(records.into_iter().map(|r| r.area.as_str()))
}

/// Records per city, largest first.
pub fn city_counts<'a, I>(records: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    value_counts(records.into_iter().map(|r| r.outlet_city.as_str()))
}

/// Count occurrences, ordered by count descending then first appearance.
pub fn value_counts<'a, I>(labels: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<LabelCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        match index.get(label) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(label, out.len());
                out.push(LabelCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(segment: &str, city: &str, area: &str, total: Option<f64>) -> CustomerRecord {
        CustomerRecord {
            customer_id: format!("{segment}-{city}"),
            outlet_city: city.to_string(),
            area: area.to_string(),
            luxury_sales: total.map(|t| t * 0.2),
            fresh_sales: total.map(|t| t * 0.3),
            dry_sales: total.map(|t| t * 0.5),
            total_sales: total,
            segment_code: None,
            segment: Some(segment.to_string()),
        }
    }

    fn sample() -> Vec<CustomerRecord> {
        vec![
            record("S1", "A", "Urban", Some(100.0)),
            record("S1", "A", "Urban", Some(200.0)),
            record("S2", "A", "Sub Urban", Some(50.0)),
            record("S1", "B", "Urban", Some(300.0)),
            record("S2", "C", "Sub Urban", None),
        ]
    }

    #[test]
    fn mean_ignores_missing_values() {
        let mean = mean_of([Some(10.0), None, Some(30.0)]).unwrap();
        assert!((mean - 20.0).abs() < 1e-12);
        assert_eq!(mean_of([None, None]), None);
        assert_eq!(mean_of(std::iter::empty()), None);
    }

    #[test]
    fn scalar_summary_counts_rows_with_missing_totals() {
        let records = sample();
        let s = scalar_summary(&records);
        assert_eq!(s.count, 5);
        assert!((s.total_sales_sum - 650.0).abs() < 1e-9);
        assert!((s.total_sales_mean.unwrap() - 162.5).abs() < 1e-9);
        assert_eq!(s.distinct_cities, 3);
    }

    #[test]
    fn all_missing_mean_is_none() {
        let records = vec![record("S1", "A", "Urban", None)];
        let s = scalar_summary(&records);
        assert_eq!(s.count, 1);
        assert_eq!(s.total_sales_mean, None);
        assert_eq!(s.total_sales_sum, 0.0);
    }

    #[test]
    fn category_totals_sum_independently() {
        let records = sample();
        let t = category_totals(&records);
        assert!((t.luxury - 130.0).abs() < 1e-9);
        assert!((t.fresh - 195.0).abs() < 1e-9);
        assert!((t.dry - 325.0).abs() < 1e-9);
    }

    #[test]
    fn segment_means_follow_discovery_order() {
        let records = sample();
        let means = segment_means(&records);
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].segment, "S1");
        assert_eq!(means[0].count, 3);
        assert!((means[0].avg_dry.unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(means[1].segment, "S2");
        assert_eq!(means[1].count, 2);
        // The C row has no values, so only the A row contributes.
        assert!((means[1].avg_fresh.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn city_table_sums_match_scalar_summary() {
        let records = sample();
        let cities = city_table(&records);
        let per_city: f64 = cities.iter().map(|c| c.total_revenue).sum();
        let summary = scalar_summary(&records);
        assert!((per_city - summary.total_sales_sum).abs() < 1e-9);
        let counted: usize = cities.iter().map(|c| c.customer_count).sum();
        assert_eq!(counted, summary.count);
    }

    #[test]
    fn city_table_is_sorted_by_revenue_descending() {
        let records = sample();
        let cities = city_table(&records);
        for pair in cities.windows(2) {
            assert!(pair[0].total_revenue >= pair[1].total_revenue);
        }
        assert_eq!(cities[0].city, "A");
        assert!((cities[0].total_revenue - 350.0).abs() < 1e-9);
        assert_eq!(cities[0].customer_count, 3);
        assert_eq!(cities[2].city, "C");
        assert_eq!(cities[2].avg_sales, None);
    }

    #[test]
    fn city_table_ties_keep_discovery_order() {
        let records = vec![
            record("S1", "Z", "Urban", Some(10.0)),
            record("S1", "Y", "Urban", Some(10.0)),
            record("S1", "X", "Urban", Some(20.0)),
        ];
        let names: Vec<String> = city_table(&records).into_iter().map(|c| c.city).collect();
        assert_eq!(names, vec!["X", "Z", "Y"]);
    }

    #[test]
    fn contingency_is_sparse_with_implicit_zeros() {
        let records = sample();
        let table = contingency(&records);
        assert_eq!(table.cities, vec!["A", "B", "C"]);
        assert_eq!(table.segments, vec!["S1", "S2"]);
        assert_eq!(table.get("A", "S1"), 2);
        assert_eq!(table.get("A", "S2"), 1);
        assert_eq!(table.get("B", "S2"), 0);
        assert_eq!(table.pair_count(), 4);
    }

    #[test]
    fn value_counts_order_by_count_then_first_seen() {
        let counts = value_counts(["b", "a", "a", "c", "b", "d"]);
        let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c", "d"]);
        assert_eq!(counts[0].count, 2);
    }

    #[test]
    fn area_counts_cover_every_row() {
        let records = sample();
        let counts = area_counts(&records);
        assert_eq!(counts[0].label, "Urban");
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[1].count, 2);
    }
}
