//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the ingest layer and read by every view
//! - exported to JSON/CSV
//! - rendered by the terminal report without reaching back into the pipeline

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Label used for rows whose segment code has no name.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// One customer row after normalization and labeling.
///
/// Every value that can fail numeric coercion is an `Option`: `None` is an
/// explicit missing value, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub outlet_city: String,
    pub area: String,
    pub luxury_sales: Option<f64>,
    pub fresh_sales: Option<f64>,
    pub dry_sales: Option<f64>,
    pub total_sales: Option<f64>,
    pub segment_code: Option<i64>,
    /// Filled by the labeler; `None` for codes outside the segment table.
    pub segment: Option<String>,
}

impl CustomerRecord {
    /// Segment label used for grouping, with unclassified rows bucketed.
    pub fn segment_label(&self) -> &str {
        self.segment.as_deref().unwrap_or(UNCLASSIFIED_LABEL)
    }
}

/// The three spend categories carried per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesCategory {
    Luxury,
    Fresh,
    Dry,
}

impl SalesCategory {
    pub const ALL: [SalesCategory; 3] = [SalesCategory::Luxury, SalesCategory::Fresh, SalesCategory::Dry];

    pub fn display_name(self) -> &'static str {
        match self {
            SalesCategory::Luxury => "Luxury",
            SalesCategory::Fresh => "Fresh",
            SalesCategory::Dry => "Dry",
        }
    }

    pub fn value(self, record: &CustomerRecord) -> Option<f64> {
        match self {
            SalesCategory::Luxury => record.luxury_sales,
            SalesCategory::Fresh => record.fresh_sales,
            SalesCategory::Dry => record.dry_sales,
        }
    }
}

/// Selection sets for the three filter facets.
///
/// An empty set selects nothing for that facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub segments: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub areas: BTreeSet<String>,
    /// Admit rows without a segment name (they never match by name).
    pub include_unclassified: bool,
}

/// Static marketing template attached to one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub primary: String,
    pub secondary: String,
    pub channels: Vec<String>,
    pub offers: Vec<String>,
    pub timing: String,
}

/// Count, sum and mean of `total_sales` over a record sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarSummary {
    pub count: usize,
    pub total_sales_sum: f64,
    /// `None` when every `total_sales` value is missing.
    pub total_sales_mean: Option<f64>,
    pub distinct_cities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub luxury: f64,
    pub fresh: f64,
    pub dry: f64,
}

impl CategoryTotals {
    pub fn get(&self, category: SalesCategory) -> f64 {
        match category {
            SalesCategory::Luxury => self.luxury,
            SalesCategory::Fresh => self.fresh,
            SalesCategory::Dry => self.dry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentMeans {
    pub segment: String,
    pub count: usize,
    pub avg_luxury: Option<f64>,
    pub avg_fresh: Option<f64>,
    pub avg_dry: Option<f64>,
}

/// One row of the per-city performance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAggregate {
    pub city: String,
    pub customer_count: usize,
    pub total_revenue: f64,
    pub avg_sales: Option<f64>,
    pub avg_luxury: Option<f64>,
    pub avg_fresh: Option<f64>,
    pub avg_dry: Option<f64>,
}

/// Value count for a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Sparse city × segment record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contingency {
    /// Cities in discovery order.
    pub cities: Vec<String>,
    /// Segment labels in discovery order.
    pub segments: Vec<String>,
    /// city -> segment -> count; absent pairs are not stored.
    pub counts: BTreeMap<String, BTreeMap<String, usize>>,
}

impl Contingency {
    /// Count for a pair; combinations never observed read as zero.
    pub fn get(&self, city: &str, segment: &str) -> usize {
        self.counts
            .get(city)
            .and_then(|row| row.get(segment))
            .copied()
            .unwrap_or(0)
    }

    /// Number of (city, segment) pairs observed at least once.
    pub fn pair_count(&self) -> usize {
        self.counts.values().map(BTreeMap::len).sum()
    }
}

/// Equal-width distribution of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// `(lower, upper, count)` triples, one per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts.iter().enumerate().map(move |(i, &count)| {
            let lo = self.min + i as f64 * self.bin_width;
            let hi = if i + 1 == self.counts.len() { self.max } else { lo + self.bin_width };
            (lo, hi, count)
        })
    }
}

/// Strategy output for one segment of the filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub segment: String,
    pub profile: StrategyProfile,
    /// True when no profile exists for the segment and the placeholder was used.
    pub is_placeholder: bool,
    pub customer_count: usize,
    pub avg_total_sales: Option<f64>,
    /// Up to three cities by record count, first-seen order on ties.
    pub top_cities: Vec<String>,
    pub area_breakdown: Vec<LabelCount>,
}

/// Illustrative campaign assumptions. None of these are derived from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignParams {
    pub reach_rate: f64,
    pub default_response_rate: f64,
    pub response_rates: BTreeMap<String, f64>,
    pub order_uplift: f64,
    pub budget_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentResponse {
    pub segment: String,
    pub customers: usize,
    pub response_rate: f64,
    pub expected_responses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignProjection {
    pub total_customers: usize,
    pub estimated_reach: f64,
    pub responses: Vec<SegmentResponse>,
    pub current_avg_order: Option<f64>,
    pub projected_avg_order: Option<f64>,
    pub additional_revenue: Option<f64>,
    pub suggested_budget: Option<f64>,
}

/// Rule-based follow-ups derived from the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItem {
    UrbanFocus,
    SuburbanFocus,
    FreshStrategy,
    BulkStrategy,
    BalancedStrategy,
}

impl ActionItem {
    pub fn title(self) -> &'static str {
        match self {
            ActionItem::UrbanFocus => "Urban Focus",
            ActionItem::SuburbanFocus => "Suburban Focus",
            ActionItem::FreshStrategy => "Fresh Strategy",
            ActionItem::BulkStrategy => "Bulk Strategy",
            ActionItem::BalancedStrategy => "Balanced Strategy",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            ActionItem::UrbanFocus => "Enhance mobile app features and push notifications",
            ActionItem::SuburbanFocus => "Strengthen delivery services and local partnerships",
            ActionItem::FreshStrategy => "Implement daily fresh deals and recipe recommendations",
            ActionItem::BulkStrategy => "Create subscription services and bulk discount programs",
            ActionItem::BalancedStrategy => "Develop cross-category promotion engine",
        }
    }
}

/// Resolved runtime configuration for a dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: SourceSpec,
    pub timeout: Duration,
    pub cache_ttl: chrono::Duration,
    pub histogram_bins: usize,
    pub top_cities: usize,
}

/// Where the raw CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Url(String),
    File(std::path::PathBuf),
}
