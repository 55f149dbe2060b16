//! Campaign performance projection and follow-up action items.
//!
//! The rates used here are planning assumptions supplied through
//! `CampaignParams`, not statistics derived from the data.

use std::collections::BTreeMap;

use crate::analysis::{FilteredView, aggregate};
use crate::domain::{ActionItem, CampaignParams, CampaignProjection, FilterCriteria, SegmentResponse};

impl Default for CampaignParams {
    fn default() -> Self {
        let response_rates: BTreeMap<String, f64> = [
            ("Bulk Dry Shoppers – Urban", 0.15),
            ("Bulk Dry Shoppers – Suburban", 0.12),
            ("Fresh-Focused Families – Urban", 0.18),
            ("Fresh-Focused Families – Suburban", 0.16),
            ("Balanced Shoppers – Urban", 0.14),
            ("Balanced Shoppers – Suburban", 0.13),
        ]
        .into_iter()
        .map(|(name, rate)| (name.to_string(), rate))
        .collect();

        Self {
            reach_rate: 0.8,
            default_response_rate: 0.14,
            response_rates,
            order_uplift: 1.25,
            budget_share: 0.3,
        }
    }
}

impl CampaignParams {
    pub fn response_rate(&self, segment: &str) -> f64 {
        self.response_rates
            .get(segment)
            .copied()
            .unwrap_or(self.default_response_rate)
    }

    /// Reject rates outside `[0, 1]` and non-positive multipliers.
    pub fn validate(&self) -> Result<(), String> {
        let unit = |name: &str, v: f64| {
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(format!("`{name}` must be within [0, 1], got {v}"))
            }
        };
        unit("reach_rate", self.reach_rate)?;
        unit("default_response_rate", self.default_response_rate)?;
        unit("budget_share", self.budget_share)?;
        for (segment, rate) in &self.response_rates {
            unit(&format!("response rate for {segment}"), *rate)?;
        }
        if !(self.order_uplift.is_finite() && self.order_uplift > 0.0) {
            return Err(format!("`order_uplift` must be > 0, got {}", self.order_uplift));
        }
        Ok(())
    }
}

/// Project campaign reach, responses and revenue for the filtered view.
///
/// `segments` lists the selected segments in display order; segments with no
/// rows in the view contribute zero expected responses.
pub fn project<'s, I>(params: &CampaignParams, segments: I, view: &FilteredView<'_>) -> CampaignProjection
where
    I: IntoIterator<Item = &'s str>,
{
    let total_customers = view.len();
    let estimated_reach = (total_customers as f64 * params.reach_rate).min(total_customers as f64);

    let responses = segments
        .into_iter()
        .map(|segment| {
            let customers = view.for_segment(segment).map_or(0, |rows| rows.len());
            let response_rate = params.response_rate(segment);
            SegmentResponse {
                segment: segment.to_string(),
                customers,
                response_rate,
                expected_responses: customers as f64 * response_rate,
            }
        })
        .collect();

    let current_avg_order = aggregate::scalar_summary(view.iter()).total_sales_mean;
    let projected_avg_order = current_avg_order.map(|avg| avg * params.order_uplift);
    let additional_revenue = current_avg_order
        .zip(projected_avg_order)
        .map(|(current, projected)| (projected - current) * estimated_reach * params.default_response_rate);
    let suggested_budget = additional_revenue.map(|rev| rev * params.budget_share);

    CampaignProjection {
        total_customers,
        estimated_reach,
        responses,
        current_avg_order,
        projected_avg_order,
        additional_revenue,
        suggested_budget,
    }
}

/// Focus items implied by the selected areas and segments.
pub fn action_items(criteria: &FilterCriteria) -> Vec<ActionItem> {
    let mut items = Vec::new();
    if criteria.areas.contains("Urban") {
        items.push(ActionItem::UrbanFocus);
    }
    if criteria.areas.contains("Sub Urban") {
        items.push(ActionItem::SuburbanFocus);
    }
    let any_segment = |needle: &str| criteria.segments.iter().any(|s| s.contains(needle));
    if any_segment("Fresh-Focused") {
        items.push(ActionItem::FreshStrategy);
    }
    if any_segment("Bulk Dry") {
        items.push(ActionItem::BulkStrategy);
    }
    if any_segment("Balanced") {
        items.push(ActionItem::BalancedStrategy);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomerRecord;

    fn record(segment: &str, total: Option<f64>) -> CustomerRecord {
        CustomerRecord {
            customer_id: "C".to_string(),
            outlet_city: "A".to_string(),
            area: "Urban".to_string(),
            luxury_sales: None,
            fresh_sales: None,
            dry_sales: None,
            total_sales: total,
            segment_code: None,
            segment: Some(segment.to_string()),
        }
    }

    #[test]
    fn projection_uses_configured_rates() {
        let fresh = "Fresh-Focused Families – Urban";
        let records: Vec<CustomerRecord> = (0..10).map(|_| record(fresh, Some(100.0))).collect();
        let view = FilteredView::new(records.iter().collect()).unwrap();

        let p = project(&CampaignParams::default(), [fresh, "Other"], &view);
        assert_eq!(p.total_customers, 10);
        assert!((p.estimated_reach - 8.0).abs() < 1e-12);
        assert!((p.responses[0].expected_responses - 1.8).abs() < 1e-12);
        assert_eq!(p.responses[1].customers, 0);
        assert!((p.responses[1].response_rate - 0.14).abs() < 1e-12);
        assert!((p.projected_avg_order.unwrap() - 125.0).abs() < 1e-9);
        // (125 - 100) * 8 * 0.14
        assert!((p.additional_revenue.unwrap() - 28.0).abs() < 1e-9);
        assert!((p.suggested_budget.unwrap() - 8.4).abs() < 1e-9);
    }

    #[test]
    fn projection_without_sales_has_no_revenue_figures() {
        let records = vec![record("S", None)];
        let view = FilteredView::new(records.iter().collect()).unwrap();
        let p = project(&CampaignParams::default(), ["S"], &view);
        assert_eq!(p.current_avg_order, None);
        assert_eq!(p.additional_revenue, None);
        assert_eq!(p.suggested_budget, None);
    }

    #[test]
    fn action_items_follow_selection() {
        let mut criteria = FilterCriteria::default();
        assert!(action_items(&criteria).is_empty());

        criteria.areas.insert("Sub Urban".to_string());
        criteria.segments.insert("Bulk Dry Shoppers – Urban".to_string());
        criteria.segments.insert("Balanced Shoppers – Suburban".to_string());
        assert_eq!(
            action_items(&criteria),
            vec![ActionItem::SuburbanFocus, ActionItem::BulkStrategy, ActionItem::BalancedStrategy]
        );
    }

    #[test]
    fn validate_rejects_out_of_range_rates() {
        let mut params = CampaignParams::default();
        assert!(params.validate().is_ok());
        params.reach_rate = 1.5;
        assert!(params.validate().is_err());
    }
}
