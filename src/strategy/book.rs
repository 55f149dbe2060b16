//! Static marketing strategy table.
//!
//! The built-in table can be replaced by a JSON file of the shape
//! `{ "<segment name>": { "primary": ..., "secondary": ..., "channels": [...],
//! "offers": [...], "timing": ... } }`.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::domain::StrategyProfile;
use crate::error::AppError;

/// Text used for every field of a segment without a profile.
pub const NEEDS_CUSTOM_STRATEGY: &str = "Needs custom strategy";

impl StrategyProfile {
    pub fn placeholder() -> Self {
        Self {
            primary: NEEDS_CUSTOM_STRATEGY.to_string(),
            secondary: NEEDS_CUSTOM_STRATEGY.to_string(),
            channels: vec![NEEDS_CUSTOM_STRATEGY.to_string()],
            offers: vec![NEEDS_CUSTOM_STRATEGY.to_string()],
            timing: NEEDS_CUSTOM_STRATEGY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyBook {
    profiles: BTreeMap<String, StrategyProfile>,
}

impl StrategyBook {
    pub fn new(profiles: BTreeMap<String, StrategyProfile>) -> Self {
        Self { profiles }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let profiles: BTreeMap<String, StrategyProfile> = serde_json::from_str(text)?;
        Ok(Self::new(profiles))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open strategy JSON '{}': {e}", path.display())))?;
        let profiles: BTreeMap<String, StrategyProfile> = serde_json::from_reader(file)
            .map_err(|e| AppError::new(2, format!("Invalid strategy JSON '{}': {e}", path.display())))?;
        Ok(Self::new(profiles))
    }

    pub fn get(&self, segment: &str) -> Option<&StrategyProfile> {
        self.profiles.get(segment)
    }

    /// Profile for `segment`, or the placeholder; the flag is true for the placeholder.
    pub fn profile_for(&self, segment: &str) -> (StrategyProfile, bool) {
        match self.get(segment) {
            Some(p) => (p.clone(), false),
            None => (StrategyProfile::placeholder(), true),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn profile(primary: &str, secondary: &str, channels: [&str; 3], offers: [&str; 3], timing: &str) -> StrategyProfile {
    StrategyProfile {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        channels: channels.iter().map(|s| s.to_string()).collect(),
        offers: offers.iter().map(|s| s.to_string()).collect(),
        timing: timing.to_string(),
    }
}

impl Default for StrategyBook {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "Bulk Dry Shoppers – Urban".to_string(),
            profile(
                "Push bundle discounts via mobile app",
                "In-store bulk purchase promotions",
                ["Mobile App", "Email", "In-store displays"],
                [
                    "Buy 3 Get 1 Free on dry goods",
                    "20% off bulk purchases over Rs.100",
                    "Monthly dry goods subscription box",
                ],
                "Weekend promotions, month-end bulk deals",
            ),
        );
        profiles.insert(
            "Bulk Dry Shoppers – Suburban".to_string(),
            profile(
                "Home delivery discounts for bulk orders",
                "Email campaigns with bulk savings",
                ["Email", "Direct Mail", "Local newspaper ads"],
                [
                    "Free delivery on orders over Rs.75",
                    "25% off quarterly bulk orders",
                    "Family pack discounts",
                ],
                "Monthly family budget cycles, seasonal stocking",
            ),
        );
        profiles.insert(
            "Fresh-Focused Families – Urban".to_string(),
            profile(
                "Weekly fresh produce delivery deals",
                "Same-day fresh delivery promotions",
                ["Mobile App", "Social Media", "Local food blogs"],
                [
                    "Daily fresh deals",
                    "Organic produce premium membership",
                    "Recipe-based fresh bundles",
                ],
                "Daily fresh arrivals, weekend meal prep",
            ),
        );
        profiles.insert(
            "Fresh-Focused Families – Suburban".to_string(),
            profile(
                "Drive-through fresh pickup services",
                "Family-oriented fresh meal kits",
                ["Local community groups", "School partnerships", "Social Media"],
                [
                    "Fresh family meal plans",
                    "Kids' lunch prep kits",
                    "Weekend BBQ fresh bundles",
                ],
                "School calendar aligned, weekend family time",
            ),
        );
        profiles.insert(
            "Balanced Shoppers – Urban".to_string(),
            profile(
                "Cross-category coupons via app notifications",
                "Smart shopping list recommendations",
                ["Mobile App", "Email", "Targeted online ads"],
                [
                    "Mix & match discounts",
                    "Smart basket rewards",
                    "Loyalty points multiplier",
                ],
                "Weekly shopping patterns, payday cycles",
            ),
        );
        profiles.insert(
            "Balanced Shoppers – Suburban".to_string(),
            profile(
                "SMS cross-category promotions",
                "In-store balanced shopping rewards",
                ["SMS", "Local radio", "Community bulletin boards"],
                [
                    "Balanced basket bonuses",
                    "Weekly shopping rewards",
                    "Seasonal variety packs",
                ],
                "Weekly family shopping trips, seasonal transitions",
            ),
        );
        Self::new(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentTable;

    #[test]
    fn default_book_covers_every_segment() {
        let book = StrategyBook::default();
        let segments = SegmentTable::default();
        for name in segments.names() {
            assert!(book.get(name).is_some(), "missing profile for {name}");
        }
        assert_eq!(book.len(), segments.len());
    }

    #[test]
    fn unknown_segment_gets_marked_placeholder() {
        let book = StrategyBook::default();
        let (profile, is_placeholder) = book.profile_for("Night Owls");
        assert!(is_placeholder);
        assert_eq!(profile.primary, NEEDS_CUSTOM_STRATEGY);
        assert_eq!(profile.secondary, NEEDS_CUSTOM_STRATEGY);
        assert_eq!(profile.timing, NEEDS_CUSTOM_STRATEGY);
        assert_eq!(profile.channels, vec![NEEDS_CUSTOM_STRATEGY]);
        assert_eq!(profile.offers, vec![NEEDS_CUSTOM_STRATEGY]);
    }

    #[test]
    fn from_json_replaces_the_table() {
        let json = r#"{"Night Owls": {"primary": "p", "secondary": "s", "channels": ["c"], "offers": [], "timing": "t"}}"#;
        let book = StrategyBook::from_json(json).unwrap();
        assert_eq!(book.len(), 1);
        assert_eq!(book.get("Night Owls").unwrap().primary, "p");
        assert!(book.get("Balanced Shoppers – Urban").is_none());
    }

    #[test]
    fn load_reports_bad_json_as_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not json").unwrap();
        let err = StrategyBook::load(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
