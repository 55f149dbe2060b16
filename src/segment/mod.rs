//! Segment code → segment name labeling.

use log::warn;

use crate::domain::CustomerRecord;
use crate::io::ingest::IngestedTable;

/// Immutable code → name table for the behavioral clusters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    entries: Vec<(i64, String)>,
}

impl Default for SegmentTable {
    fn default() -> Self {
        Self::new([
            (1, "Bulk Dry Shoppers – Urban"),
            (2, "Fresh-Focused Families – Suburban"),
            (3, "Balanced Shoppers – Urban"),
            (4, "Bulk Dry Shoppers – Suburban"),
            (5, "Balanced Shoppers – Suburban"),
            (6, "Fresh-Focused Families – Urban"),
        ])
    }
}

impl SegmentTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        let mut entries: Vec<(i64, String)> = entries.into_iter().map(|(c, n)| (c, n.into())).collect();
        entries.sort_by_key(|(code, _)| *code);
        entries.dedup_by_key(|(code, _)| *code);
        Self { entries }
    }

    pub fn label(&self, code: i64) -> Option<&str> {
        self.entries
            .binary_search_by_key(&code, |(c, _)| *c)
            .ok()
            .map(|idx| self.entries[idx].1.as_str())
    }

    /// Names in code order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, name)| name.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill `segment` on every record. Returns how many stayed unclassified.
    pub fn label_records(&self, records: &mut [CustomerRecord]) -> usize {
        let mut unclassified = 0;
        for record in records.iter_mut() {
            record.segment = record
                .segment_code
                .and_then(|code| self.label(code))
                .map(str::to_string);
            if record.segment.is_none() {
                unclassified += 1;
            }
        }
        unclassified
    }

    /// Label an ingested table in place and record the unclassified count.
    pub fn label_table(&self, table: &mut IngestedTable) {
        table.unclassified = self.label_records(&mut table.records);
        if table.unclassified > 0 {
            warn!(
                "{} of {} rows have no segment name; they only appear when unclassified rows are selected",
                table.unclassified,
                table.records.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn record(code: Option<i64>) -> CustomerRecord {
        CustomerRecord {
            customer_id: "C".to_string(),
            outlet_city: "A".to_string(),
            area: "Urban".to_string(),
            luxury_sales: None,
            fresh_sales: None,
            dry_sales: None,
            total_sales: None,
            segment_code: code,
            segment: None,
        }
    }

    #[test]
    fn every_valid_code_has_a_distinct_name() {
        let table = SegmentTable::default();
        let names: HashSet<&str> = (1..=6).map(|c| table.label(c).unwrap()).collect();
        assert_eq!(names.len(), 6);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn unknown_codes_have_no_name() {
        let table = SegmentTable::default();
        assert_eq!(table.label(0), None);
        assert_eq!(table.label(7), None);
        assert_eq!(table.label(-1), None);
    }

    #[test]
    fn label_records_counts_unclassified() {
        let table = SegmentTable::default();
        let mut records = vec![record(Some(1)), record(Some(9)), record(None)];
        assert_eq!(table.label_records(&mut records), 2);
        assert_eq!(records[0].segment.as_deref(), Some("Bulk Dry Shoppers – Urban"));
        assert_eq!(records[1].segment, None);
    }

    #[test]
    fn substituted_table_is_honored() {
        let table = SegmentTable::new([(2, "Two"), (1, "One")]);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["One", "Two"]);
        assert_eq!(table.label(2), Some("Two"));
    }
}
