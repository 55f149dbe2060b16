//! Facet filtering over the normalized table.
//!
//! Zero matching rows is a distinct outcome (`FilterOutcome::Empty`) rather than
//! an empty vector, so aggregate code never runs over nothing.

use std::collections::BTreeSet;

use crate::domain::{CustomerRecord, FilterCriteria};

impl FilterCriteria {
    /// Criteria that select every segment, city and area observed in `records`.
    ///
    /// Unclassified rows stay excluded unless the caller opts in.
    pub fn everything<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CustomerRecord>,
    {
        let mut criteria = FilterCriteria::default();
        for r in records {
            if let Some(segment) = &r.segment {
                criteria.segments.insert(segment.clone());
            }
            criteria.cities.insert(r.outlet_city.clone());
            criteria.areas.insert(r.area.clone());
        }
        criteria
    }

    pub fn matches(&self, record: &CustomerRecord) -> bool {
        let segment_ok = match &record.segment {
            Some(name) => self.segments.contains(name),
            None => self.include_unclassified,
        };
        segment_ok && self.cities.contains(&record.outlet_city) && self.areas.contains(&record.area)
    }
}

/// Result of applying a filter.
#[derive(Debug, Clone)]
pub enum FilterOutcome<'a> {
    Empty,
    Matched(FilteredView<'a>),
}

impl<'a> FilterOutcome<'a> {
    pub fn view(&self) -> Option<&FilteredView<'a>> {
        match self {
            FilterOutcome::Empty => None,
            FilterOutcome::Matched(view) => Some(view),
        }
    }

    pub fn len(&self) -> usize {
        self.view().map_or(0, FilteredView::len)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FilterOutcome::Empty)
    }
}

/// A non-empty subsequence of the table, in input order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    rows: Vec<&'a CustomerRecord>,
}

impl<'a> FilteredView<'a> {
    /// Wrap `rows`, or `None` when there are none.
    pub fn new(rows: Vec<&'a CustomerRecord>) -> Option<Self> {
        if rows.is_empty() { None } else { Some(Self { rows }) }
    }

    pub fn rows(&self) -> &[&'a CustomerRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CustomerRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Narrow to rows carrying the given segment label.
    pub fn for_segment(&self, segment: &str) -> Option<FilteredView<'a>> {
        FilteredView::new(
            self.rows
                .iter()
                .copied()
                .filter(|r| r.segment_label() == segment)
                .collect(),
        )
    }

    /// Segment labels present in the view, in discovery order.
    pub fn segment_labels(&self) -> Vec<&'a str> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for r in self.rows.iter().copied() {
            let label = r.segment_label();
            if seen.insert(label) {
                out.push(label);
            }
        }
        out
    }
}

/// Keep the records matching every facet of `criteria`.
pub fn apply<'a>(criteria: &FilterCriteria, records: &'a [CustomerRecord]) -> FilterOutcome<'a> {
    let rows: Vec<&CustomerRecord> = records.iter().filter(|r| criteria.matches(r)).collect();
    match FilteredView::new(rows) {
        Some(view) => FilterOutcome::Matched(view),
        None => FilterOutcome::Empty,
    }
}
