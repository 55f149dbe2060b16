//! CSV ingest and normalization.
//!
//! This module turns the raw sheet export into typed `CustomerRecord`s.
//!
//! Design goals:
//! - **Strict schema** for required columns (`SchemaError` when one is absent)
//! - **Lenient values**: a field that fails numeric coercion becomes `None`
//!   and is reported, the row itself is kept
//! - **Deterministic behavior**: output order is input order
//! - **Separation of concerns**: no labeling, filtering or aggregation here

use std::collections::HashMap;

use csv::StringRecord;
use log::{debug, info};
use serde::Serialize;

use crate::domain::CustomerRecord;
use crate::error::{PipelineError, PipelineResult};

pub const COL_CUSTOMER_ID: &str = "customer_id";
pub const COL_OUTLET_CITY: &str = "outlet_city";
pub const COL_AREA: &str = "area";
pub const COL_LUXURY: &str = "luxury_sales";
pub const COL_FRESH: &str = "fresh_sales";
pub const COL_DRY: &str = "dry_sales";
pub const COL_TOTAL: &str = "total_sales";
pub const COL_SEGMENT: &str = "predicted_customer_segmentation";

/// Accepted alternatives for the identifier column.
const CUSTOMER_ID_ALIASES: [&str; 2] = [COL_CUSTOMER_ID, "id"];

/// A field- or row-level problem absorbed during ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub line: usize,
    pub customer_id: Option<String>,
    pub column: Option<String>,
    pub message: String,
}

/// Ingest output: records in input order plus what was absorbed on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestedTable {
    pub records: Vec<CustomerRecord>,
    pub issues: Vec<RowIssue>,
    pub rows_read: usize,
    /// Rows whose segment code has no name (filled in by the labeler).
    pub unclassified: usize,
}

impl IngestedTable {
    pub fn rows_used(&self) -> usize {
        self.records.len()
    }
}

/// Resolved column positions for the expected schema.
struct Columns {
    customer_id: usize,
    outlet_city: usize,
    area: usize,
    luxury: usize,
    fresh: usize,
    dry: usize,
    total: usize,
    segment: usize,
}

/// Parse and normalize a CSV document.
///
/// Fails only when the document is not tabular at all (`ParseError`) or a
/// required column is absent (`SchemaError`).
pub fn normalize_csv(text: &str) -> PipelineResult<IngestedTable> {
    if text.trim().is_empty() {
        return Err(PipelineError::ParseError("document is empty".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::ParseError(format!("failed to read header row: {e}")))?
        .clone();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::ParseError("header row is empty".to_string()));
    }

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;

    let mut table = IngestedTable::default();

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        table.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                table.issues.push(RowIssue {
                    line,
                    customer_id: None,
                    column: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let row = parse_row(&record, &columns, line, &mut table.issues);
        table.records.push(row);
    }

    info!(
        "normalized {} rows ({} field issues)",
        table.records.len(),
        table.issues.len()
    );
    Ok(table)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Sheet exports sometimes carry a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> PipelineResult<Columns> {
    let require = |name: &str| -> PipelineResult<usize> {
        header_map.get(name).copied().ok_or_else(|| PipelineError::SchemaError {
            column: name.to_string(),
        })
    };

    let customer_id = CUSTOMER_ID_ALIASES
        .iter()
        .find_map(|alias| header_map.get(*alias).copied())
        .ok_or_else(|| PipelineError::SchemaError {
            column: COL_CUSTOMER_ID.to_string(),
        })?;

    Ok(Columns {
        customer_id,
        outlet_city: require(COL_OUTLET_CITY)?,
        area: require(COL_AREA)?,
        luxury: require(COL_LUXURY)?,
        fresh: require(COL_FRESH)?,
        dry: require(COL_DRY)?,
        total: require(COL_TOTAL)?,
        segment: require(COL_SEGMENT)?,
    })
}

fn parse_row(record: &StringRecord, columns: &Columns, line: usize, issues: &mut Vec<RowIssue>) -> CustomerRecord {
    let customer_id = get_text(record, columns.customer_id);
    let id_for_issue = || Some(customer_id.clone()).filter(|s| !s.is_empty());

    let mut numeric = |idx: usize, column: &str| -> Option<f64> {
        let raw = get_text(record, idx);
        match parse_amount(&raw) {
            Some(v) => Some(v),
            None => {
                debug!("line {line}: `{column}` value '{raw}' is not numeric");
                issues.push(RowIssue {
                    line,
                    customer_id: id_for_issue(),
                    column: Some(column.to_string()),
                    message: format!("invalid numeric value '{raw}'"),
                });
                None
            }
        }
    };

    let luxury_sales = numeric(columns.luxury, COL_LUXURY);
    let fresh_sales = numeric(columns.fresh, COL_FRESH);
    let dry_sales = numeric(columns.dry, COL_DRY);
    let total_sales = numeric(columns.total, COL_TOTAL);

    let raw_segment = get_text(record, columns.segment);
    let segment_code = parse_segment_code(&raw_segment);
    if segment_code.is_none() {
        issues.push(RowIssue {
            line,
            customer_id: id_for_issue(),
            column: Some(COL_SEGMENT.to_string()),
            message: format!("invalid segment code '{raw_segment}'"),
        });
    }

    CustomerRecord {
        outlet_city: get_text(record, columns.outlet_city),
        area: get_text(record, columns.area),
        luxury_sales,
        fresh_sales,
        dry_sales,
        total_sales,
        segment_code,
        segment: None,
        customer_id,
    }
}

fn get_text(record: &StringRecord, idx: usize) -> String {
    record.get(idx).map(str::trim).unwrap_or("").to_string()
}

/// Parse a monetary amount; empty, unparsable and non-finite values are missing.
fn parse_amount(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Segment codes arrive as integers, sometimes rendered as floats (`"2.0"`).
fn parse_segment_code(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(code) = raw.parse::<i64>() {
        return Some(code);
    }
    let v = parse_amount(raw)?;
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
