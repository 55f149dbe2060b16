//! Data acquisition: raw CSV sources and the expiring table cache.

pub mod cache;
pub mod source;

pub use cache::{CachedTable, Clock, SharedTableCache, SystemClock, TableCache};
pub use source::{CsvSource, DEFAULT_SOURCE_URL, FileSource, SheetClient};

use crate::error::PipelineResult;
use crate::io::ingest::{IngestedTable, normalize_csv};
use crate::segment::SegmentTable;

/// Fetch → normalize → label, as one load cycle.
pub fn load_table<S: CsvSource + ?Sized>(source: &S, segments: &SegmentTable) -> PipelineResult<IngestedTable> {
    let text = source.fetch()?;
    let mut table = normalize_csv(&text)?;
    segments.label_table(&mut table);
    Ok(table)
}
