//! Single-slot, time-boxed cache for the normalized table.
//!
//! The table is loaded at most once per TTL window; `invalidate` expires it so
//! the next access refetches, while the old table stays available as a fallback. Time comes from a `Clock` so expiry can be tested
//! without sleeping.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::data::{CsvSource, load_table};
use crate::error::PipelineResult;
use crate::io::ingest::IngestedTable;
use crate::segment::SegmentTable;

pub const DEFAULT_TTL_SECS: i64 = 300;

pub fn default_ttl() -> chrono::Duration {
    chrono::Duration::seconds(DEFAULT_TTL_SECS)
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A loaded table and the time it was loaded.
#[derive(Debug, Clone)]
pub struct CachedTable {
    pub table: Arc<IngestedTable>,
    pub loaded_at: DateTime<Utc>,
}

pub struct TableCache<S, C = SystemClock> {
    source: S,
    segments: SegmentTable,
    clock: C,
    ttl: chrono::Duration,
    slot: Option<CachedTable>,
    expired: bool,
    fetches: usize,
}

impl<S: CsvSource> TableCache<S, SystemClock> {
    pub fn new(source: S, segments: SegmentTable, ttl: chrono::Duration) -> Self {
        Self::with_clock(source, segments, ttl, SystemClock)
    }
}

impl<S: CsvSource, C: Clock> TableCache<S, C> {
    pub fn with_clock(source: S, segments: SegmentTable, ttl: chrono::Duration, clock: C) -> Self {
        Self {
            source,
            segments,
            clock,
            ttl,
            slot: None,
            expired: false,
            fetches: 0,
        }
    }

    /// Return the cached table, loading it first if absent or expired.
    ///
    /// A failed load leaves any previous table in place (see `stale`).
    pub fn get_or_fetch(&mut self) -> PipelineResult<CachedTable> {
        let now = self.clock.now();
        if let Some(cached) = &self.slot {
            if !self.expired && now - cached.loaded_at < self.ttl {
                debug!("cache hit (loaded at {})", cached.loaded_at);
                return Ok(cached.clone());
            }
            info!("cached table expired (loaded at {})", cached.loaded_at);
        }

        self.fetches += 1;
        let table = match load_table(&self.source, &self.segments) {
            Ok(t) => t,
            Err(e) => {
                warn!("load from {} failed: {e}", self.source.describe());
                return Err(e);
            }
        };

        let cached = CachedTable {
            table: Arc::new(table),
            loaded_at: now,
        };
        self.slot = Some(cached.clone());
        self.expired = false;
        Ok(cached)
    }

    /// Expire the cached table; the next access refetches.
    ///
    /// The table itself is kept for `stale` until a reload succeeds.
    pub fn invalidate(&mut self) {
        if self.slot.is_some() && !self.expired {
            info!("cache invalidated");
        }
        self.expired = true;
    }

    /// The last successfully loaded table, expired or not.
    pub fn stale(&self) -> Option<CachedTable> {
        self.slot.clone()
    }

    /// Number of load attempts made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }
}

/// Thread-safe wrapper: concurrent callers share one load per expiry.
///
/// This is the entry point for hosts that serve several requests at once
/// (a web handler, a worker pool). The single-threaded CLI and shell own a
/// `TableCache` directly.
///
/// The lock is held across the load, so callers arriving while a refetch is in
/// flight wait for it and then observe the fresh table.
pub struct SharedTableCache<S, C = SystemClock> {
    inner: Mutex<TableCache<S, C>>,
}

impl<S: CsvSource, C: Clock> SharedTableCache<S, C> {
    pub fn new(cache: TableCache<S, C>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    pub fn get_or_fetch(&self) -> PipelineResult<CachedTable> {
        self.lock().get_or_fetch()
    }

    pub fn invalidate(&self) {
        self.lock().invalidate();
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableCache<S, C>> {
        // The cache holds no invariant a panicking reader could break.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
