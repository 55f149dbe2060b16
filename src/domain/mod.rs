//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the normalized customer row (`CustomerRecord`)
//! - filter selections (`FilterCriteria`) and strategy templates (`StrategyProfile`)
//! - aggregate outputs (`ScalarSummary`, `CityAggregate`, `Contingency`, etc.)

pub mod types;

pub use types::*;
