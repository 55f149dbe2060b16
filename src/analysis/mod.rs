//! Filtering and descriptive statistics over the normalized table.

pub mod aggregate;
pub mod filter;
pub mod histogram;

pub use aggregate::*;
pub use filter::{FilterOutcome, FilteredView, apply};
pub use histogram::*;
