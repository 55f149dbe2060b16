//! Terminal reporting for the dashboard views.

pub mod format;

pub use format::*;
