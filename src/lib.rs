//! `segment-dashboard` library crate.
//!
//! The binary (`segdash`) is a thin wrapper around this library so that:
//!
//! - the load → filter → aggregate → recommend pipeline is testable without spawning processes
//! - views can be rendered as text, exported, or driven from an interactive shell
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod segment;
pub mod strategy;
