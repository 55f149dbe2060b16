//! Rule-based marketing output: strategy profiles, per-segment
//! recommendations, and the campaign projection.

pub mod book;
pub mod campaign;
pub mod recommend;

pub use book::{NEEDS_CUSTOM_STRATEGY, StrategyBook};
pub use campaign::{action_items, project};
pub use recommend::{TOP_CITIES, recommend, recommend_all};
