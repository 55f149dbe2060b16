//! Command-line parsing for the customer segmentation dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code; `app` turns these structs into configuration values.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::data::DEFAULT_SOURCE_URL;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "segdash", version, about = "Customer segmentation dashboard (published sheet CSV)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Headline metrics, segment/area distribution and segment characteristics.
    Summary(ViewArgs),
    /// Category totals, per-segment averages and the total sales distribution.
    Sales(ViewArgs),
    /// Per-city performance table and the city × segment breakdown.
    Cities(ViewArgs),
    /// Marketing strategy recommendations for each selected segment.
    Strategy(ViewArgs),
    /// Campaign reach / response / ROI projection.
    Campaign(ViewArgs),
    /// Write the city table (CSV) and/or the full snapshot (JSON).
    Export(ExportArgs),
    /// Line-driven session that keeps the table cached between commands.
    ///
    /// Commands: summary, sales, cities, strategy, campaign, refresh, quit.
    Shell(ViewArgs),
}

/// Where to read the customer table from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Published CSV URL.
    #[arg(long, env = "SEGDASH_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Read a local CSV file instead of fetching (takes precedence over the URL).
    #[arg(long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, env = "SEGDASH_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Cache lifetime in seconds for the shell session.
    #[arg(long, default_value_t = 300)]
    pub cache_ttl_secs: i64,

    /// Replace the built-in strategy table with a JSON file.
    #[arg(long, value_name = "JSON")]
    pub strategies: Option<PathBuf>,
}

/// Facet selections. An omitted facet selects every observed value.
#[derive(Debug, Args, Clone, Default)]
pub struct FilterArgs {
    /// Segment name to include (repeatable).
    #[arg(long = "segment", value_name = "NAME")]
    pub segments: Vec<String>,

    /// City to include (repeatable).
    #[arg(long = "city", value_name = "CITY")]
    pub cities: Vec<String>,

    /// Area to include (repeatable), e.g. "Urban" or "Sub Urban".
    #[arg(long = "area", value_name = "AREA")]
    pub areas: Vec<String>,

    /// Select no segments.
    #[arg(long, conflicts_with = "segments")]
    pub no_segments: bool,

    /// Select no cities.
    #[arg(long, conflicts_with = "cities")]
    pub no_cities: bool,

    /// Select no areas.
    #[arg(long, conflicts_with = "areas")]
    pub no_areas: bool,

    /// Also include rows whose segment code has no name.
    #[arg(long)]
    pub include_unclassified: bool,
}

/// Campaign planning assumptions.
#[derive(Debug, Args, Clone)]
pub struct CampaignArgs {
    /// Share of selected customers a campaign reaches.
    #[arg(long, default_value_t = 0.8)]
    pub reach_rate: f64,

    /// Response rate for segments without a specific rate (and for revenue).
    #[arg(long, default_value_t = 0.14)]
    pub response_rate: f64,

    /// Average order multiplier after the campaign.
    #[arg(long, default_value_t = 1.25)]
    pub order_uplift: f64,

    /// Share of additional revenue suggested as budget.
    #[arg(long, default_value_t = 0.3)]
    pub budget_share: f64,
}

/// Common options for every view.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub campaign: CampaignArgs,

    /// Number of bins for the total sales distribution.
    #[arg(long, default_value_t = 30)]
    pub bins: usize,

    /// Cities listed per strategy recommendation.
    #[arg(long, default_value_t = 3)]
    pub top_cities: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Write the per-city table to this CSV file.
    #[arg(long, value_name = "CSV")]
    pub cities_csv: Option<PathBuf>,

    /// Write the full dashboard snapshot to this JSON file.
    #[arg(long, value_name = "JSON")]
    pub snapshot_json: Option<PathBuf>,
}
