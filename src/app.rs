//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and environment overrides
//! - builds the static catalog (segments, strategies, campaign assumptions)
//! - loads the customer table through the cache
//! - renders or exports the requested views

use std::io::{BufRead, Write};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::{info, warn};

use crate::cli::{Command, ExportArgs, FilterArgs, ViewArgs};
use crate::data::{CachedTable, Clock, CsvSource, FileSource, SheetClient, TableCache};
use crate::domain::{CampaignParams, CustomerRecord, DashboardConfig, FilterCriteria, SourceSpec};
use crate::error::AppError;
use crate::report::{self, ViewKind};
use crate::segment::SegmentTable;
use crate::strategy::StrategyBook;

pub mod pipeline;

use pipeline::{Catalog, ViewOptions};

/// Entry point for the `segdash` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` values become visible to clap's `env = ...` lookups.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Summary(args) => handle_view(ViewKind::Summary, &args),
        Command::Sales(args) => handle_view(ViewKind::Sales, &args),
        Command::Cities(args) => handle_view(ViewKind::Cities, &args),
        Command::Strategy(args) => handle_view(ViewKind::Strategy, &args),
        Command::Campaign(args) => handle_view(ViewKind::Campaign, &args),
        Command::Export(args) => handle_export(&args),
        Command::Shell(args) => handle_shell(&args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .try_init();
}

fn handle_view(kind: ViewKind, args: &ViewArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(args)?;
    let catalog = catalog_from_args(args)?;
    let mut cache = open_cache(&config, &catalog)?;

    let cached = cache.get_or_fetch()?;
    let criteria = criteria_from_args(&args.filter, &catalog.segments, &cached.table.records);
    let snapshot = pipeline::build_snapshot(
        &catalog,
        &cached,
        &cache.source_description(),
        &criteria,
        view_options(&config),
    );

    println!("{}", report::render(kind, &snapshot));
    no_data_check(&snapshot)
}

fn handle_export(args: &ExportArgs) -> Result<(), AppError> {
    if args.cities_csv.is_none() && args.snapshot_json.is_none() {
        return Err(AppError::new(
            2,
            "Nothing to export: pass `--cities-csv` and/or `--snapshot-json`.",
        ));
    }

    let config = dashboard_config_from_args(&args.view)?;
    let catalog = catalog_from_args(&args.view)?;
    let mut cache = open_cache(&config, &catalog)?;

    let cached = cache.get_or_fetch()?;
    let criteria = criteria_from_args(&args.view.filter, &catalog.segments, &cached.table.records);
    let snapshot = pipeline::build_snapshot(
        &catalog,
        &cached,
        &cache.source_description(),
        &criteria,
        view_options(&config),
    );

    if let Some(path) = &args.cities_csv {
        let rows = snapshot.views.as_ref().map(|v| v.city_table.as_slice()).unwrap_or(&[]);
        crate::io::export::write_city_csv(path, rows)?;
        info!("wrote {} city rows to {}", rows.len(), path.display());
        println!("City table: {}", path.display());
    }
    if let Some(path) = &args.snapshot_json {
        crate::io::export::write_snapshot_json(path, &snapshot)?;
        println!("Snapshot: {}", path.display());
    }
    no_data_check(&snapshot)
}

/// Exit code 3 when the filters matched nothing.
fn no_data_check(snapshot: &pipeline::DashboardSnapshot) -> Result<(), AppError> {
    match snapshot.views {
        Some(_) => Ok(()),
        None => Err(AppError::new(3, report::NO_DATA_MESSAGE)),
    }
}

fn handle_shell(args: &ViewArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(args)?;
    let catalog = catalog_from_args(args)?;
    let mut cache = open_cache(&config, &catalog)?;

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    run_shell(
        stdin.lock(),
        &mut stdout,
        &mut cache,
        &catalog,
        &args.filter,
        view_options(&config),
    )
}

const SHELL_HELP: &str = "Commands: summary | sales | cities | strategy | campaign | refresh | help | quit";

/// Line-driven session over a cached table.
///
/// Views reuse the cached table until it expires; `refresh` expires it first. When
/// a reload fails the last good table is shown with a warning, if there is one.
pub fn run_shell<R, W, S, C>(
    input: R,
    out: &mut W,
    cache: &mut TableCache<S, C>,
    catalog: &Catalog,
    filter: &FilterArgs,
    options: ViewOptions,
) -> Result<(), AppError>
where
    R: BufRead,
    W: Write,
    S: CsvSource,
    C: Clock,
{
    let io_err = |e: std::io::Error| AppError::new(2, format!("Shell I/O error: {e}"));

    writeln!(out, "{SHELL_HELP}").map_err(io_err)?;
    for line in input.lines() {
        let line = line.map_err(io_err)?;
        let cmd = line.trim();
        match cmd {
            "" => continue,
            "q" | "quit" | "exit" => break,
            "?" | "help" => writeln!(out, "{SHELL_HELP}").map_err(io_err)?,
            "r" | "refresh" => {
                cache.invalidate();
                match cache.get_or_fetch() {
                    Ok(cached) => writeln!(
                        out,
                        "Refreshed: {} rows loaded at {}",
                        cached.table.rows_used(),
                        cached.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                    .map_err(io_err)?,
                    Err(e) => match cache.stale() {
                        Some(stale) => writeln!(
                            out,
                            "Refresh failed: {e}; keeping data loaded at {}",
                            stale.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
                        )
                        .map_err(io_err)?,
                        None => writeln!(out, "Refresh failed: {e}").map_err(io_err)?,
                    },
                }
            }
            other => match ViewKind::from_str(other, true) {
                Ok(kind) => {
                    let Some(cached) = current_table(cache, out).map_err(io_err)? else {
                        continue;
                    };
                    let criteria = criteria_from_args(filter, &catalog.segments, &cached.table.records);
                    let snapshot = pipeline::build_snapshot(
                        catalog,
                        &cached,
                        &cache.source_description(),
                        &criteria,
                        options,
                    );
                    writeln!(out, "{}", report::render(kind, &snapshot)).map_err(io_err)?;
                }
                Err(_) => writeln!(out, "Unknown command '{other}'. {SHELL_HELP}").map_err(io_err)?,
            },
        }
    }
    Ok(())
}

/// Fresh table if possible, else the stale one with a warning, else nothing.
fn current_table<S, C, W>(cache: &mut TableCache<S, C>, out: &mut W) -> std::io::Result<Option<CachedTable>>
where
    S: CsvSource,
    C: Clock,
    W: Write,
{
    match cache.get_or_fetch() {
        Ok(cached) => Ok(Some(cached)),
        Err(e) => match cache.stale() {
            Some(stale) => {
                writeln!(
                    out,
                    "Warning: {e}; showing data loaded at {}",
                    stale.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
                )?;
                Ok(Some(stale))
            }
            None => {
                writeln!(out, "{e}\nNo data available. Use `refresh` to retry.")?;
                Ok(None)
            }
        },
    }
}

pub fn dashboard_config_from_args(args: &ViewArgs) -> Result<DashboardConfig, AppError> {
    if args.source.cache_ttl_secs < 0 {
        return Err(AppError::new(2, "`--cache-ttl-secs` must be >= 0."));
    }
    if args.bins == 0 {
        return Err(AppError::new(2, "`--bins` must be > 0."));
    }

    let source = match &args.source.input {
        Some(path) => SourceSpec::File(path.clone()),
        None => SourceSpec::Url(args.source.source_url.clone()),
    };

    Ok(DashboardConfig {
        source,
        timeout: Duration::from_secs(args.source.timeout_secs),
        cache_ttl: chrono::Duration::seconds(args.source.cache_ttl_secs),
        histogram_bins: args.bins,
        top_cities: args.top_cities,
    })
}

pub fn catalog_from_args(args: &ViewArgs) -> Result<Catalog, AppError> {
    let strategies = match &args.source.strategies {
        Some(path) => StrategyBook::load(path)?,
        None => StrategyBook::default(),
    };

    let campaign = CampaignParams {
        reach_rate: args.campaign.reach_rate,
        default_response_rate: args.campaign.response_rate,
        order_uplift: args.campaign.order_uplift,
        budget_share: args.campaign.budget_share,
        ..CampaignParams::default()
    };
    campaign.validate().map_err(|msg| AppError::new(2, msg))?;

    Ok(Catalog {
        segments: SegmentTable::default(),
        strategies,
        campaign,
    })
}

fn view_options(config: &DashboardConfig) -> ViewOptions {
    ViewOptions {
        histogram_bins: config.histogram_bins,
        top_cities: config.top_cities,
    }
}

fn open_cache(config: &DashboardConfig, catalog: &Catalog) -> Result<TableCache<Box<dyn CsvSource>>, AppError> {
    let source: Box<dyn CsvSource> = match &config.source {
        SourceSpec::Url(url) => Box::new(SheetClient::new(url.clone(), config.timeout)?),
        SourceSpec::File(path) => Box::new(FileSource::new(path.clone())),
    };
    Ok(TableCache::new(source, catalog.segments.clone(), config.cache_ttl))
}

/// Resolve facet selections against the loaded table.
///
/// Omitted facets select every observed value; `--no-*` selects none.
pub fn criteria_from_args(filter: &FilterArgs, segments: &SegmentTable, records: &[CustomerRecord]) -> FilterCriteria {
    let mut criteria = FilterCriteria::everything(records);

    if filter.no_segments {
        criteria.segments.clear();
    } else if !filter.segments.is_empty() {
        for name in &filter.segments {
            if !segments.contains_name(name) {
                warn!("segment '{name}' is not a known segment name");
            }
        }
        criteria.segments = filter.segments.iter().cloned().collect();
    }

    if filter.no_cities {
        criteria.cities.clear();
    } else if !filter.cities.is_empty() {
        criteria.cities = filter.cities.iter().cloned().collect();
    }

    if filter.no_areas {
        criteria.areas.clear();
    } else if !filter.areas.is_empty() {
        criteria.areas = filter.areas.iter().cloned().collect();
    }

    criteria.include_unclassified = filter.include_unclassified;
    criteria
}

/// Rewrite argv so `segdash` defaults to `segdash summary`.
///
/// Rules:
/// - `segdash`                      -> `segdash summary`
/// - `segdash --city A ...`         -> `segdash summary --city A ...`
/// - `segdash --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("summary".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "summary" | "sales" | "cities" | "strategy" | "campaign" | "export" | "shell"
    );
    if is_subcommand {
        return argv;
    }

    // A leading flag is treated as "summary flags" (`-v` is global either way).
    if arg1.starts_with('-') {
        argv.insert(1, "summary".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cache::default_ttl;
    use crate::data::cache::tests::{CountingSource, FakeClock};
    use crate::domain::UNCLASSIFIED_LABEL;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn record(segment: Option<&str>, city: &str, area: &str) -> CustomerRecord {
        CustomerRecord {
            customer_id: "C".to_string(),
            outlet_city: city.to_string(),
            area: area.to_string(),
            luxury_sales: None,
            fresh_sales: None,
            dry_sales: None,
            total_sales: Some(1.0),
            segment_code: None,
            segment: segment.map(str::to_string),
        }
    }

    #[test]
    fn rewrite_defaults_to_summary() {
        assert_eq!(rewrite_args(argv(&["segdash"])), argv(&["segdash", "summary"]));
        assert_eq!(
            rewrite_args(argv(&["segdash", "--city", "A"])),
            argv(&["segdash", "summary", "--city", "A"])
        );
        assert_eq!(rewrite_args(argv(&["segdash", "cities"])), argv(&["segdash", "cities"]));
        assert_eq!(rewrite_args(argv(&["segdash", "--help"])), argv(&["segdash", "--help"]));
    }

    #[test]
    fn omitted_facets_select_everything_observed() {
        let records = vec![record(Some("S1"), "A", "Urban"), record(None, "B", "Sub Urban")];
        let criteria = criteria_from_args(&FilterArgs::default(), &SegmentTable::default(), &records);
        assert_eq!(criteria.segments.len(), 1);
        assert_eq!(criteria.cities.len(), 2);
        assert_eq!(criteria.areas.len(), 2);
        assert!(!criteria.include_unclassified);
    }

    #[test]
    fn explicit_and_empty_facets_override() {
        let records = vec![record(Some("S1"), "A", "Urban"), record(Some("S2"), "B", "Urban")];
        let filter = FilterArgs {
            cities: vec!["B".to_string()],
            no_areas: true,
            include_unclassified: true,
            ..FilterArgs::default()
        };
        let criteria = criteria_from_args(&filter, &SegmentTable::default(), &records);
        assert_eq!(criteria.cities.iter().collect::<Vec<_>>(), vec!["B"]);
        assert!(criteria.areas.is_empty());
        assert_eq!(criteria.segments.len(), 2);
        assert!(criteria.include_unclassified);
    }

    #[test]
    fn empty_selection_exits_with_no_data_code() {
        let catalog = Catalog::default();
        let cached = CachedTable {
            table: std::sync::Arc::new(crate::io::ingest::IngestedTable {
                records: vec![record(Some("S1"), "A", "Urban")],
                rows_read: 1,
                ..Default::default()
            }),
            loaded_at: chrono::Utc::now(),
        };
        let filter = FilterArgs {
            no_cities: true,
            ..FilterArgs::default()
        };
        let criteria = criteria_from_args(&filter, &catalog.segments, &cached.table.records);
        let snapshot = pipeline::build_snapshot(&catalog, &cached, "test", &criteria, ViewOptions::default());

        let err = no_data_check(&snapshot).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(report::render(ViewKind::Summary, &snapshot).contains(report::NO_DATA_MESSAGE));
    }

    #[test]
    fn campaign_args_are_validated() {
        let cli = crate::cli::Cli::parse_from(["segdash", "campaign", "--reach-rate", "2.0"]);
        let Command::Campaign(args) = cli.command else {
            panic!("expected campaign");
        };
        let err = catalog_from_args(&args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn input_file_takes_precedence_over_url() {
        let cli = crate::cli::Cli::parse_from(["segdash", "summary", "--input", "local.csv"]);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        let config = dashboard_config_from_args(&args).unwrap();
        assert_eq!(config.source, SourceSpec::File("local.csv".into()));
        assert_eq!(config.cache_ttl, default_ttl());
    }

    #[test]
    fn shell_reuses_cache_and_refreshes_on_demand() {
        let source = CountingSource::new();
        let clock = FakeClock::new();
        let catalog = Catalog::default();
        let mut cache = TableCache::with_clock(source.clone(), catalog.segments.clone(), default_ttl(), clock.clone());

        let input = "summary\ncities\nrefresh\nbogus\nstrategy\nquit\nsummary\n";
        let mut out = Vec::new();
        run_shell(
            input.as_bytes(),
            &mut out,
            &mut cache,
            &catalog,
            &FilterArgs::default(),
            ViewOptions::default(),
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(source.calls(), 2);
        assert!(text.contains("Customer Segment Overview"));
        assert!(text.contains("City performance"));
        assert!(text.contains("Refreshed: 1 rows"));
        assert!(text.contains("Unknown command 'bogus'"));
        assert!(text.contains("Recommended marketing strategies"));
        assert!(!text.contains(UNCLASSIFIED_LABEL));
    }

    #[test]
    fn shell_falls_back_to_stale_table_when_reload_fails() {
        let source = CountingSource::new();
        let clock = FakeClock::new();
        let catalog = Catalog::default();
        let mut cache = TableCache::with_clock(source.clone(), catalog.segments.clone(), default_ttl(), clock.clone());
        cache.get_or_fetch().unwrap();

        *source.fail.lock().unwrap() = true;
        clock.advance(600);

        let mut out = Vec::new();
        run_shell(
            "summary\n".as_bytes(),
            &mut out,
            &mut cache,
            &catalog,
            &FilterArgs::default(),
            ViewOptions::default(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Warning: Data unavailable: offline"));
        assert!(text.contains("Total Customers : 1"));
    }

    #[test]
    fn failed_refresh_keeps_last_good_table() {
        let source = CountingSource::new();
        let catalog = Catalog::default();
        let mut cache =
            TableCache::with_clock(source.clone(), catalog.segments.clone(), default_ttl(), FakeClock::new());
        cache.get_or_fetch().unwrap();

        *source.fail.lock().unwrap() = true;

        let mut out = Vec::new();
        run_shell(
            "refresh\nsummary\n".as_bytes(),
            &mut out,
            &mut cache,
            &catalog,
            &FilterArgs::default(),
            ViewOptions::default(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Refresh failed: Data unavailable: offline; keeping data loaded at 2025-01-01 12:00:00 UTC"));
        assert!(text.contains("Warning: Data unavailable: offline"));
        assert!(text.contains("Total Customers : 1"));
        assert!(!text.contains("No data available"));
        // The refresh and the view each tried the source once more.
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn shell_reports_no_data_after_failed_refresh() {
        let source = CountingSource::new();
        *source.fail.lock().unwrap() = true;
        let catalog = Catalog::default();
        let mut cache =
            TableCache::with_clock(source.clone(), catalog.segments.clone(), default_ttl(), FakeClock::new());

        let mut out = Vec::new();
        run_shell(
            "refresh\nsummary\n".as_bytes(),
            &mut out,
            &mut cache,
            &catalog,
            &FilterArgs::default(),
            ViewOptions::default(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Refresh failed"));
        assert!(text.contains("No data available. Use `refresh` to retry."));
    }
}
