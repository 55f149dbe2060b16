//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays free of rounding and display concerns
//! - output changes are localized

use crate::app::pipeline::{DashboardSnapshot, DashboardViews, LoadInfo};
use crate::domain::{Contingency, FilterCriteria, Histogram, LabelCount, SalesCategory};

pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

/// Which dashboard view to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewKind {
    Summary,
    Sales,
    Cities,
    Strategy,
    Campaign,
}

/// Render one view, with the shared header and the empty-selection notice.
pub fn render(kind: ViewKind, snapshot: &DashboardSnapshot) -> String {
    let mut out = format_header(&snapshot.load, &snapshot.criteria, snapshot.matched_rows());
    out.push('\n');

    let Some(views) = &snapshot.views else {
        out.push_str(NO_DATA_MESSAGE);
        out.push('\n');
        return out;
    };

    let body = match kind {
        ViewKind::Summary => format_summary(views),
        ViewKind::Sales => format_sales(views),
        ViewKind::Cities => format_cities(views),
        ViewKind::Strategy => format_strategy(views),
        ViewKind::Campaign => format_campaign(views),
    };
    out.push_str(&body);
    out
}

pub fn format_header(load: &LoadInfo, criteria: &FilterCriteria, matched: usize) -> String {
    let mut out = String::new();
    out.push_str("=== segdash - Customer Segmentation Dashboard ===\n");
    out.push_str(&format!("Source: {}\n", load.source));
    out.push_str(&format!(
        "Loaded: {} | rows={} | field issues={} | unclassified={}\n",
        load.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        load.rows_used,
        load.field_issues,
        load.unclassified,
    ));
    out.push_str(&format!(
        "Filters: segments={} cities={} areas={}{} | matched={}\n",
        criteria.segments.len(),
        criteria.cities.len(),
        criteria.areas.len(),
        if criteria.include_unclassified { " (+unclassified)" } else { "" },
        fmt_count(matched),
    ));
    out
}

pub fn format_summary(views: &DashboardViews) -> String {
    let mut out = String::new();
    let s = &views.summary;

    out.push_str("Customer Segment Overview\n");
    out.push_str(&format!("  Total Customers : {}\n", fmt_count(s.count)));
    out.push_str(&format!("  Avg Total Sales : {}\n", fmt_money_opt(s.total_sales_mean)));
    out.push_str(&format!("  Total Revenue   : {}\n", fmt_money(s.total_sales_sum)));
    out.push_str(&format!("  Active Cities   : {}\n", s.distinct_cities));

    out.push_str("\nCustomers by segment:\n");
    out.push_str(&format_shares(&views.segment_counts, s.count));
    out.push_str("\nCustomers by area:\n");
    out.push_str(&format_shares(&views.area_counts, s.count));

    out.push_str("\nSegment characteristics:\n");
    for m in &views.segment_means {
        out.push_str(&format!(
            "  {}: customers={} | avg luxury={} | avg fresh={} | avg dry={}\n",
            m.segment,
            fmt_count(m.count),
            fmt_money_opt(m.avg_luxury),
            fmt_money_opt(m.avg_fresh),
            fmt_money_opt(m.avg_dry),
        ));
    }
    out
}

pub fn format_sales(views: &DashboardViews) -> String {
    let mut out = String::new();

    out.push_str("Sales by category:\n");
    for category in SalesCategory::ALL {
        out.push_str(&format!(
            "  {:<8} {:>18}\n",
            category.display_name(),
            fmt_money(views.category_totals.get(category))
        ));
    }

    out.push_str("\nAverage sales by segment:\n");
    out.push_str(&trimmed_line(format!(
        "{:<40} {:>14} {:>14} {:>14}",
        "segment", "luxury", "fresh", "dry"
    )));
    out.push_str(&trimmed_line(format!("{:-<40} {:-<14} {:-<14} {:-<14}", "", "", "", "")));
    for m in &views.segment_means {
        out.push_str(&trimmed_line(format!(
            "{:<40} {:>14} {:>14} {:>14}",
            truncate(&m.segment, 40),
            fmt_opt(m.avg_luxury),
            fmt_opt(m.avg_fresh),
            fmt_opt(m.avg_dry),
        )));
    }

    out.push_str("\nTotal sales distribution:\n");
    match &views.sales_histogram {
        Some(h) => out.push_str(&format_histogram(h)),
        None => out.push_str("  n/a (no total_sales values)\n"),
    }
    out
}

fn format_histogram(h: &Histogram) -> String {
    let mut out = String::new();
    for (lo, hi, count) in h.bins() {
        out.push_str(&trimmed_line(format!(
            "  {:>14} - {:<14} {:>8}",
            fmt_num(lo),
            fmt_num(hi),
            count
        )));
    }
    out
}

pub fn format_cities(views: &DashboardViews) -> String {
    let mut out = String::new();

    out.push_str("City performance (by total revenue):\n");
    out.push_str(&trimmed_line(format!(
        "{:<20} {:>9} {:>16} {:>12} {:>12} {:>12} {:>12}",
        "city", "customers", "total_revenue", "avg_sales", "avg_luxury", "avg_fresh", "avg_dry"
    )));
    out.push_str(&trimmed_line(format!(
        "{:-<20} {:-<9} {:-<16} {:-<12} {:-<12} {:-<12} {:-<12}",
        "", "", "", "", "", "", ""
    )));
    for c in &views.city_table {
        out.push_str(&trimmed_line(format!(
            "{:<20} {:>9} {:>16} {:>12} {:>12} {:>12} {:>12}",
            truncate(&c.city, 20),
            c.customer_count,
            fmt_num(c.total_revenue),
            fmt_opt(c.avg_sales),
            fmt_opt(c.avg_luxury),
            fmt_opt(c.avg_fresh),
            fmt_opt(c.avg_dry),
        )));
    }

    out.push_str("\nCustomer segments by city:\n");
    out.push_str(&format_contingency(&views.contingency));
    out
}

fn format_contingency(table: &Contingency) -> String {
    let mut out = String::new();
    let mut header = format!("{:<20}", "city");
    for (i, _) in table.segments.iter().enumerate() {
        header.push_str(&format!(" {:>6}", format!("S{}", i + 1)));
    }
    out.push_str(&trimmed_line(header));

    for city in &table.cities {
        let mut line = format!("{:<20}", truncate(city, 20));
        for segment in &table.segments {
            line.push_str(&format!(" {:>6}", table.get(city, segment)));
        }
        out.push_str(&trimmed_line(line));
    }

    out.push_str("Legend:\n");
    for (i, segment) in table.segments.iter().enumerate() {
        out.push_str(&format!("  S{} = {segment}\n", i + 1));
    }
    out
}

pub fn format_strategy(views: &DashboardViews) -> String {
    let mut out = String::new();
    out.push_str("Recommended marketing strategies\n");

    for rec in &views.recommendations {
        out.push_str(&format!("\n## {}\n", rec.segment));
        if rec.is_placeholder {
            out.push_str("  (no strategy profile on file)\n");
        }
        out.push_str(&format!(
            "  Target audience: {} customers | Avg sales: {}\n",
            fmt_count(rec.customer_count),
            fmt_money_opt(rec.avg_total_sales)
        ));
        out.push_str(&format!("  Top cities: {}\n", rec.top_cities.join(", ")));
        let areas: Vec<String> = rec
            .area_breakdown
            .iter()
            .map(|a| format!("{} ({})", a.label, a.count))
            .collect();
        out.push_str(&format!("  Area focus: {}\n", areas.join(", ")));
        out.push_str(&format!("  Primary  : {}\n", rec.profile.primary));
        out.push_str(&format!("  Secondary: {}\n", rec.profile.secondary));
        out.push_str(&format!("  Channels : {}\n", rec.profile.channels.join(", ")));
        out.push_str("  Offers   :\n");
        for offer in &rec.profile.offers {
            out.push_str(&format!("    - {offer}\n"));
        }
        out.push_str(&format!("  Timing   : {}\n", rec.profile.timing));
    }

    if !views.action_items.is_empty() {
        out.push_str("\nImmediate action items:\n");
        for item in &views.action_items {
            out.push_str(&format!("  - {}: {}\n", item.title(), item.detail()));
        }
    }
    out
}

pub fn format_campaign(views: &DashboardViews) -> String {
    let mut out = String::new();
    let c = &views.campaign;

    out.push_str("Campaign performance predictor\n");
    out.push_str(&format!("  Potential customers reached: {:.0}\n", c.estimated_reach));
    out.push_str("\nExpected responses by segment:\n");
    for r in &c.responses {
        out.push_str(&trimmed_line(format!(
            "  {:<40} {:>8} x {:>5.1}% = {:>8.0}",
            truncate(&r.segment, 40),
            r.customers,
            r.response_rate * 100.0,
            r.expected_responses
        )));
    }

    out.push_str("\nROI projections:\n");
    out.push_str(&format!("  Current avg order value  : {}\n", fmt_money_opt(c.current_avg_order)));
    out.push_str(&format!("  Projected avg order value: {}\n", fmt_money_opt(c.projected_avg_order)));
    out.push_str(&format!("  Est. additional revenue  : {}\n", fmt_money_opt(c.additional_revenue)));
    out.push_str(&format!("  Suggested campaign budget: {}\n", fmt_money_opt(c.suggested_budget)));
    out
}

fn format_shares(counts: &[LabelCount], total: usize) -> String {
    let mut out = String::new();
    for c in counts {
        let share = if total == 0 { 0.0 } else { c.count as f64 * 100.0 / total as f64 };
        out.push_str(&trimmed_line(format!(
            "  {:<40} {:>8} {:>6.1}%",
            truncate(&c.label, 40),
            fmt_count(c.count),
            share
        )));
    }
    out
}

fn trimmed_line(s: String) -> String {
    let mut line = s.trim_end().to_string();
    line.push('\n');
    line
}

/// Two decimals with thousands separators; non-finite values read `n/a`.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    let rounded = format!("{:.2}", v.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0') { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

pub fn fmt_money(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    format!("Rs.{}", fmt_num(v))
}

pub fn fmt_money_opt(v: Option<f64>) -> String {
    v.map(fmt_money).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_num).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_count(n: usize) -> String {
    let s = fmt_num(n as f64);
    s.trim_end_matches(".00").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
