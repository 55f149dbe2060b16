//! Export computed dashboard views.
//!
//! The city table goes to CSV (easy to consume in spreadsheets); the full
//! snapshot goes to JSON for downstream scripts.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::DashboardSnapshot;
use crate::domain::CityAggregate;
use crate::error::AppError;

/// Write the per-city performance table to a CSV file.
pub fn write_city_csv(path: &Path, rows: &[CityAggregate]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record([
            "city",
            "customer_count",
            "total_revenue",
            "avg_sales",
            "avg_luxury",
            "avg_fresh",
            "avg_dry",
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in rows {
        writer
            .write_record([
                r.city.clone(),
                r.customer_count.to_string(),
                r.total_revenue.to_string(),
                fmt_opt(r.avg_sales),
                fmt_opt(r.avg_luxury),
                fmt_opt(r.avg_fresh),
                fmt_opt(r.avg_dry),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write the whole snapshot (load info, criteria, all views) as JSON.
pub fn write_snapshot_json(path: &Path, snapshot: &DashboardSnapshot) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create snapshot JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, snapshot)
        .map_err(|e| AppError::new(2, format!("Failed to write snapshot JSON: {e}")))?;
    Ok(())
}

/// Full precision; missing values export as empty cells.
fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_csv_quotes_names_and_blanks_missing_means() {
        let rows = vec![CityAggregate {
            city: "Colombo, West".to_string(),
            customer_count: 2,
            total_revenue: 300.0,
            avg_sales: Some(1.0 / 3.0),
            avg_luxury: None,
            avg_fresh: Some(1.5),
            avg_dry: Some(2.0),
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.csv");
        write_city_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("city,customer_count,total_revenue,avg_sales,avg_luxury,avg_fresh,avg_dry")
        );
        assert_eq!(
            lines.next(),
            Some("\"Colombo, West\",2,300,0.3333333333333333,,1.5,2")
        );
    }

    #[test]
    fn snapshot_json_round_trips_through_serde_json() {
        use std::sync::Arc;

        use crate::app::pipeline::{Catalog, ViewOptions, build_snapshot};
        use crate::data::CachedTable;
        use crate::domain::FilterCriteria;
        use crate::io::ingest::normalize_csv;

        let catalog = Catalog::default();
        let mut table = normalize_csv(
            "customer_id,outlet_city,Area,luxury_sales,fresh_sales,dry_sales,total_sales,predicted_customer_segmentation\n\
             C1,A,Urban,1,2,3,6,1\n",
        )
        .unwrap();
        catalog.segments.label_table(&mut table);
        let cached = CachedTable {
            table: Arc::new(table),
            loaded_at: chrono::Utc::now(),
        };
        let criteria = FilterCriteria::everything(&cached.table.records);
        let snapshot = build_snapshot(&catalog, &cached, "inline", &criteria, ViewOptions::default());
        assert!(snapshot.views.is_some());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        write_snapshot_json(&path, &snapshot).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let views = &value["views"];
        assert_eq!(views["summary"]["count"], 1);
        assert_eq!(views["contingency"]["counts"]["A"]["Bulk Dry Shoppers – Urban"], 1);
        assert_eq!(value["load"]["source"], "inline");
    }

    #[test]
    fn unwritable_path_is_config_error() {
        let err = write_city_csv(Path::new("/nonexistent-dir/x/cities.csv"), &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
