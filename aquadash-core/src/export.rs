//! Enriched-table serialization for the reporting collaborators.
//!
//! One flat row per daily record: raw fields, derived KPI columns, the
//! per-parameter status labels and the composed alert. The full assessment is
//! additionally embedded as a JSON cell so spreadsheet consumers keep the
//! structured detail.

use crate::classify::{self, RowAssessment};
use crate::error::AquadashError;
use crate::metrics::{self, DerivedMetrics};
use aquadash_schemas::policy::RiskPolicy;
use aquadash_schemas::record::DailyRecord;
use aquadash_schemas::status::{AlertLevel, StatusLabel};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub date: NaiveDate,
    pub block: String,
    pub tank: String,
    pub worker: Option<String>,
    pub water_worker: Option<String>,
    pub ph: Option<f64>,
    pub salinity_ppt: Option<f64>,
    pub water_temp_c: Option<f64>,
    pub scheduled_feed_g: f64,
    pub actual_feed_g: f64,
    pub leftover_feed_g: f64,
    pub dead_count: u32,
    pub dead_weight_g: f64,
    pub initial_count: u32,
    pub live_count: u32,
    pub survival_pct: f64,
    pub mortality_pct: f64,
    pub feed_efficiency_pct: f64,
    pub ph_score: Option<f64>,
    pub salinity_score: Option<f64>,
    pub overall_performance_pct: f64,
    pub ph_status: Option<StatusLabel>,
    pub salinity_status: Option<StatusLabel>,
    pub water_temp_status: Option<StatusLabel>,
    pub mortality_status: StatusLabel,
    pub alert_level: Option<AlertLevel>,
    pub statuses_json: String,
}

fn to_row(
    record: &DailyRecord,
    derived: &DerivedMetrics,
    assessment: &RowAssessment,
) -> Result<EnrichedRow, AquadashError> {
    Ok(EnrichedRow {
        date: record.date,
        block: record.block.clone(),
        tank: record.tank.clone(),
        worker: record.worker.clone(),
        water_worker: record.water_worker.clone(),
        ph: record.ph,
        salinity_ppt: record.salinity_ppt,
        water_temp_c: record.water_temp_c,
        scheduled_feed_g: record.scheduled_feed_g,
        actual_feed_g: record.actual_feed_g,
        leftover_feed_g: derived.leftover_feed_g,
        dead_count: record.dead_count,
        dead_weight_g: record.dead_weight_g,
        initial_count: record.initial_count,
        live_count: record.live_count,
        survival_pct: derived.survival_pct,
        mortality_pct: derived.mortality_pct,
        feed_efficiency_pct: derived.feed_efficiency_pct,
        ph_score: derived.ph_score,
        salinity_score: derived.salinity_score,
        overall_performance_pct: derived.overall_performance_pct,
        ph_status: assessment.ph,
        salinity_status: assessment.salinity,
        water_temp_status: assessment.water_temp,
        mortality_status: assessment.mortality,
        alert_level: assessment.alert,
        statuses_json: serde_json::to_string(assessment)?,
    })
}

/// Runs the metrics engine and the classifier over the filtered set and
/// returns one enriched row per record, in input order.
pub fn build_rows(
    records: &[DailyRecord],
    policy: &RiskPolicy,
) -> Result<Vec<EnrichedRow>, AquadashError> {
    let derived = metrics::enrich(records, policy);
    let assessments = classify::assess_all(records, policy);
    records
        .iter()
        .zip(derived.iter())
        .zip(assessments.iter())
        .map(|((record, derived), assessment)| to_row(record, derived, assessment))
        .collect()
}

pub fn write_csv(path: &Path, rows: &[EnrichedRow]) -> Result<(), AquadashError> {
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AquadashError::CsvError(display.clone(), e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AquadashError::CsvError(display.clone(), e))?;
    }
    writer
        .flush()
        .map_err(|e| AquadashError::FileIO(display, e))?;
    Ok(())
}

pub fn write_json(path: &Path, rows: &[EnrichedRow]) -> Result<(), AquadashError> {
    let display = path.display().to_string();
    let mut file =
        fs::File::create(path).map_err(|e| AquadashError::FileIO(display.clone(), e))?;
    serde_json::to_writer_pretty(&mut file, rows)?;
    file.write_all(b"\n")
        .map_err(|e| AquadashError::FileIO(display, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            block: "H1".to_string(),
            tank: "T3".to_string(),
            worker: Some("Flora".to_string()),
            water_worker: None,
            ph: Some(9.0),
            salinity_ppt: None,
            water_temp_c: Some(29.0),
            room_temp_c: None,
            humidity_pct: None,
            scheduled_feed_g: 500.0,
            actual_feed_g: 600.0,
            initial_count: 1000,
            live_count: 950,
            dead_count: 2,
            dead_weight_g: 1.2,
        }
    }

    #[test]
    fn rows_carry_raw_derived_and_status_columns() {
        let policy = RiskPolicy::site_2026_01();
        let rows = build_rows(&[record()], &policy).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.survival_pct, 95.0);
        assert_eq!(row.feed_efficiency_pct, 100.0);
        assert_eq!(row.leftover_feed_g, -100.0);
        assert_eq!(row.ph_status, Some(StatusLabel::Critical));
        assert_eq!(row.salinity_status, None);
        assert_eq!(row.alert_level, Some(AlertLevel::Warning));
        assert!(row.statuses_json.contains("\"ph\":\"critical\""));
    }

    #[test]
    fn csv_serialization_keeps_one_line_per_record() {
        let policy = RiskPolicy::site_2026_01();
        let rows = build_rows(&[record(), record()], &policy).unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &rows {
            writer.serialize(row).unwrap();
        }
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,block,tank"));
        assert!(lines[1].contains("2026-01-12"));
        assert!(lines[1].contains("critical"));
    }

    #[test]
    fn empty_set_exports_cleanly() {
        let policy = RiskPolicy::site_2026_01();
        let rows = build_rows(&[], &policy).unwrap();
        assert!(rows.is_empty());
    }
}
