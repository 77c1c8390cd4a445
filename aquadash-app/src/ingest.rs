//! Spreadsheet ingest: column mapping, schema validation, row parsing.
//!
//! The daily log arrives as a CSV export of the consolidated tank/block
//! report. Headers are renamed to canonical names through the column mapping;
//! a file that fails to supply every required canonical column aborts before
//! any metric is computed, listing all missing names at once.
//!
//! Missing sensor cells parse to `None` and stay that way. Feed, dead-count
//! and dead-weight cells default to zero, matching how the field crews leave
//! uneventful cells blank.

use anyhow::{Context, Result};
use aquadash_core::error::AquadashError;
use aquadash_schemas::mapping::{canonical, ColumnMapping};
use aquadash_schemas::record::{DailyRecord, GrowthSample};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Result of loading one daily-log file.
#[derive(Debug)]
pub struct LoadedLog {
    pub records: Vec<DailyRecord>,
    /// Rows discarded because the date cell would not parse.
    pub dropped_rows: usize,
}

pub fn load_daily_log(path: &Path, mapping: &ColumnMapping) -> Result<LoadedLog> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open daily log '{}'", path.display()))?;
    parse_daily_log(file, mapping)
        .with_context(|| format!("failed to read daily log '{}'", path.display()))
}

pub fn parse_daily_log(reader: impl io::Read, mapping: &ColumnMapping) -> Result<LoadedLog> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let missing = mapping.missing_columns(&headers);
    if !missing.is_empty() {
        return Err(AquadashError::MissingColumns(missing).into());
    }

    let index = header_index(&headers, mapping);
    let mut records = Vec::new();
    let mut dropped_rows = 0usize;

    for row in csv_reader.records() {
        let row = row?;
        let cell = |name: &str| index.get(name).and_then(|i| row.get(*i)).unwrap_or("");

        let Some(date) = parse_date(cell(canonical::DATE)) else {
            dropped_rows += 1;
            continue;
        };

        records.push(DailyRecord {
            date,
            block: cell(canonical::BLOCK).trim().to_uppercase(),
            tank: cell(canonical::TANK).trim().to_uppercase(),
            worker: parse_opt_string(cell(canonical::WORKER)),
            water_worker: parse_opt_string(cell(canonical::WATER_WORKER)),
            ph: parse_opt_f64(cell(canonical::PH)),
            salinity_ppt: parse_opt_f64(cell(canonical::SALINITY)),
            water_temp_c: parse_opt_f64(cell(canonical::WATER_TEMP)),
            room_temp_c: parse_opt_f64(cell(canonical::ROOM_TEMP)),
            humidity_pct: parse_opt_f64(cell(canonical::HUMIDITY)),
            scheduled_feed_g: parse_f64_or_zero(cell(canonical::SCHEDULED_FEED_G)),
            actual_feed_g: parse_f64_or_zero(cell(canonical::ACTUAL_FEED_G)),
            initial_count: parse_u32_or_zero(cell(canonical::INITIAL_COUNT)),
            live_count: parse_u32_or_zero(cell(canonical::LIVE_COUNT)),
            dead_count: parse_u32_or_zero(cell(canonical::DEAD_COUNT)),
            dead_weight_g: parse_f64_or_zero(cell(canonical::DEAD_WEIGHT_G)),
        });
    }

    Ok(LoadedLog {
        records,
        dropped_rows,
    })
}

pub fn load_growth_log(path: &Path) -> Result<Vec<GrowthSample>> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open growth log '{}'", path.display()))?;
    parse_growth_log(file).with_context(|| format!("failed to read growth log '{}'", path.display()))
}

/// The ABW survey file keeps its own small layout: Date, Block, Tank,
/// Avg Weight and the optional S/M/L size-class weights. Weight cells come in
/// hand-typed ("0.51g", "no shrimp"), so they are cleaned before parsing.
pub fn parse_growth_log(reader: impl io::Read) -> Result<Vec<GrowthSample>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let date_idx = find("Date").context("growth log is missing a 'Date' column")?;
    let block_idx = find("Block").context("growth log is missing a 'Block' column")?;
    let tank_idx = find("Tank").context("growth log is missing a 'Tank' column")?;
    let avg_idx = find("Avg Weight").context("growth log is missing an 'Avg Weight' column")?;
    let small_idx = find("S-Weight");
    let medium_idx = find("M-Weight");
    let large_idx = find("L-Weight");

    let mut samples = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let cell = |i: usize| row.get(i).unwrap_or("");
        let opt_cell = |i: Option<usize>| i.map(|i| cell(i)).unwrap_or("");

        let Some(date) = parse_date(cell(date_idx)) else {
            continue;
        };
        samples.push(GrowthSample {
            date,
            block: cell(block_idx).trim().to_uppercase(),
            tank: cell(tank_idx).trim().to_uppercase(),
            avg_weight_g: parse_weight(cell(avg_idx)),
            small_weight_g: parse_weight(opt_cell(small_idx)),
            medium_weight_g: parse_weight(opt_cell(medium_idx)),
            large_weight_g: parse_weight(opt_cell(large_idx)),
        });
    }
    Ok(samples)
}

/// View selection shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub block: Option<String>,
    pub tank: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Filter {
    pub fn apply(&self, records: &[DailyRecord]) -> Vec<DailyRecord> {
        records
            .iter()
            .filter(|r| {
                self.block
                    .as_deref()
                    .map_or(true, |b| r.block.eq_ignore_ascii_case(b))
                    && self
                        .tank
                        .as_deref()
                        .map_or(true, |t| r.tank.eq_ignore_ascii_case(t))
                    && self.from.map_or(true, |from| r.date >= from)
                    && self.to.map_or(true, |to| r.date <= to)
            })
            .cloned()
            .collect()
    }

    pub fn scope_label(&self) -> String {
        match (&self.block, &self.tank) {
            (Some(block), Some(tank)) => format!("block {block}, tank {tank}"),
            (Some(block), None) => format!("block {block}"),
            (None, Some(tank)) => format!("tank {tank}"),
            (None, None) => "all blocks and tanks".to_string(),
        }
    }
}

fn header_index(headers: &[String], mapping: &ColumnMapping) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(i, header)| {
            mapping
                .canonical_for(header)
                .map(|canonical| (canonical.to_string(), i))
        })
        .collect()
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(cell, format) {
            return Some(date);
        }
    }
    None
}

fn parse_opt_string(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

fn parse_opt_f64(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn parse_f64_or_zero(cell: &str) -> f64 {
    parse_opt_f64(cell).unwrap_or(0.0)
}

fn parse_u32_or_zero(cell: &str) -> u32 {
    let cell = cell.trim();
    cell.parse::<u32>()
        .ok()
        .or_else(|| cell.parse::<f64>().ok().map(|v| v.max(0.0).round() as u32))
        .unwrap_or(0)
}

/// Cleans one hand-typed weight cell. A trailing unit is dropped; "no shrimp"
/// means there was nothing to weigh, which is missing data, not a weight of
/// zero.
fn parse_weight(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("no shrimp") {
        return None;
    }
    let cell = cell.strip_suffix(['g', 'G']).unwrap_or(cell).trim();
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}
