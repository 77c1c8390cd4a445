//! Calendar bucketing and grouped summaries.
//!
//! Aggregation rules follow the nature of each column: masses and counts are
//! summed, intensities (sensor readings and percentages) are averaged with
//! missing readings left out of the denominator. Summaries are recomputed
//! from the filtered record set on every request and never persisted.

use crate::metrics::{self, round2};
use aquadash_schemas::policy::RiskPolicy;
use aquadash_schemas::record::DailyRecord;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewGranularity {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for ViewGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(ViewGranularity::Daily),
            "weekly" => Ok(ViewGranularity::Weekly),
            "monthly" => Ok(ViewGranularity::Monthly),
            other => Err(format!(
                "unknown view '{other}', expected daily, weekly or monthly"
            )),
        }
    }
}

/// Monday of the calendar week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Human-readable bucket label; labels sort chronologically as strings.
pub fn bucket_label(granularity: ViewGranularity, date: NaiveDate) -> String {
    match granularity {
        ViewGranularity::Daily => date.format("%Y-%m-%d").to_string(),
        ViewGranularity::Weekly => {
            let start = week_start(date);
            let end = start + Duration::days(6);
            format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
        }
        ViewGranularity::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// Aggregation of daily records over (bucket, block, tank).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub bucket: String,
    pub block: String,
    pub tank: String,
    pub records: usize,
    pub scheduled_feed_g: f64,
    pub actual_feed_g: f64,
    pub leftover_feed_g: f64,
    pub dead_count: u64,
    pub dead_weight_g: f64,
    pub mean_ph: Option<f64>,
    pub mean_salinity_ppt: Option<f64>,
    pub mean_water_temp_c: Option<f64>,
    pub mean_survival_pct: f64,
    pub mean_mortality_pct: f64,
    pub mean_feed_efficiency_pct: f64,
    pub workers: Vec<String>,
}

#[derive(Default)]
pub(crate) struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    pub(crate) fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn push_opt(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            self.push(v);
        }
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(round2(self.sum / self.count as f64))
        }
    }
}

#[derive(Default)]
struct GroupAcc {
    records: usize,
    scheduled_feed_g: f64,
    actual_feed_g: f64,
    dead_count: u64,
    dead_weight_g: f64,
    ph: MeanAcc,
    salinity: MeanAcc,
    water_temp: MeanAcc,
    survival: MeanAcc,
    feed_efficiency: MeanAcc,
    workers: BTreeSet<String>,
}

/// Groups the filtered set by (calendar bucket, block, tank).
///
/// Output order is deterministic: ascending by bucket, block, tank. An empty
/// input produces an empty vector.
pub fn summarize(records: &[DailyRecord], granularity: ViewGranularity) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<(String, String, String), GroupAcc> = BTreeMap::new();

    for record in records {
        let key = (
            bucket_label(granularity, record.date),
            record.block.clone(),
            record.tank.clone(),
        );
        let acc = groups.entry(key).or_default();
        acc.records += 1;
        acc.scheduled_feed_g += record.scheduled_feed_g;
        acc.actual_feed_g += record.actual_feed_g;
        acc.dead_count += u64::from(record.dead_count);
        acc.dead_weight_g += record.dead_weight_g;
        acc.ph.push_opt(record.ph);
        acc.salinity.push_opt(record.salinity_ppt);
        acc.water_temp.push_opt(record.water_temp_c);
        acc.survival
            .push(metrics::survival_pct(record.live_count, record.initial_count));
        acc.feed_efficiency.push(metrics::feed_efficiency_pct(
            record.actual_feed_g,
            record.scheduled_feed_g,
        ));
        for worker in [&record.worker, &record.water_worker].into_iter().flatten() {
            acc.workers.insert(worker.clone());
        }
    }

    groups
        .into_iter()
        .map(|((bucket, block, tank), acc)| {
            let mean_survival = acc.survival.mean().unwrap_or(0.0);
            GroupSummary {
                bucket,
                block,
                tank,
                records: acc.records,
                scheduled_feed_g: acc.scheduled_feed_g,
                actual_feed_g: acc.actual_feed_g,
                leftover_feed_g: acc.scheduled_feed_g - acc.actual_feed_g,
                dead_count: acc.dead_count,
                dead_weight_g: acc.dead_weight_g,
                mean_ph: acc.ph.mean(),
                mean_salinity_ppt: acc.salinity.mean(),
                mean_water_temp_c: acc.water_temp.mean(),
                mean_survival_pct: mean_survival,
                mean_mortality_pct: round2(100.0 - mean_survival),
                mean_feed_efficiency_pct: acc.feed_efficiency.mean().unwrap_or(0.0),
                workers: acc.workers.into_iter().collect(),
            }
        })
        .collect()
}

/// Per-worker feed handling and water-quality compliance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub worker: String,
    pub records: usize,
    pub ph_compliance_pct: f64,
    pub salinity_compliance_pct: f64,
    pub scheduled_feed_kg: f64,
    pub actual_feed_kg: f64,
    pub leftover_feed_kg: f64,
    pub dead_count: u64,
    pub dead_weight_g: f64,
}

/// Rolls the filtered set up by feeding worker. Records without a worker name
/// group under "Unknown". Compliance uses the policy's ideal bands; records
/// with a missing reading do not count against the worker.
pub fn worker_summaries(records: &[DailyRecord], policy: &RiskPolicy) -> Vec<WorkerSummary> {
    let mut by_worker: BTreeMap<String, Vec<&DailyRecord>> = BTreeMap::new();
    for record in records {
        let name = record
            .worker
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        by_worker.entry(name).or_default().push(record);
    }

    by_worker
        .into_iter()
        .map(|(worker, rows)| {
            let ph_readings: Vec<Option<f64>> = rows.iter().map(|r| r.ph).collect();
            let salinity_readings: Vec<Option<f64>> =
                rows.iter().map(|r| r.salinity_ppt).collect();
            let scheduled: f64 = rows.iter().map(|r| r.scheduled_feed_g).sum();
            let actual: f64 = rows.iter().map(|r| r.actual_feed_g).sum();
            WorkerSummary {
                worker,
                records: rows.len(),
                ph_compliance_pct: metrics::compliance_pct(&ph_readings, &policy.ph),
                salinity_compliance_pct: metrics::compliance_pct(
                    &salinity_readings,
                    &policy.salinity,
                ),
                scheduled_feed_kg: round2(scheduled / 1000.0),
                actual_feed_kg: round2(actual / 1000.0),
                leftover_feed_kg: round2((scheduled - actual) / 1000.0),
                dead_count: rows.iter().map(|r| u64::from(r.dead_count)).sum(),
                dead_weight_g: rows.iter().map(|r| r.dead_weight_g).sum(),
            }
        })
        .collect()
}
