//! Tank, worker and farm scorecards over a reporting period.
//!
//! Joins the daily logs with the ABW survey samples to derive biomass gain,
//! ADG, FCR and growth uniformity per tank, then rolls the tanks up to
//! workers and to one consolidated farm row compared against the production
//! targets.

use crate::aggregate::MeanAcc;
use crate::metrics::{self, round2, round3};
use aquadash_schemas::policy::RiskPolicy;
use aquadash_schemas::record::{DailyRecord, GrowthSample};
use aquadash_schemas::status::GrowthStatus;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const TARGET_SURVIVAL_MIN_PCT: f64 = 95.0;
pub const TARGET_FCR_MAX: f64 = 1.0;

/// Stage-dependent ABW target for a crop of the given age.
pub fn target_weight_g(days_elapsed: i64) -> f64 {
    if days_elapsed <= 30 {
        2.0
    } else if days_elapsed <= 60 {
        8.0
    } else {
        15.0
    }
}

/// Site staffing map: block prefix decides the responsible worker.
pub fn assign_worker(block: &str) -> &'static str {
    match block.trim().to_ascii_uppercase().chars().next() {
        Some('H' | 'I' | 'J') => "Flora",
        Some('E' | 'F' | 'G') => "Jimmy",
        _ => "Other",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankScorecard {
    pub block: String,
    pub tank: String,
    pub worker: &'static str,
    pub abw_start_g: Option<f64>,
    pub abw_end_g: Option<f64>,
    pub period_gain_g: Option<f64>,
    pub cv_pct: Option<f64>,
    pub growth_status: GrowthStatus,
    pub initial_count: u32,
    pub live_count: u32,
    pub dead_count: u32,
    pub feed_kg: f64,
    pub dead_weight_g: f64,
    pub biomass_start_kg: Option<f64>,
    pub biomass_end_kg: Option<f64>,
    pub weight_gain_kg: Option<f64>,
    pub adg_g_per_day: Option<f64>,
    pub survival_pct: f64,
    pub fcr: Option<f64>,
    pub mean_ph: Option<f64>,
    pub mean_salinity_ppt: Option<f64>,
}

/// Consolidated farm row plus target comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmScorecard {
    pub days_elapsed: i64,
    pub mean_abw_start_g: Option<f64>,
    pub mean_abw_end_g: Option<f64>,
    pub initial_count: u64,
    pub live_count: u64,
    pub dead_count: u64,
    pub feed_kg: f64,
    pub dead_weight_g: f64,
    pub biomass_start_kg: f64,
    pub biomass_end_kg: f64,
    pub weight_gain_kg: f64,
    pub mean_adg_g_per_day: Option<f64>,
    pub mean_survival_pct: f64,
    /// Overall rate: summed feed over summed gain, not a mean of tank FCRs.
    pub fcr: f64,
    pub mean_ph: Option<f64>,
    pub mean_salinity_ppt: Option<f64>,
    pub targets: Vec<TargetRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRow {
    pub metric: String,
    pub actual: Option<f64>,
    pub target: String,
    pub met: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerScorecard {
    pub worker: &'static str,
    pub tanks: usize,
    pub mean_abw_end_g: Option<f64>,
    pub initial_count: u64,
    pub live_count: u64,
    pub dead_count: u64,
    pub feed_kg: f64,
    pub weight_gain_kg: f64,
    pub mean_survival_pct: f64,
    pub fcr: f64,
    pub mean_ph: Option<f64>,
    pub mean_salinity_ppt: Option<f64>,
}

struct GrowthWindow {
    abw_start: Option<f64>,
    abw_end: Option<f64>,
    cv_pct: Option<f64>,
}

/// First and last usable average weights per tank within the window, plus the
/// CV of the latest sample that carries size-class weights.
fn growth_windows(
    samples: &[GrowthSample],
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<(String, String), GrowthWindow> {
    let mut by_tank: BTreeMap<(String, String), Vec<&GrowthSample>> = BTreeMap::new();
    for sample in samples {
        if sample.date < from || sample.date > to {
            continue;
        }
        by_tank
            .entry((sample.block.clone(), sample.tank.clone()))
            .or_default()
            .push(sample);
    }

    by_tank
        .into_iter()
        .map(|(key, mut rows)| {
            rows.sort_by_key(|s| s.date);
            let abw_start = rows.iter().find_map(|s| s.avg_weight_g);
            let abw_end = rows.iter().rev().find_map(|s| s.avg_weight_g);
            let cv_pct = rows.iter().rev().find_map(|s| {
                let small = s.small_weight_g?;
                let large = s.large_weight_g?;
                let end = s.avg_weight_g?;
                if end <= 0.0 {
                    return None;
                }
                Some(round2(metrics::cv_pct(
                    metrics::estimated_sd(small, large),
                    end,
                )))
            });
            (
                key,
                GrowthWindow {
                    abw_start,
                    abw_end,
                    cv_pct,
                },
            )
        })
        .collect()
}

/// Builds one scorecard per (block, tank) over the inclusive date range.
pub fn tank_scorecards(
    daily: &[DailyRecord],
    growth: &[GrowthSample],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<TankScorecard> {
    let days_elapsed = (to - from).num_days().max(1);
    let windows = growth_windows(growth, from, to);

    let mut by_tank: BTreeMap<(String, String), Vec<&DailyRecord>> = BTreeMap::new();
    for record in daily {
        if record.date < from || record.date > to {
            continue;
        }
        by_tank
            .entry((record.block.clone(), record.tank.clone()))
            .or_default()
            .push(record);
    }

    by_tank
        .into_iter()
        .map(|((block, tank), mut rows)| {
            rows.sort_by_key(|r| r.date);
            let initial_count = rows.first().map_or(0, |r| r.initial_count);
            let live_count = rows.last().map_or(0, |r| r.live_count);
            let feed_g: f64 = rows.iter().map(|r| r.actual_feed_g).sum();
            let feed_kg = round2(feed_g / 1000.0);
            let dead_weight_g: f64 = rows.iter().map(|r| r.dead_weight_g).sum();
            let mut ph = MeanAcc::default();
            let mut salinity = MeanAcc::default();
            for row in &rows {
                ph.push_opt(row.ph);
                salinity.push_opt(row.salinity_ppt);
            }

            let window = windows.get(&(block.clone(), tank.clone()));
            let abw_start = window.and_then(|w| w.abw_start);
            let abw_end = window.and_then(|w| w.abw_end);
            let cv = window.and_then(|w| w.cv_pct);

            let biomass_start_kg = abw_start.map(|w| metrics::biomass_kg(initial_count, w));
            let biomass_end_kg = abw_end.map(|w| metrics::biomass_kg(live_count, w));
            let weight_gain_kg = match (biomass_start_kg, biomass_end_kg) {
                (Some(start), Some(end)) => Some(round2(end - start)),
                _ => None,
            };
            let period_gain_g = match (abw_start, abw_end) {
                (Some(start), Some(end)) => Some(round3(end - start)),
                _ => None,
            };

            TankScorecard {
                worker: assign_worker(&block),
                abw_start_g: abw_start,
                abw_end_g: abw_end,
                period_gain_g,
                cv_pct: cv,
                growth_status: cv.map_or(GrowthStatus::NoVerdict, metrics::growth_status),
                initial_count,
                live_count,
                dead_count: initial_count.saturating_sub(live_count),
                feed_kg,
                dead_weight_g,
                biomass_start_kg,
                biomass_end_kg,
                weight_gain_kg,
                adg_g_per_day: period_gain_g
                    .map(|gain| metrics::average_daily_gain(gain, days_elapsed)),
                survival_pct: metrics::survival_pct(live_count, initial_count),
                fcr: weight_gain_kg.map(|gain| metrics::fcr(feed_kg, gain)),
                mean_ph: ph.mean(),
                mean_salinity_ppt: salinity.mean(),
                block,
                tank,
            }
        })
        .collect()
}

/// Consolidates tank scorecards into one farm row and compares it against the
/// production targets under the given policy.
pub fn farm_scorecard(
    tanks: &[TankScorecard],
    days_elapsed: i64,
    policy: &RiskPolicy,
) -> FarmScorecard {
    let days_elapsed = days_elapsed.max(1);
    let mut abw_start = MeanAcc::default();
    let mut abw_end = MeanAcc::default();
    let mut adg = MeanAcc::default();
    let mut survival = MeanAcc::default();
    let mut ph = MeanAcc::default();
    let mut salinity = MeanAcc::default();
    let mut totals = FarmScorecard {
        days_elapsed,
        mean_abw_start_g: None,
        mean_abw_end_g: None,
        initial_count: 0,
        live_count: 0,
        dead_count: 0,
        feed_kg: 0.0,
        dead_weight_g: 0.0,
        biomass_start_kg: 0.0,
        biomass_end_kg: 0.0,
        weight_gain_kg: 0.0,
        mean_adg_g_per_day: None,
        mean_survival_pct: 0.0,
        fcr: 0.0,
        mean_ph: None,
        mean_salinity_ppt: None,
        targets: Vec::new(),
    };

    for tank in tanks {
        totals.initial_count += u64::from(tank.initial_count);
        totals.live_count += u64::from(tank.live_count);
        totals.dead_count += u64::from(tank.dead_count);
        totals.feed_kg += tank.feed_kg;
        totals.dead_weight_g += tank.dead_weight_g;
        totals.biomass_start_kg += tank.biomass_start_kg.unwrap_or(0.0);
        totals.biomass_end_kg += tank.biomass_end_kg.unwrap_or(0.0);
        totals.weight_gain_kg += tank.weight_gain_kg.unwrap_or(0.0);
        abw_start.push_opt(tank.abw_start_g);
        abw_end.push_opt(tank.abw_end_g);
        adg.push_opt(tank.adg_g_per_day);
        survival.push(tank.survival_pct);
        ph.push_opt(tank.mean_ph);
        salinity.push_opt(tank.mean_salinity_ppt);
    }

    totals.feed_kg = round2(totals.feed_kg);
    totals.biomass_start_kg = round2(totals.biomass_start_kg);
    totals.biomass_end_kg = round2(totals.biomass_end_kg);
    totals.weight_gain_kg = round2(totals.weight_gain_kg);
    totals.mean_abw_start_g = abw_start.mean();
    totals.mean_abw_end_g = abw_end.mean();
    totals.mean_adg_g_per_day = adg.mean();
    totals.mean_survival_pct = survival.mean().unwrap_or(0.0);
    totals.fcr = metrics::fcr(totals.feed_kg, totals.weight_gain_kg);
    totals.mean_ph = ph.mean();
    totals.mean_salinity_ppt = salinity.mean();
    totals.targets = target_rows(&totals, policy);
    totals
}

fn target_rows(farm: &FarmScorecard, policy: &RiskPolicy) -> Vec<TargetRow> {
    let abw_target = target_weight_g(farm.days_elapsed);
    vec![
        TargetRow {
            metric: "ABW end (g)".to_string(),
            actual: farm.mean_abw_end_g,
            target: format!(">= {abw_target}"),
            met: farm.mean_abw_end_g.map(|abw| abw >= abw_target),
        },
        TargetRow {
            metric: "Survival %".to_string(),
            actual: Some(farm.mean_survival_pct),
            target: format!(">= {TARGET_SURVIVAL_MIN_PCT}"),
            met: Some(farm.mean_survival_pct >= TARGET_SURVIVAL_MIN_PCT),
        },
        TargetRow {
            metric: "FCR".to_string(),
            actual: Some(farm.fcr),
            target: format!("<= {TARGET_FCR_MAX}"),
            met: Some(farm.fcr <= TARGET_FCR_MAX),
        },
        TargetRow {
            metric: "Avg pH".to_string(),
            actual: farm.mean_ph,
            target: format!("{} - {}", policy.ph.ideal_min, policy.ph.ideal_max),
            met: farm.mean_ph.map(|v| policy.ph.in_ideal(v)),
        },
        TargetRow {
            metric: "Avg Salinity (ppt)".to_string(),
            actual: farm.mean_salinity_ppt,
            target: format!(
                "{} - {}",
                policy.salinity.ideal_min, policy.salinity.ideal_max
            ),
            met: farm.mean_salinity_ppt.map(|v| policy.salinity.in_ideal(v)),
        },
    ]
}

/// Rolls tank scorecards up to the responsible workers.
pub fn worker_scorecards(tanks: &[TankScorecard]) -> Vec<WorkerScorecard> {
    let mut by_worker: BTreeMap<&'static str, Vec<&TankScorecard>> = BTreeMap::new();
    for tank in tanks {
        by_worker.entry(tank.worker).or_default().push(tank);
    }

    by_worker
        .into_iter()
        .map(|(worker, rows)| {
            let mut abw_end = MeanAcc::default();
            let mut survival = MeanAcc::default();
            let mut ph = MeanAcc::default();
            let mut salinity = MeanAcc::default();
            let mut feed_kg = 0.0;
            let mut gain_kg = 0.0;
            let mut initial = 0u64;
            let mut live = 0u64;
            let mut dead = 0u64;
            for tank in &rows {
                abw_end.push_opt(tank.abw_end_g);
                survival.push(tank.survival_pct);
                ph.push_opt(tank.mean_ph);
                salinity.push_opt(tank.mean_salinity_ppt);
                feed_kg += tank.feed_kg;
                gain_kg += tank.weight_gain_kg.unwrap_or(0.0);
                initial += u64::from(tank.initial_count);
                live += u64::from(tank.live_count);
                dead += u64::from(tank.dead_count);
            }
            WorkerScorecard {
                worker,
                tanks: rows.len(),
                mean_abw_end_g: abw_end.mean(),
                initial_count: initial,
                live_count: live,
                dead_count: dead,
                feed_kg: round2(feed_kg),
                weight_gain_kg: round2(gain_kg),
                mean_survival_pct: survival.mean().unwrap_or(0.0),
                fcr: metrics::fcr(round2(feed_kg), round2(gain_kg)),
                mean_ph: ph.mean(),
                mean_salinity_ppt: salinity.mean(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn daily(date: NaiveDate, block: &str, tank: &str, live: u32, feed_g: f64) -> DailyRecord {
        DailyRecord {
            date,
            block: block.to_string(),
            tank: tank.to_string(),
            worker: None,
            water_worker: None,
            ph: Some(7.9),
            salinity_ppt: Some(27.0),
            water_temp_c: Some(29.0),
            room_temp_c: None,
            humidity_pct: None,
            scheduled_feed_g: feed_g,
            actual_feed_g: feed_g,
            initial_count: 1000,
            live_count: live,
            dead_count: 0,
            dead_weight_g: 0.0,
        }
    }

    fn sample(date: NaiveDate, block: &str, tank: &str, avg: f64) -> GrowthSample {
        GrowthSample {
            date,
            block: block.to_string(),
            tank: tank.to_string(),
            avg_weight_g: Some(avg),
            small_weight_g: None,
            medium_weight_g: None,
            large_weight_g: None,
        }
    }

    #[test]
    fn worker_assignment_follows_block_prefix() {
        assert_eq!(assign_worker("H1"), "Flora");
        assert_eq!(assign_worker("j4"), "Flora");
        assert_eq!(assign_worker("E2"), "Jimmy");
        assert_eq!(assign_worker("K7"), "Other");
        assert_eq!(assign_worker(""), "Other");
    }

    #[test]
    fn target_weight_follows_crop_age() {
        assert_eq!(target_weight_g(20), 2.0);
        assert_eq!(target_weight_g(45), 8.0);
        assert_eq!(target_weight_g(90), 15.0);
    }

    #[test]
    fn scorecard_joins_daily_logs_with_growth_samples() {
        let daily_rows = vec![
            daily(day(5), "H1", "T3", 980, 3000.0),
            daily(day(12), "H1", "T3", 950, 4000.0),
        ];
        let samples = vec![
            sample(day(5), "H1", "T3", 5.0),
            sample(day(12), "H1", "T3", 12.0),
        ];
        let cards = tank_scorecards(&daily_rows, &samples, day(5), day(12));
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.worker, "Flora");
        assert_eq!(card.abw_start_g, Some(5.0));
        assert_eq!(card.abw_end_g, Some(12.0));
        assert_eq!(card.feed_kg, 7.0);
        // biomass: 1000 * 5g = 5 kg -> 950 * 12g = 11.4 kg, gain 6.4 kg
        assert_eq!(card.biomass_start_kg, Some(5.0));
        assert_eq!(card.biomass_end_kg, Some(11.4));
        assert_eq!(card.weight_gain_kg, Some(6.4));
        // 7 g gain over 7 days
        assert_eq!(card.adg_g_per_day, Some(1.0));
        assert_eq!(card.survival_pct, 95.0);
        assert_eq!(card.fcr, Some(1.09));
        assert_eq!(card.dead_count, 50);
    }

    #[test]
    fn tank_without_samples_has_no_growth_figures() {
        let daily_rows = vec![daily(day(5), "E1", "T4", 990, 2000.0)];
        let cards = tank_scorecards(&daily_rows, &[], day(5), day(12));
        let card = &cards[0];
        assert_eq!(card.abw_start_g, None);
        assert_eq!(card.weight_gain_kg, None);
        assert_eq!(card.fcr, None);
        assert_eq!(card.growth_status, GrowthStatus::NoVerdict);
        // daily-log figures still come through
        assert_eq!(card.feed_kg, 2.0);
        assert_eq!(card.survival_pct, 99.0);
    }

    #[test]
    fn cv_comes_from_latest_sample_with_size_classes() {
        let mut early = sample(day(5), "H1", "T3", 5.0);
        early.small_weight_g = Some(2.0);
        early.large_weight_g = Some(10.0);
        let late = sample(day(12), "H1", "T3", 10.0);
        let daily_rows = vec![daily(day(5), "H1", "T3", 1000, 1000.0)];
        let cards = tank_scorecards(&daily_rows, &[early, late], day(5), day(12));
        // est sd = (10 - 2) / 4 = 2, over the early sample's own abw 5 -> 40%
        assert_eq!(cards[0].cv_pct, Some(40.0));
        assert_eq!(cards[0].growth_status, GrowthStatus::Uneven);
    }

    #[test]
    fn farm_fcr_uses_summed_feed_over_summed_gain() {
        let daily_rows = vec![
            daily(day(5), "H1", "T3", 1000, 4000.0),
            daily(day(5), "E1", "T4", 1000, 6000.0),
        ];
        let samples = vec![
            sample(day(5), "H1", "T3", 2.0),
            sample(day(12), "H1", "T3", 6.0),
            sample(day(5), "E1", "T4", 2.0),
            sample(day(12), "E1", "T4", 4.0),
        ];
        let cards = tank_scorecards(&daily_rows, &samples, day(5), day(12));
        let farm = farm_scorecard(&cards, 7, &RiskPolicy::site_2026_01());
        // gains: 4 kg and 2 kg; feed: 4 kg and 6 kg -> 10 / 6
        assert_eq!(farm.weight_gain_kg, 6.0);
        assert_eq!(farm.fcr, 1.67);
        assert_eq!(farm.initial_count, 2000);
        let fcr_row = farm
            .targets
            .iter()
            .find(|row| row.metric == "FCR")
            .unwrap();
        assert_eq!(fcr_row.met, Some(false));
    }

    #[test]
    fn empty_period_scores_to_empty_and_zero() {
        let cards = tank_scorecards(&[], &[], day(5), day(12));
        assert!(cards.is_empty());
        let farm = farm_scorecard(&cards, 7, &RiskPolicy::site_2026_01());
        assert_eq!(farm.fcr, 0.0);
        assert_eq!(farm.mean_abw_end_g, None);
        assert!(worker_scorecards(&cards).is_empty());
    }

    #[test]
    fn worker_rollup_groups_tanks_by_staffing_map() {
        let daily_rows = vec![
            daily(day(5), "H1", "T3", 1000, 1000.0),
            daily(day(5), "H2", "T4", 1000, 1000.0),
            daily(day(5), "E1", "T5", 1000, 1000.0),
        ];
        let cards = tank_scorecards(&daily_rows, &[], day(5), day(12));
        let workers = worker_scorecards(&cards);
        assert_eq!(workers.len(), 2);
        let flora = workers.iter().find(|w| w.worker == "Flora").unwrap();
        assert_eq!(flora.tanks, 2);
        assert_eq!(flora.initial_count, 2000);
    }
}
