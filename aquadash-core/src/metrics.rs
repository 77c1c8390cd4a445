//! Per-record KPI derivation: survival, feed efficiency, FCR, growth.
//!
//! Every function here is pure and total. Division edge cases that occur on a
//! live farm (total stock loss, zero-feed days, flat growth) resolve to
//! sentinel values, never to errors.

use aquadash_schemas::policy::{Band, RiskPolicy};
use aquadash_schemas::record::DailyRecord;
use aquadash_schemas::status::GrowthStatus;
use serde::Serialize;

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Share of the initial stock still alive, in percent. Reports 0 for an
/// empty tank (initial count 0) rather than failing.
pub fn survival_pct(live: u32, initial: u32) -> f64 {
    if initial == 0 {
        return 0.0;
    }
    round2(f64::from(live) / f64::from(initial) * 100.0)
}

pub fn mortality_pct(live: u32, initial: u32) -> f64 {
    round2(100.0 - survival_pct(live, initial))
}

/// Feed efficiency with actual capped at scheduled, so overfeeding never
/// scores above 100. A zero-feed schedule reports 0.
pub fn feed_efficiency_pct(actual_g: f64, scheduled_g: f64) -> f64 {
    if scheduled_g <= 0.0 {
        return 0.0;
    }
    round2(actual_g.min(scheduled_g) / scheduled_g * 100.0)
}

/// Scheduled minus actual, deliberately unclamped: a negative leftover is
/// the overfeeding signal.
pub fn leftover_feed_g(scheduled_g: f64, actual_g: f64) -> f64 {
    scheduled_g - actual_g
}

/// Feed conversion ratio. Zero is the sentinel for non-positive weight gain,
/// which is expected during early or volatile growth phases.
pub fn fcr(feed_kg: f64, weight_gain_kg: f64) -> f64 {
    if weight_gain_kg > 0.0 {
        round2(feed_kg / weight_gain_kg)
    } else {
        0.0
    }
}

/// Body-weight gain per day. Same-day ranges count as one day.
pub fn average_daily_gain(gain_g: f64, days_elapsed: i64) -> f64 {
    round3(gain_g / days_elapsed.max(1) as f64)
}

/// Range-rule estimate: the small and large size classes are taken to span
/// about four standard deviations.
pub fn estimated_sd(small_weight_g: f64, large_weight_g: f64) -> f64 {
    (large_weight_g - small_weight_g) / 4.0
}

/// Coefficient of variation in percent; 0 when the end weight is not positive.
pub fn cv_pct(estimated_sd: f64, abw_end_g: f64) -> f64 {
    if abw_end_g > 0.0 {
        estimated_sd / abw_end_g * 100.0
    } else {
        0.0
    }
}

/// A CV above 25% flags uneven growth within a tank. Zero or undefined CV
/// gives no verdict.
pub fn growth_status(cv_pct: f64) -> GrowthStatus {
    if cv_pct.is_nan() || cv_pct == 0.0 {
        GrowthStatus::NoVerdict
    } else if cv_pct > 25.0 {
        GrowthStatus::Uneven
    } else {
        GrowthStatus::Uniform
    }
}

pub fn biomass_kg(count: u32, abw_g: f64) -> f64 {
    round2(f64::from(count) * abw_g / 1000.0)
}

/// Share of non-missing readings inside the ideal band, in percent.
/// Missing readings are excluded from the denominator; no readings at all
/// reports 0.
pub fn compliance_pct(readings: &[Option<f64>], band: &Band) -> f64 {
    let mut total = 0usize;
    let mut within = 0usize;
    for reading in readings.iter().flatten() {
        if reading.is_nan() {
            continue;
        }
        total += 1;
        if band.in_ideal(*reading) {
            within += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    round1(within as f64 / total as f64 * 100.0)
}

/// 100 inside the ideal band, 80 slightly outside, 50 beyond.
pub fn band_score(band: &Band, value: f64) -> f64 {
    if band.in_ideal(value) {
        100.0
    } else if band.in_accept(value) {
        80.0
    } else {
        50.0
    }
}

/// Derived KPI columns for one daily record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub survival_pct: f64,
    pub mortality_pct: f64,
    pub feed_efficiency_pct: f64,
    pub leftover_feed_g: f64,
    pub ph_score: Option<f64>,
    pub salinity_score: Option<f64>,
    pub overall_performance_pct: f64,
}

/// Computes the derived columns for a batch of records.
///
/// Recomputing over already-enriched input reproduces identical values: the
/// derivation reads raw fields only. The overall performance figure averages
/// whichever of the four components exist; water scores for missing readings
/// are left out of the mean instead of being scored as out-of-band.
pub fn enrich(records: &[DailyRecord], policy: &RiskPolicy) -> Vec<DerivedMetrics> {
    records
        .iter()
        .map(|record| {
            let survival = survival_pct(record.live_count, record.initial_count);
            let feed_efficiency =
                feed_efficiency_pct(record.actual_feed_g, record.scheduled_feed_g);
            let ph_score = non_nan(record.ph).map(|v| band_score(&policy.ph_scoring, v));
            let salinity_score =
                non_nan(record.salinity_ppt).map(|v| band_score(&policy.salinity_scoring, v));

            let mut components = vec![survival, feed_efficiency];
            components.extend(ph_score);
            components.extend(salinity_score);
            let overall =
                round2(components.iter().sum::<f64>() / components.len() as f64);

            DerivedMetrics {
                survival_pct: survival,
                mortality_pct: mortality_pct(record.live_count, record.initial_count),
                feed_efficiency_pct: feed_efficiency,
                leftover_feed_g: leftover_feed_g(record.scheduled_feed_g, record.actual_feed_g),
                ph_score,
                salinity_score,
                overall_performance_pct: overall,
            }
        })
        .collect()
}

/// Top-line totals for a filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub records: usize,
    pub scheduled_feed_g: f64,
    pub actual_feed_g: f64,
    pub leftover_feed_g: f64,
    pub dead_count: u64,
    pub dead_weight_g: f64,
    pub mean_survival_pct: f64,
    pub mean_mortality_pct: f64,
}

impl Kpis {
    pub fn scheduled_feed_kg(&self) -> f64 {
        round2(self.scheduled_feed_g / 1000.0)
    }

    pub fn actual_feed_kg(&self) -> f64 {
        round2(self.actual_feed_g / 1000.0)
    }

    pub fn leftover_feed_kg(&self) -> f64 {
        round2(self.leftover_feed_g / 1000.0)
    }
}

/// Sums and means over the filtered set. An empty set yields all-zero totals,
/// which downstream renders as "no data" rather than failing.
pub fn kpis(records: &[DailyRecord]) -> Kpis {
    if records.is_empty() {
        return Kpis::default();
    }
    let mut out = Kpis {
        records: records.len(),
        ..Kpis::default()
    };
    let mut survival_sum = 0.0;
    for record in records {
        out.scheduled_feed_g += record.scheduled_feed_g;
        out.actual_feed_g += record.actual_feed_g;
        out.leftover_feed_g += leftover_feed_g(record.scheduled_feed_g, record.actual_feed_g);
        out.dead_count += u64::from(record.dead_count);
        out.dead_weight_g += record.dead_weight_g;
        survival_sum += survival_pct(record.live_count, record.initial_count);
    }
    out.mean_survival_pct = round2(survival_sum / records.len() as f64);
    out.mean_mortality_pct = round2(100.0 - out.mean_survival_pct);
    out
}

fn non_nan(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquadash_schemas::policy::RiskPolicy;
    use chrono::NaiveDate;

    fn sample_record() -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            block: "H1".to_string(),
            tank: "T3".to_string(),
            worker: Some("Flora".to_string()),
            water_worker: Some("Flora".to_string()),
            ph: Some(7.9),
            salinity_ppt: Some(27.0),
            water_temp_c: Some(29.0),
            room_temp_c: None,
            humidity_pct: None,
            scheduled_feed_g: 500.0,
            actual_feed_g: 480.0,
            initial_count: 1000,
            live_count: 950,
            dead_count: 2,
            dead_weight_g: 1.6,
        }
    }

    #[test]
    fn survival_and_mortality_sum_to_one_hundred() {
        assert_eq!(survival_pct(950, 1000), 95.0);
        assert_eq!(mortality_pct(950, 1000), 5.0);
        for (live, initial) in [(0, 1000), (333, 1000), (1, 3), (999, 1000)] {
            let total = survival_pct(live, initial) + mortality_pct(live, initial);
            assert!((total - 100.0).abs() < 0.01);
        }
    }

    #[test]
    fn empty_tank_reports_zero_survival() {
        assert_eq!(survival_pct(0, 0), 0.0);
    }

    #[test]
    fn overfeeding_caps_efficiency_but_not_leftover() {
        assert_eq!(feed_efficiency_pct(600.0, 500.0), 100.0);
        assert_eq!(leftover_feed_g(500.0, 600.0), -100.0);
    }

    #[test]
    fn feed_efficiency_stays_within_bounds() {
        for (actual, scheduled) in [(0.0, 500.0), (250.0, 500.0), (500.0, 500.0), (900.0, 500.0)] {
            let eff = feed_efficiency_pct(actual, scheduled);
            assert!((0.0..=100.0).contains(&eff));
        }
        assert_eq!(feed_efficiency_pct(100.0, 0.0), 0.0);
    }

    #[test]
    fn fcr_zero_gain_is_a_sentinel() {
        assert_eq!(fcr(10.0, 0.0), 0.0);
        assert_eq!(fcr(10.0, -0.5), 0.0);
        assert_eq!(fcr(10.0, 8.0), 1.25);
    }

    #[test]
    fn adg_clamps_same_day_range_to_one_day() {
        assert_eq!(average_daily_gain(0.7, 0), 0.7);
        assert_eq!(average_daily_gain(0.7, 7), 0.1);
    }

    #[test]
    fn growth_status_thresholds() {
        let sd = estimated_sd(0.4, 1.2);
        assert_eq!(sd, 0.2);
        assert_eq!(growth_status(cv_pct(sd, 0.5)), GrowthStatus::Uneven);
        assert_eq!(growth_status(cv_pct(sd, 1.0)), GrowthStatus::Uniform);
        assert_eq!(growth_status(cv_pct(0.0, 1.0)), GrowthStatus::NoVerdict);
        assert_eq!(growth_status(cv_pct(0.2, 0.0)), GrowthStatus::NoVerdict);
    }

    #[test]
    fn compliance_excludes_missing_readings_from_denominator() {
        let policy = RiskPolicy::site_2026_01();
        let readings = vec![Some(7.8), Some(8.2), None, Some(9.0), None];
        // 2 of 3 present readings inside [7.6, 8.3]
        assert_eq!(compliance_pct(&readings, &policy.ph), 66.7);
        assert_eq!(compliance_pct(&[], &policy.ph), 0.0);
        assert_eq!(compliance_pct(&[None, None], &policy.ph), 0.0);
    }

    #[test]
    fn enrich_is_idempotent_over_raw_fields() {
        let policy = RiskPolicy::site_2026_01();
        let records = vec![sample_record()];
        let first = enrich(&records, &policy);
        let second = enrich(&records, &policy);
        assert_eq!(first, second);
        assert_eq!(first[0].survival_pct, 95.0);
        assert_eq!(first[0].mortality_pct, 5.0);
        assert_eq!(first[0].feed_efficiency_pct, 96.0);
        assert_eq!(first[0].leftover_feed_g, 20.0);
    }

    #[test]
    fn missing_water_scores_drop_out_of_overall_mean() {
        let policy = RiskPolicy::site_2026_01();
        let mut record = sample_record();
        record.ph = None;
        record.salinity_ppt = None;
        let derived = &enrich(&[record], &policy)[0];
        assert_eq!(derived.ph_score, None);
        assert_eq!(derived.salinity_score, None);
        let expected = round2((derived.survival_pct + derived.feed_efficiency_pct) / 2.0);
        assert_eq!(derived.overall_performance_pct, expected);
    }

    #[test]
    fn kpis_over_empty_set_are_zero() {
        let totals = kpis(&[]);
        assert_eq!(totals.records, 0);
        assert_eq!(totals.scheduled_feed_g, 0.0);
        assert_eq!(totals.dead_count, 0);
        assert_eq!(totals.mean_survival_pct, 0.0);
    }

    #[test]
    fn kpi_totals_accumulate() {
        let mut second = sample_record();
        second.tank = "T4".to_string();
        second.actual_feed_g = 520.0;
        second.dead_count = 6;
        let totals = kpis(&[sample_record(), second]);
        assert_eq!(totals.records, 2);
        assert_eq!(totals.scheduled_feed_g, 1000.0);
        assert_eq!(totals.actual_feed_g, 1000.0);
        assert_eq!(totals.leftover_feed_g, 0.0);
        assert_eq!(totals.dead_count, 8);
        assert_eq!(totals.actual_feed_kg(), 1.0);
    }
}
