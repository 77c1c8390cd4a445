//! Risk classification: fixed three-band thresholds per parameter, composed
//! into a row-level alert.

use aquadash_schemas::policy::{Band, CountBand, RiskPolicy};
use aquadash_schemas::record::DailyRecord;
use aquadash_schemas::status::{AlertLevel, RiskColor, StatusLabel};
use serde::Serialize;

/// The classifiable parameters of a daily record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Salinity,
    WaterTemp,
    Mortality,
}

fn classify_band(band: &Band, value: f64) -> StatusLabel {
    if band.in_ideal(value) {
        StatusLabel::Normal
    } else if band.in_accept(value) {
        StatusLabel::Warning
    } else {
        StatusLabel::Critical
    }
}

fn classify_count(band: &CountBand, count: u32) -> StatusLabel {
    if count <= band.warn_above {
        StatusLabel::Normal
    } else if count <= band.critical_above {
        StatusLabel::Warning
    } else {
        StatusLabel::Critical
    }
}

/// Maps a raw value to exactly one label under the given policy. Total over
/// the reals; band edges are inclusive on the Normal side. NaN is not a
/// reading and must be routed through [`classify_reading`].
pub fn classify(policy: &RiskPolicy, parameter: Parameter, value: f64) -> StatusLabel {
    match parameter {
        Parameter::Ph => classify_band(&policy.ph, value),
        Parameter::Salinity => classify_band(&policy.salinity, value),
        Parameter::WaterTemp => classify_band(&policy.water_temp, value),
        // Dead counts arrive as whole animals; fractional values classify
        // like the next whole count above them.
        Parameter::Mortality => classify_count(&policy.mortality, value.ceil().max(0.0) as u32),
    }
}

/// Classification for an optional sensor reading. Absent and NaN readings
/// produce no label: the record drops out of this parameter's classification
/// instead of being scored against a fabricated value.
pub fn classify_reading(
    policy: &RiskPolicy,
    parameter: Parameter,
    reading: Option<f64>,
) -> Option<StatusLabel> {
    let value = reading.filter(|v| !v.is_nan())?;
    Some(classify(policy, parameter, value))
}

/// Counting composition rule: a single out-of-band parameter is tolerated as
/// a warning; only simultaneous multi-parameter stress escalates.
/// 0 non-Normal -> Normal, 1-2 -> Warning, 3+ -> Critical.
pub fn compose_alert(labels: &[StatusLabel]) -> AlertLevel {
    let flagged = labels.iter().filter(|l| !l.is_normal()).count();
    match flagged {
        0 => AlertLevel::Normal,
        1 | 2 => AlertLevel::Warning,
        _ => AlertLevel::Critical,
    }
}

pub fn risk_color(status: StatusLabel) -> RiskColor {
    match status {
        StatusLabel::Normal => RiskColor::Green,
        StatusLabel::Warning => RiskColor::Orange,
        StatusLabel::Critical => RiskColor::Red,
    }
}

pub fn alert_color(alert: AlertLevel) -> RiskColor {
    match alert {
        AlertLevel::Normal => RiskColor::Green,
        AlertLevel::Warning => RiskColor::Orange,
        AlertLevel::Critical => RiskColor::Red,
    }
}

/// Per-parameter labels and the composed alert for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowAssessment {
    pub ph: Option<StatusLabel>,
    pub salinity: Option<StatusLabel>,
    pub water_temp: Option<StatusLabel>,
    pub mortality: StatusLabel,
    /// `None` when the record carries no water-quality reading at all;
    /// rendered as "no water data" instead of a fabricated Normal.
    pub alert: Option<AlertLevel>,
}

impl RowAssessment {
    /// Labels that were actually assigned, in parameter order.
    pub fn labels(&self) -> Vec<StatusLabel> {
        let mut labels: Vec<StatusLabel> = [self.ph, self.salinity, self.water_temp]
            .iter()
            .flatten()
            .copied()
            .collect();
        labels.push(self.mortality);
        labels
    }
}

/// Classifies one record under the policy. Mortality is always classified
/// (an empty cell ingests as zero dead); water parameters classify only when
/// present.
pub fn assess(record: &DailyRecord, policy: &RiskPolicy) -> RowAssessment {
    let ph = classify_reading(policy, Parameter::Ph, record.ph);
    let salinity = classify_reading(policy, Parameter::Salinity, record.salinity_ppt);
    let water_temp = classify_reading(policy, Parameter::WaterTemp, record.water_temp_c);
    let mortality = classify_count(&policy.mortality, record.dead_count);

    let assessment = RowAssessment {
        ph,
        salinity,
        water_temp,
        mortality,
        alert: None,
    };
    let alert = if record.has_water_data() {
        Some(compose_alert(&assessment.labels()))
    } else {
        None
    };
    RowAssessment {
        alert,
        ..assessment
    }
}

/// Batch classification over a filtered set, one assessment per record.
pub fn assess_all(records: &[DailyRecord], policy: &RiskPolicy) -> Vec<RowAssessment> {
    records.iter().map(|r| assess(r, policy)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record_with(
        ph: Option<f64>,
        salinity: Option<f64>,
        temp: Option<f64>,
        dead: u32,
    ) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            block: "H1".to_string(),
            tank: "T3".to_string(),
            worker: None,
            water_worker: None,
            ph,
            salinity_ppt: salinity,
            water_temp_c: temp,
            room_temp_c: None,
            humidity_pct: None,
            scheduled_feed_g: 500.0,
            actual_feed_g: 500.0,
            initial_count: 1000,
            live_count: 998,
            dead_count: dead,
            dead_weight_g: 0.0,
        }
    }

    #[test]
    fn ph_band_edges_are_inclusive() {
        let policy = RiskPolicy::site_2026_01();
        assert_eq!(classify(&policy, Parameter::Ph, 7.6), StatusLabel::Normal);
        assert_eq!(classify(&policy, Parameter::Ph, 8.3), StatusLabel::Normal);
        assert_eq!(classify(&policy, Parameter::Ph, 8.4), StatusLabel::Warning);
        assert_eq!(classify(&policy, Parameter::Ph, 8.41), StatusLabel::Critical);
        assert_eq!(classify(&policy, Parameter::Ph, 7.5), StatusLabel::Warning);
        assert_eq!(classify(&policy, Parameter::Ph, 6.0), StatusLabel::Critical);
    }

    #[test]
    fn ph_slightly_over_the_band_warns_not_criticals() {
        let policy = RiskPolicy::site_2026_01();
        assert_eq!(classify(&policy, Parameter::Ph, 8.35), StatusLabel::Warning);
    }

    #[test]
    fn classify_is_total_across_the_line() {
        let policy = RiskPolicy::site_2025_12();
        for parameter in [Parameter::Ph, Parameter::Salinity, Parameter::WaterTemp] {
            let mut value = -5.0;
            while value < 45.0 {
                // every value maps to exactly one of the three labels
                let label = classify(&policy, parameter, value);
                assert!(matches!(
                    label,
                    StatusLabel::Normal | StatusLabel::Warning | StatusLabel::Critical
                ));
                value += 0.05;
            }
        }
    }

    #[test]
    fn mortality_bands_follow_the_policy_revision() {
        let lenient = RiskPolicy::site_2025_12();
        let current = RiskPolicy::site_2026_01();
        assert_eq!(classify(&lenient, Parameter::Mortality, 4.0), StatusLabel::Normal);
        assert_eq!(classify(&lenient, Parameter::Mortality, 6.0), StatusLabel::Warning);
        assert_eq!(classify(&lenient, Parameter::Mortality, 7.0), StatusLabel::Critical);
        assert_eq!(classify(&current, Parameter::Mortality, 6.0), StatusLabel::Critical);
    }

    #[test]
    fn missing_and_nan_readings_get_no_label() {
        let policy = RiskPolicy::site_2026_01();
        assert_eq!(classify_reading(&policy, Parameter::Ph, None), None);
        assert_eq!(classify_reading(&policy, Parameter::Ph, Some(f64::NAN)), None);
        assert_eq!(
            classify_reading(&policy, Parameter::Ph, Some(8.0)),
            Some(StatusLabel::Normal)
        );
    }

    #[test]
    fn compose_alert_counting_rule() {
        use StatusLabel::{Critical, Normal, Warning};
        assert_eq!(compose_alert(&[Normal, Normal, Normal, Normal]), AlertLevel::Normal);
        assert_eq!(compose_alert(&[Critical, Normal, Normal, Normal]), AlertLevel::Warning);
        assert_eq!(compose_alert(&[Warning, Critical, Normal, Normal]), AlertLevel::Warning);
        assert_eq!(compose_alert(&[Warning, Warning, Warning, Normal]), AlertLevel::Critical);
        assert_eq!(compose_alert(&[Critical, Critical, Critical, Critical]), AlertLevel::Critical);
        assert_eq!(compose_alert(&[]), AlertLevel::Normal);
    }

    #[test]
    fn compose_alert_is_monotonic_in_flagged_count() {
        let mut labels = vec![StatusLabel::Normal; 4];
        let mut previous = compose_alert(&labels);
        for i in 0..4 {
            labels[i] = StatusLabel::Warning;
            let next = compose_alert(&labels);
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn assess_excludes_missing_parameters_from_composition() {
        let policy = RiskPolicy::site_2026_01();
        // pH critical, salinity missing, temp normal, mortality normal:
        // one flagged parameter -> Warning
        let record = record_with(Some(9.0), None, Some(29.0), 0);
        let assessment = assess(&record, &policy);
        assert_eq!(assessment.ph, Some(StatusLabel::Critical));
        assert_eq!(assessment.salinity, None);
        assert_eq!(assessment.alert, Some(AlertLevel::Warning));
    }

    #[test]
    fn assess_without_water_data_yields_no_alert() {
        let policy = RiskPolicy::site_2026_01();
        let record = record_with(None, None, None, 12);
        let assessment = assess(&record, &policy);
        assert_eq!(assessment.mortality, StatusLabel::Critical);
        assert_eq!(assessment.alert, None);
    }

    #[test]
    fn multi_parameter_stress_escalates() {
        let policy = RiskPolicy::site_2026_01();
        let record = record_with(Some(9.0), Some(20.0), Some(33.0), 0);
        let assessment = assess(&record, &policy);
        assert_eq!(assessment.alert, Some(AlertLevel::Critical));
    }

    #[test]
    fn colors_map_by_severity() {
        assert_eq!(risk_color(StatusLabel::Normal), RiskColor::Green);
        assert_eq!(risk_color(StatusLabel::Warning), RiskColor::Orange);
        assert_eq!(risk_color(StatusLabel::Critical), RiskColor::Red);
        assert_eq!(alert_color(AlertLevel::Critical), RiskColor::Red);
    }
}
