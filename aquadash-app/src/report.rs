//! Markdown report assembly for the document-export collaborator.

use aquadash_core::aggregate::{self, ViewGranularity};
use aquadash_core::classify::{self, RowAssessment};
use aquadash_core::metrics;
use aquadash_core::scorecard;
use aquadash_schemas::policy::RiskPolicy;
use aquadash_schemas::record::{DailyRecord, GrowthSample};
use aquadash_schemas::status::StatusLabel;
use chrono::NaiveDate;
use std::fmt::Write;

pub struct ReportInputs<'a> {
    pub scope: String,
    pub records: &'a [DailyRecord],
    pub growth: &'a [GrowthSample],
    pub granularity: ViewGranularity,
    pub policy: &'a RiskPolicy,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "\u{2013}".to_string(), |v| format!("{v:.2}"))
}

fn fmt_label(label: Option<StatusLabel>) -> String {
    label.map_or_else(|| "\u{2013}".to_string(), |l| l.to_string())
}

fn alert_details(assessment: &RowAssessment) -> String {
    format!(
        "pH {}, Salinity {}, Temp {}, Mortality {}",
        fmt_label(assessment.ph),
        fmt_label(assessment.salinity),
        fmt_label(assessment.water_temp),
        assessment.mortality
    )
}

pub fn build_report(inputs: &ReportInputs) -> String {
    let mut output = String::new();
    let records = inputs.records;

    let _ = writeln!(output, "# Shrimp Farm Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {}, policy {})",
        inputs.scope, inputs.from, inputs.to, inputs.policy.name
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Indicators");
    let kpis = metrics::kpis(records);
    if kpis.records == 0 {
        let _ = writeln!(output, "No data for the selected filters.");
    } else {
        let _ = writeln!(output, "- Records: {}", kpis.records);
        let _ = writeln!(
            output,
            "- Feed: {:.2} kg actual of {:.2} kg scheduled ({:.2} kg leftover)",
            kpis.actual_feed_kg(),
            kpis.scheduled_feed_kg(),
            kpis.leftover_feed_kg()
        );
        let _ = writeln!(
            output,
            "- Mortality: {} dead ({:.1} g), mean mortality {:.2}%",
            kpis.dead_count, kpis.dead_weight_g, kpis.mean_mortality_pct
        );
        let _ = writeln!(output, "- Mean survival: {:.2}%", kpis.mean_survival_pct);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Water-Quality Compliance");
    if records.is_empty() {
        let _ = writeln!(output, "No readings in this window.");
    } else {
        let ph_readings: Vec<Option<f64>> = records.iter().map(|r| r.ph).collect();
        let salinity_readings: Vec<Option<f64>> =
            records.iter().map(|r| r.salinity_ppt).collect();
        let ph_present = ph_readings.iter().flatten().count();
        let salinity_present = salinity_readings.iter().flatten().count();
        let _ = writeln!(
            output,
            "- pH: {:.1}% within [{}, {}] ({} readings)",
            metrics::compliance_pct(&ph_readings, &inputs.policy.ph),
            inputs.policy.ph.ideal_min,
            inputs.policy.ph.ideal_max,
            ph_present
        );
        let _ = writeln!(
            output,
            "- Salinity: {:.1}% within [{}, {}] ({} readings)",
            metrics::compliance_pct(&salinity_readings, &inputs.policy.salinity),
            inputs.policy.salinity.ideal_min,
            inputs.policy.salinity.ideal_max,
            salinity_present
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Group Summary");
    let summaries = aggregate::summarize(records, inputs.granularity);
    if summaries.is_empty() {
        let _ = writeln!(output, "No data for the selected filters.");
    } else {
        let _ = writeln!(
            output,
            "| Bucket | Block | Tank | Feed (g) | Leftover (g) | Dead | Avg pH | Avg Salinity | Survival % |"
        );
        let _ = writeln!(
            output,
            "|--------|-------|------|----------|--------------|------|--------|--------------|------------|"
        );
        for summary in &summaries {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {:.0} | {:.0} | {} | {} | {} | {:.2} |",
                summary.bucket,
                summary.block,
                summary.tank,
                summary.actual_feed_g,
                summary.leftover_feed_g,
                summary.dead_count,
                fmt_opt(summary.mean_ph),
                fmt_opt(summary.mean_salinity_ppt),
                summary.mean_survival_pct
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Worker Performance");
    let workers = aggregate::worker_summaries(records, inputs.policy);
    if workers.is_empty() {
        let _ = writeln!(output, "No worker records in this window.");
    } else {
        let _ = writeln!(
            output,
            "| Worker | Records | pH % | Salinity % | Scheduled (kg) | Actual (kg) | Leftover (kg) | Dead | Dead Weight (g) |"
        );
        let _ = writeln!(
            output,
            "|--------|---------|------|------------|----------------|-------------|---------------|------|-----------------|"
        );
        for worker in &workers {
            let _ = writeln!(
                output,
                "| {} | {} | {:.1} | {:.1} | {:.2} | {:.2} | {:.2} | {} | {:.1} |",
                worker.worker,
                worker.records,
                worker.ph_compliance_pct,
                worker.salinity_compliance_pct,
                worker.scheduled_feed_kg,
                worker.actual_feed_kg,
                worker.leftover_feed_kg,
                worker.dead_count,
                worker.dead_weight_g
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance");
    if records.is_empty() {
        let _ = writeln!(output, "No data for the selected filters.");
    } else {
        let derived = metrics::enrich(records, inputs.policy);
        let mut rows: Vec<(&DailyRecord, &metrics::DerivedMetrics)> =
            records.iter().zip(derived.iter()).collect();
        rows.sort_by(|a, b| {
            b.1.overall_performance_pct
                .partial_cmp(&a.1.overall_performance_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let _ = writeln!(
            output,
            "| Date | Block | Tank | Survival % | Feed Eff % | pH Score | Salinity Score | Overall % |"
        );
        let _ = writeln!(
            output,
            "|------|-------|------|------------|------------|----------|----------------|-----------|"
        );
        for (record, derived) in rows {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {:.2} | {:.2} | {} | {} | {:.2} |",
                record.date,
                record.block,
                record.tank,
                derived.survival_pct,
                derived.feed_efficiency_pct,
                fmt_opt(derived.ph_score),
                fmt_opt(derived.salinity_score),
                derived.overall_performance_pct
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk & Alerts");
    if records.is_empty() {
        let _ = writeln!(output, "No data for the selected filters.");
    } else {
        let assessments = classify::assess_all(records, inputs.policy);
        let _ = writeln!(
            output,
            "| Date | Block | Tank | pH | Salinity | Temp | Dead | Alert | Details |"
        );
        let _ = writeln!(
            output,
            "|------|-------|------|----|----------|------|------|-------|---------|"
        );
        for (record, assessment) in records.iter().zip(assessments.iter()) {
            let alert = assessment
                .alert
                .map_or_else(|| "No water data".to_string(), |a| a.to_string());
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                record.date,
                record.block,
                record.tank,
                fmt_opt(record.ph),
                fmt_opt(record.salinity_ppt),
                fmt_opt(record.water_temp_c),
                record.dead_count,
                alert,
                alert_details(assessment)
            );
        }
    }

    if !inputs.growth.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Scorecard");
        let cards =
            scorecard::tank_scorecards(records, inputs.growth, inputs.from, inputs.to);
        if cards.is_empty() {
            let _ = writeln!(output, "No data for the selected filters.");
        } else {
            let _ = writeln!(
                output,
                "| Block | Tank | Worker | ABW start | ABW end | Gain (kg) | ADG (g/d) | Survival % | FCR | Growth |"
            );
            let _ = writeln!(
                output,
                "|-------|------|--------|-----------|---------|-----------|-----------|------------|-----|--------|"
            );
            for card in &cards {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} | {} | {} | {:.2} | {} | {} |",
                    card.block,
                    card.tank,
                    card.worker,
                    fmt_opt(card.abw_start_g),
                    fmt_opt(card.abw_end_g),
                    fmt_opt(card.weight_gain_kg),
                    fmt_opt(card.adg_g_per_day),
                    card.survival_pct,
                    fmt_opt(card.fcr),
                    card.growth_status
                );
            }

            let days = (inputs.to - inputs.from).num_days().max(1);
            let farm = scorecard::farm_scorecard(&cards, days, inputs.policy);
            let _ = writeln!(output);
            let _ = writeln!(output, "### Farm vs Targets");
            let _ = writeln!(output, "| Metric | Actual | Target | Met |");
            let _ = writeln!(output, "|--------|--------|--------|-----|");
            for row in &farm.targets {
                let met = match row.met {
                    Some(true) => "YES",
                    Some(false) => "NO",
                    None => "\u{2013}",
                };
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} |",
                    row.metric,
                    fmt_opt(row.actual),
                    row.target,
                    met
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, ph: Option<f64>) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            block: "H1".to_string(),
            tank: "T3".to_string(),
            worker: Some("Flora".to_string()),
            water_worker: None,
            ph,
            salinity_ppt: Some(27.0),
            water_temp_c: Some(29.0),
            room_temp_c: None,
            humidity_pct: None,
            scheduled_feed_g: 500.0,
            actual_feed_g: 480.0,
            initial_count: 1000,
            live_count: 960,
            dead_count: 1,
            dead_weight_g: 0.8,
        }
    }

    fn inputs<'a>(
        records: &'a [DailyRecord],
        growth: &'a [GrowthSample],
        policy: &'a RiskPolicy,
    ) -> ReportInputs<'a> {
        ReportInputs {
            scope: "all blocks and tanks".to_string(),
            records,
            growth,
            granularity: ViewGranularity::Daily,
            policy,
            from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        }
    }

    #[test]
    fn empty_window_reports_no_data_everywhere() {
        let policy = RiskPolicy::site_2026_01();
        let report = build_report(&inputs(&[], &[], &policy));
        assert!(report.contains("# Shrimp Farm Report"));
        assert!(report.contains("No data for the selected filters."));
        assert!(report.contains("No readings in this window."));
        assert!(!report.contains("## Scorecard"));
    }

    #[test]
    fn report_carries_kpis_compliance_and_risk_rows() {
        let policy = RiskPolicy::site_2026_01();
        let records = vec![record(12, Some(7.9)), record(13, None)];
        let report = build_report(&inputs(&records, &[], &policy));
        assert!(report.contains("- Records: 2"));
        assert!(report.contains("pH: 100.0% within [7.6, 8.3] (1 readings)"));
        assert!(report.contains("| 2026-01-12 | H1 | T3 |"));
        assert!(report.contains("Mortality Normal"));
        // missing pH renders as a dash, not a number
        assert!(report.contains("| \u{2013} | 27.00 |"));
    }

    #[test]
    fn scorecard_section_appears_with_growth_data() {
        let policy = RiskPolicy::site_2026_01();
        let records = vec![record(12, Some(7.9))];
        let growth = vec![GrowthSample {
            date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            block: "H1".to_string(),
            tank: "T3".to_string(),
            avg_weight_g: Some(6.0),
            small_weight_g: None,
            medium_weight_g: None,
            large_weight_g: None,
        }];
        let report = build_report(&inputs(&records, &growth, &policy));
        assert!(report.contains("## Scorecard"));
        assert!(report.contains("### Farm vs Targets"));
        assert!(report.contains("| Survival % |"));
    }
}
