//! This module renders the chart set from a filtered record batch.

use anyhow::Result;
use aquadash_core::classify::{self, Parameter};
use aquadash_schemas::policy::RiskPolicy;
use aquadash_schemas::record::DailyRecord;
use aquadash_schemas::status::{RiskColor, StatusLabel};
use plotters::prelude::*;
use std::path::Path;

const ORANGE: RGBColor = RGBColor(255, 140, 0);

/// The main function to generate and save all plots for a filtered view.
pub fn generate_all_plots(
    output_dir: &Path,
    records: &[DailyRecord],
    policy: &RiskPolicy,
) -> Result<()> {
    println!("[Plotting] Generating graphs from the filtered records...");

    if records.is_empty() {
        println!("[Plotting] Warning: No data to plot.");
        return Ok(());
    }
    std::fs::create_dir_all(output_dir)?;

    let mut ordered: Vec<&DailyRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        (a.date, &a.block, &a.tank).cmp(&(b.date, &b.block, &b.tank))
    });
    let labels: Vec<String> = ordered
        .iter()
        .map(|r| format!("{} {}|{}", r.date.format("%m-%d"), r.block, r.tank))
        .collect();

    plot_water_quality(output_dir, &ordered, &labels, policy)?;
    plot_feed_trends(output_dir, &ordered, &labels)?;
    plot_mortality(output_dir, &ordered, &labels, policy)?;

    println!(
        "[Plotting] Graphs have been saved to '{}'.",
        output_dir.display()
    );
    Ok(())
}

fn marker_style(status: StatusLabel) -> Option<RGBColor> {
    match classify::risk_color(status) {
        RiskColor::Green => None,
        RiskColor::Orange => Some(ORANGE),
        RiskColor::Red => Some(RED),
    }
}

/// pH and salinity series with out-of-band readings highlighted.
fn plot_water_quality(
    output_dir: &Path,
    records: &[&DailyRecord],
    labels: &[String],
    policy: &RiskPolicy,
) -> Result<()> {
    let path = output_dir.join("1_water_quality.png");
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_salinity = records
        .iter()
        .filter_map(|r| r.salinity_ppt)
        .fold(35.0_f64, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption("Water Quality (Salinity & pH)", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0usize..records.len(), 0f64..max_salinity * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Date Block|Tank")
        .y_desc("Reading")
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .draw()?;

    let series: [(&str, Parameter, RGBColor, fn(&DailyRecord) -> Option<f64>); 2] = [
        ("pH", Parameter::Ph, BLUE, |r| r.ph),
        ("Salinity (ppt)", Parameter::Salinity, GREEN, |r| r.salinity_ppt),
    ];

    for (name, parameter, color, getter) in series {
        chart
            .draw_series(LineSeries::new(
                records
                    .iter()
                    .copied()
                    .enumerate()
                    .filter_map(|(i, r)| getter(r).map(|v| (i, v))),
                color.stroke_width(2),
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));

        // risk markers on warning/critical readings
        chart.draw_series(records.iter().copied().enumerate().filter_map(|(i, r)| {
            let value = getter(r)?;
            let status = classify::classify_reading(policy, parameter, Some(value))?;
            let marker = marker_style(status)?;
            Some(Circle::new((i, value), 6, marker.filled()))
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Scheduled vs actual feed per record.
fn plot_feed_trends(
    output_dir: &Path,
    records: &[&DailyRecord],
    labels: &[String],
) -> Result<()> {
    let path = output_dir.join("2_feed_trends.png");
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_feed = records
        .iter()
        .map(|r| r.scheduled_feed_g.max(r.actual_feed_g))
        .fold(1.0_f64, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption("Feed Trends", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..records.len(), 0f64..max_feed * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Date Block|Tank")
        .y_desc("Feed (g)")
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .draw()?;

    let series: [(&str, RGBColor, fn(&DailyRecord) -> f64); 2] = [
        ("Scheduled", MAGENTA, |r| r.scheduled_feed_g),
        ("Actual", BLUE, |r| r.actual_feed_g),
    ];
    for (name, color, getter) in series {
        chart
            .draw_series(LineSeries::new(
                records.iter().copied().enumerate().map(|(i, r)| (i, getter(r))),
                color.stroke_width(2),
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    // leftover markers where the crew fed less than scheduled
    chart
        .draw_series(records.iter().enumerate().filter_map(|(i, r)| {
            if r.scheduled_feed_g - r.actual_feed_g > 0.0 {
                Some(TriangleMarker::new((i, r.scheduled_feed_g), 8, ORANGE.filled()))
            } else {
                None
            }
        }))?
        .label("Leftover feed")
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 8, ORANGE.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Dead-count bars, red where the count breaches the policy ceiling.
fn plot_mortality(
    output_dir: &Path,
    records: &[&DailyRecord],
    labels: &[String],
    policy: &RiskPolicy,
) -> Result<()> {
    let path = output_dir.join("3_mortality.png");
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_dead = records.iter().map(|r| r.dead_count).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Mortality", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0usize..records.len(), 0u32..(max_dead + 2))?;

    chart
        .configure_mesh()
        .x_desc("Date Block|Tank")
        .y_desc("Dead Shrimp")
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .draw()?;

    chart.draw_series(records.iter().enumerate().map(|(i, r)| {
        let status = classify::classify(policy, Parameter::Mortality, f64::from(r.dead_count));
        let color = marker_style(status).unwrap_or(RGBColor(70, 130, 180));
        Rectangle::new([(i, 0), (i + 1, r.dead_count)], color.filled())
    }))?;

    root.present()?;
    Ok(())
}
