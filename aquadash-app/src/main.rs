use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use aquadash_core::aggregate::{self, ViewGranularity};
use aquadash_core::export;
use aquadash_core::metrics;
use aquadash_core::scorecard;
use aquadash_schemas::mapping::ColumnMapping;
use aquadash_schemas::policy::DEFAULT_POLICY;
use aquadash_schemas::record::{DailyRecord, GrowthSample};

mod config;
mod ingest;
mod plotting;
mod report;

#[derive(Parser)]
#[command(name = "aquadash")]
#[command(about = "Shrimp-farm daily log analysis: KPIs, risk alerts, scorecards", long_about = None)]
struct Cli {
    /// CSV export of the consolidated daily tank/block report
    #[arg(long)]
    daily_log: PathBuf,

    /// CSV export of the ABW survey file (enables growth figures)
    #[arg(long)]
    growth_log: Option<PathBuf>,

    /// Directory of additional risk-policy YAML files
    #[arg(long)]
    policies: Option<PathBuf>,

    /// Risk policy revision to classify against
    #[arg(long, default_value = DEFAULT_POLICY)]
    policy: String,

    #[arg(long)]
    block: Option<String>,

    #[arg(long)]
    tank: Option<String>,

    #[arg(long)]
    from: Option<NaiveDate>,

    #[arg(long)]
    to: Option<NaiveDate>,

    /// Aggregation bucket for summaries: daily, weekly or monthly
    #[arg(long, default_value = "daily", value_parser = ViewGranularity::from_str)]
    view: ViewGranularity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPI totals, group summaries and worker performance
    Summary,
    /// Print the tank/worker/farm scorecard over the date range
    Scorecard,
    /// Write a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Render the chart set as PNG files
    Plots {
        #[arg(long, default_value = "plots")]
        out_dir: PathBuf,
    },
    /// Write the enriched table (raw + derived + status columns)
    Export {
        #[arg(long, default_value = "enriched.csv")]
        out: PathBuf,
        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let library = match &cli.policies {
        Some(dir) => config::PolicyLibrary::load(dir)?,
        None => config::PolicyLibrary::builtin(),
    };
    let policy = library.get(&cli.policy)?;

    let mapping = ColumnMapping::consolidated_report();
    let log = ingest::load_daily_log(&cli.daily_log, &mapping)?;
    if log.dropped_rows > 0 {
        println!(
            "Dropped {} rows with unparseable dates from '{}'.",
            log.dropped_rows,
            cli.daily_log.display()
        );
    }

    let growth = match &cli.growth_log {
        Some(path) => ingest::load_growth_log(path)?,
        None => Vec::new(),
    };

    let filter = ingest::Filter {
        block: cli.block.clone(),
        tank: cli.tank.clone(),
        from: cli.from,
        to: cli.to,
    };
    let records = filter.apply(&log.records);
    let (from, to) = period_bounds(&records, &growth, cli.from, cli.to);

    match cli.command {
        Commands::Summary => {
            print_summary(&records, policy, cli.view, &filter);
        }
        Commands::Scorecard => {
            print_scorecard(&records, &growth, from, to, policy);
        }
        Commands::Report { out } => {
            let inputs = report::ReportInputs {
                scope: filter.scope_label(),
                records: &records,
                growth: &growth,
                granularity: cli.view,
                policy,
                from,
                to,
            };
            let markdown = report::build_report(&inputs);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write report to '{}'", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Plots { out_dir } => {
            plotting::generate_all_plots(&out_dir, &records, policy)?;
        }
        Commands::Export { out, format } => {
            let rows = export::build_rows(&records, policy)?;
            match format.as_str() {
                "csv" => export::write_csv(&out, &rows)?,
                "json" => export::write_json(&out, &rows)?,
                other => anyhow::bail!("unknown export format '{other}', expected csv or json"),
            }
            println!("Exported {} rows to {}.", rows.len(), out.display());
        }
    }

    Ok(())
}

/// The reporting period: explicit flags win, otherwise the span of the
/// loaded data. Falls back to today for a fully empty run.
fn period_bounds(
    records: &[DailyRecord],
    growth: &[GrowthSample],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> (NaiveDate, NaiveDate) {
    let dates = records
        .iter()
        .map(|r| r.date)
        .chain(growth.iter().map(|s| s.date));
    let min = dates.clone().min();
    let max = dates.max();
    let today = chrono::Utc::now().date_naive();
    let from = from.or(min).unwrap_or(today);
    let to = to.or(max).unwrap_or(today);
    (from, to)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "\u{2013}".to_string(), |v| format!("{v:.2}"))
}

fn print_summary(
    records: &[DailyRecord],
    policy: &aquadash_schemas::policy::RiskPolicy,
    view: ViewGranularity,
    filter: &ingest::Filter,
) {
    println!("\n--- [Summary: {}] ---", filter.scope_label());

    let kpis = metrics::kpis(records);
    if kpis.records == 0 {
        println!("No data for the selected filters.");
        return;
    }
    println!("Records:           {}", kpis.records);
    println!(
        "Feed:              {:.2} kg actual / {:.2} kg scheduled",
        kpis.actual_feed_kg(),
        kpis.scheduled_feed_kg()
    );
    println!("Leftover feed:     {:.2} kg", kpis.leftover_feed_kg());
    println!(
        "Mortality:         {} dead ({:.1} g)",
        kpis.dead_count, kpis.dead_weight_g
    );
    println!("Mean survival:     {:.2}%", kpis.mean_survival_pct);
    println!("Mean mortality:    {:.2}%", kpis.mean_mortality_pct);

    println!("\nGroup summary:");
    for summary in aggregate::summarize(records, view) {
        println!(
            "  - {} | {} | {}: feed {:.0} g, leftover {:.0} g, dead {}, pH {}, salinity {}, survival {:.2}%",
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

    println!("\nWorker performance:");
    for worker in aggregate::worker_summaries(records, policy) {
        println!(
            "  - {}: pH {:.1}%, salinity {:.1}%, fed {:.2} kg of {:.2} kg, dead {}",
            worker.worker,
            worker.ph_compliance_pct,
            worker.salinity_compliance_pct,
            worker.actual_feed_kg,
            worker.scheduled_feed_kg,
            worker.dead_count
        );
    }
}

fn print_scorecard(
    records: &[DailyRecord],
    growth: &[GrowthSample],
    from: NaiveDate,
    to: NaiveDate,
    policy: &aquadash_schemas::policy::RiskPolicy,
) {
    println!("\n--- [Scorecard {} to {}] ---", from, to);
    let cards = scorecard::tank_scorecards(records, growth, from, to);
    if cards.is_empty() {
        println!("No data for the selected filters.");
        return;
    }

    println!("Tanks:");
    for card in &cards {
        println!(
            "  - {}/{} ({}): ABW {} -> {} g, gain {} kg, ADG {} g/d, survival {:.2}%, FCR {}, growth {}",
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

    println!("\nWorkers:");
    for worker in scorecard::worker_scorecards(&cards) {
        println!(
            "  - {}: {} tanks, fed {:.2} kg, gain {:.2} kg, survival {:.2}%, FCR {:.2}",
            worker.worker,
            worker.tanks,
            worker.feed_kg,
            worker.weight_gain_kg,
            worker.mean_survival_pct,
            worker.fcr
        );
    }

    let days = (to - from).num_days().max(1);
    let farm = scorecard::farm_scorecard(&cards, days, policy);
    println!("\nFarm vs targets:");
    for row in &farm.targets {
        let met = match row.met {
            Some(true) => "YES",
            Some(false) => "NO",
            None => "\u{2013}",
        };
        println!(
            "  - {:<18} actual {:>8} | target {:<10} | {}",
            row.metric,
            fmt_opt(row.actual),
            row.target,
            met
        );
    }
}
