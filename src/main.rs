use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use ecommerce_revenue_pipeline::config::{DiscountUnit, PipelineConfig, DEFAULT_ROLLING_WINDOW};
use ecommerce_revenue_pipeline::models::{Dimension, EnrichedRecord, Metric};
use ecommerce_revenue_pipeline::report::{self, Dashboard};
use ecommerce_revenue_pipeline::{aggregate, ingest, pipeline, stats, PipelineError};

#[derive(Parser)]
#[command(name = "revenue-pipeline")]
#[command(about = "Revenue aggregates for e-commerce transaction exports", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOptions {
    /// How the discount column is encoded; `auto` infers it from the column maximum
    #[arg(long, global = true, value_enum, env = "REVENUE_PIPELINE_DISCOUNT_UNIT", default_value_t = DiscountUnit::Auto)]
    discount_unit: DiscountUnit,
    /// Days averaged in the daily rolling mean
    #[arg(long, global = true, default_value_t = DEFAULT_ROLLING_WINDOW)]
    rolling_window: usize,
    #[arg(long, global = true, env = "REVENUE_PIPELINE_LOG", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs and per-column statistics
    Summary {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Sum revenue by one or more dimensions
    Aggregate {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long = "by", value_enum, value_delimiter = ',', required = true)]
        group_by: Vec<Dimension>,
        /// Order rows by period instead of first appearance
        #[arg(long)]
        chronological: bool,
        #[arg(long)]
        json: bool,
    },
    /// Monthly revenue trend, or daily with a rolling mean
    Trend {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        daily: bool,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown dashboard
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.options.log_level.as_str()),
    )
    .init();

    let config = PipelineConfig {
        discount_unit: cli.options.discount_unit,
        rolling_window: cli.options.rolling_window,
    };

    match cli.command {
        Commands::Summary { csv } => {
            let Some(records) = load(&csv, &config)? else {
                return Ok(());
            };
            let kpis = stats::kpis(&records);
            println!("Total revenue:   {:.2}", kpis.total_revenue);
            println!("Total orders:    {}", kpis.total_orders);
            println!("Avg order value: {:.2}", kpis.avg_order_value);
            println!("Avg discount:    {:.1}%", kpis.avg_discount_pct);
            println!();
            for summary in stats::describe(&records) {
                println!(
                    "- {}: count {} mean {} std {} min {} median {} max {}",
                    summary.column.as_str(),
                    summary.count,
                    number(summary.mean),
                    number(summary.std),
                    number(summary.min),
                    number(summary.median),
                    number(summary.max)
                );
            }
        }
        Commands::Aggregate {
            csv,
            group_by,
            chronological,
            json,
        } => {
            let Some(records) = load(&csv, &config)? else {
                return Ok(());
            };
            let mut result = aggregate::aggregate(&records, &group_by, Metric::SumRevenue)?;
            if chronological {
                result = result.into_chronological();
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.is_empty() {
                println!("Nothing to display.");
            } else {
                for row in &result.rows {
                    println!("- {}: {:.2}", row.keys.join(" / "), row.revenue);
                }
            }
        }
        Commands::Trend { csv, daily, json } => {
            let Some(records) = load(&csv, &config)? else {
                return Ok(());
            };
            if daily {
                let trend = aggregate::daily_trend(&records, config.rolling_window)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&trend)?);
                } else {
                    for day in &trend {
                        println!(
                            "- {}: {:.2} (rolling {})",
                            day.date,
                            day.revenue,
                            number(day.rolling_mean)
                        );
                    }
                }
            } else {
                let trend = aggregate::monthly_trend(&records)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&trend)?);
                } else {
                    for row in &trend.rows {
                        println!("- {}: {:.2}", row.keys[0], row.revenue);
                    }
                }
            }
        }
        Commands::Report { csv, out } => {
            let Some(records) = load(&csv, &config)? else {
                return Ok(());
            };
            let dashboard = Dashboard::build(&records, &config)?;
            let markdown = report::build_report(&csv.display().to_string(), &dashboard);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// `None` when the file has no data rows, after telling the user so.
fn load(csv: &Path, config: &PipelineConfig) -> anyhow::Result<Option<Vec<EnrichedRecord>>> {
    let table =
        ingest::read_table(csv).with_context(|| format!("failed to read {}", csv.display()))?;

    match pipeline::load_and_enrich(&table, config) {
        Ok(records) => Ok(Some(records)),
        Err(PipelineError::EmptyDataset) => {
            println!(
                "No transactions found in {}; nothing to display.",
                csv.display()
            );
            Ok(None)
        }
        Err(err) => Err(err).with_context(|| format!("failed to load {}", csv.display())),
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.2}"))
}
