#![deny(warnings)]

//! Headless runner: simulate block yields and write the dataset and report.

mod config;

use anyhow::Result;
use clap::Parser;
use flush_pipeline::{write_outputs, BuildInfo, RunReport};
use flush_runtime::Simulator;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "flush-sim", version = VERSION, about = "Monte Carlo simulation of block yields")]
struct Cli {
    /// YAML file with simulation options
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: config::Overrides,

    /// Base name for the CSV dataset and JSON report
    #[arg(long)]
    outfile: Option<String>,

    /// Directory the output files are written to
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,
}

fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_sha: env!("GIT_SHA").to_string(),
        build_date: env!("BUILD_DATE").to_string(),
    }
}

fn print_weekly_means(report: &RunReport) {
    println!("week | harvested (g) | blocks | infected");
    let rows = report
        .weekly_harvest
        .iter()
        .zip(&report.weekly_blocks)
        .zip(&report.weekly_infected);
    for ((harvest, blocks), infected) in rows {
        println!(
            "{:>4} | {:>13.1} | {:>6.1} | {:>8.1}",
            harvest.week, harvest.mean, blocks.mean, infected.mean
        );
    }
}

fn mean_total_harvest(report: &RunReport, replications: u32) -> f64 {
    if replications == 0 {
        return 0.0;
    }
    report.harvest.iter().map(|h| h.harvested).sum::<f64>() / replications as f64
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let cfg = config::resolve(cli.config.as_deref(), &cli.overrides)?;
    info!(config = ?cli.config, outfile = ?cli.outfile, "starting flush-sim");

    let sim = Simulator::new(cfg.params())?;
    let (harvest, removal) = (cfg.harvest_policy(), cfg.removal_policy());
    let dataset = if cfg.parallel {
        sim.run_parallel(&harvest, &removal)?
    } else {
        sim.run(&harvest, &removal)?
    };

    let report = RunReport::build(&dataset, &cfg, build_info());
    print_weekly_means(&report);
    println!(
        "rows: {} | blocks created: {} | mean total harvest per replication: {:.1} g",
        dataset.len(),
        sim.ids().peek().0 - 1,
        mean_total_harvest(&report, cfg.replications)
    );

    if let Some(name) = &cli.outfile {
        write_outputs(&cli.out_dir, name, &dataset, &report)?;
    }
    Ok(())
}
