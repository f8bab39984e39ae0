//! Flat-file output: the dataset as CSV and a JSON run report.

use crate::summary::{
    block_summary, harvest_summary, weekly_distribution, BlockSummary, HarvestSummary, WeekStats,
};
use chrono::{DateTime, Utc};
use flush_runtime::{Dataset, SimulationConfig, COLUMNS};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors while writing simulation output.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Version information of the binary that produced a report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_sha: String,
    pub build_date: String,
}

/// Provenance of a run.
#[derive(Clone, Debug, Serialize)]
pub struct RunManifest {
    pub build: BuildInfo,
    pub generated_at: DateTime<Utc>,
    pub config: SimulationConfig,
}

/// Summaries of one run, written next to the raw dataset.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub manifest: RunManifest,
    pub harvest: Vec<HarvestSummary>,
    pub blocks: Vec<BlockSummary>,
    /// Weekly harvest across replications.
    pub weekly_harvest: Vec<WeekStats>,
    /// Weekly live block count across replications.
    pub weekly_blocks: Vec<WeekStats>,
    /// Weekly infected block count across replications.
    pub weekly_infected: Vec<WeekStats>,
    /// Weekly new block count across replications.
    pub weekly_new_blocks: Vec<WeekStats>,
}

impl RunReport {
    pub fn build(dataset: &Dataset, config: &SimulationConfig, build: BuildInfo) -> Self {
        Self::build_at(dataset, config, build, Utc::now())
    }

    pub fn build_at(
        dataset: &Dataset,
        config: &SimulationConfig,
        build: BuildInfo,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let harvest = harvest_summary(dataset);
        let blocks = block_summary(dataset);
        let weekly_harvest = weekly_distribution(harvest.iter().map(|h| (h.week, h.harvested)));
        let weekly_blocks =
            weekly_distribution(blocks.iter().map(|b| (b.week, b.number_of_blocks as f64)));
        let weekly_infected = weekly_distribution(
            blocks
                .iter()
                .map(|b| (b.week, b.number_of_infected_blocks as f64)),
        );
        let weekly_new_blocks = weekly_distribution(
            blocks
                .iter()
                .map(|b| (b.week, b.number_of_new_blocks as f64)),
        );
        Self {
            manifest: RunManifest {
                build,
                generated_at,
                config: config.clone(),
            },
            harvest,
            blocks,
            weekly_harvest,
            weekly_blocks,
            weekly_infected,
            weekly_new_blocks,
        }
    }
}

/// Write the dataset as CSV with a header row, even when empty.
pub fn write_dataset_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!dataset.is_empty())
        .from_writer(writer);
    if dataset.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    for row in dataset {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the report as pretty-printed JSON.
pub fn write_report_json<W: Write>(report: &RunReport, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Write `<dir>/<name>.csv` and `<dir>/<name>_report.json`, creating `dir`.
pub fn write_outputs(
    dir: &Path,
    name: &str,
    dataset: &Dataset,
    report: &RunReport,
) -> Result<(PathBuf, PathBuf), ExportError> {
    fs::create_dir_all(dir)?;
    let csv_path = dir.join(format!("{name}.csv"));
    let json_path = dir.join(format!("{name}_report.json"));

    let mut csv_out = BufWriter::new(File::create(&csv_path)?);
    write_dataset_csv(dataset, &mut csv_out)?;
    csv_out.flush()?;

    let mut json_out = BufWriter::new(File::create(&json_path)?);
    write_report_json(report, &mut json_out)?;
    json_out.flush()?;

    info!(
        csv = %csv_path.display(),
        report = %json_path.display(),
        rows = dataset.len(),
        "wrote simulation output"
    );
    Ok((csv_path, json_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flush_runtime::Simulator;

    fn build_info() -> BuildInfo {
        BuildInfo {
            version: "0.1.0".into(),
            git_sha: "abc123".into(),
            build_date: "2026-01-01".into(),
        }
    }

    fn small_run() -> (SimulationConfig, Dataset) {
        let cfg = SimulationConfig {
            replications: 2,
            weeks: 10,
            blocks: 3,
            ..SimulationConfig::default()
        };
        let data = Simulator::new(cfg.params())
            .unwrap()
            .run(&cfg.harvest_policy(), &cfg.removal_policy())
            .unwrap();
        (cfg, data)
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let (_, data) = small_run();
        let mut buf = Vec::new();
        write_dataset_csv(&data, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert_eq!(lines.count(), data.len());
        assert!(text.contains(",COLONIZING,"));
    }

    #[test]
    fn empty_dataset_still_gets_a_header() {
        let mut buf = Vec::new();
        write_dataset_csv(&Dataset::default(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn report_covers_every_week() {
        let (cfg, data) = small_run();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let report = RunReport::build_at(&data, &cfg, build_info(), at);
        assert_eq!(report.harvest.len(), 20);
        assert_eq!(report.blocks.len(), 20);
        assert_eq!(report.weekly_harvest.len(), 10);
        assert!(report.weekly_blocks.iter().all(|w| w.count == 2));

        let mut buf = Vec::new();
        write_report_json(&report, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["manifest"]["build"]["git_sha"], "abc123");
        assert_eq!(value["manifest"]["config"]["weeks"], 10);
        assert_eq!(value["manifest"]["config"]["yield_decay_mode"], "linear");
        assert_eq!(value["blocks"][0]["number_of_new_blocks"], 3);
        assert!(report
            .weekly_new_blocks
            .iter()
            .all(|w| w.count == 2 && w.min == 3.0 && w.max == 3.0));
    }
}
