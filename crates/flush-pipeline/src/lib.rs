#![deny(warnings)]

//! Aggregation and flat-file export of simulation datasets.

pub mod export;
pub mod summary;

pub use export::{
    write_dataset_csv, write_outputs, write_report_json, BuildInfo, ExportError, RunManifest,
    RunReport,
};
pub use summary::{
    block_summary, harvest_summary, weekly_distribution, BlockSummary, HarvestSummary, WeekStats,
};
