#![deny(warnings)]

//! Monte Carlo driver for the flush simulator.
//!
//! A [`Simulator`] replays the weekly insert, harvest, snapshot, remove and
//! mature cycle over many independent replications and collects one
//! [`DatasetRow`] per live block per week.

pub mod config;
pub mod dataset;
pub mod driver;
pub mod policy;

pub use config::{SimError, SimulationConfig, SimulationParams};
pub use dataset::{Dataset, DatasetRow, COLUMNS};
pub use driver::Simulator;
pub use policy::{
    harvest_after_j_weeks, remove_after_infection_or_k_flushes, BlockPolicy, HarvestAfterWeeks,
    RemoveAfterInfectionOrFlushes,
};
