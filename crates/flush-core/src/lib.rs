#![deny(warnings)]

//! Core lifecycle models for the flush simulator.
//!
//! A [`Block`] is one substrate bag that colonizes, fruits over up to three
//! flushes, and may become infected while colonizing. A [`Population`] holds
//! the blocks live in one replication under an optional capacity. Durations
//! and weights are drawn by the [`sampler`], fruit growth follows one of the
//! [`growth`] decay policies.

pub mod block;
pub mod config;
pub mod growth;
pub mod population;
pub mod sampler;

pub use block::{Block, BlockId, BlockIds, BlockSnapshot, Phase};
pub use config::{BlockConfig, ConfigError, DecayMode, SimulationMode};
pub use growth::{exponential_growth, grow, linear_growth, MAX_FLUSHES};
pub use population::{InsertReport, Population};
pub use sampler::{sample_duration, sample_weight};
