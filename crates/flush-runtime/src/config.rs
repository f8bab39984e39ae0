//! Run configuration: the flat option set and the parameters the driver uses.

use crate::policy::{HarvestAfterWeeks, RemoveAfterInfectionOrFlushes};
use flush_core::{BlockConfig, ConfigError, DecayMode, SimulationMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a simulation before the first replication.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// Block parameters are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A policy threshold is out of range.
    #[error("invalid policy threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Every recognized run option, flat, as read from a config file or CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulation_mode: SimulationMode,
    pub yield_decay_mode: DecayMode,
    pub bag_weight: f64,
    pub max_lifetime_factor: f64,
    pub lifetime_yield_std: f64,
    pub mean_t_colonization: f64,
    pub mean_t_fruiting: f64,
    pub p_infection: f64,
    pub replications: u32,
    pub weeks: u32,
    /// Blocks inserted at the start of every week.
    pub blocks: usize,
    /// Population capacity, unbounded when absent.
    pub capacity: Option<usize>,
    /// Weeks a flush grows before it is harvested.
    pub grow_time: f64,
    /// Flush count after which a block is retired.
    pub remove_after_flush: u32,
    pub seed: u64,
    /// Run replications on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let block = BlockConfig::default();
        Self {
            simulation_mode: block.simulation_mode,
            yield_decay_mode: block.yield_decay_mode,
            bag_weight: block.bag_weight,
            max_lifetime_factor: block.max_lifetime_factor,
            lifetime_yield_std: block.lifetime_yield_std,
            mean_t_colonization: block.mean_t_colonization,
            mean_t_fruiting: block.mean_t_fruiting,
            p_infection: block.p_infection,
            replications: 100,
            weeks: 52,
            blocks: 8,
            capacity: None,
            grow_time: 2.0,
            remove_after_flush: 3,
            seed: 42,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    /// Block creation parameters.
    pub fn block_config(&self) -> BlockConfig {
        BlockConfig {
            simulation_mode: self.simulation_mode,
            yield_decay_mode: self.yield_decay_mode,
            bag_weight: self.bag_weight,
            max_lifetime_factor: self.max_lifetime_factor,
            lifetime_yield_std: self.lifetime_yield_std,
            mean_t_colonization: self.mean_t_colonization,
            mean_t_fruiting: self.mean_t_fruiting,
            p_infection: self.p_infection,
        }
    }

    /// Driver parameters.
    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            replications: self.replications,
            weeks: self.weeks,
            blocks_per_week: self.blocks,
            capacity: self.capacity,
            seed: self.seed,
            block: self.block_config(),
        }
    }

    pub fn harvest_policy(&self) -> HarvestAfterWeeks {
        HarvestAfterWeeks {
            weeks: self.grow_time,
        }
    }

    pub fn removal_policy(&self) -> RemoveAfterInfectionOrFlushes {
        RemoveAfterInfectionOrFlushes {
            flushes: self.remove_after_flush,
        }
    }

    /// Validate block parameters and policy thresholds.
    pub fn validate(&self) -> Result<(), SimError> {
        self.block_config().validate()?;
        validate_threshold("grow_time", self.grow_time)
    }
}

/// Policy thresholds are finite and non-negative.
pub fn validate_threshold(name: &'static str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::InvalidThreshold { name, value });
    }
    Ok(())
}

/// Parameters of one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub replications: u32,
    pub weeks: u32,
    pub blocks_per_week: usize,
    pub capacity: Option<usize>,
    /// Base seed; replication `r` draws from stream `r` of this seed.
    pub seed: u64,
    pub block: BlockConfig,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationConfig::default().params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_block_defaults() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.block_config(), BlockConfig::default());
        assert_eq!(cfg.params().blocks_per_week, 8);
        assert_eq!(cfg.harvest_policy().weeks, 2.0);
        assert_eq!(cfg.removal_policy().flushes, 3);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"weeks": 10, "capacity": 40, "simulation_mode": "random"}"#)
                .unwrap();
        assert_eq!(cfg.weeks, 10);
        assert_eq!(cfg.capacity, Some(40));
        assert_eq!(cfg.simulation_mode, SimulationMode::Random);
        assert_eq!(cfg.replications, 100);
    }

    #[test]
    fn negative_grow_time_is_rejected() {
        let cfg = SimulationConfig {
            grow_time: -1.0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(SimError::InvalidThreshold {
                name: "grow_time",
                value: -1.0
            })
        );
    }

    #[test]
    fn block_errors_are_wrapped() {
        let cfg = SimulationConfig {
            p_infection: 2.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }
}
