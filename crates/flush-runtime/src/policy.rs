//! Harvest and removal policies.
//!
//! A policy is a side-effect free test on a block, evaluated once per block
//! per week. Any `Fn(&Block) -> bool` closure is a policy; the two standard
//! ones are also available as configurable structs.

use crate::config::{validate_threshold, SimError};
use flush_core::{Block, Phase};

/// Decides whether a block is picked (harvest) or retired (removal) this week.
pub trait BlockPolicy: Send + Sync {
    fn matches(&self, block: &Block) -> bool;

    /// Checked by the simulator before the first replication.
    fn validate(&self) -> Result<(), SimError> {
        Ok(())
    }
}

impl<F> BlockPolicy for F
where
    F: Fn(&Block) -> bool + Send + Sync,
{
    fn matches(&self, block: &Block) -> bool {
        self(block)
    }
}

/// True once a fruiting block's current flush has grown for `j` weeks.
pub fn harvest_after_j_weeks(block: &Block, j: f64) -> bool {
    block.phase() == Phase::Fruiting && block.weeks_since_colonization_or_last_harvest() >= j
}

/// True for infected blocks and blocks that produced `k` flushes.
pub fn remove_after_infection_or_k_flushes(block: &Block, k: u32) -> bool {
    block.is_infected() || block.flush() >= k
}

/// Harvest every flush after a fixed number of growing weeks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarvestAfterWeeks {
    pub weeks: f64,
}

impl BlockPolicy for HarvestAfterWeeks {
    fn matches(&self, block: &Block) -> bool {
        harvest_after_j_weeks(block, self.weeks)
    }

    fn validate(&self) -> Result<(), SimError> {
        validate_threshold("grow_time", self.weeks)
    }
}

/// Retire infected or spent blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveAfterInfectionOrFlushes {
    pub flushes: u32,
}

impl BlockPolicy for RemoveAfterInfectionOrFlushes {
    fn matches(&self, block: &Block) -> bool {
        remove_after_infection_or_k_flushes(block, self.flushes)
    }
}
