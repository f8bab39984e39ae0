//! Single-block lifecycle: colonization, fruiting flushes, infection, harvest.

use crate::config::{BlockConfig, ConfigError, DecayMode};
use crate::growth::{grow, MAX_FLUSHES};
use crate::sampler::{sample_duration, sample_weight};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Unique identifier of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {}", self.0)
    }
}

/// Issues strictly increasing block ids, starting at 1.
///
/// One generator is shared by every replication of a simulation run and is
/// never reset between them, so ids stay unique across the whole dataset.
#[derive(Debug)]
pub struct BlockIds {
    next: AtomicU64,
}

impl BlockIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Take the next id.
    pub fn next_id(&self) -> BlockId {
        BlockId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to [`BlockIds::next_id`] will return.
    pub fn peek(&self) -> BlockId {
        BlockId(self.next.load(Ordering::Relaxed))
    }
}

impl Default for BlockIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle stage of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Mycelium is still spreading through the substrate.
    Colonizing,
    /// Colonization finished; the block produces flushes.
    Fruiting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Colonizing => "COLONIZING",
            Phase::Fruiting => "FRUITING",
        })
    }
}

/// Observable state of a block at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub block_id: BlockId,
    pub age: u32,
    pub phase: Phase,
    pub infected: bool,
    pub flush: u32,
    pub substrate_weight: f64,
    pub fruit_weight: f64,
    /// Grams harvested since the previous snapshot.
    pub harvested: f64,
}

/// One growing unit.
///
/// Phase only moves forward, infection is permanent and stops all further
/// growth and harvest, and `flush` counts successful harvests.
#[derive(Clone, Debug)]
pub struct Block {
    id: BlockId,
    age: u32,
    phase: Phase,
    infected: bool,
    flush: u32,
    substrate_weight: f64,
    fruit_weight: f64,
    decay_mode: DecayMode,
    time_to_colonize: f64,
    time_to_fruit: f64,
    max_lifetime_yield: f64,
    p_infection_per_week: f64,
    age_at_last_harvest: Option<u32>,
    yield_history: Vec<f64>,
    last_harvested: f64,
}

impl Block {
    /// Create a fresh block, drawing its durations and yield cap from `config`.
    ///
    /// The weekly infection probability is set so that the chance of being
    /// infected by the end of colonization equals `config.p_infection`.
    pub fn create<R: Rng + ?Sized>(
        config: &BlockConfig,
        ids: &BlockIds,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let mode = config.simulation_mode;
        let time_to_colonize = sample_duration(config.mean_t_colonization, mode, rng)?;
        let time_to_fruit = sample_duration(config.mean_t_fruiting, mode, rng)?;
        let max_lifetime_yield = sample_weight(
            config.mean_lifetime_yield(),
            config.lifetime_yield_std,
            mode,
            rng,
        )?
        .max(0.0);
        let p_infection_per_week = 1.0 - (1.0 - config.p_infection).powf(1.0 / time_to_colonize);

        Ok(Self {
            id: ids.next_id(),
            age: 0,
            phase: Phase::Colonizing,
            infected: false,
            flush: 0,
            substrate_weight: config.bag_weight,
            fruit_weight: 0.0,
            decay_mode: config.yield_decay_mode,
            time_to_colonize,
            time_to_fruit,
            max_lifetime_yield,
            p_infection_per_week,
            age_at_last_harvest: None,
            yield_history: Vec::new(),
            last_harvested: 0.0,
        })
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Weeks since creation.
    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_infected(&self) -> bool {
        self.infected
    }

    /// Number of completed harvests.
    pub fn flush(&self) -> u32 {
        self.flush
    }

    pub fn substrate_weight(&self) -> f64 {
        self.substrate_weight
    }

    /// Grams currently grown in the active flush.
    pub fn fruit_weight(&self) -> f64 {
        self.fruit_weight
    }

    pub fn time_to_colonize(&self) -> f64 {
        self.time_to_colonize
    }

    pub fn time_to_fruit(&self) -> f64 {
        self.time_to_fruit
    }

    pub fn max_lifetime_yield(&self) -> f64 {
        self.max_lifetime_yield
    }

    pub fn p_infection_per_week(&self) -> f64 {
        self.p_infection_per_week
    }

    pub fn age_at_last_harvest(&self) -> Option<u32> {
        self.age_at_last_harvest
    }

    /// Amounts of every past harvest, oldest first.
    pub fn yield_history(&self) -> &[f64] {
        &self.yield_history
    }

    /// Weeks elapsed in the current flush: since colonization completed for
    /// the first flush, since the last harvest afterwards. Negative while the
    /// block is still colonizing.
    pub fn weeks_since_colonization_or_last_harvest(&self) -> f64 {
        match (self.flush, self.age_at_last_harvest) {
            (0, _) | (_, None) => self.age as f64 - self.time_to_colonize,
            (_, Some(harvested_at)) => (self.age - harvested_at) as f64,
        }
    }

    /// Advance the block by one week.
    ///
    /// Order matters: age, then phase, then the infection roll (colonizing
    /// blocks only), then growth.
    pub fn mature<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.age += 1;
        self.check_phase();
        self.roll_infection(rng);
        self.grow_fruit();
    }

    fn check_phase(&mut self) {
        if !self.infected && self.age as f64 > self.time_to_colonize {
            self.phase = Phase::Fruiting;
        }
    }

    fn roll_infection<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.phase != Phase::Colonizing || self.infected {
            return;
        }
        let draw: f64 = rng.gen();
        if self.p_infection_per_week > 0.0 && draw <= self.p_infection_per_week {
            self.infected = true;
            trace!(block = %self, "block infected");
        }
    }

    fn grow_fruit(&mut self) {
        if self.infected || self.flush >= MAX_FLUSHES || self.age as f64 <= self.time_to_colonize {
            return;
        }
        let t = self.weeks_since_colonization_or_last_harvest();
        self.fruit_weight = grow(
            self.decay_mode,
            t,
            self.flush,
            self.time_to_fruit,
            self.max_lifetime_yield,
        );
    }

    /// Pick the current flush and return its weight.
    ///
    /// Infected blocks yield nothing and are left untouched.
    pub fn harvest(&mut self) -> f64 {
        if self.infected {
            return 0.0;
        }
        let harvested = self.fruit_weight;
        self.fruit_weight = 0.0;
        self.flush += 1;
        self.age_at_last_harvest = Some(self.age);
        self.yield_history.push(harvested);
        self.last_harvested = harvested;
        harvested
    }

    /// Record the current state and clear the harvested amount, so each
    /// snapshot only reports harvests since the previous one.
    pub fn snapshot(&mut self) -> BlockSnapshot {
        let snap = BlockSnapshot {
            block_id: self.id,
            age: self.age,
            phase: self.phase,
            infected: self.infected,
            flush: self.flush,
            substrate_weight: self.substrate_weight,
            fruit_weight: self.fruit_weight,
            harvested: self.last_harvested,
        };
        self.last_harvested = 0.0;
        snap
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let health = if self.infected { "infected" } else { "healthy" };
        write!(
            f,
            "{} | {} | {} | flush {} | age {} | weight {}",
            self.id, health, self.phase, self.flush, self.age, self.fruit_weight
        )
    }
}
