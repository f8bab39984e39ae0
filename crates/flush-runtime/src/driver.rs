//! Replicated weekly simulation loop.

use crate::config::{SimError, SimulationParams};
use crate::dataset::{Dataset, DatasetRow};
use crate::policy::BlockPolicy;
use flush_core::{BlockIds, Population};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Random stream of one replication: stream `replication` of `seed`.
pub fn replication_rng(seed: u64, replication: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(replication as u64);
    rng
}

/// Runs replications and owns the block id generator they share.
///
/// Ids are not reset between replications or between calls to
/// [`Simulator::run`], so every row of every dataset produced by one
/// simulator carries a distinct `block_id`.
#[derive(Debug)]
pub struct Simulator {
    params: SimulationParams,
    ids: BlockIds,
}

impl Simulator {
    /// Validate `params` and build a simulator whose ids start at 1.
    pub fn new(params: SimulationParams) -> Result<Self, SimError> {
        Self::with_ids(params, BlockIds::new())
    }

    pub fn with_ids(params: SimulationParams, ids: BlockIds) -> Result<Self, SimError> {
        params.block.validate()?;
        Ok(Self { params, ids })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn ids(&self) -> &BlockIds {
        &self.ids
    }

    /// Run every replication in order on the current thread.
    pub fn run<H, D>(&self, harvest: &H, removal: &D) -> Result<Dataset, SimError>
    where
        H: BlockPolicy + ?Sized,
        D: BlockPolicy + ?Sized,
    {
        let first_id = self.start(harvest, removal, false)?;
        let mut rows = Vec::new();
        for replication in 0..self.params.replications {
            rows.extend(self.run_replication(replication, harvest, removal)?);
        }
        Ok(self.finish(rows, first_id))
    }

    /// Run replications as independent rayon tasks.
    ///
    /// Rows are concatenated in replication order once all tasks finish.
    /// Random streams match [`Simulator::run`]; block ids stay unique but are
    /// interleaved between replications.
    pub fn run_parallel<H, D>(&self, harvest: &H, removal: &D) -> Result<Dataset, SimError>
    where
        H: BlockPolicy + ?Sized,
        D: BlockPolicy + ?Sized,
    {
        let first_id = self.start(harvest, removal, true)?;
        let per_replication = (0..self.params.replications)
            .into_par_iter()
            .map(|replication| self.run_replication(replication, harvest, removal))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.finish(
            per_replication.into_iter().flatten().collect(),
            first_id,
        ))
    }

    /// Check the policies and log the run parameters. Returns the first id
    /// this run will hand out.
    fn start<H, D>(&self, harvest: &H, removal: &D, parallel: bool) -> Result<u64, SimError>
    where
        H: BlockPolicy + ?Sized,
        D: BlockPolicy + ?Sized,
    {
        harvest.validate()?;
        removal.validate()?;
        info!(
            replications = self.params.replications,
            weeks = self.params.weeks,
            blocks_per_week = self.params.blocks_per_week,
            capacity = ?self.params.capacity,
            seed = self.params.seed,
            simulation_mode = %self.params.block.simulation_mode,
            yield_decay_mode = %self.params.block.yield_decay_mode,
            parallel,
            "starting simulation"
        );
        Ok(self.ids.peek().0)
    }

    fn finish(&self, rows: Vec<DatasetRow>, first_id: u64) -> Dataset {
        info!(
            rows = rows.len(),
            blocks_created = self.ids.peek().0 - first_id,
            "simulation finished"
        );
        Dataset::from_rows(rows)
    }

    /// One replication: a fresh population driven through every week.
    ///
    /// Each week inserts, harvests, snapshots, removes and then matures, in
    /// that order. The snapshot precedes removal so a block's final week is
    /// still recorded.
    pub fn run_replication<H, D>(
        &self,
        replication: u32,
        harvest: &H,
        removal: &D,
    ) -> Result<Vec<DatasetRow>, SimError>
    where
        H: BlockPolicy + ?Sized,
        D: BlockPolicy + ?Sized,
    {
        let mut rng = replication_rng(self.params.seed, replication);
        let mut population = Population::new(replication, self.params.capacity);
        let mut rows = Vec::new();

        for week in 0..self.params.weeks {
            population.insert(
                self.params.blocks_per_week,
                &self.params.block,
                &self.ids,
                &mut rng,
            )?;
            population.harvest(|b| harvest.matches(b));
            rows.extend(
                population
                    .snapshot_all()
                    .into_iter()
                    .map(|snap| DatasetRow::from_snapshot(replication, week, snap)),
            );
            population.remove(|b| removal.matches(b));
            population.pass_time(&mut rng);
        }

        debug!(
            replication,
            rows = rows.len(),
            live_blocks = population.len(),
            "replication finished"
        );
        Ok(rows)
    }
}
