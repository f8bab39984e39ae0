//! Bounded collection of the blocks live in one replication.

use crate::block::{Block, BlockIds, BlockSnapshot};
use crate::config::{BlockConfig, ConfigError};
use rand::Rng;
use tracing::warn;

/// Outcome of an insertion request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Blocks actually created.
    pub inserted: usize,
    /// Requests dropped because the population was full.
    pub dropped: usize,
}

/// Ordered set of blocks with an optional capacity.
///
/// Blocks keep their insertion order. Inserting into a full population drops
/// the request with a warning instead of failing.
#[derive(Clone, Debug)]
pub struct Population {
    id: u32,
    capacity: Option<usize>,
    blocks: Vec<Block>,
}

impl Population {
    pub fn new(id: u32, capacity: Option<usize>) -> Self {
        Self {
            id,
            capacity,
            blocks: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Maximum number of blocks, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    fn has_room(&self) -> bool {
        self.capacity.map_or(true, |cap| self.blocks.len() < cap)
    }

    /// Create up to `n` blocks, stopping once the population is full.
    pub fn insert<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        config: &BlockConfig,
        ids: &BlockIds,
        rng: &mut R,
    ) -> Result<InsertReport, ConfigError> {
        let mut report = InsertReport::default();
        for _ in 0..n {
            if !self.has_room() {
                report.dropped = n - report.inserted;
                break;
            }
            self.blocks.push(Block::create(config, ids, rng)?);
            report.inserted += 1;
        }
        if report.dropped > 0 {
            warn!(
                population = self.id,
                requested = n,
                inserted = report.inserted,
                dropped = report.dropped,
                capacity = ?self.capacity,
                "population at capacity, dropping block insertions"
            );
        }
        Ok(report)
    }

    /// Harvest every block matching `predicate` and return the total weight.
    pub fn harvest<P>(&mut self, mut predicate: P) -> f64
    where
        P: FnMut(&Block) -> bool,
    {
        let mut total = 0.0;
        for block in &mut self.blocks {
            if predicate(&*block) {
                total += block.harvest();
            }
        }
        total
    }

    /// Drop every block matching `predicate`; returns how many were removed.
    ///
    /// The retained blocks are rebuilt in one pass, so each block is tested
    /// exactly once whatever is removed around it.
    pub fn remove<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&Block) -> bool,
    {
        let before = self.blocks.len();
        self.blocks.retain(|block| !predicate(block));
        before - self.blocks.len()
    }

    /// Advance every block by one week.
    pub fn pass_time<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for block in &mut self.blocks {
            block.mature(rng);
        }
    }

    /// Weight that would be picked if every block were harvested now.
    pub fn total_yield(&self) -> f64 {
        self.blocks.iter().map(Block::fruit_weight).sum()
    }

    /// Snapshot every block in insertion order.
    pub fn snapshot_all(&mut self) -> Vec<BlockSnapshot> {
        self.blocks.iter_mut().map(Block::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockId, Phase};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Run `f` and count the warnings it logs.
    fn warnings_during(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(count.clone()));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    fn healthy() -> BlockConfig {
        BlockConfig {
            p_infection: 0.0,
            ..BlockConfig::default()
        }
    }

    #[test]
    fn fills_to_capacity_without_drops() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pop = Population::new(0, Some(5));
        let report = pop.insert(5, &healthy(), &ids, &mut rng).unwrap();
        assert_eq!(pop.len(), 5);
        assert_eq!(
            report,
            InsertReport {
                inserted: 5,
                dropped: 0
            }
        );
    }

    #[test]
    fn overflow_is_dropped() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pop = Population::new(0, Some(5));
        pop.insert(3, &healthy(), &ids, &mut rng).unwrap();
        let report = pop.insert(4, &healthy(), &ids, &mut rng).unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.dropped, 2);
        assert_eq!(pop.len(), 5);
        // dropped requests do not consume ids
        assert_eq!(ids.peek(), BlockId(6));
    }

    #[test]
    fn only_overflow_logs_a_warning() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pop = Population::new(0, Some(5));
        let exact = warnings_during(|| {
            pop.insert(5, &healthy(), &ids, &mut rng).unwrap();
        });
        assert_eq!(exact, 0);
        let over = warnings_during(|| {
            pop.insert(2, &healthy(), &ids, &mut rng).unwrap();
        });
        assert_eq!(over, 1);
        assert_eq!(pop.len(), 5);
    }

    #[test]
    fn unbounded_accepts_everything() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pop = Population::new(0, None);
        assert!(pop.is_empty());
        pop.insert(1_000, &healthy(), &ids, &mut rng).unwrap();
        assert_eq!(pop.len(), 1_000);
        assert_eq!(pop.capacity(), None);
    }

    #[test]
    fn invalid_config_fails_insert() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pop = Population::new(0, None);
        let cfg = BlockConfig {
            simulation_mode: crate::config::SimulationMode::Random,
            lifetime_yield_std: -3.0,
            ..BlockConfig::default()
        };
        assert!(pop.insert(2, &cfg, &ids, &mut rng).is_err());
    }

    #[test]
    fn harvest_sums_matching_blocks_only() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut pop = Population::new(0, None);
        pop.insert(4, &healthy(), &ids, &mut rng).unwrap();
        for _ in 0..6 {
            pop.pass_time(&mut rng);
        }
        assert_eq!(pop.total_yield(), 4.0 * 125.0);
        let total = pop.harvest(|b| b.id().0 % 2 == 0);
        assert_eq!(total, 2.0 * 125.0);
        assert_eq!(pop.total_yield(), 2.0 * 125.0);
        let flushes: Vec<u32> = pop.iter().map(Block::flush).collect();
        assert_eq!(flushes, vec![0, 1, 0, 1]);
    }

    #[test]
    fn pass_time_ages_every_block() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut pop = Population::new(0, None);
        pop.insert(3, &healthy(), &ids, &mut rng).unwrap();
        pop.pass_time(&mut rng);
        pop.insert(2, &healthy(), &ids, &mut rng).unwrap();
        pop.pass_time(&mut rng);
        let ages: Vec<u32> = pop.iter().map(Block::age).collect();
        assert_eq!(ages, vec![2, 2, 2, 1, 1]);
    }

    #[test]
    fn snapshots_follow_insertion_order() {
        let ids = BlockIds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut pop = Population::new(0, None);
        pop.insert(3, &healthy(), &ids, &mut rng).unwrap();
        let snaps = pop.snapshot_all();
        let got: Vec<u64> = snaps.iter().map(|s| s.block_id.0).collect();
        assert_eq!(got, vec![1, 2, 3]);
        assert!(snaps.iter().all(|s| s.phase == Phase::Colonizing && s.age == 0));
    }

    proptest! {
        #[test]
        fn remove_drops_exactly_the_matching_subset(n in 0usize..60,
                                                    mask in proptest::collection::vec(any::<bool>(), 60),
                                                    seed in any::<u64>()) {
            let ids = BlockIds::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut pop = Population::new(0, None);
            pop.insert(n, &BlockConfig::default(), &ids, &mut rng).unwrap();
            let doomed: BTreeSet<BlockId> = pop
                .iter()
                .filter(|b| mask[(b.id().0 - 1) as usize])
                .map(Block::id)
                .collect();
            let expected: Vec<BlockId> = pop
                .iter()
                .map(Block::id)
                .filter(|id| !doomed.contains(id))
                .collect();
            let removed = pop.remove(|b| doomed.contains(&b.id()));
            let remaining: Vec<BlockId> = pop.iter().map(Block::id).collect();
            prop_assert_eq!(removed, doomed.len());
            prop_assert_eq!(remaining, expected);
        }

        #[test]
        fn size_never_exceeds_capacity(cap in 0usize..20,
                                       batches in proptest::collection::vec(0usize..10, 1..10)) {
            let ids = BlockIds::new();
            let mut rng = ChaCha8Rng::seed_from_u64(9);
            let mut pop = Population::new(0, Some(cap));
            for n in batches {
                let before = pop.len();
                let report = pop.insert(n, &healthy(), &ids, &mut rng).unwrap();
                prop_assert!(pop.len() <= cap);
                prop_assert_eq!(report.inserted + report.dropped, n);
                prop_assert_eq!(pop.len(), before + report.inserted);
            }
        }
    }
}
