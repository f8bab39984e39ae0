//! Per-week aggregates of a dataset.
//!
//! Summaries are keyed by `(replication, week)` and come out in that order.

use flush_runtime::Dataset;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Harvest totals of one replication-week.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HarvestSummary {
    pub replication: u32,
    pub week: u32,
    /// Grams picked this week.
    pub harvested: f64,
    /// Grams standing on the blocks after harvest.
    pub fruit_weight: f64,
}

/// Block counts of one replication-week.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockSummary {
    pub replication: u32,
    pub week: u32,
    pub number_of_blocks: usize,
    /// Highest block id present.
    pub last_block: u64,
    pub number_of_infected_blocks: usize,
    /// Blocks inserted this week, seen as rows of age 0.
    pub number_of_new_blocks: usize,
}

/// Distribution of one metric over replications for a single week.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeekStats {
    pub week: u32,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Sum harvested and standing fruit weight per replication-week.
pub fn harvest_summary(dataset: &Dataset) -> Vec<HarvestSummary> {
    let mut groups: BTreeMap<(u32, u32), (f64, f64)> = BTreeMap::new();
    for row in dataset {
        let entry = groups.entry((row.replication, row.week)).or_default();
        entry.0 += row.harvested;
        entry.1 += row.fruit_weight;
    }
    groups
        .into_iter()
        .map(|((replication, week), (harvested, fruit_weight))| HarvestSummary {
            replication,
            week,
            harvested,
            fruit_weight,
        })
        .collect()
}

#[derive(Default)]
struct BlockGroup {
    ids: BTreeSet<u64>,
    infected: usize,
    new: usize,
}

/// Count blocks, infected blocks and newly created blocks per replication-week.
///
/// A block is snapshotted in the week it is inserted before it first matures,
/// so new blocks are the rows of age 0. Block ids are not used for this since
/// parallel replications interleave them.
pub fn block_summary(dataset: &Dataset) -> Vec<BlockSummary> {
    let mut groups: BTreeMap<(u32, u32), BlockGroup> = BTreeMap::new();
    for row in dataset {
        let group = groups.entry((row.replication, row.week)).or_default();
        group.ids.insert(row.block_id.0);
        if row.infected {
            group.infected += 1;
        }
        if row.age == 0 {
            group.new += 1;
        }
    }

    groups
        .into_iter()
        .map(|((replication, week), group)| BlockSummary {
            replication,
            week,
            number_of_blocks: group.ids.len(),
            last_block: group.ids.last().copied().unwrap_or_default(),
            number_of_infected_blocks: group.infected,
            number_of_new_blocks: group.new,
        })
        .collect()
}

/// Per-week distribution of `(week, value)` points, one point per replication.
///
/// Quartiles interpolate linearly between order statistics.
pub fn weekly_distribution<I>(points: I) -> Vec<WeekStats>
where
    I: IntoIterator<Item = (u32, f64)>,
{
    let mut by_week: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (week, value) in points {
        by_week.entry(week).or_default().push(value);
    }
    by_week
        .into_iter()
        .map(|(week, mut values)| {
            values.sort_by(f64::total_cmp);
            let count = values.len();
            WeekStats {
                week,
                count,
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[count - 1],
                mean: values.iter().sum::<f64>() / count as f64,
            }
        })
        .collect()
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
