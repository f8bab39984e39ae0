//! Tabular simulation output.

use flush_core::{BlockId, BlockSnapshot, Phase};
use serde::{Deserialize, Serialize};

/// Column names of exported tables, in order.
pub const COLUMNS: [&str; 10] = [
    "replication",
    "week",
    "block_id",
    "substrate_weight",
    "age",
    "phase",
    "infected",
    "flush",
    "fruit_weight",
    "harvested",
];

/// One block's state in one week of one replication.
///
/// Field order is the column order of exported tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub replication: u32,
    pub week: u32,
    pub block_id: BlockId,
    pub substrate_weight: f64,
    pub age: u32,
    pub phase: Phase,
    pub infected: bool,
    pub flush: u32,
    pub fruit_weight: f64,
    pub harvested: f64,
}

impl DatasetRow {
    pub fn from_snapshot(replication: u32, week: u32, snap: BlockSnapshot) -> Self {
        Self {
            replication,
            week,
            block_id: snap.block_id,
            substrate_weight: snap.substrate_weight,
            age: snap.age,
            phase: snap.phase,
            infected: snap.infected,
            flush: snap.flush,
            fruit_weight: snap.fruit_weight,
            harvested: snap.harvested,
        }
    }
}

/// Rows of a finished simulation, ordered by replication, week, then block
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetRow> {
        self.rows.iter()
    }

    /// Rows of a single replication and week.
    pub fn week(&self, replication: u32, week: u32) -> impl Iterator<Item = &DatasetRow> {
        self.rows
            .iter()
            .filter(move |r| r.replication == replication && r.week == week)
    }

    pub fn into_rows(self) -> Vec<DatasetRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DatasetRow;
    type IntoIter = std::slice::Iter<'a, DatasetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<DatasetRow> for Dataset {
    fn from_iter<I: IntoIterator<Item = DatasetRow>>(iter: I) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}
