use crate::aggregate::record::Record;
use crate::aggregate::tree::Tree;
use crate::error::{ReportError, Result};
use crate::parse::{station_hash, Reading};

/// A fixed number of [`Tree`]s indexed by `hash % buckets`.
///
/// Behaves as one logical tree; the buckets only keep each search shallow.
#[derive(Debug)]
pub struct StationTable {
    trees: Vec<Tree>,
}

impl StationTable {
    pub fn new(buckets: usize) -> Self {
        Self {
            trees: (0..buckets.max(1)).map(|_| Tree::new()).collect(),
        }
    }

    pub fn buckets(&self) -> usize {
        self.trees.len()
    }

    pub fn len(&self) -> usize {
        self.trees.iter().map(Tree::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.iter().all(Tree::is_empty)
    }

    fn bucket(&self, hash: u64) -> usize {
        (hash % self.trees.len() as u64) as usize
    }

    #[inline]
    pub fn add(&mut self, reading: Reading<'_>) -> Result<()> {
        let bucket = self.bucket(reading.hash);
        self.trees[bucket].add(reading)
    }

    /// Drains `other` into `self`, bucket by bucket.
    pub fn merge(&mut self, other: StationTable) -> Result<()> {
        if other.buckets() != self.buckets() {
            return Err(ReportError::InvalidSetting(format!(
                "cannot merge a table of {} buckets into one of {}",
                other.buckets(),
                self.buckets()
            )));
        }
        for (tree, theirs) in self.trees.iter_mut().zip(other.trees) {
            tree.merge(theirs)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &[u8]) -> Option<&Record> {
        self.trees[self.bucket(station_hash(name))].get(name)
    }

    #[cfg(test)]
    pub(crate) fn hash_of(&self, name: &[u8]) -> Option<u64> {
        self.trees.iter().find_map(|tree| tree.hash_of(name))
    }

    /// Every record across all buckets, sorted by station name.
    pub fn flatten(&self) -> Vec<&Record> {
        let mut records = Vec::with_capacity(self.len());
        for tree in &self.trees {
            tree.collect_into(&mut records);
        }
        records.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        records
    }
}
