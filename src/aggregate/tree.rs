use std::cmp::Ordering;

use crate::aggregate::record::Record;
use crate::error::{ReportError, Result};
use crate::parse::{station_hash, Reading};

#[derive(Debug)]
struct Node {
    hash: u64,
    record: Record,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(hash: u64, record: Record) -> Box<Self> {
        Box::new(Self {
            hash,
            record,
            left: None,
            right: None,
        })
    }
}

/// Binary search tree of station records keyed by name hash.
///
/// Nodes are ordered by hash, not by name, so lookups compare integers. A hash
/// match whose names differ is reported as [`ReportError::HashCollision`]
/// instead of combining two stations.
#[derive(Debug, Default)]
pub struct Tree {
    root: Option<Box<Node>>,
    len: usize,
}

fn collision(hash: u64, existing: &Record, incoming: &[u8]) -> ReportError {
    ReportError::HashCollision {
        hash,
        existing: existing.station().into_owned(),
        incoming: String::from_utf8_lossy(incoming).into_owned(),
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct stations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn add(&mut self, reading: Reading<'_>) -> Result<()> {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = match reading.hash.cmp(&node.hash) {
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
                Ordering::Equal => {
                    if *node.record.name != *reading.station {
                        return Err(collision(node.hash, &node.record, reading.station));
                    }
                    node.record.observe(reading.temperature);
                    return Ok(());
                }
            };
        }
        *slot = Some(Node::leaf(reading.hash, Record::new(&reading)));
        self.len += 1;
        Ok(())
    }

    /// Moves every node of `other` into `self`, children before parents.
    /// Records of the same station are combined.
    pub fn merge(&mut self, mut other: Tree) -> Result<()> {
        let mut pending: Vec<Box<Node>> = other.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            let (left, right) = (node.left.take(), node.right.take());
            if left.is_none() && right.is_none() {
                self.insert(node)?;
            } else {
                pending.push(node);
                pending.extend(left);
                pending.extend(right);
            }
        }
        Ok(())
    }

    fn insert(&mut self, detached: Box<Node>) -> Result<()> {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = match detached.hash.cmp(&node.hash) {
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
                Ordering::Equal => {
                    if node.record.name != detached.record.name {
                        return Err(collision(node.hash, &node.record, &detached.record.name));
                    }
                    node.record.absorb(&detached.record);
                    return Ok(());
                }
            };
        }
        *slot = Some(detached);
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, name: &[u8]) -> Option<&Record> {
        let hash = station_hash(name);
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = match hash.cmp(&node.hash) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return (*node.record.name == *name).then_some(&node.record),
            };
        }
        None
    }

    /// The hash stored alongside `name`, found by scanning rather than hashing.
    #[cfg(test)]
    pub(crate) fn hash_of(&self, name: &[u8]) -> Option<u64> {
        let mut stack: Vec<&Node> = self.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            if *node.record.name == *name {
                return Some(node.hash);
            }
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
        }
        None
    }

    /// Every record, in no particular order.
    pub(crate) fn collect_into<'a>(&'a self, out: &mut Vec<&'a Record>) {
        let mut stack: Vec<&Node> = self.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            out.push(&node.record);
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
        }
    }

    /// Every record, sorted by the bytes of the station name.
    pub fn flatten(&self) -> Vec<&Record> {
        let mut records = Vec::with_capacity(self.len);
        self.collect_into(&mut records);
        records.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        records
    }

    #[cfg(test)]
    fn is_ordered(&self) -> bool {
        fn check(node: Option<&Node>, low: Option<u64>, high: Option<u64>) -> bool {
            let Some(node) = node else { return true };
            low.map_or(true, |low| node.hash > low)
                && high.map_or(true, |high| node.hash < high)
                && check(node.left.as_deref(), low, Some(node.hash))
                && check(node.right.as_deref(), Some(node.hash), high)
        }
        check(self.root.as_deref(), None, None)
    }
}

impl Drop for Tree {
    // Unlink iteratively so a degenerate, list-shaped tree cannot overflow the
    // stack through recursive Box drops.
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(lines: &[(&str, i16)]) -> Tree {
        let mut tree = Tree::new();
        for &(name, temperature) in lines {
            tree.add(Reading::new(name.as_bytes(), temperature)).unwrap();
        }
        tree
    }

    fn rows(tree: &Tree) -> Vec<(String, i16, i16, i64, u64)> {
        tree.flatten()
            .into_iter()
            .map(|r| (r.station().into_owned(), r.min, r.max, r.sum, r.count))
            .collect()
    }

    #[test]
    fn add_updates_existing_station() {
        let tree = tree_of(&[("x", 42), ("x", 420), ("x", 42), ("x", 69)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(rows(&tree), vec![("x".to_string(), 42, 420, 573, 4)]);
    }

    #[test]
    fn flatten_sorts_by_name_not_hash() {
        let names = ["iii", "aaa", "hhh", "bbb", "ggg", "ccc", "fff", "ddd", "eee", "iii"];
        let tree = tree_of(&names.map(|n| (n, 10)));
        assert!(tree.is_ordered());
        let sorted: Vec<_> = rows(&tree).into_iter().map(|r| (r.0, r.4)).collect();
        assert_eq!(
            sorted,
            vec![
                ("aaa".to_string(), 1),
                ("bbb".to_string(), 1),
                ("ccc".to_string(), 1),
                ("ddd".to_string(), 1),
                ("eee".to_string(), 1),
                ("fff".to_string(), 1),
                ("ggg".to_string(), 1),
                ("hhh".to_string(), 1),
                ("iii".to_string(), 2),
            ]
        );
    }

    #[test]
    fn merge_is_order_independent() {
        let left = [("Athens", 214), ("Bangkok", 265), ("Odesa", -171), ("x", 42)];
        let right = [("Odesa", 171), ("x", 69), ("Erbil", 287), ("Athens", -14)];

        let mut ab = tree_of(&left);
        ab.merge(tree_of(&right)).unwrap();
        let mut ba = tree_of(&right);
        ba.merge(tree_of(&left)).unwrap();
        let mut both = tree_of(&left);
        for &(name, t) in &right {
            both.add(Reading::new(name.as_bytes(), t)).unwrap();
        }

        assert!(ab.is_ordered() && ba.is_ordered());
        assert_eq!(rows(&ab), rows(&ba));
        assert_eq!(rows(&ab), rows(&both));
        assert_eq!(ab.len(), 5);
        assert_eq!(
            ab.get(b"Odesa").map(|r| (r.min, r.max, r.sum, r.count)),
            Some((-171, 171, 0, 2))
        );
    }

    #[test]
    fn merge_with_empty_trees() {
        let mut empty = Tree::new();
        empty.merge(tree_of(&[("x", 1)])).unwrap();
        assert_eq!(empty.len(), 1);

        let mut full = tree_of(&[("x", 1)]);
        full.merge(Tree::new()).unwrap();
        assert_eq!(rows(&full), vec![("x".to_string(), 1, 1, 1, 1)]);
    }

    #[test]
    fn hash_collision_is_fatal() {
        let mut tree = tree_of(&[("Denver", 5)]);
        let forged = Reading {
            station: b"Boulder",
            temperature: 7,
            hash: station_hash(b"Denver"),
        };
        let err = tree.add(forged).unwrap_err();
        assert!(matches!(
            err,
            ReportError::HashCollision { ref existing, ref incoming, .. }
                if existing == "Denver" && incoming == "Boulder"
        ));

        let mut other = Tree::new();
        other.add(forged).unwrap();
        assert!(matches!(tree.merge(other), Err(ReportError::HashCollision { .. })));
    }

    #[test]
    fn get_and_hash_of_agree_with_station_hash() {
        let tree = tree_of(&[("Jerusalem", 258), ("La Paz", 261)]);
        assert_eq!(tree.get(b"La Paz").map(|r| r.sum), Some(261));
        assert_eq!(tree.get(b"Lima"), None);
        assert_eq!(tree.hash_of(b"Jerusalem"), Some(station_hash(b"Jerusalem")));
    }

    #[test]
    fn degenerate_tree_drops_without_recursion() {
        let mut root = None;
        for hash in (0..1_000_000u64).rev() {
            let mut node = Node::leaf(hash, Record::new(&Reading::new(b"s", 0)));
            node.right = root;
            root = Some(node);
        }
        let tree = Tree { root, len: 1_000_000 };
        assert_eq!(tree.len(), 1_000_000);
        drop(tree);
    }
}
