// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use std::{cmp::Ordering, iter::Rev, slice};

use crate::{Interval, NodeId};

/// Interval of a child node, stored in the interval tree of its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalEntry {
    pub interval: Interval,
    pub node_id: NodeId,
}

impl IntervalEntry {
    #[must_use]
    pub const fn new(interval: Interval, node_id: NodeId) -> Self {
        Self { interval, node_id }
    }
}

fn cmp_by_low(lhs: &IntervalEntry, rhs: &IntervalEntry) -> Ordering {
    lhs.interval
        .cmp_low_high(&rhs.interval)
        .then_with(|| lhs.node_id.cmp(&rhs.node_id))
}

fn cmp_by_high(lhs: &IntervalEntry, rhs: &IntervalEntry) -> Ordering {
    lhs.interval
        .cmp_high_low(&rhs.interval)
        .then_with(|| lhs.node_id.cmp(&rhs.node_id))
}

/// Centered interval tree over the interval children of a single node.
///
/// Every tree node stores the entries that contain its midpoint twice:
/// sorted ascending by their low bound and sorted ascending by their high
/// bound. Entries entirely left or right of the midpoint are delegated to
/// the corresponding subtree. Subtrees are rebuilt around the median of
/// their endpoints whenever one side outweighs the other.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalTree {
    root: Option<Box<IntervalTreeNode>>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct IntervalTreeNode {
    mid: f64,

    /// Number of entries in this subtree, including all descendants.
    count: usize,

    left: Option<Box<IntervalTreeNode>>,
    right: Option<Box<IntervalTreeNode>>,

    /// Entries containing `mid`, ascending by low bound.
    left_points: Vec<IntervalEntry>,

    /// Same entries as `left_points`, ascending by high bound.
    right_points: Vec<IntervalEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    NotFound,
    Removed,
    Emptied,
}

impl IntervalTreeNode {
    fn build(entries: Vec<IntervalEntry>) -> Option<Box<Self>> {
        if entries.is_empty() {
            return None;
        }
        let mut bounds = entries
            .iter()
            .flat_map(|entry| [entry.interval.low(), entry.interval.high()])
            .collect::<Vec<_>>();
        bounds.sort_unstable_by(f64::total_cmp);
        // The median is a bound of at least one entry that will stay here
        let mid = bounds[bounds.len() / 2];
        let count = entries.len();
        let mut left_entries = Vec::new();
        let mut right_entries = Vec::new();
        let mut center_entries = Vec::new();
        for entry in entries {
            if entry.interval.high() < mid {
                left_entries.push(entry);
            } else if mid < entry.interval.low() {
                right_entries.push(entry);
            } else {
                center_entries.push(entry);
            }
        }
        let mut left_points = center_entries.clone();
        left_points.sort_unstable_by(cmp_by_low);
        let mut right_points = center_entries;
        right_points.sort_unstable_by(cmp_by_high);
        Some(Box::new(Self {
            mid,
            count,
            left: Self::build(left_entries),
            right: Self::build(right_entries),
            left_points,
            right_points,
        }))
    }

    fn collect_entries(&self, entries: &mut Vec<IntervalEntry>) {
        entries.extend_from_slice(&self.left_points);
        if let Some(left) = &self.left {
            left.collect_entries(entries);
        }
        if let Some(right) = &self.right {
            right.collect_entries(entries);
        }
    }

    fn rebuild_with(&mut self, entry: IntervalEntry) {
        let mut entries = Vec::with_capacity(self.count + 1);
        self.collect_entries(&mut entries);
        entries.push(entry);
        if let Some(rebuilt) = Self::build(entries) {
            *self = *rebuilt;
        }
    }

    fn rebuild_without(&mut self, entry: &IntervalEntry) -> Removal {
        let mut entries = Vec::with_capacity(self.count);
        self.collect_entries(&mut entries);
        let Some(index) = entries.iter().position(|candidate| candidate == entry) else {
            return Removal::NotFound;
        };
        entries.swap_remove(index);
        match Self::build(entries) {
            Some(rebuilt) => {
                *self = *rebuilt;
                Removal::Removed
            }
            None => Removal::Emptied,
        }
    }

    /// Number of entries stored in the subtrees.
    fn weight(&self) -> usize {
        self.count - self.left_points.len()
    }

    fn insert(&mut self, entry: IntervalEntry) {
        let weight = self.weight();
        self.count += 1;
        if entry.interval.high() < self.mid {
            if let Some(left) = &self.left {
                if 4 * (left.count + 1) > 3 * (weight + 1) {
                    log::trace!("Rebuilding left-heavy subtree at {mid}", mid = self.mid);
                    self.rebuild_with(entry);
                    return;
                }
            }
            if let Some(left) = &mut self.left {
                left.insert(entry);
            } else {
                self.left = Self::build(vec![entry]);
            }
        } else if self.mid < entry.interval.low() {
            if let Some(right) = &self.right {
                if 4 * (right.count + 1) > 3 * (weight + 1) {
                    log::trace!("Rebuilding right-heavy subtree at {mid}", mid = self.mid);
                    self.rebuild_with(entry);
                    return;
                }
            }
            if let Some(right) = &mut self.right {
                right.insert(entry);
            } else {
                self.right = Self::build(vec![entry]);
            }
        } else {
            let index = self
                .left_points
                .partition_point(|point| cmp_by_low(point, &entry).is_lt());
            self.left_points.insert(index, entry);
            let index = self
                .right_points
                .partition_point(|point| cmp_by_high(point, &entry).is_lt());
            self.right_points.insert(index, entry);
        }
    }

    fn remove(&mut self, entry: &IntervalEntry) -> Removal {
        let weight = self.weight();
        if entry.interval.high() < self.mid {
            let right_count = self.right.as_ref().map_or(0, |right| right.count);
            let Some(left) = &mut self.left else {
                return Removal::NotFound;
            };
            if 4 * right_count > 3 * weight.saturating_sub(1) {
                return self.rebuild_without(entry);
            }
            match left.remove(entry) {
                Removal::NotFound => Removal::NotFound,
                Removal::Removed => {
                    self.count -= 1;
                    Removal::Removed
                }
                Removal::Emptied => {
                    self.left = None;
                    self.count -= 1;
                    Removal::Removed
                }
            }
        } else if self.mid < entry.interval.low() {
            let left_count = self.left.as_ref().map_or(0, |left| left.count);
            let Some(right) = &mut self.right else {
                return Removal::NotFound;
            };
            if 4 * left_count > 3 * weight.saturating_sub(1) {
                return self.rebuild_without(entry);
            }
            match right.remove(entry) {
                Removal::NotFound => Removal::NotFound,
                Removal::Removed => {
                    self.count -= 1;
                    Removal::Removed
                }
                Removal::Emptied => {
                    self.right = None;
                    self.count -= 1;
                    Removal::Removed
                }
            }
        } else {
            let Ok(left_index) = self
                .left_points
                .binary_search_by(|point| cmp_by_low(point, entry))
            else {
                return Removal::NotFound;
            };
            if self.left_points.len() == 1 {
                // The midpoint would no longer be covered by any entry
                return self.rebuild_without(entry);
            }
            self.left_points.remove(left_index);
            let right_index = self
                .right_points
                .binary_search_by(|point| cmp_by_high(point, entry));
            debug_assert!(right_index.is_ok());
            if let Ok(right_index) = right_index {
                self.right_points.remove(right_index);
            }
            self.count -= 1;
            Removal::Removed
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        1 + self
            .left
            .as_ref()
            .map_or(0, |left| left.depth())
            .max(self.right.as_ref().map_or(0, |right| right.depth()))
    }
}

impl IntervalTree {
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.count)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn insert(&mut self, entry: IntervalEntry) {
        if let Some(root) = &mut self.root {
            root.insert(entry);
        } else {
            self.root = IntervalTreeNode::build(vec![entry]);
        }
    }

    /// Remove an entry that matches exactly, including the node id.
    ///
    /// Returns `false` if no such entry exists.
    pub fn remove(&mut self, entry: &IntervalEntry) -> bool {
        let Some(root) = &mut self.root else {
            return false;
        };
        match root.remove(entry) {
            Removal::NotFound => false,
            Removal::Removed => true,
            Removal::Emptied => {
                self.root = None;
                true
            }
        }
    }

    /// All entries that intersect the closed query interval.
    ///
    /// Entries of a single tree node are reported in the order of its sorted
    /// point lists. The order across tree nodes is unspecified.
    #[must_use]
    pub fn query_overlap(&self, query: Interval) -> Overlapping<'_> {
        Overlapping {
            query,
            pending_nodes: self.root.as_deref().into_iter().collect(),
            scan: Scan::Done,
        }
    }

    /// All entries in unspecified order.
    #[must_use]
    pub fn iter(&self) -> Overlapping<'_> {
        self.query_overlap(Interval::UNBOUNDED)
    }

    /// Find the entry with exactly the given bounds.
    #[must_use]
    pub fn find_exact(&self, interval: Interval) -> Option<&IntervalEntry> {
        self.query_overlap(interval)
            .find(|entry| entry.interval == interval)
    }
}

impl<'a> IntoIterator for &'a IntervalTree {
    type Item = &'a IntervalEntry;
    type IntoIter = Overlapping<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
enum Scan<'a> {
    Done,
    /// Report while `low <= query.high`.
    Ascending(slice::Iter<'a, IntervalEntry>),
    /// Report while `high >= query.low`.
    Descending(Rev<slice::Iter<'a, IntervalEntry>>),
    All(slice::Iter<'a, IntervalEntry>),
}

/// Lazy overlap query, see [`IntervalTree::query_overlap()`].
#[derive(Debug)]
pub struct Overlapping<'a> {
    query: Interval,
    pending_nodes: Vec<&'a IntervalTreeNode>,
    scan: Scan<'a>,
}

impl<'a> Overlapping<'a> {
    fn visit(&mut self, node: &'a IntervalTreeNode) {
        let query = self.query;
        // Subtrees that cannot contain an overlapping entry are never visited
        if query.low() < node.mid {
            if let Some(left) = node.left.as_deref() {
                self.pending_nodes.push(left);
            }
        }
        if query.high() > node.mid {
            if let Some(right) = node.right.as_deref() {
                self.pending_nodes.push(right);
            }
        }
        self.scan = if query.high() < node.mid {
            Scan::Ascending(node.left_points.iter())
        } else if query.low() > node.mid {
            Scan::Descending(node.right_points.iter().rev())
        } else {
            // The query contains the midpoint and thereby all entries of this node
            Scan::All(node.left_points.iter())
        };
    }
}

impl<'a> Iterator for Overlapping<'a> {
    type Item = &'a IntervalEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let query = self.query;
            let next = match &mut self.scan {
                Scan::Done => None,
                Scan::Ascending(entries) => entries
                    .next()
                    .filter(|entry| entry.interval.low() <= query.high()),
                Scan::Descending(entries) => entries
                    .next()
                    .filter(|entry| entry.interval.high() >= query.low()),
                Scan::All(entries) => entries.next(),
            };
            if next.is_some() {
                return next;
            }
            self.scan = Scan::Done;
            let node = self.pending_nodes.pop()?;
            self.visit(node);
        }
    }
}
