// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use crate::{
    classify, Interval, IntervalEntry, IntervalTree, NamedChildren, NodeId, SegmentKind,
};

/// Name of the root node.
pub const ROOT_NODE_NAME: &str = "root";

/// Node record as stored in a [`NodeRepository`](crate::NodeRepository).
///
/// The children of a node are partitioned by their [`SegmentKind`]:
/// named children are addressed by name, point and range children
/// by their exact interval in the interval tree of the node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Identifier for direct lookup.
    pub id: NodeId,

    /// The raw path segment of this node.
    pub name: String,

    /// Classification of `name`, derived once on creation.
    pub kind: SegmentKind,

    /// Link to the parent node.
    ///
    /// Must be `None` for the root node and `Some` for all other nodes.
    pub parent_id: Option<NodeId>,

    pub named_children: NamedChildren,

    /// Created lazily when the first point or range child is attached.
    pub interval_children: Option<IntervalTree>,

    /// Delimited ids from the root down to and including this node.
    pub path: String,

    /// Delimited names from the root down to and including this node.
    pub name_path: String,
}

impl Node {
    pub(crate) fn new_root(id: NodeId) -> Self {
        Self {
            id,
            name: ROOT_NODE_NAME.to_owned(),
            kind: SegmentKind::Name,
            parent_id: None,
            named_children: NamedChildren::default(),
            interval_children: None,
            path: id.to_string(),
            name_path: ROOT_NODE_NAME.to_owned(),
        }
    }

    /// Create a detached child node.
    ///
    /// The child is linked to the parent only after it has been
    /// attached with [`Node::attach_child()`].
    pub(crate) fn new_child(id: NodeId, name: &str, parent: &Self, delimiter: char) -> Self {
        let Self {
            path: parent_path,
            name_path: parent_name_path,
            ..
        } = parent;
        Self {
            id,
            name: name.to_owned(),
            kind: classify(name),
            parent_id: None,
            named_children: NamedChildren::default(),
            interval_children: None,
            path: format!("{parent_path}{delimiter}{id}"),
            name_path: format!("{parent_name_path}{delimiter}{name}"),
        }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The numeric bounds of a point or range node.
    #[must_use]
    pub fn bounds(&self) -> Option<Interval> {
        self.kind.interval()
    }

    #[must_use]
    pub const fn has_interval_tree(&self) -> bool {
        self.interval_children.is_some()
    }

    /// Number of direct children, both named and numeric.
    #[must_use]
    pub fn count_children(&self) -> usize {
        self.named_children.len() + self.interval_children.as_ref().map_or(0, IntervalTree::len)
    }

    /// Ids of all direct children.
    ///
    /// Named children come first in creation order, followed by
    /// the interval children in tree order.
    pub fn child_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.named_children.node_ids().chain(
            self.interval_children
                .iter()
                .flat_map(IntervalTree::iter)
                .map(|entry| entry.node_id),
        )
    }

    /// Look up the id of a direct child by its path segment.
    ///
    /// Numeric segments only match an interval child with exactly the same
    /// bounds, not merely an overlapping one.
    #[must_use]
    pub fn find_child(&self, segment: &str) -> Option<NodeId> {
        let kind = classify(segment);
        if kind.is_name() {
            return self.named_children.get(segment);
        }
        let interval = kind.interval()?;
        self.interval_children
            .as_ref()?
            .find_exact(interval)
            .map(|entry| entry.node_id)
    }

    /// Interval siblings stored in the interval tree of this node that
    /// overlap the given bounds.
    pub(crate) fn overlapping_child_node_ids(
        &self,
        bounds: Interval,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.interval_children
            .iter()
            .flat_map(move |tree| tree.query_overlap(bounds))
            .map(|entry| entry.node_id)
    }

    /// Link the child to this node.
    ///
    /// Returns `false` without modifying any node if this node already has
    /// a child with the same name or interval, or if the child has inverted
    /// range bounds.
    pub(crate) fn attach_child(&mut self, child: &mut Self) -> bool {
        if child.kind.is_name() {
            if !self.named_children.push(child.name.clone(), child.id) {
                return false;
            }
        } else {
            let Some(interval) = child.bounds() else {
                return false;
            };
            let interval_children = self.interval_children.get_or_insert_with(IntervalTree::new);
            if interval_children.find_exact(interval).is_some() {
                return false;
            }
            interval_children.insert(IntervalEntry::new(interval, child.id));
        }
        child.parent_id = Some(self.id);
        true
    }

    /// Unlink the child from this node.
    ///
    /// Returns `false` if the child was not found.
    pub(crate) fn detach_child(&mut self, child: &Self) -> bool {
        if child.kind.is_name() {
            return self.named_children.remove(&child.name, child.id);
        }
        let (Some(interval), Some(interval_children)) =
            (child.bounds(), self.interval_children.as_mut())
        else {
            return false;
        };
        interval_children.remove(&IntervalEntry::new(interval, child.id))
    }
}
