// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use std::{convert::Infallible, sync::Arc};

use crate::{HashMap, Node, NodeId};

/// Storage of node records.
///
/// The tree only reads and writes whole node records. Every write
/// receives the complete new state of the node, including its
/// children structures.
pub trait NodeRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a single node.
    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, Self::Error>;

    /// Load multiple nodes at once.
    ///
    /// Unknown ids are skipped. The order of the results is unspecified.
    fn find_by_ids(&self, ids: &[NodeId]) -> Result<Vec<Node>, Self::Error>;

    /// Load an arbitrary node, if any.
    fn find_first(&self) -> Result<Option<Node>, Self::Error>;

    /// Insert or replace a node.
    fn save(&mut self, node: &Node) -> Result<(), Self::Error>;

    /// Insert or replace multiple nodes as a single unit.
    ///
    /// The default implementation saves the nodes one after another
    /// and does not provide any atomicity guarantees.
    fn save_all(&mut self, nodes: &[&Node]) -> Result<(), Self::Error> {
        for node in nodes {
            self.save(node)?;
        }
        Ok(())
    }

    /// Delete a node.
    ///
    /// Deleting an unknown node is not an error.
    fn delete(&mut self, id: NodeId) -> Result<(), Self::Error>;
}

/// Volatile repository that keeps all nodes in memory.
///
/// Cheaply clonable, clones are independent snapshots.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNodeRepository {
    nodes: HashMap<NodeId, Arc<Node>>,
}

impl InMemoryNodeRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|node| &**node)
    }
}

impl NodeRepository for InMemoryNodeRepository {
    type Error = Infallible;

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, Self::Error> {
        Ok(self.nodes.get(&id).map(|node| Node::clone(node)))
    }

    fn find_by_ids(&self, ids: &[NodeId]) -> Result<Vec<Node>, Self::Error> {
        Ok(ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| Node::clone(node))
            .collect())
    }

    fn find_first(&self) -> Result<Option<Node>, Self::Error> {
        Ok(self.nodes.values().next().map(|node| Node::clone(node)))
    }

    fn save(&mut self, node: &Node) -> Result<(), Self::Error> {
        let old_node = self.nodes.insert(node.id, Arc::new(node.clone()));
        log::trace!(
            "Saved node {node:?}, replacing {old_node:?}",
            old_node = old_node.as_deref()
        );
        Ok(())
    }

    fn save_all(&mut self, nodes: &[&Node]) -> Result<(), Self::Error> {
        // Apply all writes to a snapshot and swap it in afterwards
        let mut next_nodes = self.nodes.clone();
        for node in nodes {
            next_nodes.insert(node.id, Arc::new(Node::clone(node)));
        }
        self.nodes = next_nodes;
        Ok(())
    }

    fn delete(&mut self, id: NodeId) -> Result<(), Self::Error> {
        let old_node = self.nodes.remove(&id);
        log::trace!("Deleted node {old_node:?}", old_node = old_node.as_deref());
        Ok(())
    }
}
