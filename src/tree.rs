// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    classify, split_path, NewNodeId, Node, NodeId, NodeRepository, SequentialNodeIds,
};

/// Options of a [`PathTree`], fixed on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTreeConfig {
    /// Separates the segments of paths.
    ///
    /// Must not occur within names. ASCII digits are rejected, because
    /// the delimiter also separates the ids in [`Node::path`]. Decimal
    /// points, dashes, and whitespace are part of numeric segments.
    pub delimiter: char,
}

impl PathTreeConfig {
    pub const DEFAULT_DELIMITER: char = '\\';

    #[must_use]
    pub fn is_valid(&self) -> bool {
        let Self { delimiter } = *self;
        !(delimiter.is_ascii_digit()
            || matches!(delimiter, '.' | '-')
            || delimiter.is_whitespace())
    }
}

impl Default for PathTreeConfig {
    fn default() -> Self {
        Self {
            delimiter: Self::DEFAULT_DELIMITER,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error<E> {
    #[error("tree has already been initialized")]
    AlreadyInitialized,
    #[error("tree has not been initialized")]
    Uninitialized,
    #[error("invalid delimiter {delimiter:?}")]
    InvalidDelimiter { delimiter: char },
    #[error("invalid path segment {segment:?}")]
    InvalidSegment { segment: String },
    #[error("node {parent_id} already has a child {segment:?}")]
    ChildExists { parent_id: NodeId, segment: String },
    #[error("node {id} not found")]
    NodeNotFound { id: NodeId },
    #[error("invalid path {path:?} of node {id}")]
    InvalidNodePath { id: NodeId, path: String },
    #[error("repository failure")]
    Repository(#[source] E),
}

pub type PathTreeResult<T, R> = Result<T, Error<<R as NodeRepository>::Error>>;

/// Outcome of resolving a path.
#[derive(Debug, Clone)]
pub enum NodePathResolved {
    /// All segments matched.
    Full(Node),

    /// Only a prefix of the segments matched.
    Partial {
        /// The node denoted by the matched prefix.
        last_matched_node: Node,

        number_of_matched_segments: usize,

        /// The remaining segments, starting with the first mismatch.
        unresolved_segments: Vec<String>,
    },
}

impl NodePathResolved {
    /// The node denoted by the path, only if all segments matched.
    #[must_use]
    pub fn into_full(self) -> Option<Node> {
        match self {
            Self::Full(node) => Some(node),
            Self::Partial { .. } => None,
        }
    }

    /// The last node that has been matched.
    #[must_use]
    pub const fn node(&self) -> &Node {
        match self {
            Self::Full(node)
            | Self::Partial {
                last_matched_node: node,
                ..
            } => node,
        }
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Return type of [`PathTree::create_path()`].
#[derive(Debug, Clone)]
pub struct NodePathCreated {
    /// The node denoted by the path.
    pub node: Node,

    /// The ids of all new nodes, ordered from top to bottom.
    ///
    /// Empty if the path already existed.
    pub created_node_ids: Vec<NodeId>,
}

/// Return type when removing a node from the tree.
#[derive(Debug, Clone)]
pub struct RemovedSubtree {
    /// The closest surviving ancestor, with the removed child detached.
    pub parent_node: Node,

    /// The removed node followed by all its descendants.
    pub removed_node_ids: Vec<NodeId>,

    /// Ancestors that have been removed after their last child was removed,
    /// ordered from bottom to top.
    pub pruned_node_ids: Vec<NodeId>,
}

/// Hierarchical index over the nodes of a [`NodeRepository`].
///
/// Each path segment is either a name, a single number, or a numeric
/// range. Names are resolved by string equality. Numbers and ranges
/// are resolved by their exact interval in the interval tree of the
/// parent node. Overlapping intervals are individually addressable.
#[derive(Debug, Clone)]
pub struct PathTree<R, N = SequentialNodeIds> {
    repository: R,
    new_node_id: N,
    config: PathTreeConfig,
    root_node_id: NodeId,
}

impl<R, N> PathTree<R, N>
where
    R: NodeRepository,
    N: NewNodeId,
{
    /// Create and persist the root node of a new tree.
    ///
    /// Fails if the repository already contains any node.
    pub fn initialize(
        mut repository: R,
        config: PathTreeConfig,
        mut new_node_id: N,
    ) -> PathTreeResult<Self, R> {
        validate_config(config)?;
        if repository
            .find_first()
            .map_err(Error::Repository)?
            .is_some()
        {
            return Err(Error::AlreadyInitialized);
        }
        let root_node = Node::new_root(new_node_id.new_node_id());
        repository.save(&root_node).map_err(Error::Repository)?;
        log::debug!("Initialized tree with root node {root_node:?}");
        Ok(Self {
            repository,
            new_node_id,
            config,
            root_node_id: root_node.id,
        })
    }

    /// Open an existing tree.
    ///
    /// The root node is found through the path of an arbitrary node.
    /// The id allocator must not hand out ids of existing nodes.
    pub fn open(
        repository: R,
        config: PathTreeConfig,
        new_node_id: N,
    ) -> PathTreeResult<Self, R> {
        validate_config(config)?;
        let Some(node) = repository.find_first().map_err(Error::Repository)? else {
            return Err(Error::Uninitialized);
        };
        let root_node_id = split_path(&node.path, config.delimiter)
            .next()
            .and_then(|root_node_id| root_node_id.parse::<NodeId>().ok())
            .ok_or_else(|| Error::InvalidNodePath {
                id: node.id,
                path: node.path.clone(),
            })?;
        let tree = Self {
            repository,
            new_node_id,
            config,
            root_node_id,
        };
        let root_node = tree.root_node()?;
        if !root_node.is_root() {
            return Err(Error::InvalidNodePath {
                id: node.id,
                path: node.path,
            });
        }
        log::debug!("Opened tree with root node {root_node:?}");
        Ok(tree)
    }

    #[must_use]
    pub const fn root_node_id(&self) -> NodeId {
        self.root_node_id
    }

    #[must_use]
    pub const fn config(&self) -> &PathTreeConfig {
        &self.config
    }

    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    #[must_use]
    pub fn into_repository(self) -> R {
        self.repository
    }

    pub fn root_node(&self) -> PathTreeResult<Node, R> {
        self.load_node(self.root_node_id)
    }

    /// Load a node that is referenced by the tree structure.
    pub fn load_node(&self, id: NodeId) -> PathTreeResult<Node, R> {
        self.repository
            .find_by_id(id)
            .map_err(Error::Repository)?
            .ok_or(Error::NodeNotFound { id })
    }

    /// Load distinct nodes with a single lookup, preserving the order of `ids`.
    fn load_nodes(&self, ids: &[NodeId]) -> PathTreeResult<Vec<Node>, R> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut nodes = self
            .repository
            .find_by_ids(ids)
            .map_err(Error::Repository)?
            .into_iter()
            .map(|node| (node.id, node))
            .collect::<HashMap<_, _>>();
        ids.iter()
            .map(|&id| nodes.remove(&id).ok_or(Error::NodeNotFound { id }))
            .collect()
    }

    /// Resolve a path, starting at the root node.
    ///
    /// Stops at the first segment that has no matching child. The empty
    /// path resolves to the root node.
    pub fn resolve_path(&self, path: &str) -> PathTreeResult<NodePathResolved, R> {
        let segments = split_path(path, self.config.delimiter).collect::<Vec<_>>();
        let mut node = self.root_node()?;
        for (index, segment) in segments.iter().enumerate() {
            let Some(child_node_id) = node.find_child(segment) else {
                log::debug!(
                    "No child {segment:?} found in node {node_id} after {index} segment(s)",
                    node_id = node.id
                );
                return Ok(NodePathResolved::Partial {
                    last_matched_node: node,
                    number_of_matched_segments: index,
                    unresolved_segments: segments[index..]
                        .iter()
                        .map(|segment| (*segment).to_owned())
                        .collect(),
                });
            };
            node = self.load_node(child_node_id)?;
        }
        Ok(NodePathResolved::Full(node))
    }

    /// Find the node denoted by the path, if all segments match.
    pub fn find_node(&self, path: &str) -> PathTreeResult<Option<Node>, R> {
        self.resolve_path(path).map(NodePathResolved::into_full)
    }

    /// Resolve a path and create all missing nodes.
    ///
    /// Nothing is created if any missing segment is an inverted range.
    pub fn create_path(&mut self, path: &str) -> PathTreeResult<NodePathCreated, R> {
        let (mut parent_node, unresolved_segments) = match self.resolve_path(path)? {
            NodePathResolved::Full(node) => {
                return Ok(NodePathCreated {
                    node,
                    created_node_ids: Vec::new(),
                });
            }
            NodePathResolved::Partial {
                last_matched_node,
                unresolved_segments,
                ..
            } => (last_matched_node, unresolved_segments),
        };
        if let Some(segment) = unresolved_segments
            .iter()
            .find(|segment| !classify(segment).is_valid())
        {
            return Err(Error::InvalidSegment {
                segment: segment.clone(),
            });
        }
        let mut created_node_ids = Vec::with_capacity(unresolved_segments.len());
        for segment in &unresolved_segments {
            let mut child_node = self.new_child_node(&parent_node, segment);
            self.add_child(&mut parent_node, &mut child_node)?;
            created_node_ids.push(child_node.id);
            parent_node = child_node;
        }
        Ok(NodePathCreated {
            node: parent_node,
            created_node_ids,
        })
    }

    /// Resolve a path and create all missing nodes.
    ///
    /// Returns the existing node unmodified if the path already exists.
    pub fn find_or_create_path(&mut self, path: &str) -> PathTreeResult<Node, R> {
        self.create_path(path).map(|created| created.node)
    }

    /// Remove the node denoted by the path, see [`Self::remove_node()`].
    ///
    /// Returns `None` if the path does not exist or denotes the root node.
    pub fn remove_path(&mut self, path: &str) -> PathTreeResult<Option<RemovedSubtree>, R> {
        let Some(node) = self.find_node(path)? else {
            log::debug!("Path {path:?} not found");
            return Ok(None);
        };
        self.remove_node(&node)
    }

    /// Allocate a new, detached child node for the given parent.
    ///
    /// The node is neither linked nor persisted until it is passed
    /// to [`Self::add_child()`].
    pub fn new_child_node(&mut self, parent_node: &Node, name: &str) -> Node {
        Node::new_child(
            self.new_node_id.new_node_id(),
            name,
            parent_node,
            self.config.delimiter,
        )
    }

    /// Link a child to its parent and persist both nodes together.
    ///
    /// Named children are appended to the named children of the parent,
    /// points and ranges are inserted into its interval tree.
    ///
    /// The child must have been created for this parent with
    /// [`Self::new_child_node()`].
    pub fn add_child(
        &mut self,
        parent_node: &mut Node,
        child_node: &mut Node,
    ) -> PathTreeResult<(), R> {
        let delimiter = self.config.delimiter;
        if child_node.path != format!("{}{delimiter}{}", parent_node.path, child_node.id)
            || child_node.name_path
                != format!("{}{delimiter}{}", parent_node.name_path, child_node.name)
        {
            return Err(Error::InvalidNodePath {
                id: child_node.id,
                path: child_node.path.clone(),
            });
        }
        if !parent_node.attach_child(child_node) {
            if !child_node.kind.is_valid() {
                return Err(Error::InvalidSegment {
                    segment: child_node.name.clone(),
                });
            }
            return Err(Error::ChildExists {
                parent_id: parent_node.id,
                segment: child_node.name.clone(),
            });
        }
        self.repository
            .save_all(&[&*parent_node, &*child_node])
            .map_err(Error::Repository)?;
        log::debug!(
            "Added child node {child_node_id} {name:?} to parent node {parent_node_id}",
            child_node_id = child_node.id,
            name = child_node.name,
            parent_node_id = parent_node.id,
        );
        Ok(())
    }

    /// Remove a node together with all its descendants.
    ///
    /// Ancestors that are left without any children are removed as well,
    /// up to but excluding the root node. The root node cannot be removed.
    pub fn remove_node(&mut self, node: &Node) -> PathTreeResult<Option<RemovedSubtree>, R> {
        let Some(mut parent_node_id) = node.parent_id else {
            log::debug!("Root node {node_id} cannot be removed", node_id = node.id);
            return Ok(None);
        };
        let removed_node_ids = std::iter::once(node.id)
            .chain(self.descendants(node)?.into_iter().map(|node| node.id))
            .collect::<Vec<_>>();
        // Bottom-up, children are deleted before their parents
        for &node_id in removed_node_ids.iter().skip(1).rev() {
            self.repository.delete(node_id).map_err(Error::Repository)?;
        }
        if removed_node_ids.len() > 1 {
            log::debug!(
                "Removed {count} descendant(s) of node {node_id}",
                count = removed_node_ids.len() - 1,
                node_id = node.id
            );
        }
        let mut pruned_node_ids = Vec::new();
        let mut child_node = node.clone();
        loop {
            let mut parent_node = self.load_node(parent_node_id)?;
            if !parent_node.detach_child(&child_node) {
                log::warn!(
                    "Node {child_node_id} not found in the children of parent node {parent_node_id}",
                    child_node_id = child_node.id,
                );
            }
            self.repository
                .delete(child_node.id)
                .map_err(Error::Repository)?;
            if child_node.id != node.id {
                pruned_node_ids.push(child_node.id);
            }
            match parent_node.parent_id {
                Some(grandparent_node_id) if parent_node.count_children() == 0 => {
                    log::debug!("Pruning empty node {parent_node_id}");
                    parent_node_id = grandparent_node_id;
                    child_node = parent_node;
                }
                _ => {
                    self.repository
                        .save(&parent_node)
                        .map_err(Error::Repository)?;
                    log::debug!(
                        "Removed node {node_id} from parent node {parent_node_id}",
                        node_id = node.id
                    );
                    return Ok(Some(RemovedSubtree {
                        parent_node,
                        removed_node_ids,
                        pruned_node_ids,
                    }));
                }
            }
        }
    }

    /// The parent node, `None` for the root node.
    pub fn parent(&self, node: &Node) -> PathTreeResult<Option<Node>, R> {
        node.parent_id.map(|id| self.load_node(id)).transpose()
    }

    /// All ancestors ordered from the root node down to the parent node.
    ///
    /// Empty for the root node.
    pub fn ancestors(&self, node: &Node) -> PathTreeResult<Vec<Node>, R> {
        let invalid_node_path = || Error::InvalidNodePath {
            id: node.id,
            path: node.path.clone(),
        };
        let mut node_ids = split_path(&node.path, self.config.delimiter)
            .map(|node_id| node_id.parse::<NodeId>().map_err(|_| invalid_node_path()))
            .collect::<Result<Vec<_>, _>>()?;
        if node_ids.pop() != Some(node.id) {
            return Err(invalid_node_path());
        }
        self.load_nodes(&node_ids)
    }

    /// All direct children.
    ///
    /// Named children come first in creation order, followed by
    /// all point and range children.
    pub fn children(&self, node: &Node) -> PathTreeResult<Vec<Node>, R> {
        let node_ids = node.child_node_ids().collect::<Vec<_>>();
        self.load_nodes(&node_ids)
    }

    /// Point and range siblings whose interval overlaps the interval of the node.
    ///
    /// The node itself is excluded. Empty for named nodes and the root node.
    pub fn overlapping(&self, node: &Node) -> PathTreeResult<Vec<Node>, R> {
        let (Some(bounds), Some(parent_node_id)) = (node.bounds(), node.parent_id) else {
            return Ok(Vec::new());
        };
        let parent_node = self.load_node(parent_node_id)?;
        let node_ids = parent_node
            .overlapping_child_node_ids(bounds)
            .filter(|&node_id| node_id != node.id)
            .collect::<Vec<_>>();
        self.load_nodes(&node_ids)
    }

    /// All descendants in breadth-first order.
    ///
    /// Collects the children and the overlapping siblings of every
    /// visited node. Each node is reported only once. The given node
    /// itself is excluded.
    pub fn descendants(&self, node: &Node) -> PathTreeResult<Vec<Node>, R> {
        let mut visited_node_ids = HashSet::from([node.id]);
        let mut descendants: Vec<Node> = Vec::new();
        let mut descendant_index_by_id: HashMap<NodeId, usize> = HashMap::new();
        let mut pending_node_ids = node
            .child_node_ids()
            .filter(|&node_id| visited_node_ids.insert(node_id))
            .collect::<Vec<_>>();
        while !pending_node_ids.is_empty() {
            // One batched lookup per level
            let next_nodes = self.load_nodes(&pending_node_ids)?;
            pending_node_ids.clear();
            for next_node in &next_nodes {
                pending_node_ids.extend(
                    next_node
                        .child_node_ids()
                        .filter(|&node_id| visited_node_ids.insert(node_id)),
                );
                let (Some(bounds), Some(parent_node_id)) = (next_node.bounds(), next_node.parent_id)
                else {
                    continue;
                };
                // The parent has been visited on a previous level
                let parent_node = if parent_node_id == node.id {
                    Some(node)
                } else {
                    descendant_index_by_id
                        .get(&parent_node_id)
                        .map(|&index| &descendants[index])
                };
                if let Some(parent_node) = parent_node {
                    pending_node_ids.extend(
                        parent_node
                            .overlapping_child_node_ids(bounds)
                            .filter(|&node_id| visited_node_ids.insert(node_id)),
                    );
                }
            }
            for next_node in next_nodes {
                descendant_index_by_id.insert(next_node.id, descendants.len());
                descendants.push(next_node);
            }
        }
        Ok(descendants)
    }
}

fn validate_config<E>(config: PathTreeConfig) -> Result<(), Error<E>> {
    if config.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidDelimiter {
            delimiter: config.delimiter,
        })
    }
}
