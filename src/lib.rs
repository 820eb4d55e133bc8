// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

//! Path-addressable tree with named and numeric interval segments.
//!
//! Paths like `a\3-5\b` are resolved segment by segment. Names are looked up
//! by string equality, numbers and numeric ranges by their exact interval in
//! the interval tree of the parent node. Overlapping intervals remain
//! individually addressable and can be queried as neighbors of each other.

mod edge;
pub use self::edge::{NamedChild, NamedChildren};

mod interval_tree;
pub use self::interval_tree::{IntervalEntry, IntervalTree, Overlapping};

mod node;
pub use self::node::{Node, ROOT_NODE_NAME};

mod node_id;
pub use self::node_id::{NewNodeId, NodeId, SequentialNodeIds};

mod repository;
pub use self::repository::{InMemoryNodeRepository, NodeRepository};

mod segment;
pub use self::segment::{classify, split_path, Interval, SegmentKind};

mod tree;
pub use self::tree::{
    Error, NodePathCreated, NodePathResolved, PathTree, PathTreeConfig, PathTreeResult,
    RemovedSubtree,
};

#[cfg(feature = "im")]
type HashMap<K, V> = im::HashMap<K, V>;

#[cfg(not(feature = "im"))]
type HashMap<K, V> = std::collections::HashMap<K, V>;
