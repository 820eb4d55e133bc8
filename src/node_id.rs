// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use std::num::NonZeroU64;

/// Stable node identifier.
///
/// Assigned once when a node is created and never changed afterwards.
/// The decimal rendering is used for the delimited id paths of nodes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::FromStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(NonZeroU64);

impl NodeId {
    #[must_use]
    pub const fn new(value: NonZeroU64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

/// Allocation of identifiers for new nodes.
pub trait NewNodeId {
    /// Allocate an identifier that has never been handed out before.
    #[must_use]
    fn new_node_id(&mut self) -> NodeId;
}

/// Allocates ascending identifiers.
///
/// Must be resumed with [`SequentialNodeIds::starting_after()`] when
/// reopening a tree whose nodes have already been persisted, otherwise
/// identifiers would be handed out twice.
#[derive(Debug, Clone, Default)]
pub struct SequentialNodeIds {
    last_value: u64,
}

impl SequentialNodeIds {
    /// Resume allocation after the given identifier.
    #[must_use]
    pub const fn starting_after(last_node_id: NodeId) -> Self {
        Self {
            last_value: last_node_id.get(),
        }
    }
}

impl NewNodeId for SequentialNodeIds {
    fn new_node_id(&mut self) -> NodeId {
        loop {
            // Wrapping add, zero is skipped
            let next_value = self.last_value.wrapping_add(1);
            self.last_value = next_value;
            if let Some(next_value) = NonZeroU64::new(next_value) {
                return NodeId(next_value);
            }
            // Looping happens only on overflow and at most once during each call.
        }
    }
}
