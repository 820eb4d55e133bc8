// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use crate::NodeId;

/// Half-edge to a named child node.
///
/// Owns the name of the child.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedChild {
    /// The name of the target node.
    pub name: String,

    /// The id of the target node.
    pub node_id: NodeId,
}

/// Named children in creation order.
///
/// Names are unique among the children of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NamedChildren(Vec<NamedChild>);

impl NamedChildren {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.0
            .iter()
            .find(|child| child.name == name)
            .map(|child| child.node_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedChild> + '_ {
        self.0.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().map(|child| child.node_id)
    }

    /// Append a new child.
    ///
    /// Returns `false` and leaves the children unchanged if the name is taken.
    pub(crate) fn push(&mut self, name: String, node_id: NodeId) -> bool {
        if self.get(&name).is_some() {
            return false;
        }
        self.0.push(NamedChild { name, node_id });
        true
    }

    /// Remove the child with the given name and id.
    pub(crate) fn remove(&mut self, name: &str, node_id: NodeId) -> bool {
        let Some(index) = self
            .0
            .iter()
            .position(|child| child.name == name && child.node_id == node_id)
        else {
            return false;
        };
        self.0.remove(index);
        true
    }
}
