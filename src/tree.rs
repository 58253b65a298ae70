//! Consensus tree.
//!
//! The consensus tree is a rooted hierarchy of consensus sequences.
//! The root has identifier 0, and each node stores the lowest compatibility between its consensus and the sequences it represents.
//! Nodes become finer-grained (more compatible) toward the leaves.
//!
//! A leaf is a defined node without children.
//! A child identifier that does not correspond to a defined node is an error rather than an implicit leaf.
//!
//! See [`layout`] for positioning the nodes and [`pruning`] for threshold cuts.

use crate::LayoutError;
use crate::formats::TreeNodeRecord;

use std::collections::{BTreeMap, BTreeSet};

pub mod layout;
pub mod pruning;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A node in the consensus tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsensusTreeNode {
    pub id: usize,
    /// Parent of the node, or [`None`] for the root.
    pub parent_id: Option<usize>,
    /// Children in input order, without duplicates.
    pub children_ids: Vec<usize>,
    /// Lowest compatibility with any represented sequence, in `[0, 1]`.
    pub min_compatibility: f64,
    pub sequence_ids: BTreeSet<usize>,
    pub name: String,
}

impl ConsensusTreeNode {
    /// Returns `true` if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }

    /// Returns `true` if the node is the root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A consensus tree rooted at node 0.
///
/// The tree is validated on construction: it has a single root, every node is reachable from the root, and every node except the root has exactly one parent.
///
/// # Examples
///
/// ```
/// use poagraph_view::ConsensusTree;
/// use poagraph_view::formats::TreeNodeRecord;
///
/// let records = vec![
///     TreeNodeRecord { id: 0, min_compatibility: 0.3, children: vec![1, 2], ..Default::default() },
///     TreeNodeRecord { id: 1, min_compatibility: 0.9, sequence_ids: vec![0, 1], ..Default::default() },
///     TreeNodeRecord { id: 2, min_compatibility: 0.2, children: vec![3], ..Default::default() },
///     TreeNodeRecord { id: 3, min_compatibility: 0.95, sequence_ids: vec![2], ..Default::default() },
/// ];
/// let tree = ConsensusTree::from_records(&records).unwrap();
/// assert_eq!(tree.len(), 4);
/// assert_eq!(tree.leaves(), vec![1, 3]);
/// assert_eq!(tree.node(3).unwrap().parent_id, Some(2));
/// assert!(tree.is_ancestor(0, 3));
/// assert!(!tree.is_ancestor(1, 3));
///
/// // Records round-trip.
/// assert_eq!(ConsensusTree::from_records(&tree.to_records()).unwrap(), tree);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsensusTree {
    nodes: BTreeMap<usize, ConsensusTreeNode>,
}

impl ConsensusTree {
    /// Identifier of the root node.
    pub const ROOT: usize = 0;

    /// Builds a tree from parent/children records.
    ///
    /// An empty list of records gives an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DataIntegrity`] if a node identifier is duplicated, a child identifier is not defined, a child is listed twice by the same parent, the root is missing, or a compatibility is outside `[0, 1]`.
    /// Returns [`LayoutError::CyclicTree`] if a node has multiple parents, the root is a child, or some nodes are not reachable from the root.
    pub fn from_records(records: &[TreeNodeRecord]) -> Result<Self, LayoutError> {
        let mut nodes: BTreeMap<usize, ConsensusTreeNode> = BTreeMap::new();
        for record in records.iter() {
            if !(0.0..=1.0).contains(&record.min_compatibility) {
                return Err(LayoutError::DataIntegrity(format!(
                    "Tree node {} has compatibility {} outside [0, 1]", record.id, record.min_compatibility
                )));
            }
            let node = ConsensusTreeNode {
                id: record.id,
                parent_id: None,
                children_ids: Vec::with_capacity(record.children.len()),
                min_compatibility: record.min_compatibility,
                sequence_ids: record.sequence_ids.iter().copied().collect(),
                name: record.name.clone(),
            };
            if nodes.insert(record.id, node).is_some() {
                return Err(LayoutError::DataIntegrity(format!("Tree node {} is defined twice", record.id)));
            }
        }
        if nodes.is_empty() {
            return Ok(ConsensusTree::default());
        }
        if !nodes.contains_key(&Self::ROOT) {
            return Err(LayoutError::DataIntegrity(format!("The tree has no root node {}", Self::ROOT)));
        }

        // Link the children to their parents.
        for record in records.iter() {
            let mut seen: BTreeSet<usize> = BTreeSet::new();
            for child_id in record.children.iter() {
                if !seen.insert(*child_id) {
                    return Err(LayoutError::DataIntegrity(
                        format!("Tree node {} lists child {} twice", record.id, child_id)
                    ));
                }
                if *child_id == Self::ROOT {
                    return Err(LayoutError::CyclicTree(format!("Tree node {} has the root as a child", record.id)));
                }
                let child = nodes.get_mut(child_id).ok_or_else(|| LayoutError::DataIntegrity(
                    format!("Tree node {} refers to undefined child {}", record.id, child_id)
                ))?;
                if let Some(parent_id) = child.parent_id {
                    return Err(LayoutError::CyclicTree(format!(
                        "Tree node {} has multiple parents ({} and {})", child_id, parent_id, record.id
                    )));
                }
                child.parent_id = Some(record.id);
            }
            if let Some(node) = nodes.get_mut(&record.id) {
                node.children_ids = record.children.clone();
            }
        }

        let tree = ConsensusTree { nodes };
        let reachable = tree.descendants(Self::ROOT).len() + 1;
        if reachable != tree.len() {
            return Err(LayoutError::CyclicTree(format!(
                "{} of {} tree nodes are not reachable from the root", tree.len() - reachable, tree.len()
            )));
        }

        Ok(tree)
    }

    /// Converts the tree to parent/children records in identifier order.
    pub fn to_records(&self) -> Vec<TreeNodeRecord> {
        self.nodes.values().map(|node| TreeNodeRecord {
            id: node.id,
            min_compatibility: node.min_compatibility,
            children: node.children_ids.clone(),
            sequence_ids: node.sequence_ids.iter().copied().collect(),
            name: node.name.clone(),
        }).collect()
    }
}

//-----------------------------------------------------------------------------

/// Accessing and traversing the tree.
impl ConsensusTree {
    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the root node, or [`None`] if the tree is empty.
    pub fn root(&self) -> Option<&ConsensusTreeNode> {
        self.nodes.get(&Self::ROOT)
    }

    /// Returns the node with the given identifier, or [`None`] if there is no such node.
    pub fn node(&self, node_id: usize) -> Option<&ConsensusTreeNode> {
        self.nodes.get(&node_id)
    }

    /// Returns an iterator over the nodes in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ConsensusTreeNode> {
        self.nodes.values()
    }

    /// Returns the node identifiers in identifier order.
    pub fn node_ids(&self) -> Vec<usize> {
        self.nodes.keys().copied().collect()
    }

    /// Returns the children of the node, or an empty slice if there is no such node.
    pub fn children(&self, node_id: usize) -> &[usize] {
        self.nodes.get(&node_id).map(|node| node.children_ids.as_slice()).unwrap_or(&[])
    }

    /// Returns the leaves in post-order (children in input order).
    pub fn leaves(&self) -> Vec<usize> {
        self.post_order().into_iter().filter(|id| self.children(*id).is_empty()).collect()
    }

    /// Returns all nodes in post-order: every node comes after its children, and children are visited in input order.
    ///
    /// The traversal is iterative and runs in linear time.
    pub fn post_order(&self) -> Vec<usize> {
        let mut result: Vec<usize> = Vec::with_capacity(self.len());
        if self.is_empty() {
            return result;
        }

        // (node, offset of the next child to visit)
        let mut stack: Vec<(usize, usize)> = vec![(Self::ROOT, 0)];
        while let Some((node_id, next_child)) = stack.pop() {
            let children = self.children(node_id);
            if next_child < children.len() {
                stack.push((node_id, next_child + 1));
                stack.push((children[next_child], 0));
            } else {
                result.push(node_id);
            }
        }

        result
    }

    /// Returns all proper descendants of the node in depth-first order.
    pub fn descendants(&self, node_id: usize) -> Vec<usize> {
        let mut result: Vec<usize> = Vec::new();
        let mut stack: Vec<usize> = self.children(node_id).iter().rev().copied().collect();
        while let Some(curr) = stack.pop() {
            result.push(curr);
            stack.extend(self.children(curr).iter().rev());
        }
        result
    }

    /// Returns `true` if `ancestor` is a proper ancestor of `node_id`.
    pub fn is_ancestor(&self, ancestor: usize, node_id: usize) -> bool {
        let mut curr = self.node(node_id).and_then(|node| node.parent_id);
        while let Some(parent_id) = curr {
            if parent_id == ancestor {
                return true;
            }
            curr = self.node(parent_id).and_then(|node| node.parent_id);
        }
        false
    }

    /// Returns the depth of the node (0 for the root), or [`None`] if there is no such node.
    pub fn depth(&self, node_id: usize) -> Option<usize> {
        let mut node = self.node(node_id)?;
        let mut depth = 0;
        while let Some(parent_id) = node.parent_id {
            node = self.node(parent_id)?;
            depth += 1;
        }
        Some(depth)
    }
}

//-----------------------------------------------------------------------------
