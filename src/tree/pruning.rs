//! Threshold cuts of the consensus tree.
//!
//! Given a compatibility threshold, the cut selects a frontier of visible nodes.
//! A node whose minimum compatibility exceeds the threshold represents its subtree well enough: it stays visible and all of its descendants are hidden.
//! Any other internal node is hidden and replaced by its children.
//! A leaf that does not exceed the threshold stays visible, as there is nothing finer to show.
//!
//! No visible node is an ancestor of another visible node, and every leaf is either visible or has a visible ancestor.

use super::ConsensusTree;
use crate::formats::PruneRecord;

use std::collections::{BTreeMap, BTreeSet};

//-----------------------------------------------------------------------------

/// Returns the identifiers of the nodes hidden by the threshold.
///
/// The comparison is strict: a node with compatibility equal to the threshold does not hide its subtree.
/// Runs in linear time using an iterative depth-first traversal.
pub fn cut(tree: &ConsensusTree, threshold: f64) -> BTreeSet<usize> {
    Frontier::new(tree, threshold).hidden
}

/// Visible and hidden nodes of the consensus tree at a threshold.
///
/// # Examples
///
/// ```
/// use poagraph_view::{ConsensusTree, Frontier};
/// use poagraph_view::formats::TreeNodeRecord;
///
/// let records = vec![
///     TreeNodeRecord { id: 0, min_compatibility: 0.3, children: vec![1, 2], ..Default::default() },
///     TreeNodeRecord { id: 1, min_compatibility: 0.9, sequence_ids: vec![0, 1], ..Default::default() },
///     TreeNodeRecord { id: 2, min_compatibility: 0.2, children: vec![3], sequence_ids: vec![2], ..Default::default() },
///     TreeNodeRecord { id: 3, min_compatibility: 0.95, sequence_ids: vec![2], ..Default::default() },
/// ];
/// let tree = ConsensusTree::from_records(&records).unwrap();
///
/// let frontier = Frontier::new(&tree, 0.5);
/// assert_eq!(frontier.hidden.iter().copied().collect::<Vec<_>>(), vec![0, 2]);
/// assert_eq!(frontier.visible.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
/// assert!(frontier.is_antichain(&tree));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frontier {
    pub threshold: f64,
    /// Nodes that are not shown.
    pub hidden: BTreeSet<usize>,
    /// The frontier.
    pub visible: BTreeSet<usize>,
}

impl Frontier {
    /// Computes the frontier for the threshold.
    ///
    /// An empty tree gives an empty frontier.
    pub fn new(tree: &ConsensusTree, threshold: f64) -> Self {
        let mut hidden: BTreeSet<usize> = BTreeSet::new();
        let mut visible: BTreeSet<usize> = BTreeSet::new();
        let root = match tree.root() {
            Some(root) => root.id,
            None => return Frontier { threshold, hidden, visible },
        };

        let mut stack: Vec<usize> = vec![root];
        while let Some(node_id) = stack.pop() {
            let node = match tree.node(node_id) {
                Some(node) => node,
                None => continue,
            };
            if node.min_compatibility > threshold {
                visible.insert(node_id);
                hidden.extend(tree.descendants(node_id));
            } else if node.is_leaf() {
                visible.insert(node_id);
            } else {
                hidden.insert(node_id);
                stack.extend(node.children_ids.iter().rev());
            }
        }

        Frontier { threshold, hidden, visible }
    }

    /// Returns `true` if no visible node is an ancestor of another visible node.
    pub fn is_antichain(&self, tree: &ConsensusTree) -> bool {
        self.visible.iter().all(|node_id| {
            let mut curr = tree.node(*node_id).and_then(|node| node.parent_id);
            while let Some(parent_id) = curr {
                if self.visible.contains(&parent_id) {
                    return false;
                }
                curr = tree.node(parent_id).and_then(|node| node.parent_id);
            }
            true
        })
    }

    /// Returns the sequences represented by each visible node.
    pub fn visible_sequences(&self, tree: &ConsensusTree) -> BTreeMap<usize, BTreeSet<usize>> {
        self.visible.iter().filter_map(|node_id| {
            tree.node(*node_id).map(|node| (*node_id, node.sequence_ids.clone()))
        }).collect()
    }

    /// Returns the sequences that appear only in hidden nodes.
    ///
    /// These are the rows a tabular view should filter out.
    pub fn hidden_sequences(&self, tree: &ConsensusTree) -> BTreeSet<usize> {
        let shown: BTreeSet<usize> = self.visible.iter()
            .filter_map(|node_id| tree.node(*node_id))
            .flat_map(|node| node.sequence_ids.iter().copied())
            .collect();
        self.hidden.iter()
            .filter_map(|node_id| tree.node(*node_id))
            .flat_map(|node| node.sequence_ids.iter().copied())
            .filter(|sequence_id| !shown.contains(sequence_id))
            .collect()
    }

    /// Converts the frontier to an output record.
    pub fn to_record(&self, tree: &ConsensusTree) -> PruneRecord {
        PruneRecord {
            threshold: self.threshold,
            hidden: self.hidden.iter().copied().collect(),
            visible: self.visible.iter().copied().collect(),
            hidden_sequences: self.hidden_sequences(tree).into_iter().collect(),
        }
    }
}

//-----------------------------------------------------------------------------
