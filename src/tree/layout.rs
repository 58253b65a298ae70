//! Positions for consensus tree nodes.
//!
//! Leaves are spread evenly over a fixed vertical range in post-order.
//! Each internal node is placed halfway between its lowest and highest child.
//! The horizontal coordinate is the minimum compatibility of the node, optionally rescaled to `[0, 1]` over the tree.

use super::ConsensusTree;
use crate::formats::{TreeNodeElement, TreeSegment};

use std::collections::BTreeMap;

//-----------------------------------------------------------------------------

/// Parameters for laying out a consensus tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeLayoutParams {
    /// Vertical coordinate of the first leaf.
    pub y_min: f64,
    /// Vertical coordinate of the last leaf.
    pub y_max: f64,
    /// Rescale compatibilities to `[0, 1]` over the tree.
    pub normalize_x: bool,
}

impl Default for TreeLayoutParams {
    fn default() -> Self {
        TreeLayoutParams {
            y_min: 0.0,
            y_max: 100.0,
            normalize_x: true,
        }
    }
}

/// Position of a tree node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TreePosition {
    pub x: f64,
    pub y: f64,
}

/// Positions for all nodes of a consensus tree.
///
/// # Examples
///
/// ```
/// use poagraph_view::ConsensusTree;
/// use poagraph_view::formats::TreeNodeRecord;
/// use poagraph_view::tree::layout::{TreeLayout, TreeLayoutParams};
///
/// let records = vec![
///     TreeNodeRecord { id: 0, min_compatibility: 0.2, children: vec![1, 2], ..Default::default() },
///     TreeNodeRecord { id: 1, min_compatibility: 0.6, ..Default::default() },
///     TreeNodeRecord { id: 2, min_compatibility: 0.4, children: vec![3, 4], ..Default::default() },
///     TreeNodeRecord { id: 3, min_compatibility: 1.0, ..Default::default() },
///     TreeNodeRecord { id: 4, min_compatibility: 0.8, ..Default::default() },
/// ];
/// let tree = ConsensusTree::from_records(&records).unwrap();
/// let layout = TreeLayout::new(&tree, &TreeLayoutParams::default());
///
/// // Leaves 1, 3, 4 are at 0, 50, 100.
/// assert_eq!(layout.y(1), Some(0.0));
/// assert_eq!(layout.y(3), Some(50.0));
/// assert_eq!(layout.y(4), Some(100.0));
/// assert_eq!(layout.y(2), Some(75.0));
/// assert_eq!(layout.y(0), Some(37.5));
///
/// // Compatibilities are rescaled from [0.2, 1.0].
/// assert_eq!(layout.x(0), Some(0.0));
/// assert_eq!(layout.x(3), Some(1.0));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
    positions: BTreeMap<usize, TreePosition>,
    // (parent, child) pairs in post-order of the children.
    edges: Vec<(usize, usize)>,
}

impl TreeLayout {
    /// Lays out the tree.
    ///
    /// Runs in linear time using a single post-order traversal.
    /// A tree with a single leaf places it in the middle of the vertical range.
    pub fn new(tree: &ConsensusTree, params: &TreeLayoutParams) -> Self {
        let order = tree.post_order();
        let leaves = order.iter().filter(|id| tree.children(**id).is_empty()).count();
        // The ends are pinned so that rounding never moves a leaf outside the range.
        let leaf_y = |rank: usize| -> f64 {
            if leaves <= 1 {
                (params.y_min + params.y_max) / 2.0
            } else if rank == 0 {
                params.y_min
            } else if rank + 1 == leaves {
                params.y_max
            } else {
                params.y_min + (params.y_max - params.y_min) * rank as f64 / (leaves - 1) as f64
            }
        };

        let (low, high) = tree.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), node| {
            (low.min(node.min_compatibility), high.max(node.min_compatibility))
        });
        let scale_x = |compatibility: f64| -> f64 {
            if !params.normalize_x {
                compatibility
            } else if high > low {
                (compatibility - low) / (high - low)
            } else {
                0.0
            }
        };

        let mut positions: BTreeMap<usize, TreePosition> = BTreeMap::new();
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(tree.len().saturating_sub(1));
        let mut leaf_rank = 0;
        for node_id in order.iter() {
            let node = match tree.node(*node_id) {
                Some(node) => node,
                None => continue,
            };
            let y = if node.is_leaf() {
                let y = leaf_y(leaf_rank);
                leaf_rank += 1;
                y
            } else {
                // Children come before the parent in post-order.
                let (low_y, high_y) = node.children_ids.iter().filter_map(|child| positions.get(child)).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(low, high), pos| (low.min(pos.y), high.max(pos.y))
                );
                (low_y + high_y) / 2.0
            };
            positions.insert(*node_id, TreePosition { x: scale_x(node.min_compatibility), y });
            if let Some(parent_id) = node.parent_id {
                edges.push((parent_id, *node_id));
            }
        }

        TreeLayout { positions, edges }
    }

    /// Returns the number of positioned nodes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if there are no positioned nodes.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the position of the node, or [`None`] if there is no such node.
    pub fn position(&self, node_id: usize) -> Option<TreePosition> {
        self.positions.get(&node_id).copied()
    }

    /// Returns the horizontal coordinate of the node.
    pub fn x(&self, node_id: usize) -> Option<f64> {
        self.position(node_id).map(|pos| pos.x)
    }

    /// Returns the vertical coordinate of the node.
    pub fn y(&self, node_id: usize) -> Option<f64> {
        self.position(node_id).map(|pos| pos.y)
    }

    /// Returns the vertical coordinates of all nodes.
    pub fn y_values(&self) -> BTreeMap<usize, f64> {
        self.positions.iter().map(|(id, pos)| (*id, pos.y)).collect()
    }

    /// Returns rendering records for the nodes in identifier order.
    pub fn node_elements(&self) -> Vec<TreeNodeElement> {
        self.positions.iter().map(|(id, pos)| TreeNodeElement { id: *id, x: pos.x, y: pos.y }).collect()
    }

    /// Returns an elbow segment for each parent-child edge.
    pub fn segments(&self) -> Vec<TreeSegment> {
        self.edges.iter().filter_map(|(parent_id, child_id)| {
            let parent = self.positions.get(parent_id)?;
            let child = self.positions.get(child_id)?;
            Some(TreeSegment {
                parent_id: *parent_id,
                child_id: *child_id,
                points: [(parent.x, parent.y), (parent.x, child.y), (child.x, child.y)],
            })
        }).collect()
    }
}

/// Returns the vertical coordinate of every node using the default parameters.
pub fn layout(tree: &ConsensusTree) -> BTreeMap<usize, f64> {
    TreeLayout::new(tree, &TreeLayoutParams::default()).y_values()
}

//-----------------------------------------------------------------------------
