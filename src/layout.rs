//! Graph layout: column occupancy and chain compaction.
//!
//! Laying out a [`PoaGraph`] is a two-stage process:
//!
//! 1. [`ColumnOccupancy::assign`] places every node at `x = column * spacing` and stacks the nodes of each column vertically in the order they are encountered along the sequences.
//! 2. [`compaction::compact`] finds maximal unbranched chains and moves each chain into a single free horizontal lane.
//!
//! The result is stored in a [`CachedLayout`], which is immutable and can be shared between threads.
//! Note that the layout depends on the order of the sequences.

use crate::{DatasetKey, GraphEdge, GraphNode, LayoutError, PoaGraph, Sequence};
use crate::graph::EdgeKind;
use crate::formats::{EdgeClass, EdgeElement, NodeClass, NodeElement};

use std::mem;
use std::ops::RangeInclusive;

pub mod compaction;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Parameters for laying out a graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Distance between adjacent columns and between stacked nodes in a column.
    pub spacing: f64,

    /// Distance between candidate lanes for compacted chains.
    pub lane_step: f64,

    /// Compact unbranched chains into shared lanes.
    pub compact_paths: bool,
}

impl LayoutParams {
    /// Default distance between columns and between stacked nodes.
    pub const SPACING: f64 = 10.0;

    /// Returns an error if the parameters cannot produce a layout.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(LayoutError::InvalidParameters(format!("spacing must be positive, got {}", self.spacing)));
        }
        if !self.lane_step.is_finite() || self.lane_step <= 0.0 {
            return Err(LayoutError::InvalidParameters(format!("lane step must be positive, got {}", self.lane_step)));
        }
        Ok(())
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            spacing: Self::SPACING,
            lane_step: Self::SPACING,
            compact_paths: true,
        }
    }
}

/// Position of a node in the layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

//-----------------------------------------------------------------------------

/// Node identifiers in each column in the order they were placed.
///
/// Columns without nodes are empty.
/// The last column always contains at least one node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    columns: Vec<Vec<usize>>,
}

impl ColumnIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        ColumnIndex::default()
    }

    // Appends the node to the column.
    pub(crate) fn push(&mut self, column_id: usize, node_id: usize) {
        if column_id >= self.columns.len() {
            self.columns.resize(column_id + 1, Vec::new());
        }
        self.columns[column_id].push(node_id);
    }

    /// Returns the number of columns, including empty ones before the last column.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the index has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the last column identifier, or [`None`] if the index is empty.
    pub fn max_column(&self) -> Option<usize> {
        self.columns.len().checked_sub(1)
    }

    /// Returns the nodes in the column in placement order.
    ///
    /// Returns an empty slice if the column does not exist.
    pub fn column(&self, column_id: usize) -> &[usize] {
        self.columns.get(column_id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Returns the total number of nodes in the index.
    pub fn node_count(&self) -> usize {
        self.columns.iter().map(|list| list.len()).sum()
    }

    /// Returns the smallest and the largest node identifier in the given columns, or [`None`] if the columns contain no nodes.
    ///
    /// Columns past the end are ignored.
    /// Runs in time proportional to the number of nodes in the columns.
    pub fn id_bounds(&self, columns: RangeInclusive<usize>) -> Option<(usize, usize)> {
        let (start, end) = (*columns.start(), *columns.end());
        if start > end || start >= self.columns.len() {
            return None;
        }
        let end = end.min(self.columns.len() - 1);
        self.columns[start..=end].iter().flatten().fold(None, |bounds, &node_id| match bounds {
            None => Some((node_id, node_id)),
            Some((low, high)) => Some((low.min(node_id), high.max(node_id))),
        })
    }

    fn heap_size(&self) -> usize {
        self.columns.capacity() * mem::size_of::<Vec<usize>>()
            + self.columns.iter().map(|list| list.capacity() * mem::size_of::<usize>()).sum::<usize>()
    }
}

//-----------------------------------------------------------------------------

/// Assigns a vertical slot to each node within its column.
///
/// Each column keeps track of its topmost occupied slot.
/// A new node is placed one spacing unit above it, or at `y = 0` if the column is empty.
/// No two nodes in the same column share a `y` value.
///
/// # Examples
///
/// ```
/// use poagraph_view::{ColumnOccupancy, GraphNode, Position, Sequence};
///
/// let nodes: Vec<GraphNode> = [0, 1, 1, 2].iter().enumerate().map(|(id, &column_id)| {
///     GraphNode { id, column_id, aligned_to_id: None, label: String::new() }
/// }).collect();
/// let sequences = vec![
///     Sequence { id: 0, path: vec![0, 2, 3] },
///     Sequence { id: 1, path: vec![0, 1, 3] },
/// ];
///
/// let (positions, index) = ColumnOccupancy::assign(&nodes, &sequences, 10.0).unwrap();
/// assert_eq!(positions[0], Position::new(0.0, 0.0));
/// // Node 2 is encountered first, so it gets the bottom slot in column 1.
/// assert_eq!(positions[2], Position::new(10.0, 0.0));
/// assert_eq!(positions[1], Position::new(10.0, 10.0));
/// assert_eq!(positions[3], Position::new(20.0, 0.0));
/// assert_eq!(index.column(1), &[2, 1]);
/// ```
#[derive(Clone, Debug)]
pub struct ColumnOccupancy {
    spacing: f64,
    // Topmost occupied y in each column.
    top: Vec<Option<f64>>,
    positions: Vec<Option<Position>>,
    index: ColumnIndex,
}

impl ColumnOccupancy {
    /// Places the nodes in the order they are first encountered on the sequences.
    ///
    /// Nodes that are not on any sequence are placed afterwards in identifier order.
    /// Node identifiers must be dense: node `i` is `nodes[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DataIntegrity`] if a sequence refers to a missing node or a node identifier does not match its offset.
    pub fn assign(nodes: &[GraphNode], sequences: &[Sequence], spacing: f64) -> Result<(Vec<Position>, ColumnIndex), LayoutError> {
        let mut occupancy = ColumnOccupancy {
            spacing,
            top: Vec::new(),
            positions: vec![None; nodes.len()],
            index: ColumnIndex::new(),
        };

        for sequence in sequences.iter() {
            for node_id in sequence.path.iter() {
                let node = nodes.get(*node_id).ok_or_else(|| LayoutError::DataIntegrity(
                    format!("Sequence {} refers to missing node {}", sequence.id, node_id)
                ))?;
                occupancy.place(node)?;
            }
        }
        for node in nodes.iter() {
            occupancy.place(node)?;
        }

        // Every node was placed in the second loop at the latest.
        let positions = occupancy.positions.into_iter().map(|pos| pos.unwrap_or_default()).collect();
        Ok((positions, occupancy.index))
    }

    fn place(&mut self, node: &GraphNode) -> Result<(), LayoutError> {
        let slot = self.positions.get_mut(node.id).ok_or_else(|| LayoutError::DataIntegrity(
            format!("Node identifier {} is out of range", node.id)
        ))?;
        if slot.is_some() {
            return Ok(());
        }
        if node.column_id >= self.top.len() {
            self.top.resize(node.column_id + 1, None);
        }
        let y = match self.top[node.column_id] {
            Some(top) => top + self.spacing,
            None => 0.0,
        };
        self.top[node.column_id] = Some(y);
        *slot = Some(Position::new(node.column_id as f64 * self.spacing, y));
        self.index.push(node.column_id, node.id);
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// A node in a finished layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaidOutNode {
    pub x: f64,
    pub y: f64,
    pub aligned_to_id: Option<usize>,
    pub label: String,
    pub column_id: usize,
    /// Offset of the compacted chain containing the node, if any.
    pub chain: Option<usize>,
}

impl LaidOutNode {
    /// Returns the rendering class of the node.
    pub fn classification(&self) -> NodeClass {
        if self.chain.is_some() { NodeClass::Chain } else { NodeClass::Standalone }
    }
}

/// A fully laid-out graph for a dataset.
///
/// Nodes are stored in a dense array indexed by node identifier.
/// The layout is immutable once built.
///
/// # Examples
///
/// ```
/// use poagraph_view::{CachedLayout, DatasetKey, GraphNode, LayoutParams, PoaGraph, Sequence};
/// use poagraph_view::formats::NodeClass;
///
/// // A single unbranched path becomes one chain.
/// let nodes: Vec<GraphNode> = (0..4).map(|id| {
///     GraphNode { id, column_id: id, aligned_to_id: None, label: String::from("A") }
/// }).collect();
/// let sequences = vec![Sequence { id: 0, path: vec![0, 1, 2, 3] }];
/// let graph = PoaGraph::new(nodes, sequences).unwrap();
///
/// let key = DatasetKey::from_bytes(b"example");
/// let layout = CachedLayout::build(key, &graph, &LayoutParams::default()).unwrap();
/// assert_eq!(layout.node_count(), 4);
/// assert_eq!(layout.chains().len(), 1);
/// assert_eq!(layout.chains()[0], vec![0, 1, 2, 3]);
/// assert!(layout.nodes().iter().all(|node| node.classification() == NodeClass::Chain));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CachedLayout {
    key: DatasetKey,
    nodes: Vec<LaidOutNode>,
    edges: Vec<Vec<GraphEdge>>,
    column_index: ColumnIndex,
    chains: Vec<Vec<usize>>,
}

/// Construction.
impl CachedLayout {
    /// Lays out the graph.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidParameters`] if the parameters are invalid.
    /// Passes through errors from [`ColumnOccupancy::assign`].
    pub fn build(key: DatasetKey, graph: &PoaGraph, params: &LayoutParams) -> Result<Self, LayoutError> {
        params.validate()?;

        let (mut positions, column_index) = ColumnOccupancy::assign(graph.nodes(), graph.sequences(), params.spacing)?;
        let chains = if params.compact_paths {
            compaction::compact(&mut positions, graph, &column_index, params.lane_step)
        } else {
            Vec::new()
        };

        let mut nodes: Vec<LaidOutNode> = graph.nodes().iter().zip(positions.iter()).map(|(node, pos)| {
            LaidOutNode {
                x: pos.x,
                y: pos.y,
                aligned_to_id: node.aligned_to_id,
                label: node.label.clone(),
                column_id: node.column_id,
                chain: None,
            }
        }).collect();
        for (chain_id, chain) in chains.iter().enumerate() {
            for node_id in chain.iter() {
                nodes[*node_id].chain = Some(chain_id);
            }
        }

        let edges = (0..graph.node_count()).map(|node_id| graph.outgoing(node_id).to_vec()).collect();
        log::debug!(
            "Laid out {} nodes in {} columns with {} compacted chains",
            nodes.len(), column_index.len(), chains.len()
        );

        Ok(CachedLayout { key, nodes, edges, column_index, chains })
    }

    /// Returns an empty layout for the key.
    pub fn empty(key: DatasetKey) -> Self {
        CachedLayout {
            key,
            nodes: Vec::new(),
            edges: Vec::new(),
            column_index: ColumnIndex::new(),
            chains: Vec::new(),
        }
    }
}

/// Accessing the layout.
impl CachedLayout {
    /// Returns the dataset key.
    pub fn key(&self) -> DatasetKey {
        self.key
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the layout has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|list| list.len()).sum()
    }

    /// Returns the laid-out nodes in identifier order.
    pub fn nodes(&self) -> &[LaidOutNode] {
        &self.nodes
    }

    /// Returns the node with the given identifier, or [`None`] if there is no such node.
    pub fn node(&self, node_id: usize) -> Option<&LaidOutNode> {
        self.nodes.get(node_id)
    }

    /// Returns the outgoing edges of the node, or an empty slice if there is no such node.
    pub fn outgoing(&self, node_id: usize) -> &[GraphEdge] {
        self.edges.get(node_id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Returns the column index.
    pub fn column_index(&self) -> &ColumnIndex {
        &self.column_index
    }

    /// Returns the last column identifier, or [`None`] if the layout is empty.
    pub fn max_column(&self) -> Option<usize> {
        self.column_index.max_column()
    }

    /// Returns the compacted chains as lists of node identifiers.
    pub fn chains(&self) -> &[Vec<usize>] {
        &self.chains
    }

    /// Returns the rendering class of an edge in this layout.
    ///
    /// A structural edge between two nodes of the same chain is a chain edge.
    pub fn edge_class(&self, edge: &GraphEdge) -> EdgeClass {
        let source_chain = self.node(edge.source_id).and_then(|node| node.chain);
        let target_chain = self.node(edge.target_id).and_then(|node| node.chain);
        classify_edge(edge.kind, source_chain, target_chain)
    }

    /// Returns the rendering record for the node, or [`None`] if there is no such node.
    pub fn node_element(&self, node_id: usize) -> Option<NodeElement> {
        let node = self.node(node_id)?;
        Some(NodeElement {
            id: node_id,
            label: node.label.clone(),
            x: node.x,
            y: node.y,
            aligned_to_id: node.aligned_to_id,
            column_id: node.column_id,
            classification: node.classification(),
        })
    }

    /// Returns the rendering records for the outgoing edges of the node.
    pub fn edge_elements(&self, node_id: usize) -> impl Iterator<Item = EdgeElement> + '_ {
        self.outgoing(node_id).iter().map(|edge| EdgeElement {
            source_id: edge.source_id,
            target_id: edge.target_id,
            weight: edge.weight(),
            classification: self.edge_class(edge),
        })
    }

    /// Returns an estimate of the heap memory used by the layout in bytes.
    pub fn heap_size(&self) -> usize {
        let nodes = self.nodes.capacity() * mem::size_of::<LaidOutNode>()
            + self.nodes.iter().map(|node| node.label.capacity()).sum::<usize>();
        let edges = self.edges.capacity() * mem::size_of::<Vec<GraphEdge>>()
            + self.edges.iter().map(|list| {
                list.capacity() * mem::size_of::<GraphEdge>()
                    + list.iter().map(|edge| edge.sequence_ids.capacity() * mem::size_of::<usize>()).sum::<usize>()
            }).sum::<usize>();
        let chains = self.chains.capacity() * mem::size_of::<Vec<usize>>()
            + self.chains.iter().map(|chain| chain.capacity() * mem::size_of::<usize>()).sum::<usize>();
        nodes + edges + chains + self.column_index.heap_size()
    }

    // Used when loading a layout from a database.
    pub(crate) fn from_parts(
        key: DatasetKey,
        nodes: Vec<LaidOutNode>,
        edges: Vec<Vec<GraphEdge>>,
        column_index: ColumnIndex,
        chains: Vec<Vec<usize>>
    ) -> Self {
        CachedLayout { key, nodes, edges, column_index, chains }
    }
}

// Chain edges connect two members of the same chain.
pub(crate) fn classify_edge(kind: EdgeKind, source_chain: Option<usize>, target_chain: Option<usize>) -> EdgeClass {
    if kind == EdgeKind::Structural && source_chain.is_some() && source_chain == target_chain {
        EdgeClass::Chain
    } else {
        EdgeClass::from(kind)
    }
}

/// Lays out the graph for the given dataset key.
///
/// This is the same as [`CachedLayout::build`].
pub fn layout_graph(key: DatasetKey, graph: &PoaGraph, params: &LayoutParams) -> Result<CachedLayout, LayoutError> {
    CachedLayout::build(key, graph, params)
}

//-----------------------------------------------------------------------------
