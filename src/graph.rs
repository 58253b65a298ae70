//! A validated partial-order alignment graph.
//!
//! The graph is built once from the records produced by the external builder and is read-only afterwards.
//! Node identifiers are dense integers `0..n`, and each node belongs to a column (topological rank).
//! Sequences are paths over the nodes, and every consecutive pair of nodes in a path induces a structural edge.
//! A node may also be aligned to another node, which induces an aligned-variant edge.

use crate::LayoutError;
use crate::formats::{DatasetRecord, EdgeClass, NodeRecord, SequenceRecord};

use std::collections::HashMap;


//-----------------------------------------------------------------------------

/// A node in the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphNode {
    /// Dense identifier of the node.
    pub id: usize,
    /// Column (topological rank) of the node.
    pub column_id: usize,
    /// Another node representing an alternative allele in the same column.
    pub aligned_to_id: Option<usize>,
    /// Label of the node.
    pub label: String,
}

impl From<&NodeRecord> for GraphNode {
    fn from(record: &NodeRecord) -> Self {
        GraphNode {
            id: record.id,
            column_id: record.column_id,
            aligned_to_id: record.aligned_to_id,
            label: record.label.clone(),
        }
    }
}

/// A sequence as a path of node identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    pub id: usize,
    pub path: Vec<usize>,
}

impl From<&SequenceRecord> for Sequence {
    fn from(record: &SequenceRecord) -> Self {
        Sequence { id: record.id, path: record.path.clone() }
    }
}

/// Kind of a graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// Induced by consecutive nodes on a sequence path.
    Structural,
    /// From a node to the node it is aligned to.
    AlignedVariant,
}

impl EdgeKind {
    pub(crate) fn code(&self) -> i64 {
        match self {
            EdgeKind::Structural => 0,
            EdgeKind::AlignedVariant => 1,
        }
    }

    pub(crate) fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EdgeKind::Structural),
            1 => Some(EdgeKind::AlignedVariant),
            _ => None,
        }
    }
}

impl From<EdgeKind> for EdgeClass {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Structural => EdgeClass::Structural,
            EdgeKind::AlignedVariant => EdgeClass::AlignedVariant,
        }
    }
}

/// A directed edge with the multiset of sequences using it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub source_id: usize,
    pub target_id: usize,
    /// Sequences using the edge, once per use.
    pub sequence_ids: Vec<usize>,
    pub kind: EdgeKind,
}

impl GraphEdge {
    /// Returns the number of sequence traversals over the edge.
    pub fn weight(&self) -> usize {
        self.sequence_ids.len()
    }
}

//-----------------------------------------------------------------------------

/// A partial-order alignment graph.
///
/// # Examples
///
/// ```
/// use poagraph_view::{GraphNode, PoaGraph, Sequence};
///
/// let nodes = vec![
///     GraphNode { id: 0, column_id: 0, aligned_to_id: None, label: String::from("A") },
///     GraphNode { id: 1, column_id: 1, aligned_to_id: Some(2), label: String::from("C") },
///     GraphNode { id: 2, column_id: 1, aligned_to_id: Some(1), label: String::from("G") },
///     GraphNode { id: 3, column_id: 2, aligned_to_id: None, label: String::from("T") },
/// ];
/// let sequences = vec![
///     Sequence { id: 0, path: vec![0, 1, 3] },
///     Sequence { id: 1, path: vec![0, 2, 3] },
///     Sequence { id: 2, path: vec![0, 1, 3] },
/// ];
/// let graph = PoaGraph::new(nodes, sequences).unwrap();
///
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.max_column(), Some(2));
/// assert_eq!(graph.successors(0).to_vec(), vec![1, 2]);
/// assert_eq!(graph.predecessors(3).to_vec(), vec![1, 2]);
///
/// // Edge 0 -> 1 is used twice.
/// let edge = graph.outgoing(0).iter().find(|edge| edge.target_id == 1).unwrap();
/// assert_eq!(edge.weight(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoaGraph {
    nodes: Vec<GraphNode>,
    sequences: Vec<Sequence>,
    // Outgoing edges for each node.
    edges: Vec<Vec<GraphEdge>>,
    // Distinct structural predecessors and successors for each node.
    predecessors: Vec<Vec<usize>>,
    successors: Vec<Vec<usize>>,
}

impl PoaGraph {
    /// Builds a graph from nodes and sequences.
    ///
    /// The nodes may be given in any order, but their identifiers must be exactly `0..n`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DataIntegrity`] if:
    ///
    /// * node identifiers are not dense or contain duplicates;
    /// * a node is aligned to itself, to a missing node, or to a node in another column;
    /// * a sequence path refers to a missing node or visits the same node twice in a row;
    /// * the column does not increase between consecutive nodes of a sequence path.
    pub fn new(nodes: Vec<GraphNode>, sequences: Vec<Sequence>) -> Result<Self, LayoutError> {
        let mut nodes = nodes;
        nodes.sort_by_key(|node| node.id);
        for (expected, node) in nodes.iter().enumerate() {
            if node.id != expected {
                return Err(LayoutError::DataIntegrity(
                    format!("Node identifiers are not dense: expected {}, found {}", expected, node.id)
                ));
            }
        }
        for node in nodes.iter() {
            if let Some(target) = node.aligned_to_id {
                if target == node.id {
                    return Err(LayoutError::DataIntegrity(format!("Node {} is aligned to itself", node.id)));
                }
                if target >= nodes.len() {
                    return Err(LayoutError::DataIntegrity(
                        format!("Node {} is aligned to missing node {}", node.id, target)
                    ));
                }
                if nodes[target].column_id != node.column_id {
                    return Err(LayoutError::DataIntegrity(format!(
                        "Node {} (column {}) is aligned to node {} in column {}",
                        node.id, node.column_id, target, nodes[target].column_id
                    )));
                }
            }
        }

        for sequence in sequences.iter() {
            Self::check_path(&nodes, sequence)?;
        }

        let (edges, predecessors, successors) = Self::build_edges(&nodes, &sequences);
        Ok(PoaGraph { nodes, sequences, edges, predecessors, successors })
    }

    /// Builds a graph from the nodes and sequences of a dataset record.
    pub fn from_record(record: &DatasetRecord) -> Result<Self, LayoutError> {
        let nodes = record.nodes.iter().map(GraphNode::from).collect();
        let sequences = record.sequences.iter().map(Sequence::from).collect();
        Self::new(nodes, sequences)
    }

    fn check_path(nodes: &[GraphNode], sequence: &Sequence) -> Result<(), LayoutError> {
        let mut prev: Option<&GraphNode> = None;
        for node_id in sequence.path.iter() {
            let node = nodes.get(*node_id).ok_or_else(|| LayoutError::DataIntegrity(
                format!("Sequence {} refers to missing node {}", sequence.id, node_id)
            ))?;
            if let Some(prev) = prev {
                if prev.id == node.id {
                    return Err(LayoutError::DataIntegrity(
                        format!("Sequence {} visits node {} twice in a row", sequence.id, node.id)
                    ));
                }
                if prev.column_id >= node.column_id {
                    return Err(LayoutError::DataIntegrity(format!(
                        "Sequence {} does not advance from node {} (column {}) to node {} (column {})",
                        sequence.id, prev.id, prev.column_id, node.id, node.column_id
                    )));
                }
            }
            prev = Some(node);
        }
        Ok(())
    }

    // Edges are listed in order of first use.
    #[allow(clippy::type_complexity)]
    fn build_edges(nodes: &[GraphNode], sequences: &[Sequence]) -> (Vec<Vec<GraphEdge>>, Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let mut edges: Vec<Vec<GraphEdge>> = vec![Vec::new(); nodes.len()];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

        // (source, target) -> offset in edges[source].
        let mut edge_offsets: HashMap<(usize, usize), usize> = HashMap::new();
        for sequence in sequences.iter() {
            for window in sequence.path.windows(2) {
                let (source, target) = (window[0], window[1]);
                match edge_offsets.get(&(source, target)) {
                    Some(offset) => edges[source][*offset].sequence_ids.push(sequence.id),
                    None => {
                        edge_offsets.insert((source, target), edges[source].len());
                        edges[source].push(GraphEdge {
                            source_id: source,
                            target_id: target,
                            sequence_ids: vec![sequence.id],
                            kind: EdgeKind::Structural,
                        });
                        successors[source].push(target);
                        predecessors[target].push(source);
                    },
                }
            }
        }

        for node in nodes.iter() {
            if let Some(target) = node.aligned_to_id {
                edges[node.id].push(GraphEdge {
                    source_id: node.id,
                    target_id: target,
                    sequence_ids: Vec::new(),
                    kind: EdgeKind::AlignedVariant,
                });
            }
        }

        for list in predecessors.iter_mut().chain(successors.iter_mut()) {
            list.sort_unstable();
        }

        (edges, predecessors, successors)
    }
}

//-----------------------------------------------------------------------------

/// Accessing the graph.
impl PoaGraph {
    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges, including aligned-variant edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|list| list.len()).sum()
    }

    /// Returns the nodes in identifier order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Returns the node with the given identifier, or [`None`] if there is no such node.
    pub fn node(&self, node_id: usize) -> Option<&GraphNode> {
        self.nodes.get(node_id)
    }

    /// Returns the sequences in input order.
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Returns the outgoing edges of the node, or an empty slice if there is no such node.
    pub fn outgoing(&self, node_id: usize) -> &[GraphEdge] {
        self.edges.get(node_id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Returns the distinct structural successors of the node in sorted order.
    pub fn successors(&self, node_id: usize) -> &[usize] {
        self.successors.get(node_id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Returns the distinct structural predecessors of the node in sorted order.
    pub fn predecessors(&self, node_id: usize) -> &[usize] {
        self.predecessors.get(node_id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Returns the number of distinct structural successors.
    pub fn out_degree(&self, node_id: usize) -> usize {
        self.successors.get(node_id).map_or(0, |list| list.len())
    }

    /// Returns the number of distinct structural predecessors.
    pub fn in_degree(&self, node_id: usize) -> usize {
        self.predecessors.get(node_id).map_or(0, |list| list.len())
    }

    /// Returns the largest column identifier, or [`None`] if the graph is empty.
    pub fn max_column(&self) -> Option<usize> {
        self.nodes.iter().map(|node| node.column_id).max()
    }
}

//-----------------------------------------------------------------------------
