//! Windowed retrieval of graph elements by column range.
//!
//! A viewer only materializes the part of a large graph that is visible.
//! [`select`] resolves the nodes in a column range using the [`ColumnIndex`](crate::ColumnIndex) of a [`CachedLayout`], and returns the contiguous block of nodes between the smallest and the largest resolved identifier.
//! Every returned node comes with its entire outgoing edge list, even if the target is outside the window.
//!
//! The cost is proportional to the size of the window, not to the size of the graph.
//! Selection is monotonic: widening the column range never removes elements from the result.

use crate::{CachedLayout, DatasetKey, ElementCache, LayoutError};
use crate::formats::{EdgeElement, NodeElement};

use std::fmt::Display;
use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};


//-----------------------------------------------------------------------------

/// An inclusive range of column identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRange {
    pub start: usize,
    pub end: usize,
}

impl ColumnRange {
    /// Creates a new range from `start` to `end` inclusive.
    pub fn new(start: usize, end: usize) -> Self {
        ColumnRange { start, end }
    }

    /// Returns the default window for a graph with the given last column.
    ///
    /// This is the middle third `[floor(0.3 * max_column), floor(0.6 * max_column)]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use poagraph_view::ColumnRange;
    ///
    /// assert_eq!(ColumnRange::default_for(100), ColumnRange::new(30, 60));
    /// assert_eq!(ColumnRange::default_for(9), ColumnRange::new(2, 5));
    /// assert_eq!(ColumnRange::default_for(0), ColumnRange::new(0, 0));
    /// ```
    pub fn default_for(max_column: usize) -> Self {
        let start = (0.3 * max_column as f64).floor() as usize;
        let end = (0.6 * max_column as f64).floor() as usize;
        ColumnRange { start, end }
    }

    /// Returns `true` if the range contains no columns.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Returns `true` if this range is contained in the other range.
    pub fn is_subset_of(&self, other: &ColumnRange) -> bool {
        self.is_empty() || (other.start <= self.start && self.end <= other.end)
    }

    /// Returns the range as a [`RangeInclusive`].
    pub fn to_range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl From<RangeInclusive<usize>> for ColumnRange {
    fn from(range: RangeInclusive<usize>) -> Self {
        ColumnRange::new(*range.start(), *range.end())
    }
}

impl Display for ColumnRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

//-----------------------------------------------------------------------------

/// Graph elements selected for a column range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// The column range used for the selection.
    pub range: ColumnRange,
    /// Nodes in identifier order.
    pub nodes: Vec<NodeElement>,
    /// Outgoing edges of the nodes, grouped by source in identifier order.
    pub edges: Vec<EdgeElement>,
}

impl Viewport {
    /// Creates an empty viewport for the range.
    pub fn empty(range: ColumnRange) -> Self {
        Viewport { range, nodes: Vec::new(), edges: Vec::new() }
    }

    /// Returns `true` if the viewport has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the identifiers of the nodes as a range.
    pub fn node_ids(&self) -> Range<usize> {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => first.id..last.id + 1,
            _ => 0..0,
        }
    }
}

//-----------------------------------------------------------------------------

/// Resolves the column range for a query.
///
/// Uses [`ColumnRange::default_for`] if no range is given.
/// Returns [`None`] if the layout is empty.
pub fn resolve_range(max_column: Option<usize>, range: Option<ColumnRange>) -> Option<ColumnRange> {
    let max_column = max_column?;
    Some(range.unwrap_or_else(|| ColumnRange::default_for(max_column)))
}

/// Selects the nodes and edges for the column range.
///
/// See the module documentation for details.
///
/// # Examples
///
/// ```
/// use poagraph_view::{CachedLayout, ColumnRange, DatasetKey, GraphNode, LayoutParams, PoaGraph, Sequence};
/// use poagraph_view::viewport;
///
/// // Node identifiers are not sorted by column: columns 1 and 2 contain nodes 2 and 3.
/// let columns = [0, 3, 1, 2, 4];
/// let nodes: Vec<GraphNode> = columns.iter().enumerate().map(|(id, &column_id)| {
///     GraphNode { id, column_id, aligned_to_id: None, label: String::new() }
/// }).collect();
/// let sequences = vec![Sequence { id: 0, path: vec![0, 2, 3, 1, 4] }];
/// let graph = PoaGraph::new(nodes, sequences).unwrap();
/// let layout = CachedLayout::build(DatasetKey::from_bytes(b"window"), &graph, &LayoutParams::default()).unwrap();
///
/// let window = viewport::select(&layout, Some(ColumnRange::new(1, 2)));
/// assert_eq!(window.node_ids(), 2..4);
///
/// // Node 3 has an edge to node 1, which is outside the window.
/// assert_eq!(window.edges.len(), 2);
/// assert_eq!(window.edges[1].target_id, 1);
/// ```
pub fn select(layout: &CachedLayout, range: Option<ColumnRange>) -> Viewport {
    let range = match resolve_range(layout.max_column(), range) {
        Some(range) => range,
        None => return Viewport::empty(range.unwrap_or(ColumnRange::new(0, 0))),
    };

    let (first, last) = match layout.column_index().id_bounds(range.to_range()) {
        Some(bounds) => bounds,
        None => return Viewport::empty(range),
    };

    let mut nodes: Vec<NodeElement> = Vec::with_capacity(last + 1 - first);
    let mut edges: Vec<EdgeElement> = Vec::new();
    for node_id in first..=last {
        if let Some(element) = layout.node_element(node_id) {
            nodes.push(element);
        }
        edges.extend(layout.edge_elements(node_id));
    }

    Viewport { range, nodes, edges }
}

/// Selects the nodes and edges for the column range from a cached layout.
///
/// # Errors
///
/// Returns [`LayoutError::CacheMiss`] if the cache has no layout for the key.
/// The caller should then lay out the dataset again.
pub fn select_cached(cache: &ElementCache, key: DatasetKey, range: Option<ColumnRange>) -> Result<Viewport, LayoutError> {
    let layout = cache.get(key)?;
    Ok(select(&layout, range))
}

//-----------------------------------------------------------------------------
