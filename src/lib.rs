//! # Poagraph-view: layout and windowed retrieval for partial-order alignment graphs.
//!
//! This crate turns a poagraph and its consensus tree, as produced by an external alignment/consensus engine, into positioned elements for an interactive viewer.
//! Graphs may have tens of thousands of nodes, so the layout is computed once per dataset and cached, and the viewer only materializes a window of columns at a time.
//!
//! ### Graph layout
//!
//! A [`PoaGraph`] is built from the nodes and sequences of a [`formats::DatasetRecord`].
//! [`ColumnOccupancy`] stacks the nodes of each column in the order they are encountered along the sequences, and [`layout::compaction`] moves unbranched chains into shared horizontal lanes.
//! The result is an immutable [`CachedLayout`].
//!
//! ### Caching and windows
//!
//! [`ElementCache`] stores layouts under a [`DatasetKey`], which is a content hash of the dataset.
//! Identical uploads share a cache entry.
//! [`SessionStore`] binds each session to the dataset it is viewing.
//! [`viewport::select`] returns the nodes and edges for a column range in time proportional to the window.
//!
//! A layout can also be stored in an SQLite database.
//! See [`LayoutBase`] and [`LayoutInterface`].
//!
//! ### Consensus tree
//!
//! [`ConsensusTree`] is a validated rooted tree.
//! [`TreeLayout`] positions its nodes, and [`Frontier`] computes the visible nodes at a compatibility threshold.
//!
//! ### Errors
//!
//! The layout engine reports [`LayoutError`].
//! Database and file operations return errors as strings.

pub mod cache;
pub mod db;
pub mod formats;
pub mod graph;
pub mod layout;
pub mod tree;
pub mod utils;
pub mod viewport;

mod error;

#[cfg(test)]
mod internal;

pub use cache::{DatasetKey, ElementCache, SessionStore};
pub use db::{LayoutBase, LayoutInterface};
pub use error::LayoutError;
pub use graph::{EdgeKind, GraphEdge, GraphNode, PoaGraph, Sequence};
pub use layout::{CachedLayout, ColumnIndex, ColumnOccupancy, LaidOutNode, LayoutParams, Position, layout_graph};
pub use tree::{ConsensusTree, ConsensusTreeNode};
pub use tree::layout::{TreeLayout, TreeLayoutParams};
pub use tree::pruning::Frontier;
pub use viewport::{ColumnRange, Viewport};
