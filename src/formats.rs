//! Input and output records, and JSON I/O for them.
//!
//! ### Input (reading)
//!
//! The external alignment/consensus engine produces a single dataset record:
//!
//! * `nodes`: an array of [`NodeRecord`] objects `{id, columnId, alignedToId?, label}`.
//! * `sequences`: an array of [`SequenceRecord`] objects `{id, path}`.
//! * `tree`: an optional array of [`TreeNodeRecord`] objects `{id, minCompatibility, children, sequenceIds, name}`.
//!
//! Use [`read_dataset`] for files (which may be gzip-compressed) and [`parse_dataset`] for raw upload bytes.
//!
//! ### Output (writing)
//!
//! Rendering collaborators consume [`NodeElement`], [`EdgeElement`], [`TreeNodeElement`], [`TreeSegment`], and [`PruneRecord`].
//! All records serialize to JSON objects with camelCase field names.
//! Any of them can be written with [`write_json`].

use crate::utils;

use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};


//-----------------------------------------------------------------------------

/// A poagraph node as produced by the external builder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Dense node identifier.
    pub id: usize,
    /// Column (topological rank) of the node.
    pub column_id: usize,
    /// Another node in the same column representing an alternative allele.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aligned_to_id: Option<usize>,
    /// Base or other label shown for the node.
    #[serde(default)]
    pub label: String,
}

/// A sequence as a path of node identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRecord {
    pub id: usize,
    #[serde(default)]
    pub path: Vec<usize>,
}

/// A consensus tree node in parent/children form.
///
/// The parent is implied by the `children` arrays of other nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeRecord {
    pub id: usize,
    pub min_compatibility: f64,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub sequence_ids: Vec<usize>,
    #[serde(default)]
    pub name: String,
}

/// A complete dataset uploaded by a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub sequences: Vec<SequenceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<Vec<TreeNodeRecord>>,
}

impl DatasetRecord {
    /// Returns `true` if the dataset contains no nodes, no sequences, and no tree nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.sequences.is_empty() && self.tree.as_ref().map_or(true, |tree| tree.is_empty())
    }
}

//-----------------------------------------------------------------------------

/// Rendering class of a graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// The node keeps its column slot.
    Standalone,
    /// The node was moved into the shared lane of a compacted chain.
    Chain,
}

/// Rendering class of a graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeClass {
    /// An edge induced by sequence paths.
    Structural,
    /// An edge between a node and its aligned alternative.
    AlignedVariant,
    /// A structural edge between consecutive members of a compacted chain.
    Chain,
}

/// A positioned graph node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeElement {
    pub id: usize,
    pub label: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aligned_to_id: Option<usize>,
    pub column_id: usize,
    pub classification: NodeClass,
}

/// A graph edge with the number of sequences using it as the weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeElement {
    pub source_id: usize,
    pub target_id: usize,
    pub weight: usize,
    pub classification: EdgeClass,
}

/// A positioned consensus tree node.
///
/// `x` is the (possibly normalized) minimum compatibility of the node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeElement {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

/// An elbow line from a parent to a child in the consensus tree.
///
/// The points are the parent, the corner at the parent's `x` and the child's `y`, and the child.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSegment {
    pub parent_id: usize,
    pub child_id: usize,
    pub points: [(f64, f64); 3],
}

/// The result of a threshold cut in a form suitable for filtering a table of sequences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneRecord {
    pub threshold: f64,
    pub hidden: Vec<usize>,
    pub visible: Vec<usize>,
    pub hidden_sequences: Vec<usize>,
}

//-----------------------------------------------------------------------------

/// Parses a dataset record from JSON bytes.
pub fn parse_dataset(bytes: &[u8]) -> Result<DatasetRecord, String> {
    serde_json::from_slice(bytes).map_err(|x| format!("Invalid dataset record: {}", x))
}

/// Reads a dataset record from a JSON file, which may be gzip-compressed.
pub fn read_dataset<P: AsRef<Path>>(filename: P) -> Result<DatasetRecord, String> {
    let reader = utils::open_file(&filename)?;
    serde_json::from_reader(reader).map_err(|x| {
        format!("Invalid dataset record in {}: {}", filename.as_ref().display(), x)
    })
}

/// Writes a record as a single line of JSON.
///
/// If `pretty` is `true`, the record is indented over multiple lines instead.
pub fn write_json<T: Serialize, W: Write>(value: &T, output: &mut W, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *output, value)?;
    } else {
        serde_json::to_writer(&mut *output, value)?;
    }
    output.write_all(b"\n")?;
    Ok(())
}

//-----------------------------------------------------------------------------
