use crate::{CachedLayout, ConsensusTree, DatasetKey, GraphNode, LayoutBase, LayoutInterface, LayoutParams, PoaGraph, Sequence};
use crate::formats::{self, DatasetRecord, TreeNodeRecord};
use crate::utils;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use simple_sds::serialize;

use std::path::{Path, PathBuf};

//-----------------------------------------------------------------------------

// Graphs.

// Builds a graph with node `i` in `columns[i]`.
pub(crate) fn graph_from_columns(columns: &[usize], paths: &[Vec<usize>]) -> PoaGraph {
    let nodes: Vec<GraphNode> = columns.iter().enumerate().map(|(id, &column_id)| {
        GraphNode { id, column_id, aligned_to_id: None, label: String::from("N") }
    }).collect();
    let sequences: Vec<Sequence> = paths.iter().enumerate().map(|(id, path)| {
        Sequence { id, path: path.clone() }
    }).collect();
    let graph = PoaGraph::new(nodes, sequences);
    assert!(graph.is_ok(), "Failed to build graph: {}", graph.unwrap_err());
    graph.unwrap()
}

pub(crate) fn load_example_dataset() -> DatasetRecord {
    let filename = utils::get_test_data("example.json");
    let dataset = formats::read_dataset(&filename);
    assert!(dataset.is_ok(), "Failed to read dataset {}: {}", filename.display(), dataset.unwrap_err());
    dataset.unwrap()
}

pub(crate) fn example_graph() -> PoaGraph {
    let dataset = load_example_dataset();
    let graph = PoaGraph::from_record(&dataset);
    assert!(graph.is_ok(), "Failed to build the example graph: {}", graph.unwrap_err());
    graph.unwrap()
}

pub(crate) fn layout(graph: &PoaGraph, name: &str) -> CachedLayout {
    let key = DatasetKey::from_bytes(name.as_bytes());
    let layout = CachedLayout::build(key, graph, &LayoutParams::default());
    assert!(layout.is_ok(), "Failed to lay out graph {}: {}", name, layout.unwrap_err());
    layout.unwrap()
}

// Random graph with `columns` columns of 1 to `width` nodes each.
// Node identifiers are shuffled, so they are not sorted by column.
// Each sequence visits a random node in a random subset of the columns.
pub(crate) fn random_graph(rng: &mut StdRng, columns: usize, width: usize, sequences: usize) -> PoaGraph {
    let mut column_ids: Vec<usize> = Vec::new();
    for column_id in 0..columns {
        let count = rng.gen_range(1..=width);
        column_ids.extend(std::iter::repeat(column_id).take(count));
    }
    column_ids.shuffle(rng);

    let mut by_column: Vec<Vec<usize>> = vec![Vec::new(); columns];
    for (node_id, column_id) in column_ids.iter().enumerate() {
        by_column[*column_id].push(node_id);
    }
    let mut nodes: Vec<GraphNode> = column_ids.iter().enumerate().map(|(id, &column_id)| {
        GraphNode { id, column_id, aligned_to_id: None, label: String::from("N") }
    }).collect();
    for column in by_column.iter() {
        if column.len() >= 2 {
            nodes[column[0]].aligned_to_id = Some(column[1]);
        }
    }

    let mut paths: Vec<Sequence> = Vec::with_capacity(sequences);
    for id in 0..sequences {
        let mut path: Vec<usize> = Vec::new();
        for column in by_column.iter() {
            if rng.gen_bool(0.8) {
                if let Some(node_id) = column.choose(rng) {
                    path.push(*node_id);
                }
            }
        }
        paths.push(Sequence { id, path });
    }

    let graph = PoaGraph::new(nodes, paths);
    assert!(graph.is_ok(), "Failed to build random graph: {}", graph.unwrap_err());
    graph.unwrap()
}

//-----------------------------------------------------------------------------

// Consensus trees.

pub(crate) fn tree_record(id: usize, min_compatibility: f64, children: &[usize], sequence_ids: &[usize]) -> TreeNodeRecord {
    TreeNodeRecord {
        id,
        min_compatibility,
        children: children.to_vec(),
        sequence_ids: sequence_ids.to_vec(),
        name: format!("CONSENSUS{}", id),
    }
}

// 0 (0.3) -> [1 (0.9), 2 (0.2) -> [3 (0.95)]]
pub(crate) fn example_tree_records() -> Vec<TreeNodeRecord> {
    vec![
        tree_record(0, 0.3, &[1, 2], &[0, 1, 2]),
        tree_record(1, 0.9, &[], &[0, 2]),
        tree_record(2, 0.2, &[3], &[1]),
        tree_record(3, 0.95, &[], &[1]),
    ]
}

pub(crate) fn build_tree(records: &[TreeNodeRecord]) -> ConsensusTree {
    let tree = ConsensusTree::from_records(records);
    assert!(tree.is_ok(), "Failed to build tree: {}", tree.unwrap_err());
    tree.unwrap()
}

pub(crate) fn example_tree() -> ConsensusTree {
    build_tree(&example_tree_records())
}

// Random tree with `nodes` nodes, where each node is attached to a random earlier node.
// Record order is shuffled, and compatibilities are random.
pub(crate) fn random_tree(rng: &mut StdRng, nodes: usize) -> ConsensusTree {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    for node_id in 1..nodes {
        let parent = rng.gen_range(0..node_id);
        children[parent].push(node_id);
    }
    let mut records: Vec<TreeNodeRecord> = children.iter().enumerate().map(|(id, list)| {
        let compatibility = (rng.gen_range(0..=100) as f64) / 100.0;
        tree_record(id, compatibility, list, &[id])
    }).collect();
    records.shuffle(rng);
    build_tree(&records)
}

//-----------------------------------------------------------------------------

// Layout base utilities.

pub(crate) fn create_layout_base(layout: &CachedLayout) -> PathBuf {
    let db_file = serialize::temp_file_name("layout-base");
    assert!(!utils::file_exists(&db_file), "Database {} already exists", db_file.display());
    let result = LayoutBase::create(layout, &db_file);
    assert!(result.is_ok(), "Failed to create database: {}", result.unwrap_err());
    db_file
}

pub(crate) fn open_layout_base(filename: &Path) -> LayoutBase {
    let database = LayoutBase::open(filename);
    assert!(database.is_ok(), "Failed to open database: {}", database.unwrap_err());
    database.unwrap()
}

pub(crate) fn create_interface(database: &LayoutBase) -> LayoutInterface<'_> {
    let interface = LayoutInterface::new(database);
    assert!(interface.is_ok(), "Failed to create layout interface: {}", interface.unwrap_err());
    interface.unwrap()
}

//-----------------------------------------------------------------------------
