use super::*;

use crate::internal;
use crate::formats::{EdgeClass, NodeClass};

use rand::SeedableRng;
use rand::rngs::StdRng;

use std::collections::HashMap;

//-----------------------------------------------------------------------------

fn check_packing(layout: &CachedLayout, name: &str) {
    // Maps (column, y) to the chain of the first node seen there.
    let mut seen: HashMap<(usize, u64), Option<usize>> = HashMap::new();
    for (node_id, node) in layout.nodes().iter().enumerate() {
        let slot = (node.column_id, node.y.to_bits());
        if let Some(chain) = seen.get(&slot) {
            assert!(
                chain.is_some() && *chain == node.chain,
                "{}: node {} shares y = {} in column {} with a node outside its chain", name, node_id, node.y, node.column_id
            );
        } else {
            seen.insert(slot, node.chain);
        }
    }
}

fn check_paths(graph: &PoaGraph, layout: &CachedLayout, name: &str) {
    for sequence in graph.sequences().iter() {
        for window in sequence.path.windows(2) {
            let (prev, next) = (&layout.nodes()[window[0]], &layout.nodes()[window[1]]);
            assert!(
                prev.x <= next.x,
                "{}: x decreases from node {} to node {} on sequence {}", name, window[0], window[1], sequence.id
            );
        }
    }
}

fn check_chains(graph: &PoaGraph, layout: &CachedLayout, name: &str) {
    let mut in_chain = vec![false; graph.node_count()];
    for (chain_id, chain) in layout.chains().iter().enumerate() {
        assert!(chain.len() >= 2, "{}: chain {} is too short", name, chain_id);
        let y = layout.nodes()[chain[0]].y;
        for (i, node_id) in chain.iter().enumerate() {
            assert!(!in_chain[*node_id], "{}: node {} is in multiple chains", name, node_id);
            in_chain[*node_id] = true;
            let node = &layout.nodes()[*node_id];
            assert_eq!(node.chain, Some(chain_id), "{}: wrong chain for node {}", name, node_id);
            assert_eq!(node.y, y, "{}: node {} is not in the lane of chain {}", name, node_id, chain_id);
            if i + 1 < chain.len() {
                assert_eq!(graph.successors(*node_id), &[chain[i + 1]], "{}: node {} has other successors", name, node_id);
                assert_eq!(graph.predecessors(chain[i + 1]), &[*node_id], "{}: node {} has other predecessors", name, chain[i + 1]);
            }
        }
    }

    // Maximality: every remaining link would have been part of a chain.
    for node_id in 0..graph.node_count() {
        if let [next] = graph.successors(node_id) {
            if graph.in_degree(*next) == 1 {
                assert!(in_chain[node_id] && in_chain[*next], "{}: link {} -> {} is not in a chain", name, node_id, next);
            }
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn occupancy_packing() {
    let mut rng = StdRng::seed_from_u64(0xC0_1);
    for round in 0..10 {
        let graph = internal::random_graph(&mut rng, 30, 4, 5);
        let result = ColumnOccupancy::assign(graph.nodes(), graph.sequences(), 10.0);
        assert!(result.is_ok(), "Round {}: occupancy failed: {}", round, result.unwrap_err());
        let (positions, index) = result.unwrap();

        assert_eq!(index.node_count(), graph.node_count(), "Round {}: wrong number of indexed nodes", round);
        for column_id in 0..index.len() {
            let column = index.column(column_id);
            for (slot, node_id) in column.iter().enumerate() {
                let node = graph.node(*node_id).unwrap();
                assert_eq!(node.column_id, column_id, "Round {}: node {} indexed in the wrong column", round, node_id);
                // Nodes are stacked from the bottom in placement order.
                assert_eq!(positions[*node_id], Position::new(column_id as f64 * 10.0, slot as f64 * 10.0), "Round {}: wrong position for node {}", round, node_id);
            }
        }
    }
}

#[test]
fn occupancy_order() {
    // Node 2 is first on the second sequence, but node 1 was already placed by the first one.
    let graph = internal::graph_from_columns(&[0, 1, 1, 2, 1], &[vec![0, 1, 3], vec![0, 2, 3]]);
    let (positions, index) = ColumnOccupancy::assign(graph.nodes(), graph.sequences(), 5.0).unwrap();
    assert_eq!(positions[1], Position::new(5.0, 0.0));
    assert_eq!(positions[2], Position::new(5.0, 5.0));
    // Node 4 is not on any sequence, so it is placed last.
    assert_eq!(positions[4], Position::new(5.0, 10.0));
    assert_eq!(index.column(1), &[1, 2, 4]);
    assert_eq!(index.id_bounds(1..=1), Some((1, 4)));
    assert_eq!(index.id_bounds(3..=10), None);
    assert_eq!(index.id_bounds(2..=1), None);

    // Reversing the sequences swaps nodes 1 and 2.
    let sequences: Vec<Sequence> = graph.sequences().iter().rev().cloned().collect();
    let (positions, _) = ColumnOccupancy::assign(graph.nodes(), &sequences, 5.0).unwrap();
    assert_eq!(positions[2], Position::new(5.0, 0.0));
    assert_eq!(positions[1], Position::new(5.0, 5.0));
}

#[test]
fn occupancy_missing_node() {
    let nodes = vec![GraphNode { id: 0, column_id: 0, aligned_to_id: None, label: String::new() }];
    let sequences = vec![Sequence { id: 0, path: vec![0, 1] }];
    let result = ColumnOccupancy::assign(&nodes, &sequences, 10.0);
    assert!(matches!(result, Err(LayoutError::DataIntegrity(_))), "Missing node not reported: {:?}", result);
}

//-----------------------------------------------------------------------------

#[test]
fn find_lane() {
    let mut index = ColumnIndex::new();
    index.push(0, 0);
    index.push(0, 1);
    index.push(1, 2);
    index.push(2, 3);
    let mut positions = vec![
        Position::new(0.0, 0.0), Position::new(0.0, 10.0),
        Position::new(10.0, 0.0), Position::new(20.0, 0.0),
    ];

    let chain = [2, 3];
    assert_eq!(compaction::find_out_y(&positions, &index, &chain, 1..=2, 10.0), 0.0, "Chain members blocked their own lane");
    assert_eq!(compaction::find_out_y(&positions, &index, &chain, 0..=2, 10.0), 20.0, "Used an occupied lane");

    // Values within the tolerance block the lane.
    positions[1].y = 10.0 + 1e-9;
    assert_eq!(compaction::find_out_y(&positions, &index, &chain, 0..=2, 10.0), 20.0, "Near-equal y did not block the lane");
    positions[1].y = 15.0;
    assert_eq!(compaction::find_out_y(&positions, &index, &chain, 0..=2, 10.0), 10.0, "Off-lane y blocked a lane");
}

#[test]
fn chain_detection() {
    // 0 -> {1, 3}; 1 -> 2 -> 5; 3 -> 4 -> 5; 5 -> 6
    let graph = internal::graph_from_columns(
        &[0, 1, 2, 1, 2, 3, 4],
        &[vec![0, 1, 2, 5, 6], vec![0, 3, 4, 5, 6], vec![0, 1, 2, 5, 6]]
    );
    let chains = compaction::find_chains(&graph);
    assert_eq!(chains, vec![vec![1, 2], vec![3, 4], vec![5, 6]], "Wrong chains");

    // Repeated traversals do not break a chain.
    let graph = internal::graph_from_columns(&[0, 1, 2], &[vec![0, 1, 2], vec![0, 1, 2], vec![1, 2]]);
    assert_eq!(compaction::find_chains(&graph), vec![vec![0, 1, 2]]);

    // A branch in the middle splits the run.
    let graph = internal::graph_from_columns(&[0, 1, 2, 3, 2], &[vec![0, 1, 2, 3], vec![1, 4]]);
    assert_eq!(compaction::find_chains(&graph), vec![vec![0, 1], vec![2, 3]]);
}

#[test]
fn compaction_moves_lane() {
    // Node 3 takes the bottom slot in column 1, so the chain 1 -> 2 must use lane 10.
    let graph = internal::graph_from_columns(&[0, 1, 2, 1, 3], &[vec![0, 3, 4], vec![0, 1, 2, 4]]);
    let layout = internal::layout(&graph, "compaction-lane");
    assert_eq!(layout.chains(), &[vec![1, 2]]);
    assert_eq!(layout.node(1).map(|node| (node.x, node.y)), Some((10.0, 10.0)));
    assert_eq!(layout.node(2).map(|node| (node.x, node.y)), Some((20.0, 10.0)), "Node 2 was not moved to the chain lane");
    assert_eq!(layout.node(3).map(|node| node.y), Some(0.0), "Standalone node was moved");
    check_packing(&layout, "compaction-lane");
}

#[test]
fn compaction_spacing() {
    // Column gaps: the chain spans columns 0 to 5.
    let graph = internal::graph_from_columns(&[0, 1, 5], &[vec![0, 1, 2]]);
    let layout = internal::layout(&graph, "compaction-spacing");
    let xs: Vec<f64> = layout.nodes().iter().map(|node| node.x).collect();
    assert_eq!(xs, vec![0.0, 25.0, 50.0], "Chain nodes are not evenly spaced");
    assert!(layout.nodes().iter().all(|node| node.classification() == NodeClass::Chain));
}

#[test]
fn without_compaction() {
    let graph = internal::graph_from_columns(&[0, 1, 2, 1, 3], &[vec![0, 3, 4], vec![0, 1, 2, 4]]);
    let params = LayoutParams { compact_paths: false, ..LayoutParams::default() };
    let layout = CachedLayout::build(DatasetKey::from_bytes(b"plain"), &graph, &params).unwrap();
    assert!(layout.chains().is_empty(), "Found chains without compaction");
    assert_eq!(layout.node(2).map(|node| node.y), Some(0.0));
    assert!(layout.nodes().iter().all(|node| node.classification() == NodeClass::Standalone));
}

//-----------------------------------------------------------------------------

#[test]
fn example_layout() {
    let graph = internal::example_graph();
    let layout = internal::layout(&graph, "example");
    assert_eq!(layout.node_count(), 10);
    assert_eq!(layout.max_column(), Some(6));
    assert_eq!(layout.chains(), &[vec![0, 1]]);

    let classes: Vec<EdgeClass> = layout.edge_elements(0).map(|edge| edge.classification).collect();
    assert_eq!(classes, vec![EdgeClass::Chain], "Wrong classes for the edges of node 0");
    let edges: Vec<(usize, usize, EdgeClass)> = layout.edge_elements(2).map(|edge| (edge.target_id, edge.weight, edge.classification)).collect();
    assert_eq!(edges, vec![(4, 2, EdgeClass::Structural), (3, 0, EdgeClass::AlignedVariant)], "Wrong edges for node 2");

    let element = layout.node_element(9).unwrap();
    assert_eq!((element.x, element.y), (40.0, 10.0));
    assert_eq!(element.aligned_to_id, Some(5));
    assert_eq!(element.label, "T");
    assert_eq!(element.classification, NodeClass::Standalone);
    assert!(layout.node_element(10).is_none());

    check_packing(&layout, "example");
    check_paths(&graph, &layout, "example");
    check_chains(&graph, &layout, "example");
}

#[test]
fn random_layouts() {
    let mut rng = StdRng::seed_from_u64(0xA11_0C);
    for round in 0..20 {
        let graph = internal::random_graph(&mut rng, 50, 3, 4);
        let name = format!("random-{}", round);
        let layout = internal::layout(&graph, &name);
        check_packing(&layout, &name);
        check_paths(&graph, &layout, &name);
        check_chains(&graph, &layout, &name);
        assert!(layout.heap_size() > 0, "{}: zero heap size", name);
    }
}

#[test]
fn empty_layout() {
    let graph = PoaGraph::new(Vec::new(), Vec::new()).unwrap();
    let layout = internal::layout(&graph, "empty");
    assert!(layout.is_empty());
    assert_eq!(layout.edge_count(), 0);
    assert_eq!(layout.max_column(), None);
    assert!(layout.chains().is_empty());
    assert_eq!(layout, CachedLayout::empty(layout.key()));
}

#[test]
fn invalid_parameters() {
    let graph = internal::example_graph();
    let key = DatasetKey::from_bytes(b"params");
    for (spacing, lane_step) in [(0.0, 10.0), (-1.0, 10.0), (10.0, 0.0), (10.0, f64::NAN), (f64::INFINITY, 10.0)] {
        let params = LayoutParams { spacing, lane_step, compact_paths: true };
        let result = layout_graph(key, &graph, &params);
        assert!(
            matches!(result, Err(LayoutError::InvalidParameters(_))),
            "Accepted spacing {} with lane step {}", spacing, lane_step
        );
    }
}

//-----------------------------------------------------------------------------
