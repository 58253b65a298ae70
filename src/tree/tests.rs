use super::*;

use super::layout::{TreeLayout, TreeLayoutParams};
use super::pruning::{self, Frontier};
use crate::internal::{self, tree_record};

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

//-----------------------------------------------------------------------------

fn expect_error(records: &[TreeNodeRecord], cyclic: bool, what: &str) {
    let result = ConsensusTree::from_records(records);
    match result {
        Err(LayoutError::CyclicTree(_)) if cyclic => {},
        Err(LayoutError::DataIntegrity(_)) if !cyclic => {},
        _ => panic!("{}: unexpected result {:?}", what, result),
    }
}

fn check_frontier(tree: &ConsensusTree, frontier: &Frontier, name: &str) {
    assert!(frontier.is_antichain(tree), "{}: visible nodes at {} are not an antichain", name, frontier.threshold);
    assert!(frontier.visible.is_disjoint(&frontier.hidden), "{}: a node is both visible and hidden", name);
    assert_eq!(frontier.visible.len() + frontier.hidden.len(), tree.len(), "{}: some nodes are neither visible nor hidden", name);

    // Every leaf is covered by exactly one visible node.
    for leaf in tree.leaves() {
        let covering = frontier.visible.iter().filter(|node_id| **node_id == leaf || tree.is_ancestor(**node_id, leaf)).count();
        assert_eq!(covering, 1, "{}: leaf {} is covered by {} visible nodes", name, leaf, covering);
    }

    // Visible internal nodes exceed the threshold, and hidden nodes above the frontier do not.
    for node_id in frontier.visible.iter() {
        let node = tree.node(*node_id).unwrap();
        assert!(node.is_leaf() || node.min_compatibility > frontier.threshold, "{}: node {} should not be visible", name, node_id);
        let mut curr = node.parent_id;
        while let Some(parent_id) = curr {
            let parent = tree.node(parent_id).unwrap();
            assert!(parent.min_compatibility <= frontier.threshold, "{}: ancestor {} of visible node {} exceeds the threshold", name, parent_id, node_id);
            curr = parent.parent_id;
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn example_tree() {
    let tree = internal::example_tree();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.root().map(|node| node.id), Some(ConsensusTree::ROOT));
    assert!(tree.root().unwrap().is_root());
    assert_eq!(tree.children(0), &[1, 2]);
    assert_eq!(tree.node(2).unwrap().parent_id, Some(0));
    assert_eq!(tree.leaves(), vec![1, 3]);
    assert_eq!(tree.post_order(), vec![1, 3, 2, 0]);
    assert_eq!(tree.descendants(0), vec![1, 2, 3]);
    assert_eq!(tree.depth(3), Some(2));
    assert_eq!(tree.depth(4), None);
    assert!(tree.is_ancestor(2, 3));
    assert!(!tree.is_ancestor(3, 3));
    assert_eq!(tree.node_ids(), vec![0, 1, 2, 3]);
}

#[test]
fn record_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x7EE);
    for round in 0..10 {
        let tree = internal::random_tree(&mut rng, 30);
        let records = tree.to_records();
        let rebuilt = ConsensusTree::from_records(&records);
        assert!(rebuilt.is_ok(), "Round {}: failed to rebuild the tree: {}", round, rebuilt.unwrap_err());
        assert_eq!(rebuilt.unwrap(), tree, "Round {}: rebuilt tree differs", round);
    }

    let tree = internal::example_tree();
    assert_eq!(tree.to_records(), internal::example_tree_records());
}

#[test]
fn invalid_trees() {
    expect_error(&[tree_record(1, 0.5, &[], &[])], false, "Missing root");
    expect_error(&[tree_record(0, 0.5, &[1], &[])], false, "Undefined child");
    expect_error(&[tree_record(0, 0.5, &[], &[]), tree_record(0, 0.6, &[], &[])], false, "Duplicate node");
    expect_error(&[tree_record(0, 0.5, &[1, 1], &[]), tree_record(1, 0.6, &[], &[])], false, "Duplicate child");
    expect_error(&[tree_record(0, 1.5, &[], &[])], false, "Compatibility above 1");
    expect_error(&[tree_record(0, f64::NAN, &[], &[])], false, "NaN compatibility");

    expect_error(&[tree_record(0, 0.5, &[0], &[])], true, "Root as its own child");
    expect_error(
        &[tree_record(0, 0.5, &[1, 2], &[]), tree_record(1, 0.6, &[2], &[]), tree_record(2, 0.7, &[], &[])],
        true, "Multiple parents"
    );
    expect_error(
        &[tree_record(0, 0.5, &[], &[]), tree_record(1, 0.6, &[2], &[]), tree_record(2, 0.7, &[1], &[])],
        true, "Unreachable cycle"
    );
    expect_error(&[tree_record(0, 0.5, &[], &[]), tree_record(1, 0.6, &[], &[])], true, "Unreachable node");
}

#[test]
fn empty_tree() {
    let tree = ConsensusTree::from_records(&[]).unwrap();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert!(tree.post_order().is_empty());
    assert!(tree.leaves().is_empty());
    assert!(TreeLayout::new(&tree, &TreeLayoutParams::default()).is_empty());
    assert!(pruning::cut(&tree, 0.5).is_empty());
    assert!(Frontier::new(&tree, 0.5).visible.is_empty());
}

//-----------------------------------------------------------------------------

#[test]
fn example_layout() {
    let tree = internal::example_tree();
    let layout = TreeLayout::new(&tree, &TreeLayoutParams::default());
    assert_eq!(layout.len(), 4);

    // Leaves 1 and 3 are at the ends; node 2 has a single child.
    assert_eq!(layout.y(1), Some(0.0));
    assert_eq!(layout.y(3), Some(100.0));
    assert_eq!(layout.y(2), Some(100.0));
    assert_eq!(layout.y(0), Some(50.0));

    // Compatibilities [0.2, 0.95] are rescaled to [0, 1].
    assert_eq!(layout.x(2), Some(0.0));
    assert_eq!(layout.x(3), Some(1.0));
    let x0 = layout.x(0).unwrap();
    assert!((x0 - 0.1 / 0.75).abs() < 1e-12, "Wrong normalized x for the root: {}", x0);

    let segments = layout.segments();
    assert_eq!(segments.len(), 3);
    let to_three = segments.iter().find(|segment| segment.child_id == 3).unwrap();
    assert_eq!(to_three.parent_id, 2);
    assert_eq!(to_three.points, [(0.0, 100.0), (0.0, 100.0), (1.0, 100.0)]);

    let elements = layout.node_elements();
    let ids: Vec<usize> = elements.iter().map(|element| element.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(layout::layout(&tree), layout.y_values());
}

#[test]
fn layout_parameters() {
    let tree = internal::example_tree();
    let params = TreeLayoutParams { y_min: -1.0, y_max: 1.0, normalize_x: false };
    let layout = TreeLayout::new(&tree, &params);
    assert_eq!(layout.y(1), Some(-1.0));
    assert_eq!(layout.y(3), Some(1.0));
    assert_eq!(layout.x(3), Some(0.95), "Compatibility was rescaled");

    // A single leaf is centered.
    let single = internal::build_tree(&[tree_record(0, 0.4, &[1], &[]), tree_record(1, 0.4, &[], &[])]);
    let layout = TreeLayout::new(&single, &TreeLayoutParams::default());
    assert_eq!(layout.y(1), Some(50.0));
    assert_eq!(layout.y(0), Some(50.0));
    // Equal compatibilities are all placed at 0.
    assert_eq!(layout.x(0), Some(0.0));
    assert_eq!(layout.x(1), Some(0.0));
}

#[test]
fn random_layouts() {
    let mut rng = StdRng::seed_from_u64(0x1A_7007);
    for round in 0..10 {
        let nodes = rng.gen_range(1..200);
        let tree = internal::random_tree(&mut rng, nodes);
        let layout = TreeLayout::new(&tree, &TreeLayoutParams::default());
        assert_eq!(layout.len(), tree.len(), "Round {}: wrong number of positions", round);

        // Leaves are evenly spaced in post-order.
        let leaves = tree.leaves();
        if leaves.len() > 1 {
            let step = 100.0 / (leaves.len() - 1) as f64;
            for (rank, leaf) in leaves.iter().enumerate() {
                let y = layout.y(*leaf).unwrap();
                assert!((y - rank as f64 * step).abs() < 1e-9, "Round {}: wrong y {} for leaf {}", round, y, leaf);
            }
        }

        // Internal nodes are at the midpoint of their children.
        for node in tree.iter().filter(|node| !node.is_leaf()) {
            let ys: Vec<f64> = node.children_ids.iter().map(|child| layout.y(*child).unwrap()).collect();
            let low = ys.iter().copied().fold(f64::INFINITY, f64::min);
            let high = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(layout.y(node.id), Some((low + high) / 2.0), "Round {}: node {} is not at the midpoint", round, node.id);
        }

        for element in layout.node_elements() {
            assert!((0.0..=1.0).contains(&element.x), "Round {}: x {} out of range", round, element.x);
            assert!((0.0..=100.0).contains(&element.y), "Round {}: y {} out of range", round, element.y);
        }
        assert_eq!(layout.segments().len(), tree.len() - 1);
    }
}

#[test]
fn leaves_stay_in_range() {
    let ranges = [(0.0, 100.0), (-3.7, 12.1), (0.1, 0.7)];
    for leaves in 2..300 {
        // The root with `leaves` children.
        let children: Vec<usize> = (1..=leaves).collect();
        let mut records = vec![tree_record(0, 0.1, &children, &[])];
        records.extend((1..=leaves).map(|id| tree_record(id, 0.9, &[], &[])));
        let tree = internal::build_tree(&records);

        for (y_min, y_max) in ranges {
            let params = TreeLayoutParams { y_min, y_max, normalize_x: true };
            let layout = TreeLayout::new(&tree, &params);
            assert_eq!(layout.y(1), Some(y_min), "{} leaves: first leaf is not at {}", leaves, y_min);
            assert_eq!(layout.y(leaves), Some(y_max), "{} leaves: last leaf is not at {}", leaves, y_max);
            for element in layout.node_elements() {
                assert!(
                    (y_min..=y_max).contains(&element.y),
                    "{} leaves: y {} of node {} outside [{}, {}]", leaves, element.y, element.id, y_min, y_max
                );
            }
        }
    }
}

#[test]
fn deep_tree() {
    // A path of 100000 nodes would overflow a recursive traversal.
    let n = 100_000;
    let records: Vec<TreeNodeRecord> = (0..n).map(|id| {
        let children: Vec<usize> = if id + 1 < n { vec![id + 1] } else { Vec::new() };
        tree_record(id, 0.5, &children, &[])
    }).collect();
    let tree = internal::build_tree(&records);
    assert_eq!(tree.post_order().len(), n);
    assert_eq!(tree.depth(n - 1), Some(n - 1));
    let layout = TreeLayout::new(&tree, &TreeLayoutParams::default());
    assert_eq!(layout.y(0), Some(50.0));
    assert_eq!(pruning::cut(&tree, 0.6).len(), n - 1);
}

//-----------------------------------------------------------------------------

#[test]
fn example_cut() {
    let tree = internal::example_tree();

    let frontier = Frontier::new(&tree, 0.5);
    assert_eq!(frontier.hidden.iter().copied().collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(frontier.visible.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(pruning::cut(&tree, 0.5), frontier.hidden);
    check_frontier(&tree, &frontier, "example");

    // The root exceeds a low threshold and hides everything else.
    let frontier = Frontier::new(&tree, 0.1);
    assert_eq!(frontier.visible.iter().copied().collect::<Vec<_>>(), vec![0]);
    assert_eq!(frontier.hidden.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);

    // Nothing exceeds 1, so only the leaves are visible.
    let frontier = Frontier::new(&tree, 1.0);
    assert_eq!(frontier.visible.iter().copied().collect::<Vec<_>>(), vec![1, 3]);

    // The comparison is strict.
    let frontier = Frontier::new(&tree, 0.3);
    assert!(frontier.hidden.contains(&0), "Root at the threshold was kept visible");
}

#[test]
fn sequence_filtering() {
    let tree = internal::example_tree();
    let frontier = Frontier::new(&tree, 0.5);
    let visible = frontier.visible_sequences(&tree);
    assert_eq!(visible.get(&1).map(|set| set.iter().copied().collect::<Vec<_>>()), Some(vec![0, 2]));
    assert_eq!(visible.get(&3).map(|set| set.iter().copied().collect::<Vec<_>>()), Some(vec![1]));
    assert!(frontier.hidden_sequences(&tree).is_empty(), "Sequences of visible nodes were hidden");

    // Sequence 3 is only in the hidden internal node.
    let records = vec![
        tree_record(0, 0.1, &[1, 2], &[0, 1, 3]),
        tree_record(1, 0.8, &[], &[0]),
        tree_record(2, 0.8, &[], &[1]),
    ];
    let tree = internal::build_tree(&records);
    let frontier = Frontier::new(&tree, 0.5);
    let record = frontier.to_record(&tree);
    assert_eq!(record.threshold, 0.5);
    assert_eq!(record.hidden, vec![0]);
    assert_eq!(record.visible, vec![1, 2]);
    assert_eq!(record.hidden_sequences, vec![3]);
}

#[test]
fn random_cuts() {
    let mut rng = StdRng::seed_from_u64(0xC07);
    for round in 0..20 {
        let nodes = rng.gen_range(1..100);
        let tree = internal::random_tree(&mut rng, nodes);
        for step in 0..=10 {
            let threshold = step as f64 / 10.0;
            let frontier = Frontier::new(&tree, threshold);
            check_frontier(&tree, &frontier, &format!("round {}", round));
        }
    }
}

//-----------------------------------------------------------------------------
