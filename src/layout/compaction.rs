//! Compaction of unbranched chains into shared lanes.
//!
//! A chain is a maximal run of nodes `v1, v2, ..., vk` (k >= 2) where each `vi` has exactly one distinct structural successor `vi+1`, and `vi+1` has exactly one distinct structural predecessor `vi`.
//! Degrees are computed on the deduplicated adjacency, so several sequences using the same edge count once.
//! Aligned-variant edges are ignored.

use super::{ColumnIndex, Position};
use crate::PoaGraph;

use std::collections::HashSet;
use std::ops::RangeInclusive;

//-----------------------------------------------------------------------------

// Returns the successor of the node if the edge to it is a chain link.
fn chain_successor(graph: &PoaGraph, node_id: usize) -> Option<usize> {
    match graph.successors(node_id) {
        [next] if graph.in_degree(*next) == 1 => Some(*next),
        _ => None,
    }
}

/// Returns all chains in the graph ordered by their first node.
///
/// Links that form a cycle without a starting point are not reported.
pub fn find_chains(graph: &PoaGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut has_incoming_link = vec![false; n];
    for node_id in 0..n {
        if let Some(next) = chain_successor(graph, node_id) {
            has_incoming_link[next] = true;
        }
    }

    let mut visited = vec![false; n];
    let mut result: Vec<Vec<usize>> = Vec::new();
    for start in 0..n {
        if has_incoming_link[start] || chain_successor(graph, start).is_none() {
            continue;
        }
        let mut chain = vec![start];
        visited[start] = true;
        let mut curr = start;
        while let Some(next) = chain_successor(graph, curr) {
            if visited[next] {
                break;
            }
            visited[next] = true;
            chain.push(next);
            curr = next;
        }
        result.push(chain);
    }

    result
}

/// Finds the lowest free lane for the chain.
///
/// Candidate lanes are `0, lane_step, 2 * lane_step, ...`.
/// A lane is free if no node outside the chain in any of the given columns has that `y` coordinate.
/// This always terminates, as only finitely many nodes can block a lane.
pub fn find_out_y(
    positions: &[Position],
    index: &ColumnIndex,
    chain: &[usize],
    columns: RangeInclusive<usize>,
    lane_step: f64
) -> f64 {
    let members: HashSet<usize> = chain.iter().copied().collect();
    let mut occupied: Vec<f64> = columns
        .flat_map(|column_id| index.column(column_id).iter())
        .filter(|node_id| !members.contains(node_id))
        .map(|node_id| positions[*node_id].y)
        .collect();
    occupied.sort_by(|a, b| a.total_cmp(b));

    let tolerance = lane_step * 1e-6;
    let mut lane: usize = 0;
    let mut offset = 0;
    loop {
        let candidate = lane as f64 * lane_step;
        while offset < occupied.len() && occupied[offset] < candidate - tolerance {
            offset += 1;
        }
        if offset < occupied.len() && (occupied[offset] - candidate).abs() <= tolerance {
            lane += 1;
        } else {
            return candidate;
        }
    }
}

/// Moves every chain into a single lane and spaces its nodes evenly.
///
/// The first and the last node of a chain keep their `x` coordinates, and the other nodes are spaced evenly between them.
/// All nodes of the chain get the `y` coordinate from [`find_out_y`] over the column span of the chain.
/// Chains are processed in the order returned by [`find_chains`], and earlier chains block lanes for later ones.
/// Nodes outside chains are not moved.
///
/// Returns the chains.
pub fn compact(positions: &mut [Position], graph: &PoaGraph, index: &ColumnIndex, lane_step: f64) -> Vec<Vec<usize>> {
    let chains = find_chains(graph);

    for chain in chains.iter() {
        let (first, last) = (chain[0], chain[chain.len() - 1]);
        let first_column = graph.node(first).map_or(0, |node| node.column_id);
        let last_column = graph.node(last).map_or(first_column, |node| node.column_id);
        let y = find_out_y(positions, index, chain, first_column..=last_column, lane_step);

        let (start_x, end_x) = (positions[first].x, positions[last].x);
        let step = (end_x - start_x) / (chain.len() - 1) as f64;
        for (i, node_id) in chain.iter().enumerate() {
            positions[*node_id] = Position::new(start_x + i as f64 * step, y);
        }
    }

    if !chains.is_empty() {
        let members: usize = chains.iter().map(|chain| chain.len()).sum();
        log::debug!("Compacted {} chains with {} nodes", chains.len(), members);
    }
    chains
}

//-----------------------------------------------------------------------------
