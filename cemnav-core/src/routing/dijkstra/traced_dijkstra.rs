use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use log::debug;

use super::state::State;
use crate::Error;
use crate::routing::snap::{Overlay, Vertex};

/// Vertices of a shortest path, from source to target
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub vertices: Vec<Vertex>,
    /// Weight of each traversed edge; one shorter than `vertices`
    pub hops: Vec<f64>,
    pub distance: f64,
}

/// Dijkstra's algorithm from `source` to `target` over the request view.
///
/// Vertices move from unvisited to the frontier when first relaxed and are
/// settled when popped; the search ends once `target` is settled. Frontier
/// ties are broken by push order and a relaxation only replaces a strictly
/// shorter distance, so identical inputs give identical paths. Parallel
/// edges are relaxed one by one.
///
/// # Errors
///
/// [`Error::NoRoute`] when the frontier runs dry before reaching `target`.
pub fn shortest_path(view: &Overlay<'_>, source: Vertex, target: Vertex) -> Result<ShortestPath, Error> {
    let vertex_count = view.vertex_count();
    let source_idx = view.dense_index(source);
    let target_idx = view.dense_index(target);
    if source_idx >= vertex_count || target_idx >= vertex_count {
        return Err(Error::InternalInvariant("route endpoint is not a vertex of the view"));
    }

    let mut distances = vec![f64::INFINITY; vertex_count];
    let mut predecessors: Vec<Option<(usize, f64)>> = vec![None; vertex_count];
    let mut settled = FixedBitSet::with_capacity(vertex_count);
    let mut heap = BinaryHeap::with_capacity(vertex_count.min(1024));
    let mut seq = 0_u64;

    distances[source_idx] = 0.0;
    heap.push(State {
        cost: 0.0,
        seq,
        vertex: source_idx,
    });

    let mut reached = false;
    while let Some(State { cost, vertex, .. }) = heap.pop() {
        if settled.contains(vertex) {
            continue;
        }
        settled.insert(vertex);

        if vertex == target_idx {
            reached = true;
            break;
        }

        for (next, weight) in view.neighbors(view.vertex_at(vertex)) {
            let next_idx = view.dense_index(next);
            if settled.contains(next_idx) {
                continue;
            }
            let next_cost = cost + weight;
            if next_cost < distances[next_idx] {
                distances[next_idx] = next_cost;
                predecessors[next_idx] = Some((vertex, weight));
                seq += 1;
                heap.push(State {
                    cost: next_cost,
                    seq,
                    vertex: next_idx,
                });
            }
        }
    }

    if !reached {
        debug!(
            "Frontier exhausted after settling {} of {vertex_count} vertices without reaching the target",
            settled.count_ones(..)
        );
        return Err(Error::NoRoute);
    }

    let (vertices, hops) = trace_back(view, &predecessors, source_idx, target_idx)?;
    Ok(ShortestPath {
        vertices,
        hops,
        distance: distances[target_idx],
    })
}

fn trace_back(
    view: &Overlay<'_>,
    predecessors: &[Option<(usize, f64)>],
    source: usize,
    target: usize,
) -> Result<(Vec<Vertex>, Vec<f64>), Error> {
    let mut vertices = vec![view.vertex_at(target)];
    let mut hops = Vec::new();
    let mut current = target;

    while current != source {
        // A chain longer than the vertex count can only be a cycle
        if hops.len() >= predecessors.len() {
            debug_assert!(false, "predecessor chain cycles");
            return Err(Error::InternalInvariant("predecessor chain cycles"));
        }
        let Some((prev, weight)) = predecessors[current] else {
            debug_assert!(false, "predecessor chain is broken");
            return Err(Error::InternalInvariant("predecessor chain is broken"));
        };
        vertices.push(view.vertex_at(prev));
        hops.push(weight);
        current = prev;
    }

    vertices.reverse();
    hops.reverse();
    Ok((vertices, hops))
}
