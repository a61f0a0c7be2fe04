//! R-tree lookups over network nodes and edges.
//!
//! Both trees work in the network's projected frame, so every distance here
//! is in meters. Queries never fall back to "globally nearest": a caller that
//! asks for candidates within a radius gets nothing when nothing is that close.

use geo::Coord;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Line};

use crate::model::{PathGraph, planar_distance};

type NodeEntry = GeomWithData<[f64; 2], NodeIndex>;
type EdgeEntry = GeomWithData<Line<[f64; 2]>, EdgeIndex>;

/// Distances closer than this are considered a tie
const TIE_EPSILON: f64 = 1e-9;

/// A node returned by a proximity query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHit {
    pub node: NodeIndex,
    pub distance: f64,
}

/// The closest point of an edge to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    pub edge: EdgeIndex,
    /// Closest point on the edge, projected frame
    pub point: Coord<f64>,
    /// Position of `point` along the edge, 0 at its source node and 1 at its target
    pub fraction: f64,
    pub distance: f64,
}

/// Nearest-neighbour structure over node positions
#[derive(Debug, Clone)]
pub struct NodeLocator {
    tree: RTree<NodeEntry>,
}

impl NodeLocator {
    pub fn build(graph: &PathGraph) -> Self {
        let entries = graph
            .node_indices()
            .map(|idx| {
                let p = graph[idx].position;
                GeomWithData::new([p.x, p.y], idx)
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Up to `k` nodes within `max_dist` of `point`, closest first
    pub fn nearest(&self, point: Coord<f64>, k: usize, max_dist: f64) -> Vec<NodeHit> {
        self.nearest_where(point, k, max_dist, |_| true)
    }

    /// Like [`NodeLocator::nearest`], skipping nodes rejected by `accept`.
    ///
    /// Equal distances are ordered by node index so results are reproducible.
    pub fn nearest_where(
        &self,
        point: Coord<f64>,
        k: usize,
        max_dist: f64,
        mut accept: impl FnMut(NodeIndex) -> bool,
    ) -> Vec<NodeHit> {
        if k == 0 || !(max_dist >= 0.0) {
            return Vec::new();
        }
        let max_d2 = max_dist * max_dist;
        let mut hits: Vec<NodeHit> = Vec::with_capacity(k);
        for (entry, d2) in self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[point.x, point.y])
        {
            if d2 > max_d2 {
                break;
            }
            let distance = d2.sqrt();
            // Once k hits are collected, keep reading only to gather ties with the last one
            if hits.len() >= k
                && hits
                    .last()
                    .is_some_and(|last| distance > last.distance + TIE_EPSILON)
            {
                break;
            }
            if accept(entry.data) {
                hits.push(NodeHit {
                    node: entry.data,
                    distance,
                });
            }
        }
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.node.index().cmp(&b.node.index()))
        });
        hits.truncate(k);
        hits
    }
}

/// Nearest-segment structure over edge geometries
#[derive(Debug, Clone)]
pub struct EdgeLocator {
    tree: RTree<EdgeEntry>,
}

impl EdgeLocator {
    pub fn build(graph: &PathGraph) -> Self {
        let entries = graph
            .edge_references()
            .map(|edge| {
                let a = graph[edge.source()].position;
                let b = graph[edge.target()].position;
                GeomWithData::new(Line::new([a.x, a.y], [b.x, b.y]), edge.id())
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Closest point on any edge, if it lies within `max_dist` of `point`.
    ///
    /// Among edges at the same distance the lowest edge index wins.
    pub fn nearest(&self, point: Coord<f64>, max_dist: f64) -> Option<EdgeHit> {
        if !(max_dist >= 0.0) {
            return None;
        }
        let max_d2 = max_dist * max_dist;
        let mut best: Option<(EdgeHit, f64)> = None;
        for (entry, d2) in self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[point.x, point.y])
        {
            if d2 > max_d2 {
                break;
            }
            if let Some((hit, best_d2)) = &best {
                if d2 > best_d2 + TIE_EPSILON {
                    break;
                }
                if entry.data.index() >= hit.edge.index() {
                    continue;
                }
            }
            let line = entry.geom();
            let a = Coord {
                x: line.from[0],
                y: line.from[1],
            };
            let b = Coord {
                x: line.to[0],
                y: line.to[1],
            };
            let (closest, fraction) = closest_point_on_segment(a, b, point);
            let hit = EdgeHit {
                edge: entry.data,
                point: closest,
                fraction,
                distance: planar_distance(closest, point),
            };
            let keep_d2 = best.as_ref().map_or(d2, |(_, best_d2)| best_d2.min(d2));
            best = Some((hit, keep_d2));
        }
        best.map(|(hit, _)| hit)
    }
}

/// Both lookups the router needs, over the final node and edge set
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    pub nodes: NodeLocator,
    pub edges: EdgeLocator,
}

impl SpatialIndex {
    pub fn build(graph: &PathGraph) -> Self {
        Self {
            nodes: NodeLocator::build(graph),
            edges: EdgeLocator::build(graph),
        }
    }
}

/// Orthogonal projection of `p` onto segment `a`-`b`, clamped to the segment.
/// Returns the projected point and its parameter along the segment.
pub fn closest_point_on_segment(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> (Coord<f64>, f64) {
    let ab = b - a;
    let len2 = ab.x * ab.x + ab.y * ab.y;
    if len2 <= f64::EPSILON {
        return (a, 0.0);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len2).clamp(0.0, 1.0);
    (
        Coord {
            x: a.x + t * ab.x,
            y: a.y + t * ab.y,
        },
        t,
    )
}
