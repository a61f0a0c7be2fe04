//! Attaching arbitrary coordinates to the path network.
//!
//! A snap either reuses an existing node or splits the closest edge at the
//! projected point. Splits live in an [`Overlay`] owned by one routing
//! request; the shared [`PathNetwork`] is never touched.

use geo::Coord;
use hashbrown::HashSet;
use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::{Coordinate, PathNetwork, planar_distance};
use crate::spatial::closest_point_on_segment;
use crate::{Error, SnapRole};

/// Snap points closer than this to an existing node reuse the node, in meters
pub const NODE_MATCH_TOLERANCE: f64 = 0.05;

/// Vertex of a routing request: a network node or a request-local snap node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertex {
    Node(NodeIndex),
    Transient(usize),
}

/// How a query coordinate was attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    /// Existing vertex reused
    Existing,
    /// New transient node splitting an edge
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    pub vertex: Vertex,
    /// The coordinate that was snapped
    pub query: Coordinate,
    /// Where it attaches to the network
    pub location: Coordinate,
    /// Planar distance from `query` to `location`, meters
    pub distance: f64,
    pub kind: SnapKind,
}

#[derive(Debug, Clone)]
struct TransientNode {
    geometry: Coordinate,
    position: Coord<f64>,
}

/// Part of a split network edge
#[derive(Debug, Clone)]
struct Piece {
    a: Vertex,
    b: Vertex,
    weight: f64,
    origin: EdgeIndex,
    removed: bool,
}

/// Request-local view of a [`PathNetwork`] plus the snap nodes and split
/// edges added for one routing request.
#[derive(Debug, Clone)]
pub struct Overlay<'a> {
    network: &'a PathNetwork,
    transient: Vec<TransientNode>,
    pieces: Vec<Piece>,
    masked: HashSet<EdgeIndex>,
}

impl<'a> Overlay<'a> {
    pub fn new(network: &'a PathNetwork) -> Self {
        Self {
            network,
            transient: Vec::new(),
            pieces: Vec::new(),
            masked: HashSet::new(),
        }
    }

    pub fn network(&self) -> &'a PathNetwork {
        self.network
    }

    /// Number of addressable vertices, network nodes first
    pub fn vertex_count(&self) -> usize {
        self.network.node_count() + self.transient.len()
    }

    pub fn transient_count(&self) -> usize {
        self.transient.len()
    }

    /// Dense index of a vertex in `0..vertex_count()`
    pub fn dense_index(&self, vertex: Vertex) -> usize {
        match vertex {
            Vertex::Node(n) => n.index(),
            Vertex::Transient(t) => self.network.node_count() + t,
        }
    }

    pub fn vertex_at(&self, dense: usize) -> Vertex {
        let nodes = self.network.node_count();
        if dense < nodes {
            Vertex::Node(NodeIndex::new(dense))
        } else {
            Vertex::Transient(dense - nodes)
        }
    }

    pub fn geometry(&self, vertex: Vertex) -> Option<Coordinate> {
        match vertex {
            Vertex::Node(n) => self.network.node(n).map(|node| node.geometry),
            Vertex::Transient(t) => self.transient.get(t).map(|node| node.geometry),
        }
    }

    fn position(&self, vertex: Vertex) -> Option<Coord<f64>> {
        match vertex {
            Vertex::Node(n) => self.network.node(n).map(|node| node.position),
            Vertex::Transient(t) => self.transient.get(t).map(|node| node.position),
        }
    }

    /// Traversable edges leaving `vertex` as `(neighbor, weight)`.
    ///
    /// Parallel edges are yielded individually. Order is stable: network
    /// edges first, in graph order, then split pieces in creation order.
    pub fn neighbors(&self, vertex: Vertex) -> impl Iterator<Item = (Vertex, f64)> + '_ {
        let network_edges = match vertex {
            Vertex::Node(n) if n.index() < self.network.node_count() => {
                Some(self.network.graph().edges(n).filter_map(move |edge| {
                    if self.masked.contains(&edge.id()) {
                        return None;
                    }
                    let other = if edge.source() == n {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    Some((Vertex::Node(other), edge.weight().weight))
                }))
            }
            _ => None,
        };
        let pieces = self.pieces.iter().filter(|p| !p.removed).filter_map(move |p| {
            if p.a == vertex {
                Some((p.b, p.weight))
            } else if p.b == vertex {
                Some((p.a, p.weight))
            } else {
                None
            }
        });
        network_edges.into_iter().flatten().chain(pieces)
    }

    /// Attaches `point` to the network.
    ///
    /// Tries, in order: an existing vertex within [`NODE_MATCH_TOLERANCE`] of
    /// the point; then the closest point on any edge within `max_radius`,
    /// splitting that edge with a transient node unless the point lands on
    /// one of its ends.
    ///
    /// The closest edge point does not depend on `max_radius`, so a larger
    /// radius can only turn a failure into a success and never changes the
    /// distance found.
    ///
    /// # Errors
    ///
    /// [`Error::NoReachablePoint`] when no edge lies within `max_radius`,
    /// [`Error::InvalidGeometry`] for an invalid coordinate and
    /// [`Error::InvalidConfig`] for a negative or non-finite radius.
    pub fn snap(
        &mut self,
        point: Coordinate,
        max_radius: f64,
        role: SnapRole,
    ) -> Result<SnapPoint, Error> {
        point.validate()?;
        if !max_radius.is_finite() || max_radius < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "snap radius must be a finite, non-negative distance, got {max_radius}"
            )));
        }
        let p = self.network.projection().project(point);

        if let Some(vertex) = self.vertex_near(p) {
            return self.existing(point, p, vertex, role);
        }

        let hit = self
            .network
            .spatial_index()
            .edges
            .nearest(p, max_radius)
            .ok_or(Error::NoReachablePoint {
                role,
                radius: max_radius,
            })?;

        let (a, b, weight, piece) = self.split_target(hit.edge, p)?;
        let pa = self
            .position(a)
            .ok_or(Error::InternalInvariant("split segment has no start position"))?;
        let pb = self
            .position(b)
            .ok_or(Error::InternalInvariant("split segment has no end position"))?;
        let (attach, t) = closest_point_on_segment(pa, pb, p);

        if planar_distance(attach, pa) <= NODE_MATCH_TOLERANCE {
            return self.existing(point, p, a, role);
        }
        if planar_distance(attach, pb) <= NODE_MATCH_TOLERANCE {
            return self.existing(point, p, b, role);
        }

        let geometry = self.network.projection().unproject(attach);
        let vertex = Vertex::Transient(self.transient.len());
        self.transient.push(TransientNode {
            geometry,
            position: attach,
        });
        match piece {
            Some(idx) => self.pieces[idx].removed = true,
            None => {
                self.masked.insert(hit.edge);
            }
        }
        self.pieces.push(Piece {
            a,
            b: vertex,
            weight: weight * t,
            origin: hit.edge,
            removed: false,
        });
        self.pieces.push(Piece {
            a: vertex,
            b,
            weight: weight * (1.0 - t),
            origin: hit.edge,
            removed: false,
        });

        let distance = planar_distance(attach, p);
        debug!(
            "Snapped {role} ({}, {}) onto edge {} at {:.2} m, split at {:.3}",
            point.lat,
            point.lng,
            hit.edge.index(),
            distance,
            t
        );
        Ok(SnapPoint {
            vertex,
            query: point,
            location: geometry,
            distance,
            kind: SnapKind::Split,
        })
    }

    /// Existing network or transient vertex practically at `p`
    fn vertex_near(&self, p: Coord<f64>) -> Option<Vertex> {
        if let Some(hit) = self
            .network
            .spatial_index()
            .nodes
            .nearest(p, 1, NODE_MATCH_TOLERANCE)
            .first()
        {
            return Some(Vertex::Node(hit.node));
        }
        self.transient
            .iter()
            .position(|node| planar_distance(node.position, p) <= NODE_MATCH_TOLERANCE)
            .map(Vertex::Transient)
    }

    /// Segment to split for a hit on `edge`: the edge itself, or the piece of
    /// it closest to `p` when an earlier snap already split it
    fn split_target(
        &self,
        edge: EdgeIndex,
        p: Coord<f64>,
    ) -> Result<(Vertex, Vertex, f64, Option<usize>), Error> {
        if !self.masked.contains(&edge) {
            let (a, b) = self
                .network
                .graph()
                .edge_endpoints(edge)
                .ok_or(Error::InternalInvariant("snapped edge is not in the graph"))?;
            let weight = self.network.graph()[edge].weight;
            return Ok((Vertex::Node(a), Vertex::Node(b), weight, None));
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, piece) in self.pieces.iter().enumerate() {
            if piece.removed || piece.origin != edge {
                continue;
            }
            let (Some(pa), Some(pb)) = (self.position(piece.a), self.position(piece.b)) else {
                continue;
            };
            let (closest, _) = closest_point_on_segment(pa, pb, p);
            let d = planar_distance(closest, p);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((idx, d));
            }
        }
        let (idx, _) = best.ok_or(Error::InternalInvariant("split edge has no live pieces"))?;
        let piece = &self.pieces[idx];
        Ok((piece.a, piece.b, piece.weight, Some(idx)))
    }

    fn existing(
        &self,
        query: Coordinate,
        p: Coord<f64>,
        vertex: Vertex,
        role: SnapRole,
    ) -> Result<SnapPoint, Error> {
        let (Some(position), Some(location)) = (self.position(vertex), self.geometry(vertex)) else {
            return Err(Error::InternalInvariant("snapped vertex does not exist"));
        };
        let distance = planar_distance(position, p);
        debug!(
            "Snapped {role} ({}, {}) to existing vertex {vertex:?} at {distance:.2} m",
            query.lat, query.lng
        );
        Ok(SnapPoint {
            vertex,
            query,
            location,
            distance,
            kind: SnapKind::Existing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::{NetworkConfig, RoadFeature, build_network};

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    /// East-west road along the equator, about 111 m long
    fn straight_road() -> PathNetwork {
        let features = vec![RoadFeature::line("a", vec![c(0.0, 0.0), c(0.0, 0.001)])];
        build_network(&features, &NetworkConfig::new(4, 0.0)).unwrap()
    }

    #[test]
    fn reuses_node_at_query_point() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        let snap = overlay.snap(c(0.0, 0.0), 5.0, SnapRole::Start).unwrap();
        assert_eq!(snap.kind, SnapKind::Existing);
        assert!(matches!(snap.vertex, Vertex::Node(_)));
        assert_eq!(overlay.transient_count(), 0);
    }

    #[test]
    fn splits_edge_interior() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        // 5.566 m north of the road's midpoint
        let snap = overlay
            .snap(c(0.00005, 0.0005), 10.0, SnapRole::Start)
            .unwrap();
        assert_eq!(snap.kind, SnapKind::Split);
        assert_eq!(snap.vertex, Vertex::Transient(0));
        assert!((snap.distance - 5.566).abs() < 1e-3);
        assert!(snap.location.lat.abs() < 1e-12);
        assert!((snap.location.lng - 0.0005).abs() < 1e-12);

        let weights: Vec<f64> = overlay.neighbors(snap.vertex).map(|(_, w)| w).collect();
        assert_eq!(weights.len(), 2);
        assert!((weights.iter().sum::<f64>() - 111.32).abs() < 1e-6);
        // The original edge is hidden from both ends
        let start = network.node_at(c(0.0, 0.0)).unwrap();
        let around: Vec<Vertex> = overlay.neighbors(Vertex::Node(start)).map(|(v, _)| v).collect();
        assert_eq!(around, vec![Vertex::Transient(0)]);
    }

    #[test]
    fn projection_past_an_end_reuses_that_node() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        let snap = overlay
            .snap(c(0.00001, -0.00001), 10.0, SnapRole::Start)
            .unwrap();
        assert_eq!(snap.kind, SnapKind::Existing);
        assert_eq!(snap.vertex, Vertex::Node(network.node_at(c(0.0, 0.0)).unwrap()));
    }

    #[test]
    fn too_far_is_no_reachable_point() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        let err = overlay
            .snap(c(0.001, 0.0005), 25.0, SnapRole::Destination)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NoReachablePoint {
                role: SnapRole::Destination,
                ..
            }
        ));
    }

    #[test]
    fn second_snap_on_same_edge_splits_the_right_piece() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        let first = overlay
            .snap(c(0.00001, 0.0002), 10.0, SnapRole::Start)
            .unwrap();
        let second = overlay
            .snap(c(-0.00001, 0.0008), 10.0, SnapRole::Destination)
            .unwrap();
        assert_eq!(second.vertex, Vertex::Transient(1));

        // The two snap nodes are now directly connected
        let link = overlay
            .neighbors(first.vertex)
            .find(|(v, _)| *v == second.vertex)
            .map(|(_, w)| w)
            .unwrap();
        assert!((link - 0.0006 * 111_320.0).abs() < 1e-6);
    }

    #[test]
    fn repeated_snap_reuses_transient_node() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        let first = overlay
            .snap(c(0.0, 0.0005), 10.0, SnapRole::Start)
            .unwrap();
        let second = overlay
            .snap(c(0.0, 0.0005), 10.0, SnapRole::Destination)
            .unwrap();
        assert_eq!(first.vertex, second.vertex);
        assert_eq!(overlay.transient_count(), 1);
    }

    #[test]
    fn rejects_negative_radius() {
        let network = straight_road();
        let mut overlay = Overlay::new(&network);
        assert!(matches!(
            overlay.snap(c(0.0, 0.0005), -1.0, SnapRole::Start),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn overlay_never_touches_the_network() {
        let network = straight_road();
        let edges = network.edge_count();
        {
            let mut overlay = Overlay::new(&network);
            overlay
                .snap(c(0.00001, 0.0005), 10.0, SnapRole::Start)
                .unwrap();
        }
        assert_eq!(network.edge_count(), edges);
        assert_eq!(network.node_count(), 2);
    }
}
