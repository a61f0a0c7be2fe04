use hashbrown::{HashMap, HashSet};
use log::{debug, info, trace, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::config::NetworkConfig;
use super::ingest::{RoadFeature, Segment, segments_from_features};
use crate::model::{
    Coordinate, EdgeKind, LocalProjection, NodeKey, PathEdge, PathGraph, PathNetwork, PathNode,
    planar_distance,
};
use crate::spatial::NodeLocator;
use crate::Error;

/// Builds the routable path network from road geometry.
///
/// Segment endpoints become nodes (exact repeats merged by quantized key),
/// every segment becomes an edge, and nodes of different road lines lying
/// within `config.max_dist` of each other are joined by bridge edges. The
/// parts of a multi-line feature count as different lines. Bridged nodes keep
/// their own identity.
///
/// # Errors
///
/// [`Error::InvalidGeometry`] for malformed features, [`Error::InvalidConfig`]
/// for an unusable configuration.
pub fn build_network(features: &[RoadFeature], config: &NetworkConfig) -> Result<PathNetwork, Error> {
    config.validate()?;

    info!("Building path network from {} road features", features.len());
    let segments = segments_from_features(features)?;

    let projection =
        LocalProjection::centered_on(segments.iter().flat_map(|s| [&s.start, &s.end]));

    let mut draft = DraftGraph::new(projection);
    draft.add_road_edges(&segments);
    let road_edges = draft.graph.edge_count();
    debug!(
        "Created {} nodes and {} road edges ({} degenerate segments dropped)",
        draft.graph.node_count(),
        road_edges,
        draft.dropped
    );

    let bridges = draft.find_bridges(config);
    for &(a, b, distance) in &bridges {
        draft.graph.add_edge(
            NodeIndex::new(a),
            NodeIndex::new(b),
            PathEdge {
                weight: distance,
                kind: EdgeKind::Bridge,
            },
        );
    }

    let feature_ids = features.iter().map(|f| f.id.clone()).collect();
    let node_lines = std::mem::take(&mut draft.node_lines);
    let network = PathNetwork::new(draft.graph, projection, draft.key_to_node, feature_ids);

    for &(a, b, distance) in &bridges {
        trace!(
            "Bridge {a} <-> {b} ({distance:.2} m) joins '{}' and '{}'",
            road_name(&network, &node_lines[a]),
            road_name(&network, &node_lines[b])
        );
    }

    info!(
        "Path network ready: {} nodes, {} road edges, {} bridges",
        network.node_count(),
        road_edges,
        bridges.len()
    );
    if network.component_count() > 1 {
        warn!(
            "Path network has {} disconnected components; routes between them will fail. \
            Consider a larger max_dist (currently {} m)",
            network.component_count(),
            config.max_dist
        );
    }

    Ok(network)
}

/// Graph under construction, with per-node bookkeeping dropped after the build
struct DraftGraph {
    graph: PathGraph,
    projection: LocalProjection,
    key_to_node: HashMap<NodeKey, NodeIndex>,
    /// Road lines touching each node as `(feature, part)`, ascending
    node_lines: Vec<Vec<(usize, usize)>>,
    seen_edges: HashSet<(usize, usize, usize)>,
    dropped: usize,
}

impl DraftGraph {
    fn new(projection: LocalProjection) -> Self {
        Self {
            graph: PathGraph::default(),
            projection,
            key_to_node: HashMap::new(),
            node_lines: Vec::new(),
            seen_edges: HashSet::new(),
            dropped: 0,
        }
    }

    fn node_for(&mut self, coord: Coordinate, line: (usize, usize)) -> NodeIndex {
        let key = coord.key();
        let idx = match self.key_to_node.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(PathNode {
                    key,
                    geometry: coord,
                    position: self.projection.project(coord),
                });
                self.key_to_node.insert(key, idx);
                self.node_lines.push(Vec::new());
                idx
            }
        };
        let lines = &mut self.node_lines[idx.index()];
        if !lines.contains(&line) {
            lines.push(line);
            lines.sort_unstable();
        }
        idx
    }

    fn add_road_edges(&mut self, segments: &[Segment]) {
        for segment in segments {
            let line = (segment.feature, segment.part);
            let a = self.node_for(segment.start, line);
            let b = self.node_for(segment.end, line);

            // Repeated points collapse into one node; the zero-length edge is useless
            if a == b {
                self.dropped += 1;
                continue;
            }
            let pair = (
                a.index().min(b.index()),
                a.index().max(b.index()),
                segment.feature,
            );
            // A feature retracing its own segment adds nothing; other features may run parallel
            if !self.seen_edges.insert(pair) {
                self.dropped += 1;
                continue;
            }

            let weight = planar_distance(self.graph[a].position, self.graph[b].position);
            self.graph.add_edge(
                a,
                b,
                PathEdge {
                    weight,
                    kind: EdgeKind::Road(segment.feature),
                },
            );
        }
    }

    /// Bridge candidates as `(lower node, higher node, distance)`, sorted and unique
    fn find_bridges(&self, config: &NetworkConfig) -> Vec<(usize, usize, f64)> {
        if config.k == 0 || self.graph.node_count() < 2 {
            return Vec::new();
        }
        let locator = NodeLocator::build(&self.graph);

        let mut bridges: Vec<(usize, usize, f64)> = (0..self.graph.node_count())
            .into_par_iter()
            .flat_map_iter(|idx| {
                let node = NodeIndex::new(idx);
                let own = &self.node_lines[idx];
                locator
                    .nearest_where(
                        self.graph[node].position,
                        config.k,
                        config.max_dist,
                        |other| {
                            if other == node {
                                return false;
                            }
                            let accepted = shares_no_line(own, &self.node_lines[other.index()]);
                            if !accepted {
                                trace!(
                                    "Bridge candidate {idx} <-> {} rejected: same road line",
                                    other.index()
                                );
                            }
                            accepted
                        },
                    )
                    .into_iter()
                    .map(move |hit| {
                        let other = hit.node.index();
                        (idx.min(other), idx.max(other), hit.distance)
                    })
            })
            .collect();

        bridges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        bridges.dedup_by_key(|b| (b.0, b.1));
        bridges
    }
}

fn shares_no_line(a: &[(usize, usize)], b: &[(usize, usize)]) -> bool {
    !a.iter().any(|line| b.binary_search(line).is_ok())
}

fn road_name<'a>(network: &'a PathNetwork, lines: &[(usize, usize)]) -> &'a str {
    lines
        .first()
        .and_then(|&(feature, _)| network.feature_id(feature))
        .unwrap_or("?")
}
