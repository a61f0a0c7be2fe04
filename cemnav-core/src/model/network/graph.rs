use hashbrown::HashMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use super::{PathEdge, PathNode};
use crate::model::{Coordinate, LocalProjection, NodeKey};
use crate::spatial::SpatialIndex;

pub type PathGraph = UnGraph<PathNode, PathEdge>;

/// Summary counts of a built network
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkStats {
    pub nodes: usize,
    pub edges: usize,
    pub bridges: usize,
    pub components: usize,
    /// Summed length of road edges, bridges excluded
    pub road_length_meters: f64,
}

/// Immutable routable network: graph, spatial index and the planar frame
/// they were computed in.
///
/// Built once per geometry snapshot by [`crate::build_network`]. Routing
/// requests only ever borrow it, so it can be shared across threads as is.
#[derive(Debug, Clone)]
pub struct PathNetwork {
    pub(crate) graph: PathGraph,
    pub(crate) index: SpatialIndex,
    pub(crate) projection: LocalProjection,
    pub(crate) key_to_node: HashMap<NodeKey, NodeIndex>,
    pub(crate) feature_ids: Vec<String>,
    component_of: Vec<usize>,
    component_count: usize,
}

impl PathNetwork {
    pub(crate) fn new(
        graph: PathGraph,
        projection: LocalProjection,
        key_to_node: HashMap<NodeKey, NodeIndex>,
        feature_ids: Vec<String>,
    ) -> Self {
        let index = SpatialIndex::build(&graph);
        let (component_of, component_count) = label_components(&graph);
        Self {
            graph,
            index,
            projection,
            key_to_node,
            feature_ids,
            component_of,
            component_count,
        }
    }

    pub fn graph(&self) -> &PathGraph {
        &self.graph
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node sitting at `coord`, after quantization
    pub fn node_at(&self, coord: Coordinate) -> Option<NodeIndex> {
        self.key_to_node.get(&coord.key()).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&PathNode> {
        self.graph.node_weight(idx)
    }

    /// Source feature id of a road edge's feature index
    pub fn feature_id(&self, feature: usize) -> Option<&str> {
        self.feature_ids.get(feature).map(String::as_str)
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn same_component(&self, a: NodeIndex, b: NodeIndex) -> bool {
        match (self.component_of.get(a.index()), self.component_of.get(b.index())) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn bridge_count(&self) -> usize {
        self.graph
            .edge_weights()
            .filter(|edge| edge.is_bridge())
            .count()
    }

    pub fn stats(&self) -> NetworkStats {
        let road_length_meters = self
            .graph
            .edge_weights()
            .filter(|edge| !edge.is_bridge())
            .map(PathEdge::length)
            .sum();
        NetworkStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            bridges: self.bridge_count(),
            components: self.component_count,
            road_length_meters,
        }
    }
}

/// Dense component label per node, and the number of components
fn label_components(graph: &PathGraph) -> (Vec<usize>, usize) {
    let mut uf = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.edge_references() {
        uf.union(edge.source().index(), edge.target().index());
    }
    let roots = uf.into_labeling();
    let mut dense: HashMap<usize, usize> = HashMap::new();
    let labels = roots
        .into_iter()
        .map(|root| {
            let next = dense.len();
            *dense.entry(root).or_insert(next)
        })
        .collect();
    (labels, dense.len())
}
