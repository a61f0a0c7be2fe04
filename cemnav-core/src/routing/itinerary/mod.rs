//! Route assembly: snapping both ends, solving and turning the result into
//! a distance-annotated polyline.

mod to_geojson;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::format::format_distance;
use crate::model::{Coordinate, PathNetwork};
use crate::routing::dijkstra::{ShortestPath, shortest_path};
use crate::routing::snap::{Overlay, SnapPoint};
use crate::{Error, SnapRole};

/// Snap radii for one routing request, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    pub start_radius: f64,
    pub dest_radius: f64,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            start_radius: 25.0,
            dest_radius: 25.0,
        }
    }
}

/// Walkable route between two query points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Requested start, the network path, then the requested destination.
    /// Always at least two points, even when both ends coincide.
    pub polyline: Vec<Coordinate>,
    /// Sum of traversed edge weights, including partial edges at both snaps
    pub distance_meters: f64,
    /// Off-network gap between the requested start and its snap point
    pub start_offset_meters: f64,
    /// Off-network gap between the requested destination and its snap point
    pub dest_offset_meters: f64,
}

impl Route {
    pub fn distance_text(&self) -> String {
        format_distance(self.distance_meters)
    }
}

/// Computes the shortest walkable route from `start` to `destination`.
///
/// Neither point has to lie on a path: each is snapped within its radius
/// from `options`. The network is only read.
///
/// # Errors
///
/// - [`Error::NoReachablePoint`] if either point has no path within its radius
/// - [`Error::NoRoute`] if both snapped but the network does not connect them
pub fn build_routed_polyline(
    start: Coordinate,
    destination: Coordinate,
    network: &PathNetwork,
    options: &RouteOptions,
) -> Result<Route, Error> {
    let mut overlay = Overlay::new(network);
    let start_snap = overlay.snap(start, options.start_radius, SnapRole::Start)?;
    route_from_snapped(overlay, &start_snap, destination, options.dest_radius)
}

/// Routes from one start to many destinations.
///
/// The start is snapped once; destinations are solved in parallel, each in
/// its own copy of the request overlay. Results keep the input order.
///
/// # Errors
///
/// The outer error is a failure to snap `start`; per-destination failures
/// are reported in the returned vector.
pub fn build_routed_polylines(
    start: Coordinate,
    destinations: &[Coordinate],
    network: &PathNetwork,
    options: &RouteOptions,
) -> Result<Vec<Result<Route, Error>>, Error> {
    let mut base = Overlay::new(network);
    let start_snap = base.snap(start, options.start_radius, SnapRole::Start)?;

    Ok(destinations
        .par_iter()
        .map(|destination| {
            route_from_snapped(base.clone(), &start_snap, *destination, options.dest_radius)
        })
        .collect())
}

fn route_from_snapped(
    mut overlay: Overlay<'_>,
    start_snap: &SnapPoint,
    destination: Coordinate,
    dest_radius: f64,
) -> Result<Route, Error> {
    let dest_snap = overlay.snap(destination, dest_radius, SnapRole::Destination)?;
    let path = shortest_path(&overlay, start_snap.vertex, dest_snap.vertex)?;
    let route = assemble(&overlay, start_snap, &dest_snap, &path)?;
    debug!(
        "Route over {} vertices, {:.1} m",
        path.vertices.len(),
        route.distance_meters
    );
    Ok(route)
}

fn assemble(
    overlay: &Overlay<'_>,
    start: &SnapPoint,
    destination: &SnapPoint,
    path: &ShortestPath,
) -> Result<Route, Error> {
    let mut polyline = Vec::with_capacity(path.vertices.len() + 2);
    push_distinct(&mut polyline, start.query);
    for &vertex in &path.vertices {
        let coord = overlay
            .geometry(vertex)
            .ok_or(Error::InternalInvariant("path vertex has no geometry"))?;
        push_distinct(&mut polyline, coord);
    }
    // The requested destination replaces a snap point it coincides with, but
    // never the start point
    if polyline.len() > 1
        && polyline
            .last()
            .is_some_and(|last| last.key() == destination.query.key())
    {
        polyline.pop();
    }
    polyline.push(destination.query);

    let distance_meters: f64 = path.hops.iter().sum();
    debug_assert!((distance_meters - path.distance).abs() <= 1e-6 * distance_meters.max(1.0));

    Ok(Route {
        polyline,
        distance_meters,
        start_offset_meters: start.distance,
        dest_offset_meters: destination.distance,
    })
}

/// Appends `coord` unless it quantizes onto the previous point
fn push_distinct(polyline: &mut Vec<Coordinate>, coord: Coordinate) {
    if polyline.last().is_none_or(|last| last.key() != coord.key()) {
        polyline.push(coord);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::{NetworkConfig, RoadFeature, build_network};

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    /// L-shaped path: east along the equator, then north
    fn corner() -> PathNetwork {
        let features = vec![RoadFeature::line(
            "L",
            vec![c(0.0, 0.0), c(0.0, 0.001), c(0.001, 0.001)],
        )];
        build_network(&features, &NetworkConfig::default()).unwrap()
    }

    #[test]
    fn polyline_starts_and_ends_at_the_query_points() {
        let network = corner();
        let start = c(-0.00002, 0.0002);
        let dest = c(0.0008, 0.00102);
        let route = build_routed_polyline(start, dest, &network, &RouteOptions::default()).unwrap();

        assert_eq!(route.polyline.first(), Some(&start));
        assert_eq!(route.polyline.last(), Some(&dest));
        // start, its snap, the corner, the destination snap, destination
        assert_eq!(route.polyline.len(), 5);
        assert!((route.polyline[2].lat).abs() < 1e-12);
        assert!((route.polyline[2].lng - 0.001).abs() < 1e-12);

        // 0.0008 degrees east plus 0.0008 degrees north
        assert!((route.distance_meters - 0.0016 * 111_320.0).abs() < 0.01);
        assert!((route.start_offset_meters - 2.2264).abs() < 1e-3);
        assert!((route.dest_offset_meters - 2.2264).abs() < 1e-3);
        assert_eq!(route.distance_text(), "178 m");
    }

    #[test]
    fn start_on_a_node_is_not_duplicated() {
        let network = corner();
        let route = build_routed_polyline(
            c(0.0, 0.0),
            c(0.001, 0.001),
            &network,
            &RouteOptions::default(),
        )
        .unwrap();
        assert_eq!(route.polyline.len(), 3);
        assert_eq!(route.start_offset_meters, 0.0);
    }

    #[test]
    fn both_points_on_one_edge() {
        let network = corner();
        let route = build_routed_polyline(
            c(0.0, 0.0002),
            c(0.0, 0.0007),
            &network,
            &RouteOptions::default(),
        )
        .unwrap();
        assert_eq!(route.polyline.len(), 2);
        assert!((route.distance_meters - 0.0005 * 111_320.0).abs() < 0.01);
    }

    #[test]
    fn identical_start_and_destination() {
        let network = corner();
        let p = c(0.00001, 0.0005);
        let route = build_routed_polyline(p, p, &network, &RouteOptions::default()).unwrap();
        assert_eq!(route.distance_meters, 0.0);
        // Out to the snap point and back
        assert_eq!(route.polyline.len(), 3);
        assert_eq!(route.polyline.first(), Some(&p));
        assert_eq!(route.polyline.last(), Some(&p));

        // On a network node the line is the point twice
        let node = c(0.0, 0.001);
        let route = build_routed_polyline(node, node, &network, &RouteOptions::default()).unwrap();
        assert_eq!(route.polyline, vec![node, node]);
    }

    #[test]
    fn start_outside_radius_fails_before_solving() {
        let network = corner();
        let options = RouteOptions {
            start_radius: 1.0,
            dest_radius: 25.0,
        };
        let err = build_routed_polyline(c(-0.001, 0.0005), c(0.0, 0.0005), &network, &options)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NoReachablePoint {
                role: SnapRole::Start,
                ..
            }
        ));
    }

    #[test]
    fn one_to_many_keeps_order_and_reports_each_failure() {
        let network = corner();
        let destinations = [c(0.001, 0.001), c(0.5, 0.5), c(0.0, 0.001)];
        let results = build_routed_polylines(
            c(0.0, 0.0),
            &destinations,
            &network,
            &RouteOptions::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::NoReachablePoint { .. })));
        let last = results[2].as_ref().unwrap();
        assert!((last.distance_meters - 111.32).abs() < 0.01);
    }

    #[test]
    fn one_to_many_matches_single_routes() {
        let network = corner();
        let start = c(0.00001, 0.0003);
        let destinations = [c(0.0004, 0.00099), c(0.0, 0.0001)];
        let results = build_routed_polylines(start, &destinations, &network, &RouteOptions::default())
            .unwrap();
        for (dest, result) in destinations.iter().zip(results) {
            let single =
                build_routed_polyline(start, *dest, &network, &RouteOptions::default()).unwrap();
            assert_eq!(result.unwrap(), single);
        }
    }
}
