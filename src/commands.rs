use std::path::Path;

use cemnav_core::loading::features_from_geojson_path;
use cemnav_core::{
    Coordinate, Error, NetworkConfig, PathNetwork, Route, RouteOptions, build_network,
    build_routed_polyline, build_routed_polylines, format_distance,
};
use log::{info, warn};

/// Parses `LAT,LNG`, latitude first
pub fn parse_coordinate(text: &str) -> Result<Coordinate, String> {
    let (lat, lng) = text
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{text}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("bad latitude '{lat}': {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("bad longitude '{lng}': {e}"))?;
    Coordinate::try_new(lat, lng).map_err(|e| e.to_string())
}

fn load(geometry: &Path, config: &NetworkConfig) -> Result<PathNetwork, Error> {
    let features = features_from_geojson_path(geometry)?;
    info!("Read {} features from {}", features.len(), geometry.display());
    build_network(&features, config)
}

pub fn inspect(geometry: &Path, config: &NetworkConfig) -> Result<(), Error> {
    let network = load(geometry, config)?;
    let stats = network.stats();
    println!("nodes:       {}", stats.nodes);
    println!("edges:       {}", stats.edges);
    println!("bridges:     {}", stats.bridges);
    println!("components:  {}", stats.components);
    println!("road length: {}", format_distance(stats.road_length_meters));
    Ok(())
}

pub fn route(
    geometry: &Path,
    config: &NetworkConfig,
    from: Coordinate,
    to: &[Coordinate],
    options: &RouteOptions,
    geojson: bool,
) -> Result<(), Error> {
    let network = load(geometry, config)?;

    if let [single] = to {
        let route = build_routed_polyline(from, *single, &network, options)?;
        print_route(&route, geojson)?;
        return Ok(());
    }

    let routes = build_routed_polylines(from, to, &network, options)?;
    let mut failures = 0;
    for (destination, result) in to.iter().zip(routes) {
        match result {
            Ok(route) => print_route(&route, geojson)?,
            Err(err) => {
                warn!(
                    "No route to ({}, {}): {err}",
                    destination.lat, destination.lng
                );
                failures += 1;
            }
        }
    }
    if failures > 0 {
        warn!("{failures} of {} destinations could not be routed", to.len());
    }
    Ok(())
}

fn print_route(route: &Route, geojson: bool) -> Result<(), Error> {
    if geojson {
        println!("{}", route.to_geojson_string()?);
    } else {
        println!("{}", summary(route));
    }
    Ok(())
}

fn summary(route: &Route) -> String {
    let header = format!(
        "{} ({:.1} m, {} points)",
        route.distance_text(),
        route.distance_meters,
        route.polyline.len()
    );
    std::iter::once(header)
        .chain(
            route
                .polyline
                .iter()
                .map(|point| format!("  {:.7},{:.7}", point.lat, point.lng)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}
