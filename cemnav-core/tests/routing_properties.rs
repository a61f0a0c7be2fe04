use cemnav_core::prelude::*;
use cemnav_core::routing::snap::Overlay;

fn c(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng)
}

/// Two collinear roads along the equator whose facing ends are 0.00005
/// degrees (about 5.57 m) apart
fn split_road() -> Vec<RoadFeature> {
    vec![
        RoadFeature::line("west", vec![c(0.0, 0.0), c(0.0, 10.0)]),
        RoadFeature::line("east", vec![c(0.0, 10.00005), c(0.0, 20.0)]),
    ]
}

/// 3x3 grid of paths with 0.001 degree spacing and one diagonal shortcut
fn grid() -> PathNetwork {
    let step = 0.001;
    let mut features = Vec::new();
    for i in 0..3 {
        let fixed = f64::from(i) * step;
        features.push(RoadFeature::line(
            format!("row-{i}"),
            (0..3).map(|j| c(fixed, f64::from(j) * step)).collect(),
        ));
        features.push(RoadFeature::line(
            format!("col-{i}"),
            (0..3).map(|j| c(f64::from(j) * step, fixed)).collect(),
        ));
    }
    features.push(RoadFeature::line(
        "diagonal",
        vec![c(0.0, 0.0), c(0.001, 0.001)],
    ));
    build_network(&features, &NetworkConfig::new(4, 0.0)).unwrap()
}

fn distance(network: &PathNetwork, from: Coordinate, to: Coordinate) -> f64 {
    build_routed_polyline(from, to, network, &RouteOptions::default())
        .unwrap()
        .distance_meters
}

#[test]
fn end_to_end_bridges_the_gap() {
    let network = build_network(&split_road(), &NetworkConfig::new(4, 10.0)).unwrap();
    assert_eq!(network.bridge_count(), 1);
    assert_eq!(network.component_count(), 1);

    let route =
        build_routed_polyline(c(0.0, 0.0), c(0.0, 20.0), &network, &RouteOptions::default())
            .unwrap();

    // Both roads plus the bridge cover the whole 20 degrees of longitude
    let expected = 20.0 * 111_320.0;
    assert!((route.distance_meters - expected).abs() < 1e-3);
    assert_eq!(route.polyline.first(), Some(&c(0.0, 0.0)));
    assert_eq!(route.polyline.last(), Some(&c(0.0, 20.0)));
    assert_eq!(route.polyline.len(), 4);
    assert_eq!(route.distance_text(), "2226.4 km");
}

#[test]
fn disconnected_roads_give_no_route() {
    let network = build_network(&split_road(), &NetworkConfig::new(4, 1.0)).unwrap();
    assert_eq!(network.bridge_count(), 0);
    assert_eq!(network.component_count(), 2);

    let err = build_routed_polyline(c(0.0, 0.0), c(0.0, 20.0), &network, &RouteOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::NoRoute));
}

#[test]
fn routing_is_idempotent() {
    let network = grid();
    let start = c(0.00003, 0.0004);
    let dest = c(0.0017, 0.00198);

    let first = build_routed_polyline(start, dest, &network, &RouteOptions::default()).unwrap();
    let second = build_routed_polyline(start, dest, &network, &RouteOptions::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn triangle_inequality_holds() {
    let network = grid();
    let points = [
        c(0.0, 0.0),
        c(0.00001, 0.0005),
        c(0.0015, 0.002),
        c(0.002, 0.00072),
        c(0.0011, 0.0011),
        c(0.002, 0.002),
    ];
    for &a in &points {
        for &b in &points {
            for &z in &points {
                let direct = distance(&network, a, z);
                let via = distance(&network, a, b) + distance(&network, b, z);
                assert!(
                    direct <= via + 1e-6,
                    "{a:?} -> {z:?}: {direct} > {via} via {b:?}"
                );
            }
        }
    }
}

#[test]
fn larger_snap_radius_never_hurts() {
    let network = grid();
    let queries = [
        c(0.0005, 0.00051),
        c(-0.0001, 0.0007),
        c(0.0003, 0.0031),
        c(0.0009, 0.001),
    ];
    let radii = [0.0, 0.5, 2.0, 10.0, 25.0, 60.0, 200.0, 1000.0];

    for query in queries {
        let mut previous: Option<f64> = None;
        for radius in radii {
            let mut overlay = Overlay::new(&network);
            match overlay.snap(query, radius, SnapRole::Start) {
                Ok(snap) => {
                    if let Some(prev) = previous {
                        assert!(snap.distance <= prev + 1e-9);
                    }
                    previous = Some(snap.distance);
                }
                Err(err) => {
                    assert!(previous.is_none(), "{query:?} failed at {radius} m after success");
                    assert!(matches!(err, Error::NoReachablePoint { .. }));
                }
            }
        }
        assert!(previous.is_some());
    }
}

#[test]
fn nearby_endpoints_of_different_features_are_connected() {
    let close = build_network(&split_road(), &NetworkConfig::new(4, 6.0)).unwrap();
    let a = close.node_at(c(0.0, 10.0)).unwrap();
    let b = close.node_at(c(0.0, 10.00005)).unwrap();
    assert!(close.same_component(a, b));

    let far = build_network(&split_road(), &NetworkConfig::new(4, 5.0)).unwrap();
    let a = far.node_at(c(0.0, 10.0)).unwrap();
    let b = far.node_at(c(0.0, 10.00005)).unwrap();
    assert!(!far.same_component(a, b));
}

#[test]
fn gapped_multi_line_routes_across_its_gap() {
    let features = vec![RoadFeature::multi_line(
        "aisle",
        vec![
            vec![c(0.0, 0.0), c(0.0, 0.001)],
            vec![c(0.0, 0.00105), c(0.0, 0.002)],
        ],
    )];
    let network = build_network(&features, &NetworkConfig::new(4, 10.0)).unwrap();
    assert_eq!(network.component_count(), 1);

    let route = build_routed_polyline(c(0.0, 0.0), c(0.0, 0.002), &network, &RouteOptions::default())
        .unwrap();
    assert!((route.distance_meters - 0.002 * 111_320.0).abs() < 1e-6);
}

#[test]
fn distant_endpoints_can_still_connect_through_other_roads() {
    let mut features = split_road();
    features.push(RoadFeature::line(
        "detour",
        vec![c(0.0, 10.0), c(0.01, 10.0), c(0.01, 10.00005), c(0.0, 10.00005)],
    ));
    let network = build_network(&features, &NetworkConfig::new(4, 1.0)).unwrap();
    assert_eq!(network.bridge_count(), 0);

    let a = network.node_at(c(0.0, 10.0)).unwrap();
    let b = network.node_at(c(0.0, 10.00005)).unwrap();
    assert!(network.same_component(a, b));
}

#[test]
fn routing_does_not_modify_the_network() {
    let network = grid();
    let before = network.stats();
    for _ in 0..3 {
        build_routed_polyline(
            c(0.00002, 0.00031),
            c(0.0013, 0.00199),
            &network,
            &RouteOptions::default(),
        )
        .unwrap();
    }
    assert_eq!(network.stats(), before);
}

#[test]
fn formatting_boundary() {
    assert_eq!(format_distance(999.0), "999 m");
    assert_eq!(format_distance(1000.0), "1.0 km");
    assert_eq!(format_distance(1500.0), "1.5 km");
    assert_eq!(format_distance(999.6), "1000 m");
}
