//! Normalization of road features into two-point segments.
//!
//! The ingest boundary is the only place that deals with axis order:
//! [`RoadFeature`] always holds `(lat, lng)` [`Coordinate`]s, and the GeoJSON
//! reader interprets every position strictly as `[lng, lat]`.

use std::path::Path;

use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry, GeometryValue, Position};
use itertools::Itertools;
use log::debug;
use serde_json::Value as JsonValue;

use crate::{Coordinate, Error};

/// Line-shaped geometry of one road feature
#[derive(Debug, Clone, PartialEq)]
pub enum RoadGeometry {
    Line(Vec<Coordinate>),
    MultiLine(Vec<Vec<Coordinate>>),
}

impl RoadGeometry {
    /// Polylines making up the geometry
    pub fn parts(&self) -> Vec<&[Coordinate]> {
        match self {
            RoadGeometry::Line(line) => vec![line.as_slice()],
            RoadGeometry::MultiLine(lines) => lines.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// Named road feature from the geometry provider
#[derive(Debug, Clone, PartialEq)]
pub struct RoadFeature {
    pub id: String,
    pub geometry: RoadGeometry,
}

impl RoadFeature {
    pub fn line(id: impl Into<String>, points: Vec<Coordinate>) -> Self {
        Self {
            id: id.into(),
            geometry: RoadGeometry::Line(points),
        }
    }

    pub fn multi_line(id: impl Into<String>, lines: Vec<Vec<Coordinate>>) -> Self {
        Self {
            id: id.into(),
            geometry: RoadGeometry::MultiLine(lines),
        }
    }
}

/// Directed piece between two consecutive points of one polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Index of the source feature in the ingested slice
    pub feature: usize,
    /// Index of the polyline within a multi-line feature
    pub part: usize,
    pub start: Coordinate,
    pub end: Coordinate,
}

/// Flattens features into segments, validating every coordinate.
///
/// # Errors
///
/// [`Error::InvalidGeometry`] when a polyline has fewer than two points, all
/// of its points coincide, or any coordinate is non-finite or out of range.
pub fn segments_from_features(features: &[RoadFeature]) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();

    for (feature_idx, feature) in features.iter().enumerate() {
        let parts = feature.geometry.parts();
        if parts.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "feature '{}' has no lines",
                feature.id
            )));
        }

        for (part_idx, points) in parts.into_iter().enumerate() {
            validate_polyline(&feature.id, points)?;
            segments.extend(points.iter().tuple_windows().map(|(start, end)| Segment {
                feature: feature_idx,
                part: part_idx,
                start: *start,
                end: *end,
            }));
        }
    }

    debug!(
        "Normalized {} features into {} segments",
        features.len(),
        segments.len()
    );
    Ok(segments)
}

fn validate_polyline(feature_id: &str, points: &[Coordinate]) -> Result<(), Error> {
    if points.len() < 2 {
        return Err(Error::InvalidGeometry(format!(
            "feature '{feature_id}' has a line with {} point(s), at least 2 required",
            points.len()
        )));
    }
    for point in points {
        point
            .validate()
            .map_err(|e| Error::InvalidGeometry(format!("feature '{feature_id}': {e}")))?;
    }
    let first = points[0].key();
    if points.iter().all(|p| p.key() == first) {
        return Err(Error::InvalidGeometry(format!(
            "feature '{feature_id}' has a line whose points all coincide"
        )));
    }
    Ok(())
}

/// Reads road features from GeoJSON text.
///
/// Accepts a `FeatureCollection`, a single `Feature` or a bare geometry, each
/// of type `LineString` or `MultiLineString`. The feature id is the GeoJSON
/// `id`, then the `name` property, then `road-<index>`.
pub fn features_from_geojson_str(text: &str) -> Result<Vec<RoadFeature>, Error> {
    let geojson: GeoJson = text.parse().map_err(|e| Error::GeoJson(format!("{e}")))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .enumerate()
            .map(|(idx, feature)| feature_from_geojson(idx, feature))
            .collect(),
        GeoJson::Feature(feature) => Ok(vec![feature_from_geojson(0, &feature)?]),
        GeoJson::Geometry(geometry) => {
            let id = "road-0".to_string();
            let geometry = road_geometry_from_geojson(&id, &geometry)?;
            Ok(vec![RoadFeature { id, geometry }])
        }
    }
}

/// Reads road features from a GeoJSON file
pub fn features_from_geojson_path(path: impl AsRef<Path>) -> Result<Vec<RoadFeature>, Error> {
    let text = std::fs::read_to_string(path)?;
    features_from_geojson_str(&text)
}

fn feature_from_geojson(idx: usize, feature: &Feature) -> Result<RoadFeature, Error> {
    let id = feature_name(idx, feature);
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| Error::InvalidGeometry(format!("feature '{id}' has no geometry")))?;
    let geometry = road_geometry_from_geojson(&id, geometry)?;
    Ok(RoadFeature { id, geometry })
}

fn feature_name(idx: usize, feature: &Feature) -> String {
    match &feature.id {
        Some(Id::String(s)) => return s.clone(),
        Some(Id::Number(n)) => return n.to_string(),
        None => {}
    }
    feature
        .property("name")
        .and_then(JsonValue::as_str)
        .map_or_else(|| format!("road-{idx}"), str::to_string)
}

fn road_geometry_from_geojson(id: &str, geometry: &Geometry) -> Result<RoadGeometry, Error> {
    match &geometry.value {
        GeometryValue::LineString { coordinates } => {
            Ok(RoadGeometry::Line(line_from_positions(id, coordinates)?))
        }
        GeometryValue::MultiLineString { coordinates } => {
            let lines = coordinates
                .iter()
                .map(|line| line_from_positions(id, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RoadGeometry::MultiLine(lines))
        }
        other => Err(Error::InvalidGeometry(format!(
            "feature '{id}' has unsupported geometry type '{}', expected LineString or MultiLineString",
            other.type_name()
        ))),
    }
}

fn line_from_positions(id: &str, positions: &[Position]) -> Result<Vec<Coordinate>, Error> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            // [lng, lat] with an optional, ignored elevation
            [lng, lat] | [lng, lat, _] => Coordinate::from_lng_lat(*lng, *lat)
                .map_err(|e| Error::InvalidGeometry(format!("feature '{id}': {e}"))),
            other => Err(Error::InvalidGeometry(format!(
                "feature '{id}' has a position that is not [lng, lat]: {other:?}"
            ))),
        })
        .collect()
}
