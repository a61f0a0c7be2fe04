use geo::{Coord, LineString};
use geojson::{Feature, Geometry, GeometryValue};
use serde_json::json;

use crate::Error;

use super::Route;

impl Route {
    /// Converts the route to a `GeoJSON` `Feature` with a `LineString`
    /// geometry in `[lng, lat]` order.
    pub fn to_geojson_feature(&self) -> Result<Feature, Error> {
        let line: LineString<f64> = self.polyline.iter().map(|&c| Coord::from(c)).collect();
        let geometry = Geometry::new(GeometryValue::from(&line));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "distance_meters": self.distance_meters,
                "distance_text": self.distance_text(),
                "start_offset_meters": self.start_offset_meters,
                "dest_offset_meters": self.dest_offset_meters,
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJson(e.to_string()))
    }

    /// Serialized form of [`Route::to_geojson_feature`]
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        let feature = self.to_geojson_feature()?;
        serde_json::to_string(&feature).map_err(|e| Error::GeoJson(e.to_string()))
    }
}
