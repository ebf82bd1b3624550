//! Highway geometry from OpenStreetMap.

use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::AcquisitionError;
use crate::coord::GeoBounds;
use crate::download::USER_AGENT;
use crate::vector::Geometry;

/// Public Overpass API interpreter.
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// `ref` values that belong to the corridor highway.
pub const DEFAULT_REF_PATTERN: &str = "485";

/// Highway name written into the centerline feature.
pub const HIGHWAY_NAME: &str = "I-485";

/// Raw segments under `raw/osm`.
pub const RAW_FILE: &str = "i485_raw.geojson";

/// Merged centerline under `processed/vectors`.
pub const CENTERLINE_FILE: &str = "i485_centerline.geojson";

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const MILES_PER_KM: f64 = 0.621371;

/// Source of raw highway segments for a corridor.
pub trait HighwaySource {
    /// Returns a GeoJSON FeatureCollection of LineString segments.
    fn fetch(&self, bounds: &GeoBounds) -> Result<Value, AcquisitionError>;
}

/// Motorway ways from the Overpass API whose `ref` matches a pattern.
pub struct OverpassHighwaySource {
    client: Client,
    endpoint: String,
    ref_pattern: Regex,
}

impl OverpassHighwaySource {
    pub fn new(timeout: Duration) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AcquisitionError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: OVERPASS_URL.to_string(),
            ref_pattern: ref_regex(DEFAULT_REF_PATTERN)?,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_ref_pattern(mut self, pattern: &str) -> Result<Self, AcquisitionError> {
        self.ref_pattern = ref_regex(pattern)?;
        Ok(self)
    }

    /// Overpass QL for motorways with a matching `ref` inside `bounds`.
    pub fn query(&self, bounds: &GeoBounds) -> String {
        format!(
            "[out:json][timeout:90];way[\"highway\"=\"motorway\"][\"ref\"~\"{}\"]({},{},{},{});out geom;",
            self.ref_pattern.as_str().trim_start_matches("(?i)"),
            bounds.south(),
            bounds.west(),
            bounds.north(),
            bounds.east()
        )
    }
}

impl HighwaySource for OverpassHighwaySource {
    fn fetch(&self, bounds: &GeoBounds) -> Result<Value, AcquisitionError> {
        let query = self.query(bounds);
        let url = Url::parse_with_params(&self.endpoint, [("data", query.as_str())])
            .map_err(|e| AcquisitionError::Http(format!("Invalid Overpass URL: {}", e)))?;
        debug!(query = %query, "Querying Overpass");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| AcquisitionError::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AcquisitionError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| AcquisitionError::InvalidResponse(format!("Overpass response: {}", e)))?;
        let collection = overpass_to_geojson(&body, &self.ref_pattern);
        info!(
            segments = feature_count(&collection),
            "Downloaded highway segments"
        );
        Ok(collection)
    }
}

fn ref_regex(pattern: &str) -> Result<Regex, AcquisitionError> {
    Ok(Regex::new(&format!("(?i){}", pattern))?)
}

/// Converts Overpass `out geom` ways into LineString features.
///
/// Ways whose `ref` tag does not match `ref_pattern`, or with fewer than two
/// nodes, are dropped.
pub fn overpass_to_geojson(body: &Value, ref_pattern: &Regex) -> Value {
    let mut features = Vec::new();
    let elements = body
        .get("elements")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for element in elements {
        if element.get("type").and_then(Value::as_str) != Some("way") {
            continue;
        }
        let tags = element
            .get("tags")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let matches = tags
            .get("ref")
            .and_then(Value::as_str)
            .is_some_and(|r| ref_pattern.is_match(r));
        if !matches {
            continue;
        }

        let coordinates: Vec<Value> = element
            .get("geometry")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|node| {
                let lat = node.get("lat")?.as_f64()?;
                let lon = node.get("lon")?.as_f64()?;
                Some(json!([lon, lat]))
            })
            .collect();
        if coordinates.len() < 2 {
            continue;
        }

        let mut feature = Map::new();
        feature.insert("type".into(), json!("Feature"));
        if let Some(id) = element.get("id") {
            feature.insert("id".into(), json!(format!("way/{}", id)));
        }
        feature.insert(
            "geometry".into(),
            json!({"type": "LineString", "coordinates": coordinates}),
        );
        feature.insert("properties".into(), Value::Object(tags));
        features.push(Value::Object(feature));
    }

    json!({"type": "FeatureCollection", "features": features})
}

fn features(collection: &Value) -> &[Value] {
    collection
        .get("features")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Number of features in a FeatureCollection.
pub fn feature_count(collection: &Value) -> usize {
    features(collection).len()
}

/// Merges every segment into one MultiLineString centerline feature.
pub fn centerline(raw: &Value) -> Result<Value, AcquisitionError> {
    let mut lines = Vec::new();
    for feature in features(raw) {
        match feature.get("geometry") {
            None | Some(Value::Null) => {}
            Some(value) => match Geometry::from_value(value)? {
                Geometry::LineString { coordinates } => lines.push(coordinates),
                Geometry::MultiLineString { coordinates } => lines.extend(coordinates),
                _ => {}
            },
        }
    }

    let geometry = Geometry::MultiLineString { coordinates: lines }.to_value()?;
    Ok(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": geometry,
            "properties": {"name": HIGHWAY_NAME, "type": "centerline"}
        }]
    }))
}

/// Great-circle distance in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Segment count and total length of a highway FeatureCollection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HighwayStats {
    pub segments: usize,
    pub length_km: f64,
    pub length_miles: f64,
}

impl HighwayStats {
    /// Sums haversine lengths over LineString and MultiLineString features.
    pub fn measure(collection: &Value) -> Result<Self, AcquisitionError> {
        let mut meters = 0.0;
        for feature in features(collection) {
            let Some(value) = feature.get("geometry").filter(|g| !g.is_null()) else {
                continue;
            };
            let lines = match Geometry::from_value(value)? {
                Geometry::LineString { coordinates } => vec![coordinates],
                Geometry::MultiLineString { coordinates } => coordinates,
                _ => continue,
            };
            for line in &lines {
                meters += line
                    .windows(2)
                    .map(|w| haversine_distance(w[0][1], w[0][0], w[1][1], w[1][0]))
                    .sum::<f64>();
            }
        }

        let length_km = meters / 1000.0;
        Ok(Self {
            segments: feature_count(collection),
            length_km: round2(length_km),
            length_miles: round2(length_km * MILES_PER_KM),
        })
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
