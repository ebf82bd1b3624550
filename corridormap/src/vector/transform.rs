//! Re-projection of GeoJSON documents into the local engine frame.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::geometry::{Geometry, Position, GEOMETRY_TYPES};
use super::VectorError;
use crate::coord::CoordinateEngine;

/// Source CRS recorded on every transformed feature.
pub const ORIGINAL_CRS: &str = "EPSG:4326";

/// Target frame recorded on every transformed feature.
pub const TRANSFORMED_CRS: &str = "Unreal";

/// Axis convention recorded on every transformed feature.
pub const COORDINATE_CONVENTION: &str = "X=North, Y=East, Z=Up (cm)";

/// Directory (next to the input) and suffix for default output files.
pub const OUTPUT_DIR_NAME: &str = "unreal";
pub const OUTPUT_SUFFIX: &str = "_unreal";

/// Outcome of transforming one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub features_transformed: usize,
}

/// Rewrites WGS84 GeoJSON into local centimeters through a borrowed engine.
pub struct VectorTransformer<'a> {
    engine: &'a CoordinateEngine,
}

impl<'a> VectorTransformer<'a> {
    pub fn new(engine: &'a CoordinateEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &CoordinateEngine {
        self.engine
    }

    /// Checks that the engine maps its center to the local origin.
    pub fn validate_origin(&self) -> bool {
        self.engine.validate_origin()
    }

    /// `[lon, lat(, elev)]` to `[x, y, z]`.
    fn transform_position(
        &self,
        position: &Position,
        default_elevation: f64,
    ) -> Result<Position, VectorError> {
        if position.len() < 2 {
            return Err(VectorError::InvalidPosition(position.len()));
        }
        let elevation = position.get(2).copied().unwrap_or(default_elevation);
        Ok(self
            .engine
            .to_local(position[1], position[0], elevation)?
            .to_array()
            .to_vec())
    }

    fn transform_positions(
        &self,
        positions: &[Position],
        default_elevation: f64,
    ) -> Result<Vec<Position>, VectorError> {
        positions
            .iter()
            .map(|p| self.transform_position(p, default_elevation))
            .collect()
    }

    fn transform_rings(
        &self,
        rings: &[Vec<Position>],
        default_elevation: f64,
    ) -> Result<Vec<Vec<Position>>, VectorError> {
        rings
            .iter()
            .map(|ring| self.transform_positions(ring, default_elevation))
            .collect()
    }

    /// Transforms every position, keeping kind, nesting, arity and order.
    ///
    /// A position's third component is used as its elevation; 2D positions
    /// get `default_elevation`.
    pub fn transform_geometry(
        &self,
        geometry: &Geometry,
        default_elevation: f64,
    ) -> Result<Geometry, VectorError> {
        Ok(match geometry {
            Geometry::Point { coordinates } => Geometry::Point {
                coordinates: self.transform_position(coordinates, default_elevation)?,
            },
            Geometry::LineString { coordinates } => Geometry::LineString {
                coordinates: self.transform_positions(coordinates, default_elevation)?,
            },
            Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
                coordinates: self.transform_positions(coordinates, default_elevation)?,
            },
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: self.transform_rings(coordinates, default_elevation)?,
            },
            Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
                coordinates: self.transform_rings(coordinates, default_elevation)?,
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|polygon| self.transform_rings(polygon, default_elevation))
                    .collect::<Result<_, _>>()?,
            },
            Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
                geometries: geometries
                    .iter()
                    .map(|g| self.transform_geometry(g, default_elevation))
                    .collect::<Result<_, _>>()?,
            },
        })
    }

    /// Transforms a Feature, preserving its id and properties and adding
    /// provenance properties. A null geometry stays null.
    pub fn transform_feature(
        &self,
        feature: &Value,
        default_elevation: f64,
    ) -> Result<Value, VectorError> {
        let object = feature
            .as_object()
            .ok_or_else(|| VectorError::InvalidGeoJson("feature is not an object".into()))?;

        let geometry = match object.get("geometry") {
            None | Some(Value::Null) => Value::Null,
            Some(value) => {
                let parsed = Geometry::from_value(value)?;
                self.transform_geometry(&parsed, default_elevation)?.to_value()?
            }
        };

        let mut properties = match object.get("properties") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        properties.insert("_original_crs".into(), json!(ORIGINAL_CRS));
        properties.insert("_transformed_crs".into(), json!(TRANSFORMED_CRS));
        properties.insert("_coordinate_convention".into(), json!(COORDINATE_CONVENTION));

        let mut out = Map::new();
        out.insert("type".into(), json!("Feature"));
        if let Some(id) = object.get("id") {
            out.insert("id".into(), id.clone());
        }
        out.insert("geometry".into(), geometry);
        out.insert("properties".into(), Value::Object(properties));
        Ok(Value::Object(out))
    }

    /// Transforms a FeatureCollection, Feature or bare geometry and attaches
    /// a `_metadata` block describing the transform.
    pub fn transform_document(
        &self,
        document: &Value,
        source_name: &str,
        default_elevation: f64,
    ) -> Result<Value, VectorError> {
        let kind = document
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| VectorError::InvalidGeoJson("missing 'type' field".into()))?;

        let mut out = match kind {
            "FeatureCollection" => {
                let features = match document.get("features") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|f| self.transform_feature(f, default_elevation))
                        .collect::<Result<Vec<_>, _>>()?,
                    None | Some(Value::Null) => Vec::new(),
                    Some(_) => {
                        return Err(VectorError::InvalidGeoJson("'features' is not an array".into()))
                    }
                };
                json!({ "type": "FeatureCollection", "features": features })
            }
            "Feature" => self.transform_feature(document, default_elevation)?,
            t if GEOMETRY_TYPES.contains(&t) => {
                let geometry = Geometry::from_value(document)?;
                self.transform_geometry(&geometry, default_elevation)?.to_value()?
            }
            other => return Err(VectorError::UnsupportedGeometry(other.to_string())),
        };

        if let Value::Object(map) = &mut out {
            map.insert("_metadata".into(), self.metadata(source_name, default_elevation));
        }
        Ok(out)
    }

    fn metadata(&self, source_name: &str, default_elevation: f64) -> Value {
        let (lat, lon) = self.engine.bounds().center();
        json!({
            "source_file": source_name,
            "transform": format!("WGS84 -> {} -> Unreal", self.engine.projection().label()),
            "origin_wgs84": { "lat": lat, "lon": lon },
            "origin_unreal": [0, 0, 0],
            "default_elevation_m": default_elevation,
        })
    }

    /// Reads, transforms and writes one GeoJSON file.
    ///
    /// Without an explicit `output` the result goes to
    /// `<input dir>/unreal/<stem>_unreal.geojson`.
    pub fn transform_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        default_elevation: f64,
    ) -> Result<(PathBuf, TransformStats), VectorError> {
        let text = fs::read_to_string(input)?;
        let document: Value = serde_json::from_str(&text)?;

        let source_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let transformed = self.transform_document(&document, &source_name, default_elevation)?;

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input),
        };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output, serde_json::to_string_pretty(&transformed)?)?;

        let features_transformed = match transformed.get("features") {
            Some(Value::Array(features)) => features.len(),
            _ => 1,
        };
        info!(
            input = %input.display(),
            output = %output.display(),
            features = features_transformed,
            "Transformed vector file"
        );

        let stats = TransformStats {
            input_file: input.to_path_buf(),
            output_file: output.clone(),
            features_transformed,
        };
        Ok((output, stats))
    }
}

/// `<dir>/unreal/<stem>_unreal.geojson` for an input at `<dir>/<stem>.*`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let path = dir
        .join(OUTPUT_DIR_NAME)
        .join(format!("{}{}.geojson", stem, OUTPUT_SUFFIX));
    debug!(input = %input.display(), output = %path.display(), "Default output path");
    path
}
