//! Extent of transformed output, used to sanity-check a transform.

use serde::Serialize;
use serde_json::Value;

use super::geometry::Geometry;
use super::VectorError;

/// Extent above which a corridor transform is suspect: 100 km in cm.
pub const MAX_EXPECTED_EXTENT_CM: f64 = 100.0 * 100.0 * 1000.0;

/// Min and max along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, v: f64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    pub fn max_abs(&self) -> f64 {
        self.min.abs().max(self.max.abs())
    }
}

/// Per-axis bounds over every position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateRange {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
    pub positions: usize,
}

impl CoordinateRange {
    fn new() -> Self {
        Self {
            x: AxisRange::empty(),
            y: AxisRange::empty(),
            z: AxisRange::empty(),
            positions: 0,
        }
    }

    fn include(&mut self, geometry: &Geometry) {
        geometry.for_each_position(&mut |p| {
            self.x.include(p[0]);
            self.y.include(p[1]);
            self.z.include(p.get(2).copied().unwrap_or(0.0));
            self.positions += 1;
        });
    }

    pub fn is_empty(&self) -> bool {
        self.positions == 0
    }

    /// True if any horizontal coordinate lies further than `limit_cm` from
    /// the origin. An empty range never exceeds.
    pub fn exceeds(&self, limit_cm: f64) -> bool {
        !self.is_empty() && (self.x.max_abs() > limit_cm || self.y.max_abs() > limit_cm)
    }
}

/// Scans a FeatureCollection, Feature or bare geometry.
///
/// Features with a null geometry are ignored.
pub fn coordinate_range(document: &Value) -> Result<CoordinateRange, VectorError> {
    let mut range = CoordinateRange::new();
    let kind = document.get("type").and_then(Value::as_str);

    match kind {
        Some("FeatureCollection") => {
            if let Some(features) = document.get("features").and_then(Value::as_array) {
                for feature in features {
                    include_feature(&mut range, feature)?;
                }
            }
        }
        Some("Feature") => include_feature(&mut range, document)?,
        Some(_) => range.include(&Geometry::from_value(document)?),
        None => return Err(VectorError::InvalidGeoJson("missing 'type' field".into())),
    }

    Ok(range)
}

fn include_feature(range: &mut CoordinateRange, feature: &Value) -> Result<(), VectorError> {
    match feature.get("geometry") {
        None | Some(Value::Null) => Ok(()),
        Some(geometry) => {
            range.include(&Geometry::from_value(geometry)?);
            Ok(())
        }
    }
}
