//! GeoJSON geometry as a closed sum type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VectorError;

/// `[x, y]` or `[x, y, z]`
pub type Position = Vec<f64>;

/// Type tags accepted by [`Geometry::from_value`].
pub const GEOMETRY_TYPES: [&str; 7] = [
    "Point",
    "LineString",
    "Polygon",
    "MultiPoint",
    "MultiLineString",
    "MultiPolygon",
    "GeometryCollection",
];

/// The seven GeoJSON geometry kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPoint { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Parses a GeoJSON geometry object.
    ///
    /// Unknown type tags are rejected before any coordinates are read, so a
    /// collection holding an unsupported member fails as a whole.
    pub fn from_value(value: &Value) -> Result<Self, VectorError> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| VectorError::InvalidGeoJson("geometry is missing 'type'".into()))?;

        let geometry = match tag {
            "GeometryCollection" => {
                let members = value
                    .get("geometries")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        VectorError::InvalidGeoJson("GeometryCollection without 'geometries'".into())
                    })?;
                let geometries = members
                    .iter()
                    .map(Geometry::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::GeometryCollection { geometries }
            }
            t if GEOMETRY_TYPES.contains(&t) => serde_json::from_value(value.clone())
                .map_err(|e| VectorError::InvalidGeoJson(format!("{}: {}", t, e)))?,
            other => return Err(VectorError::UnsupportedGeometry(other.to_string())),
        };

        geometry.check_positions()?;
        Ok(geometry)
    }

    /// Serializes back to a GeoJSON value.
    pub fn to_value(&self) -> Result<Value, VectorError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The GeoJSON type tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::LineString { .. } => "LineString",
            Self::Polygon { .. } => "Polygon",
            Self::MultiPoint { .. } => "MultiPoint",
            Self::MultiLineString { .. } => "MultiLineString",
            Self::MultiPolygon { .. } => "MultiPolygon",
            Self::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Calls `f` for every position, depth first.
    pub fn for_each_position<F: FnMut(&Position)>(&self, f: &mut F) {
        match self {
            Self::Point { coordinates } => f(coordinates),
            Self::LineString { coordinates } | Self::MultiPoint { coordinates } => {
                coordinates.iter().for_each(|p| f(p))
            }
            Self::Polygon { coordinates } | Self::MultiLineString { coordinates } => coordinates
                .iter()
                .flatten()
                .for_each(|p| f(p)),
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| f(p)),
            Self::GeometryCollection { geometries } => {
                geometries.iter().for_each(|g| g.for_each_position(f))
            }
        }
    }

    /// Total number of positions in the tree.
    pub fn position_count(&self) -> usize {
        let mut count = 0;
        self.for_each_position(&mut |_| count += 1);
        count
    }

    fn check_positions(&self) -> Result<(), VectorError> {
        let mut short = None;
        self.for_each_position(&mut |p| {
            if p.len() < 2 && short.is_none() {
                short = Some(p.len());
            }
        });
        match short {
            Some(len) => Err(VectorError::InvalidPosition(len)),
            None => Ok(()),
        }
    }
}
