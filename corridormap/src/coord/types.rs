//! Coordinate type definitions

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.0511;
pub const MAX_LAT: f64 = 85.0511;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Highest zoom level accepted by the tile math.
pub const MAX_ZOOM: u8 = 22;

/// Maximum distance (centimeters, per axis) between the projected corridor
/// center and the local origin.
pub const ORIGIN_TOLERANCE_CM: f64 = 1.0;

/// Errors raised by coordinate conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator domain.
    #[error("Latitude {0} out of Web Mercator range (-85.0511 to 85.0511)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("Longitude {0} out of range (-180 to 180)")]
    InvalidLongitude(f64),

    /// Zoom level above [`MAX_ZOOM`].
    #[error("Zoom level {0} exceeds maximum of 22")]
    InvalidZoom(u8),

    /// Bounding box edges or center are inconsistent.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// The requested projected CRS is not supported.
    #[error("Projection unavailable: {0}")]
    ProjectionUnavailable(String),
}

/// Geographic area of interest plus the point that becomes the local origin.
///
/// Fields are private so a constructed value always satisfies
/// `south < north`, `west < east` and a center strictly inside the box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoBounds {
    name: String,
    north: f64,
    south: f64,
    east: f64,
    west: f64,
    center_lat: f64,
    center_lon: f64,
}

impl GeoBounds {
    /// Creates validated bounds.
    pub fn new(
        name: impl Into<String>,
        north: f64,
        south: f64,
        east: f64,
        west: f64,
        center_lat: f64,
        center_lon: f64,
    ) -> Result<Self, CoordError> {
        for lat in [north, south, center_lat] {
            if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(CoordError::InvalidLatitude(lat));
            }
        }
        for lon in [east, west, center_lon] {
            if !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(CoordError::InvalidLongitude(lon));
            }
        }
        if south >= north {
            return Err(CoordError::InvalidBounds(format!(
                "south ({}) must be less than north ({})",
                south, north
            )));
        }
        if west >= east {
            return Err(CoordError::InvalidBounds(format!(
                "west ({}) must be less than east ({})",
                west, east
            )));
        }
        if !(center_lat > south && center_lat < north && center_lon > west && center_lon < east) {
            return Err(CoordError::InvalidBounds(format!(
                "center ({}, {}) must lie strictly inside the box",
                center_lat, center_lon
            )));
        }

        Ok(Self {
            name: name.into(),
            north,
            south,
            east,
            west,
            center_lat,
            center_lon,
        })
    }

    /// The Charlotte I-485 corridor.
    pub fn charlotte() -> Self {
        Self {
            name: "Charlotte I-485 Corridor".to_string(),
            north: 35.37,
            south: 35.08,
            east: -80.65,
            west: -81.00,
            center_lat: 35.227,
            center_lon: -80.843,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    /// Returns `(lat, lon)` of the origin point.
    pub fn center(&self) -> (f64, f64) {
        (self.center_lat, self.center_lon)
    }

    /// Inclusive containment check.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lon)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::charlotte()
    }
}

/// Easting/northing in meters under the engine's projected CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub easting: f64,
    pub northing: f64,
}

/// Position in the local engine frame, in centimeters.
///
/// `x` follows north, `y` follows east and `z` is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LocalPoint {
    pub const ORIGIN: LocalPoint = LocalPoint {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column, 0 at the antimeridian (west)
    pub x: u32,
    /// Row, 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Relative cache path `{zoom}/{x}/{y}.png`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.zoom.to_string())
            .join(self.x.to_string())
            .join(format!("{}.png", self.y))
    }

    /// Tile URL under a `{base}/{z}/{x}/{y}.png` server.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}/{}.png",
            base_url.trim_end_matches('/'),
            self.zoom,
            self.x,
            self.y
        )
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Inclusive range of tile indices covering a bounding box at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRange {
    pub fn width(&self) -> u64 {
        (self.max_x - self.min_x) as u64 + 1
    }

    pub fn height(&self) -> u64 {
        (self.max_y - self.min_y) as u64 + 1
    }

    /// Number of tiles in the range.
    pub fn count(&self) -> u64 {
        self.width() * self.height()
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Iterates all tiles column by column.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let range = *self;
        (range.min_x..=range.max_x)
            .flat_map(move |x| {
                (range.min_y..=range.max_y).map(move |y| TileCoord::new(range.zoom, x, y))
            })
    }
}
