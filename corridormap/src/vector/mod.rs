//! GeoJSON re-projection into the local engine frame.
//!
//! Every position `[lon, lat(, elev_m)]` becomes `[x, y, z]` in centimeters
//! relative to the corridor center (X north, Y east, Z up). Geometry kinds,
//! nesting, position order and feature properties survive unchanged.

mod geometry;
mod range;
mod transform;

pub use geometry::{Geometry, Position, GEOMETRY_TYPES};
pub use range::{coordinate_range, AxisRange, CoordinateRange, MAX_EXPECTED_EXTENT_CM};
pub use transform::{
    default_output_path, TransformStats, VectorTransformer, COORDINATE_CONVENTION, ORIGINAL_CRS,
    OUTPUT_DIR_NAME, OUTPUT_SUFFIX, TRANSFORMED_CRS,
};

use std::io;

use thiserror::Error;

use crate::coord::CoordError;

/// Errors from reading, transforming or writing vector data.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Position has {0} components, at least 2 required")]
    InvalidPosition(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Coord(#[from] CoordError),
}
