//! WGS84 ↔ projected ↔ local-frame conversions around one fixed origin.

use serde::Serialize;
use tracing::{debug, warn};

use super::projection::UtmProjection;
use super::types::{
    CoordError, GeoBounds, LocalPoint, ProjectedPoint, TileRange, ORIGIN_TOLERANCE_CM,
};

const CM_PER_METER: f64 = 100.0;

/// Owns the corridor bounds, its projection and the memoized projected origin.
///
/// Dependents borrow the engine, so several engines with different bounds can
/// coexist in one process.
#[derive(Debug, Clone)]
pub struct CoordinateEngine {
    bounds: GeoBounds,
    projection: UtmProjection,
    origin: ProjectedPoint,
}

/// Summary of the corridor in projected space.
#[derive(Debug, Clone, Serialize)]
pub struct BoundsInfo {
    pub name: String,
    pub epsg: u32,
    pub projection: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub center_easting: f64,
    pub center_northing: f64,
    pub southwest: ProjectedPoint,
    pub northeast: ProjectedPoint,
    pub width_m: f64,
    pub height_m: f64,
    pub area_km2: f64,
}

impl CoordinateEngine {
    /// Creates an engine and projects the bounds center once.
    pub fn new(bounds: GeoBounds, projection: UtmProjection) -> Result<Self, CoordError> {
        let (lat, lon) = bounds.center();
        let origin = projection.forward(lat, lon)?;
        if !origin.easting.is_finite() || !origin.northing.is_finite() {
            return Err(CoordError::ProjectionUnavailable(format!(
                "{} cannot project center ({}, {})",
                projection, lat, lon
            )));
        }

        debug!(
            bounds = bounds.name(),
            projection = %projection,
            easting = origin.easting,
            northing = origin.northing,
            "Coordinate origin established"
        );

        Ok(Self {
            bounds,
            projection,
            origin,
        })
    }

    /// Creates an engine for an EPSG code (WGS84 UTM zones only).
    pub fn from_epsg(bounds: GeoBounds, epsg: u32) -> Result<Self, CoordError> {
        Self::new(bounds, UtmProjection::from_epsg(epsg)?)
    }

    /// Engine for the Charlotte corridor under UTM 17N.
    pub fn charlotte() -> Result<Self, CoordError> {
        Self::new(GeoBounds::charlotte(), UtmProjection::utm17n())
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn projection(&self) -> &UtmProjection {
        &self.projection
    }

    /// Geodetic degrees to projected meters.
    pub fn project(&self, lat: f64, lon: f64) -> Result<ProjectedPoint, CoordError> {
        self.projection.forward(lat, lon)
    }

    /// Projected meters to `(lat, lon)` degrees.
    pub fn unproject(&self, easting: f64, northing: f64) -> Result<(f64, f64), CoordError> {
        self.projection.inverse(easting, northing)
    }

    /// The projected bounds center.
    pub fn origin_projected(&self) -> ProjectedPoint {
        self.origin
    }

    /// Converts a geodetic position to the local frame in centimeters.
    ///
    /// Northing offset becomes `x`, easting offset becomes `y` and
    /// elevation becomes `z`.
    pub fn to_local(
        &self,
        lat: f64,
        lon: f64,
        elevation_m: f64,
    ) -> Result<LocalPoint, CoordError> {
        let p = self.project(lat, lon)?;
        Ok(LocalPoint {
            x: (p.northing - self.origin.northing) * CM_PER_METER,
            y: (p.easting - self.origin.easting) * CM_PER_METER,
            z: elevation_m * CM_PER_METER,
        })
    }

    /// Inverse of [`to_local`](Self::to_local): `(lat, lon, elevation_m)`.
    pub fn to_geodetic(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64), CoordError> {
        let northing = self.origin.northing + x / CM_PER_METER;
        let easting = self.origin.easting + y / CM_PER_METER;
        let (lat, lon) = self.unproject(easting, northing)?;
        Ok((lat, lon, z / CM_PER_METER))
    }

    /// Inclusive check against the engine's bounds.
    pub fn is_within_bounds(&self, lat: f64, lon: f64) -> bool {
        self.bounds.contains(lat, lon)
    }

    /// Tile range covering the engine's bounds.
    pub fn tile_bounds(&self, zoom: u8) -> Result<TileRange, CoordError> {
        super::tile_bounds(&self.bounds, zoom)
    }

    /// Checks that the bounds center maps to the local origin within 1 cm.
    pub fn validate_origin(&self) -> bool {
        let (lat, lon) = self.bounds.center();
        let local = match self.to_local(lat, lon, 0.0) {
            Ok(local) => local,
            Err(e) => {
                warn!(error = %e, "Origin validation failed");
                return false;
            }
        };
        let valid = [local.x, local.y, local.z]
            .iter()
            .all(|v| v.abs() <= ORIGIN_TOLERANCE_CM);

        if valid {
            debug!(x = local.x, y = local.y, z = local.z, "Origin validated");
        } else {
            warn!(
                x = local.x,
                y = local.y,
                z = local.z,
                "Origin validation failed: center does not map to (0, 0, 0)"
            );
        }
        valid
    }

    /// Projected extent of the corridor.
    pub fn bounds_info(&self) -> Result<BoundsInfo, CoordError> {
        let (center_lat, center_lon) = self.bounds.center();
        let southwest = self.project(self.bounds.south(), self.bounds.west())?;
        let northeast = self.project(self.bounds.north(), self.bounds.east())?;
        let width_m = northeast.easting - southwest.easting;
        let height_m = northeast.northing - southwest.northing;

        Ok(BoundsInfo {
            name: self.bounds.name().to_string(),
            epsg: self.projection.epsg(),
            projection: self.projection.label(),
            center_lat,
            center_lon,
            center_easting: self.origin.easting,
            center_northing: self.origin.northing,
            southwest,
            northeast,
            width_m,
            height_m,
            area_km2: width_m * height_m / 1_000_000.0,
        })
    }
}
