//! Universal Transverse Mercator on the WGS84 ellipsoid, backed by proj4rs.

use std::fmt;
use std::sync::{Arc, OnceLock};

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::types::{CoordError, ProjectedPoint};

/// Geographic WGS84 source CRS (EPSG:4326).
const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

/// Source and target definitions for one zone.
struct UtmTransformer {
    geographic: Proj,
    utm: Proj,
}

/// A single UTM zone projection.
///
/// The proj4rs definitions are built on first use and shared between clones.
#[derive(Clone)]
pub struct UtmProjection {
    zone: u8,
    hemisphere: Hemisphere,
    transformer: Arc<OnceLock<Result<UtmTransformer, CoordError>>>,
}

impl UtmProjection {
    /// Builds the projection for a zone (1-60) and hemisphere.
    pub fn new(zone: u8, hemisphere: Hemisphere) -> Result<Self, CoordError> {
        if !(1..=60).contains(&zone) {
            return Err(CoordError::ProjectionUnavailable(format!(
                "UTM zone {} is outside 1-60",
                zone
            )));
        }
        let projection = Self::build(zone, hemisphere);
        projection.transformer()?;
        Ok(projection)
    }

    fn build(zone: u8, hemisphere: Hemisphere) -> Self {
        Self {
            zone,
            hemisphere,
            transformer: Arc::new(OnceLock::new()),
        }
    }

    /// Resolves a WGS84 / UTM EPSG code (326xx north, 327xx south).
    pub fn from_epsg(code: u32) -> Result<Self, CoordError> {
        match code {
            32601..=32660 => Self::new((code - 32600) as u8, Hemisphere::North),
            32701..=32760 => Self::new((code - 32700) as u8, Hemisphere::South),
            _ => Err(CoordError::ProjectionUnavailable(format!(
                "EPSG:{} is not a WGS84 UTM zone",
                code
            ))),
        }
    }

    /// UTM zone 17 north, which covers the Charlotte corridor.
    pub fn utm17n() -> Self {
        Self::build(17, Hemisphere::North)
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    pub fn central_meridian(&self) -> f64 {
        (self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }

    pub fn epsg(&self) -> u32 {
        match self.hemisphere {
            Hemisphere::North => 32600 + self.zone as u32,
            Hemisphere::South => 32700 + self.zone as u32,
        }
    }

    /// Short label such as `UTM17N`.
    pub fn label(&self) -> String {
        let suffix = match self.hemisphere {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        };
        format!("UTM{}{}", self.zone, suffix)
    }

    /// proj string of the zone, e.g. `+proj=utm +zone=17 +datum=WGS84 ...`.
    pub fn proj_string(&self) -> String {
        let south = match self.hemisphere {
            Hemisphere::North => "",
            Hemisphere::South => " +south",
        };
        format!(
            "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
            self.zone, south
        )
    }

    fn transformer(&self) -> Result<&UtmTransformer, CoordError> {
        self.transformer
            .get_or_init(|| {
                let geographic = Proj::from_proj_string(WGS84_PROJ).map_err(|e| {
                    CoordError::ProjectionUnavailable(format!("WGS84 definition: {:?}", e))
                })?;
                let utm = Proj::from_proj_string(&self.proj_string()).map_err(|e| {
                    CoordError::ProjectionUnavailable(format!("{}: {:?}", self.label(), e))
                })?;
                Ok(UtmTransformer { geographic, utm })
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Projects geodetic degrees to easting/northing meters.
    pub fn forward(&self, lat: f64, lon: f64) -> Result<ProjectedPoint, CoordError> {
        let t = self.transformer()?;
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&t.geographic, &t.utm, &mut point).map_err(|e| {
            CoordError::ProjectionUnavailable(format!(
                "{} cannot project ({}, {}): {:?}",
                self.label(),
                lat,
                lon,
                e
            ))
        })?;
        Ok(ProjectedPoint {
            easting: point.0,
            northing: point.1,
        })
    }

    /// Inverse of [`forward`](Self::forward), returning `(lat, lon)` in degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64), CoordError> {
        let t = self.transformer()?;
        let mut point = (easting, northing, 0.0);
        transform(&t.utm, &t.geographic, &mut point).map_err(|e| {
            CoordError::ProjectionUnavailable(format!(
                "{} cannot unproject ({}, {}): {:?}",
                self.label(),
                easting,
                northing,
                e
            ))
        })?;
        Ok((point.1.to_degrees(), point.0.to_degrees()))
    }
}

impl PartialEq for UtmProjection {
    fn eq(&self, other: &Self) -> bool {
        self.zone == other.zone && self.hemisphere == other.hemisphere
    }
}

impl fmt::Debug for UtmProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtmProjection")
            .field("zone", &self.zone)
            .field("hemisphere", &self.hemisphere)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for UtmProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg(), self.label())
    }
}
