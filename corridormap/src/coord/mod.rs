//! Coordinate conversion module
//!
//! Provides the corridor coordinate engine (WGS84 → UTM → local centimeters)
//! and the Web Mercator slippy-map tile math used by the tile downloader.

mod engine;
mod projection;
mod types;

pub use engine::{BoundsInfo, CoordinateEngine};
pub use projection::{Hemisphere, UtmProjection};
pub use types::{
    CoordError, GeoBounds, LocalPoint, ProjectedPoint, TileCoord, TileRange, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, ORIGIN_TOLERANCE_CM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to slippy-map tile indices `(x, y)`.
///
/// Both indices are clamped into `[0, 2^zoom - 1]`. Latitude is validated,
/// never clamped.
///
/// # Errors
///
/// * [`CoordError::InvalidLatitude`] if `|lat| > 85.0511`
/// * [`CoordError::InvalidLongitude`] if `lon` is not finite
/// * [`CoordError::InvalidZoom`] if `zoom > 22`
#[inline]
pub fn tile_index(lat: f64, lon: f64, zoom: u8) -> Result<(u32, u32), CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lon.is_finite() {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    // Fractions are zoom-independent so each level is an exact power-of-two scaling
    let x_frac = (lon + 180.0) / 360.0;
    let lat_rad = lat * PI / 180.0;
    let y_frac = (1.0 - lat_rad.tan().asinh() / PI) / 2.0;

    let x = (x_frac * n).floor().clamp(0.0, max_index) as u32;
    let y = (y_frac * n).floor().clamp(0.0, max_index) as u32;

    Ok((x, y))
}

/// Returns the `(lat, lon)` of a tile's center point.
#[inline]
pub fn tile_center(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);

    let lon = (x as f64 + 0.5) / n * 360.0 - 180.0;

    let y_frac = (y as f64 + 0.5) / n;
    let lat_rad = (PI * (1.0 - 2.0 * y_frac)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Computes the inclusive tile range covering `bounds` at `zoom`.
///
/// Tile Y grows southward, so the south-west corner supplies `min_x`/`max_y`
/// and the north-east corner supplies `max_x`/`min_y`.
pub fn tile_bounds(bounds: &GeoBounds, zoom: u8) -> Result<TileRange, CoordError> {
    let (min_x, max_y) = tile_index(bounds.south(), bounds.west(), zoom)?;
    let (max_x, min_y) = tile_index(bounds.north(), bounds.east(), zoom)?;

    Ok(TileRange {
        zoom,
        min_x,
        min_y,
        max_x,
        max_y,
    })
}

/// Number of tiles covering `bounds` at `zoom`.
pub fn count_tiles(bounds: &GeoBounds, zoom: u8) -> Result<u64, CoordError> {
    Ok(tile_bounds(bounds, zoom)?.count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let (x, y) = tile_index(40.7128, -74.0060, 16).unwrap();
        assert_eq!(x, 19295);
        assert_eq!(y, 24640);
    }

    #[test]
    fn test_origin_tile_at_zoom_zero() {
        assert_eq!(tile_index(0.0, 0.0, 0).unwrap(), (0, 0));
        assert_eq!(tile_index(85.0, 179.9, 0).unwrap(), (0, 0));
    }

    #[test]
    fn test_invalid_latitude_is_not_clamped() {
        assert!(matches!(
            tile_index(85.06, 0.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            tile_index(-90.0, 0.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_invalid_zoom() {
        assert_eq!(tile_index(35.0, -80.0, 23), Err(CoordError::InvalidZoom(23)));
    }

    #[test]
    fn test_antimeridian_is_clamped() {
        let (x, _) = tile_index(0.0, 180.0, 4).unwrap();
        assert_eq!(x, 15);
        let (x, _) = tile_index(0.0, 200.0, 4).unwrap();
        assert_eq!(x, 15);
        let (x, _) = tile_index(0.0, -200.0, 4).unwrap();
        assert_eq!(x, 0);
    }

    #[test]
    fn test_tile_center_is_not_corner() {
        let (lat, lon) = tile_center(0, 0, 1);
        assert!((lon + 90.0).abs() < 1e-9);
        assert!(lat > 0.0 && lat < 85.0511);

        let (lat, lon) = tile_center(512, 512, 10);
        assert!(lat < 0.0 && lat > -0.36);
        assert!(lon > 0.0 && lon < 0.36);
    }

    #[test]
    fn test_charlotte_tile_bounds_not_inverted() {
        let bounds = GeoBounds::charlotte();
        for zoom in [12, 14, 15, 16, 17] {
            let range = tile_bounds(&bounds, zoom).unwrap();
            assert!(range.min_x < range.max_x, "zoom {}: {:?}", zoom, range);
            assert!(range.min_y < range.max_y, "zoom {}: {:?}", zoom, range);
            assert_eq!(
                range.count(),
                (range.max_x - range.min_x + 1) as u64 * (range.max_y - range.min_y + 1) as u64
            );
            assert_eq!(count_tiles(&bounds, zoom).unwrap(), range.count());
        }
    }

    #[test]
    fn test_charlotte_zoom_15_range() {
        let range = tile_bounds(&GeoBounds::charlotte(), 15).unwrap();
        // 0.35 degrees of longitude and 0.29 of latitude both span about 32 tiles
        assert!((31..=34).contains(&range.width()), "{:?}", range);
        assert!((32..=35).contains(&range.height()), "{:?}", range);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_indices_in_range(
                lat in -85.05..85.05_f64,
                lon in -180.0..=180.0_f64,
                zoom in 0u8..=22
            ) {
                let (x, y) = tile_index(lat, lon, zoom)?;
                let max_tile = 1u64 << zoom;
                prop_assert!((x as u64) < max_tile);
                prop_assert!((y as u64) < max_tile);
            }

            #[test]
            fn test_monotonic_refinement(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..22
            ) {
                let (x0, y0) = tile_index(lat, lon, zoom)?;
                let (x1, y1) = tile_index(lat, lon, zoom + 1)?;
                prop_assert!(x1 == 2 * x0 || x1 == 2 * x0 + 1, "x {} -> {}", x0, x1);
                prop_assert!(y1 == 2 * y0 || y1 == 2 * y0 + 1, "y {} -> {}", y0, y1);
            }

            #[test]
            fn test_center_lies_inside_tile(
                x_raw in 0u32..65536,
                y_raw in 0u32..65536,
                zoom in 0u8..=16
            ) {
                let n = 1u32 << zoom;
                let x = x_raw % n;
                let y = y_raw % n;
                let (lat, lon) = tile_center(x, y, zoom);
                prop_assert_eq!(tile_index(lat, lon, zoom)?, (x, y));
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lon1 in -180.0..-90.0_f64,
                lon2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                let (x1, _) = tile_index(lat, lon1, zoom)?;
                let (x2, _) = tile_index(lat, lon2, zoom)?;
                prop_assert!(x1 < x2);
            }
        }
    }
}
