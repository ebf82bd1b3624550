//! Overlays INI values onto [`CorridorConfig::default`].
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::settings::{CorridorConfig, ZoomProfile};
use super::ConfigError;
use crate::coord::{GeoBounds, UtmProjection, MAX_ZOOM};

const MILLIS_REASON: &str = "must be a non-negative integer (milliseconds)";

pub(super) fn parse_ini(ini: &Ini) -> Result<CorridorConfig, ConfigError> {
    let mut config = CorridorConfig::default();

    // [bounds]
    if let Some(section) = ini.section(Some("bounds")) {
        let current = &config.bounds;
        let (center_lat, center_lon) = current.center();
        let name = section
            .get("name")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| current.name().to_string());
        let north = parse_or(section, "bounds", "north", current.north())?;
        let south = parse_or(section, "bounds", "south", current.south())?;
        let east = parse_or(section, "bounds", "east", current.east())?;
        let west = parse_or(section, "bounds", "west", current.west())?;
        let center_lat = parse_or(section, "bounds", "center_lat", center_lat)?;
        let center_lon = parse_or(section, "bounds", "center_lon", center_lon)?;

        config.bounds = GeoBounds::new(name, north, south, east, west, center_lat, center_lon)
            .map_err(|e| ConfigError::InvalidValue {
                section: "bounds".to_string(),
                key: "*".to_string(),
                value: format!("N {} S {} E {} W {}", north, south, east, west),
                reason: e.to_string(),
            })?;
    }

    // [zoom]
    if let Some(section) = ini.section(Some("zoom")) {
        if let Some(v) = section.get("profile") {
            config.zoom.profile = ZoomProfile::from_str(v).map_err(|_| ConfigError::InvalidValue {
                section: "zoom".to_string(),
                key: "profile".to_string(),
                value: v.to_string(),
                reason: "must be 'development' or 'production'".to_string(),
            })?;
        }
        if let Some(v) = section.get("development") {
            config.zoom.development = parse_zoom_list("development", v)?;
        }
        if let Some(v) = section.get("production") {
            config.zoom.production = parse_zoom_list("production", v)?;
        }
    }

    // [tiles]
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    section: "tiles".to_string(),
                    key: "base_url".to_string(),
                    value: v.to_string(),
                    reason: "must be an http(s) URL".to_string(),
                });
            }
            config.tiles.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = section.get("rate_limit_delay_ms") {
            let ms = parse_value(v, "tiles", "rate_limit_delay_ms", MILLIS_REASON)?;
            config.tiles.rate_limit_delay = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("workers") {
            config.tiles.workers = parse_positive(v, "tiles", "workers")?;
        }
        if let Some(v) = section.get("timeout") {
            config.tiles.timeout =
                Duration::from_secs(parse_positive(v, "tiles", "timeout")? as u64);
        }
        if let Some(v) = section.get("progress_interval") {
            config.tiles.progress_interval = parse_positive(v, "tiles", "progress_interval")?;
        }
        if let Some(v) = section.get("max_attempts") {
            config.tiles.max_attempts = parse_positive(v, "tiles", "max_attempts")? as u32;
        }
    }

    // [projection]
    if let Some(section) = ini.section(Some("projection")) {
        if let Some(v) = section.get("epsg") {
            let code: u32 = parse_value(v, "projection", "epsg", "must be an EPSG code")?;
            UtmProjection::from_epsg(code).map_err(|e| ConfigError::InvalidValue {
                section: "projection".to_string(),
                key: "epsg".to_string(),
                value: v.to_string(),
                reason: e.to_string(),
            })?;
            config.epsg = code;
        }
    }

    // [dem]
    if let Some(section) = ini.section(Some("dem")) {
        if let Some(v) = section.get("datasets") {
            let datasets: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if datasets.is_empty() {
                return Err(ConfigError::InvalidValue {
                    section: "dem".to_string(),
                    key: "datasets".to_string(),
                    value: v.to_string(),
                    reason: "expected one or more dataset names separated by ','".to_string(),
                });
            }
            config.dem.datasets = datasets;
        }
        if let Some(v) = section.get("query_delay_ms") {
            let ms = parse_value(v, "dem", "query_delay_ms", MILLIS_REASON)?;
            config.dem.query_delay = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("timeout") {
            config.dem.timeout = Duration::from_secs(parse_positive(v, "dem", "timeout")? as u64);
        }
    }

    // [heightmap]
    if let Some(section) = ini.section(Some("heightmap")) {
        if let Some(v) = section.get("target_size") {
            let v = v.trim();
            config.heightmap.target_size = if v.is_empty() || v.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(parse_positive(v, "heightmap", "target_size")? as u32)
            };
        }
    }

    // [vectors]
    if let Some(section) = ini.section(Some("vectors")) {
        if let Some(v) = section.get("default_elevation") {
            config.vectors.default_elevation =
                parse_value(v, "vectors", "default_elevation", "must be a number (meters)")?;
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    v: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigError> {
    v.trim().parse().map_err(|_| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: v.to_string(),
        reason: reason.to_string(),
    })
}

fn parse_or(section: &Properties, name: &str, key: &str, default: f64) -> Result<f64, ConfigError> {
    match section.get(key) {
        Some(v) => parse_value(v, name, key, "must be a number (decimal degrees)"),
        None => Ok(default),
    }
}

fn parse_positive(v: &str, section: &str, key: &str) -> Result<usize, ConfigError> {
    match v.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: v.to_string(),
            reason: "must be a positive integer".to_string(),
        }),
    }
}

/// `"15, 16"` to `[15, 16]`.
fn parse_zoom_list(key: &str, v: &str) -> Result<Vec<u8>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        section: "zoom".to_string(),
        key: key.to_string(),
        value: v.to_string(),
        reason: format!("expected comma-separated zoom levels between 0 and {}", MAX_ZOOM),
    };

    let levels = v
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>().ok().filter(|z| *z <= MAX_ZOOM))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;

    if levels.is_empty() {
        return Err(invalid());
    }
    Ok(levels)
}
