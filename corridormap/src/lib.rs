//! CorridorMap - map data acquisition for the Charlotte I-485 corridor
//!
//! Fetches map tiles, elevation products and highway geometry for a fixed
//! corridor and converts vector data into a simulation engine's local frame:
//! X north, Y east, Z up, in centimeters from the corridor center.
//!
//! - [`coord`]: WGS84 / UTM / local conversions and slippy-map tile math
//! - [`download`]: concurrent, rate-limited, resumable tile downloader
//! - [`pipeline`]: step registry and orchestrator
//! - [`vector`]: GeoJSON re-projection
//! - [`acquisition`]: the concrete corridor steps
//! - [`config`]: defaults and INI overlay
//! - [`logging`]: tracing subscriber setup

pub mod acquisition;
pub mod config;
pub mod coord;
pub mod download;
pub mod logging;
pub mod pipeline;
pub mod vector;
