//! Info command - corridor extent and tile counts.

use corridormap::coord::count_tiles;
use serde_json::json;

use crate::error::CliError;
use crate::runner::{parse_zoom_list, CliRunner, CommonArgs};

/// Run the info command.
pub fn run(common: CommonArgs, zoom: Option<String>, json: bool) -> Result<(), CliError> {
    let mut runner = CliRunner::without_logging(&common)?;
    if let Some(zoom) = &zoom {
        runner.config_mut().set_zoom_levels(parse_zoom_list(zoom)?);
    }

    let engine = runner.engine()?;
    let bounds = engine.bounds();
    let info = engine.bounds_info()?;

    let mut counts = Vec::new();
    for &level in runner.config().zoom_levels() {
        counts.push((level, count_tiles(bounds, level)?));
    }
    let total: u64 = counts.iter().map(|(_, n)| n).sum();

    if json {
        let tiles: Vec<_> = counts
            .iter()
            .map(|(zoom, count)| json!({ "zoom": zoom, "tiles": count }))
            .collect();
        let report = json!({ "bounds": info, "tiles": tiles, "total_tiles": total });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Corridor:    {}", info.name);
    println!("Projection:  {} (EPSG:{})", info.projection, info.epsg);
    println!("Center:      {:.6}, {:.6}", info.center_lat, info.center_lon);
    println!(
        "Center UTM:  E={:.2} N={:.2}",
        info.center_easting, info.center_northing
    );
    println!(
        "Extent:      {:.2} km x {:.2} km ({:.1} km²)",
        info.width_m / 1000.0,
        info.height_m / 1000.0,
        info.area_km2
    );
    println!();
    println!("Tiles:");
    for (level, count) in &counts {
        println!("  zoom {:>2}: {:>8}", level, count);
    }
    println!("  total:   {:>8}", total);
    Ok(())
}
