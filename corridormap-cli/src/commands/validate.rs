//! Validate command - check the coordinate origin.

use crate::error::CliError;
use crate::runner::{CliRunner, CommonArgs};

/// Run the validate command.
pub fn run(common: CommonArgs) -> Result<(), CliError> {
    let runner = CliRunner::without_logging(&common)?;
    let engine = runner.engine()?;

    let (lat, lon) = engine.bounds().center();
    let local = engine.to_local(lat, lon, 0.0)?;

    println!("Corridor:    {}", engine.bounds().name());
    println!("Projection:  {}", engine.projection().label());
    println!("Center:      {:.6}, {:.6}", lat, lon);
    println!(
        "Local:       X={:.3} Y={:.3} Z={:.3} cm",
        local.x, local.y, local.z
    );

    if engine.validate_origin() {
        println!("Origin OK");
        Ok(())
    } else {
        Err(CliError::OriginInvalid)
    }
}
