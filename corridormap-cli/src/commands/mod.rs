//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`run`] - Run the acquisition pipeline (all steps or a subset)
//! - [`steps`] - List registered steps
//! - [`validate`] - Check that the corridor center maps to the origin
//! - [`info`] - Corridor extent and tile counts

pub mod info;
pub mod run;
pub mod steps;
pub mod validate;
