//! CLI commands module for herald.

pub mod app;
pub mod commands;

pub use app::{Cli, Commands, ConfigAction};
