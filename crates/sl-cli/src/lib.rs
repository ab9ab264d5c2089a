//! Symptom log analytics CLI library.
//!
//! This crate provides the CLI interface for the analytics engine.

mod cli;
pub mod commands;
mod config;
pub mod fetch;

pub use cli::{Cli, Commands, TreatmentsAction};
pub use config::{Config, TimelineConfig};
