//! CLI subcommand implementations.

pub mod chart;
pub mod compare;
pub mod filters;
pub mod import;
pub mod logs;
pub mod timeline;
pub mod treatments;
pub mod util;
