//! CLI command handlers

pub mod completions;
pub mod config;
pub mod plan;
pub mod simulate;
pub mod validate;
