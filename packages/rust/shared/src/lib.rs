//! Shared types, error model, and configuration for ReviewCrew.
//!
//! This crate is the foundation depended on by all other ReviewCrew crates.
//! It provides:
//! - [`ReviewCrewError`] — the unified error type
//! - Domain types ([`Record`], [`Table`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OutputsConfig, RunConfig, RunSection, ScrapeConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_search_keys,
};
pub use error::{Result, ReviewCrewError};
pub use types::{Record, RunId, Table, cell_text};
