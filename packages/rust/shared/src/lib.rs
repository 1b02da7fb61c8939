//! Shared types, error model, and configuration for scholardigest.
//!
//! This crate is the foundation depended on by all other scholardigest crates.
//! It provides:
//! - [`ScholarDigestError`] - the unified error type
//! - Domain types ([`SearchResult`], [`SearchResponse`], [`ScratchDocument`], [`RunId`])
//! - Configuration ([`AppConfig`], config loading, credential lookup)
//! - File naming for scratch artifacts and output emails

pub mod config;
pub mod error;
pub mod naming;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GenerationConfig, PathsConfig, PipelineConfig, SearchConfig, SweepMode,
    TopicsConfig, config_dir, config_file_path, init_config, init_config_at, load_config,
    load_config_from, resolve_api_key,
};
pub use error::{Result, ScholarDigestError};
pub use naming::{output_file_name, scratch_file_name};
pub use types::{
    ContentFormat, OutputDocument, Resource, RunId, ScratchDocument, SearchResponse, SearchResult,
};
