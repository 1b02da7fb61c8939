//! Article retrieval and text extraction.
//!
//! This crate provides:
//! - [`ContentFetcher`] - downloads a URL and persists it to scratch storage
//! - [`extract_text`] - structural-tag text extraction used for HTML pages

pub mod extract;
pub mod fetcher;

pub use extract::extract_text;
pub use fetcher::{ContentFetcher, USER_AGENTS};
