//! Core digest logic for scholardigest.
//!
//! This crate ties together topic expansion, search, fetching, summarization
//! and email rendering into the end-to-end [`run_digest`] workflow.

pub mod digest;
pub mod expander;
pub mod generation;
pub mod pipeline;
pub mod renderer;
pub mod summarizer;

#[cfg(test)]
pub(crate) mod testing;

pub use digest::{DigestRun, RunReport, run_digest};
pub use expander::TermExpander;
pub use generation::{GeminiClient, TextGenerator};
pub use pipeline::{Pipeline, PipelineOptions, ProcessReport, ProgressReporter, SilentProgress};
pub use renderer::EmailRenderer;
pub use summarizer::{ArticleMeta, Summarizer, SummaryOptions};
