//! Topic-level driver: expand topics, search each term, process results.

use std::time::{Duration, Instant};

use chrono::Datelike;
use tracing::{info, instrument, warn};

use scholardigest_search::{SearchProvider, SearchRequest};
use scholardigest_shared::{AppConfig, Result, RunId, SearchConfig};

use crate::expander::TermExpander;
use crate::pipeline::{Pipeline, ProcessReport, ProgressReporter};

/// Inputs for one digest run.
#[derive(Debug, Clone)]
pub struct DigestRun {
    /// Topics in the order they are searched.
    pub topics: Vec<String>,
    pub search: SearchConfig,
    /// Remove the scratch directory after the last topic.
    pub cleanup_scratch: bool,
}

impl DigestRun {
    /// A run over `topics` with the rest taken from config.
    pub fn from_config(config: &AppConfig, topics: Vec<String>) -> Self {
        Self {
            topics,
            search: config.search.clone(),
            cleanup_scratch: config.pipeline.cleanup_scratch,
        }
    }
}

/// Outcome of a completed digest run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub terms_searched: usize,
    pub totals: ProcessReport,
    pub elapsed: Duration,
}

/// Run the digest: every topic is expanded, every term searched, and every
/// response pushed through the pipeline in order.
///
/// Search failures end the run.
#[instrument(skip_all, fields(topics = run.topics.len()))]
pub async fn run_digest(
    run: &DigestRun,
    search: &dyn SearchProvider,
    pipeline: &Pipeline,
    expander: &TermExpander,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    info!(%run_id, "starting digest run");

    let cutoff = run
        .search
        .recency_filter
        .then(|| chrono::Local::now().year());

    let mut totals = ProcessReport::default();
    let mut terms_searched = 0;

    for topic in &run.topics {
        let terms = expander.expand(topic);
        info!(%topic, terms = terms.len(), "expanded topic");

        for term in &terms {
            progress.phase(&format!("Searching: {term}"));
            let request = SearchRequest::from_config(term, &run.search, cutoff);
            let response = search.search(&request).await?;
            terms_searched += 1;

            let report = pipeline.process_search_results(&response, progress).await?;
            totals.absorb(report);
        }
    }

    if run.cleanup_scratch {
        let scratch = &pipeline.options().scratch_dir;
        if let Err(e) = std::fs::remove_dir_all(scratch) {
            warn!(path = %scratch.display(), error = %e, "failed to remove scratch directory");
        }
    }

    let report = RunReport {
        run_id,
        terms_searched,
        totals,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        run_id = %report.run_id,
        terms = report.terms_searched,
        emails = report.totals.emails_written,
        elapsed_ms = report.elapsed.as_millis(),
        "digest run complete"
    );

    Ok(report)
}
