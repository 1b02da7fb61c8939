//! Search-result processing: fetch → summarize → render → write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use scholardigest_fetcher::ContentFetcher;
use scholardigest_shared::{
    AppConfig, ContentFormat, OutputDocument, Result, ScholarDigestError, ScratchDocument,
    SearchResponse, SearchResult, SweepMode, output_file_name,
};

use crate::digest::RunReport;
use crate::generation::TextGenerator;
use crate::renderer::EmailRenderer;
use crate::summarizer::{ArticleMeta, Summarizer, SummaryOptions};

/// Declared resource format that triggers a document download.
const PDF_FORMAT: &str = "PDF";

/// Directories and sweep behavior for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sweep_mode: SweepMode,
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            scratch_dir: config.paths.scratch_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
            sweep_mode: config.pipeline.sweep_mode,
        }
    }
}

/// Counters for one or more processed search responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub results_processed: usize,
    pub scratch_written: usize,
    pub fetch_failures: usize,
    pub summaries_generated: usize,
    pub emails_written: usize,
    pub emails_skipped: usize,
    pub outputs: Vec<OutputDocument>,
}

impl ProcessReport {
    /// Fold `other` into `self`.
    pub fn absorb(&mut self, other: ProcessReport) {
        self.results_processed += other.results_processed;
        self.scratch_written += other.scratch_written;
        self.fetch_failures += other.fetch_failures;
        self.summaries_generated += other.summaries_generated;
        self.emails_written += other.emails_written;
        self.emails_skipped += other.emails_skipped;
        self.outputs.extend(other.outputs);
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each search result is processed.
    fn result_started(&self, title: &str, current: usize, total: usize);
    /// Called after an email is written.
    fn email_written(&self, output: &OutputDocument);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn result_started(&self, _title: &str, _current: usize, _total: usize) {}
    fn email_written(&self, _output: &OutputDocument) {}
    fn done(&self, _report: &RunReport) {}
}

/// Turns search responses into rendered email files.
pub struct Pipeline {
    options: PipelineOptions,
    fetcher: ContentFetcher,
    summarizer: Summarizer,
    renderer: EmailRenderer,
}

impl Pipeline {
    pub fn new(
        options: PipelineOptions,
        summarizer: Summarizer,
        renderer: EmailRenderer,
    ) -> Result<Self> {
        let fetcher = ContentFetcher::new(&options.scratch_dir)?;
        Ok(Self {
            options,
            fetcher,
            summarizer,
            renderer,
        })
    }

    /// Build a pipeline from config, sharing one generator between the
    /// summarizer and the renderer.
    pub fn from_config(config: &AppConfig, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let summarizer = Summarizer::new(
            generator.clone(),
            SummaryOptions {
                word_limit: config.pipeline.summary_word_limit,
            },
        );
        let renderer = EmailRenderer::new(generator, &config.paths.template_path);
        Self::new(PipelineOptions::from(config), summarizer, renderer)
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Create the scratch and output directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.options.scratch_dir, &self.options.output_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ScholarDigestError::io(dir, e))?;
        }
        Ok(())
    }

    /// Process every result of one search response in rank order.
    ///
    /// Fetch and render failures are logged and counted; summarization and
    /// output-write failures abort processing.
    #[instrument(skip_all, fields(results = response.results().len(), sweep = %self.options.sweep_mode))]
    pub async fn process_search_results(
        &self,
        response: &SearchResponse,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessReport> {
        self.ensure_dirs()?;

        let mut report = ProcessReport::default();
        let results = response.results();
        if results.is_empty() {
            info!("No results found.");
            return Ok(report);
        }

        let total = results.len();
        for (i, result) in results.iter().enumerate() {
            progress.result_started(&result.title, i + 1, total);
            info!("Processing: {}", result.title);
            report.results_processed += 1;

            let fetched = self.fetch_result(result, &mut report).await;
            let worklist = match self.options.sweep_mode {
                SweepMode::CurrentResult => fetched.into_iter().map(|doc| doc.path).collect(),
                SweepMode::FullSweep => self.sweep_scratch()?,
            };

            let meta = ArticleMeta::from(result);
            for path in &worklist {
                self.process_artifact(path, &meta, &mut report, progress)
                    .await?;
            }
        }

        Ok(report)
    }

    /// Download the landing page and any PDF resources of `result`.
    async fn fetch_result(
        &self,
        result: &SearchResult,
        report: &mut ProcessReport,
    ) -> Vec<ScratchDocument> {
        let mut fetched = Vec::new();

        if let Some(link) = result.link.as_deref() {
            match self.fetcher.fetch(link, ContentFormat::Html).await {
                Ok(doc) => fetched.push(doc),
                Err(e) => {
                    warn!(url = %link, error = %e, "Failed to download article");
                    report.fetch_failures += 1;
                }
            }
        }

        for resource in result.resources.iter().filter(|r| r.format == PDF_FORMAT) {
            match self
                .fetcher
                .fetch_declared(&resource.link, &resource.format)
                .await
            {
                Ok(doc) => fetched.push(doc),
                Err(e) => {
                    warn!(url = %resource.link, error = %e, "Failed to download resource");
                    report.fetch_failures += 1;
                }
            }
        }

        report.scratch_written += fetched.len();
        fetched
    }

    /// Every file currently in the scratch directory, sorted by name.
    fn sweep_scratch(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.options.scratch_dir;
        let entries = std::fs::read_dir(dir).map_err(|e| ScholarDigestError::io(dir, e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Summarize, render and write one scratch artifact.
    async fn process_artifact(
        &self,
        path: &Path,
        meta: &ArticleMeta<'_>,
        report: &mut ProcessReport,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !name.ends_with(".html") {
            info!("Skipping file: {name} (not an HTML file)");
            return Ok(());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ScholarDigestError::io(path, e))?;

        let summary = self.summarizer.summarize(&text, meta).await?;
        report.summaries_generated += 1;

        let Some(html) = self.renderer.render(&summary, meta).await else {
            warn!(title = %meta.title, "no email content, skipping output");
            report.emails_skipped += 1;
            return Ok(());
        };

        let output_path = self.options.output_dir.join(output_file_name(meta.title));
        std::fs::write(&output_path, html).map_err(|e| ScholarDigestError::io(&output_path, e))?;
        info!(path = %output_path.display(), "Email content written");

        let output = OutputDocument {
            path: output_path,
            title: meta.title.to_string(),
        };
        progress.email_written(&output);
        report.emails_written += 1;
        report.outputs.push(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingGenerator;
    use uuid::Uuid;

    struct Workspace {
        root: PathBuf,
        template: PathBuf,
    }

    impl Workspace {
        fn new(label: &str) -> Self {
            let root = std::env::temp_dir().join(format!("sd-{label}-{}", Uuid::now_v7()));
            std::fs::create_dir_all(&root).unwrap();
            let template = root.join("emailtemplate.txt");
            std::fs::write(&template, "<h1>{{title}}</h1><div>{{summary}}</div>").unwrap();
            Self { root, template }
        }

        fn options(&self, sweep_mode: SweepMode) -> PipelineOptions {
            PipelineOptions {
                scratch_dir: self.root.join("temp"),
                output_dir: self.root.join("emails"),
                sweep_mode,
            }
        }

        fn pipeline(&self, sweep_mode: SweepMode, generator: Arc<RecordingGenerator>) -> Pipeline {
            Pipeline::new(
                self.options(sweep_mode),
                Summarizer::new(generator.clone(), SummaryOptions::default()),
                EmailRenderer::new(generator, &self.template),
            )
            .unwrap()
        }

        fn files(&self, sub: &str) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(self.root.join(sub))
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .map(|e| e.file_name().to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default();
            names.sort();
            names
        }
    }

    impl Drop for Workspace {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn summary_prompts(generator: &RecordingGenerator) -> Vec<String> {
        generator
            .prompts()
            .into_iter()
            .filter(|p| p.starts_with("Create a"))
            .collect()
    }

    async fn mount_page(server: &wiremock::MockServer, path: &str, body: &str) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_single_result_end_to_end() {
        let server = wiremock::MockServer::start().await;
        let article = std::fs::read_to_string("../../../fixtures/html/article.html")
            .expect("read article fixture");
        mount_page(&server, "/a1", &article).await;
        wiremock::Mock::given(wiremock::matchers::path("/pdf/a1.pdf"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 binary".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "organic_results": [{
                "title": "Deep Learning Review",
                "link": format!("{}/a1", server.uri()),
                "snippet": "A survey.",
                "publication_info": {"summary": "Nature, 2024"},
                "resources": [
                    {"file_format": "PDF", "link": format!("{}/pdf/a1.pdf", server.uri())}
                ]
            }]
        }))
        .unwrap();

        let ws = Workspace::new("pipeline-e2e");
        let generator = Arc::new(RecordingGenerator::replying("<html>styled</html>"));
        let pipeline = ws.pipeline(SweepMode::CurrentResult, generator.clone());

        let report = pipeline
            .process_search_results(&response, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.results_processed, 1);
        assert_eq!(report.scratch_written, 2);
        assert_eq!(report.summaries_generated, 1);
        assert_eq!(report.emails_written, 1);
        assert_eq!(ws.files("emails"), vec!["Deep_Learning_Review_email.html"]);

        let scratch = ws.files("temp");
        assert_eq!(scratch.len(), 2);
        assert!(scratch.iter().any(|n| n.ends_with(".pdf")));

        let summaries = summary_prompts(&generator);
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].contains("Backpropagation at scale"));
        assert!(!summaries[0].contains("%PDF"));

        let written = std::fs::read_to_string(&report.outputs[0].path).unwrap();
        assert_eq!(written, "<html>styled</html>");
    }

    #[tokio::test]
    async fn test_empty_response_writes_nothing() {
        let ws = Workspace::new("pipeline-empty");
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let pipeline = ws.pipeline(SweepMode::CurrentResult, generator.clone());

        for response in [
            SearchResponse::default(),
            serde_json::from_str(r#"{"organic_results": []}"#).unwrap(),
        ] {
            let report = pipeline
                .process_search_results(&response, &SilentProgress)
                .await
                .unwrap();
            assert_eq!(report, ProcessReport::default());
        }

        assert!(ws.files("temp").is_empty());
        assert!(ws.files("emails").is_empty());
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_linkless_result_fetches_only_uppercase_pdf_resources() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .mount(&server)
            .await;

        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "organic_results": [{
                "title": "No Link",
                "resources": [
                    {"file_format": "pdf", "link": format!("{}/lower.pdf", server.uri())},
                    {"file_format": "HTML", "link": format!("{}/page.html", server.uri())},
                    {"file_format": "PDF", "link": format!("{}/upper.pdf", server.uri())}
                ]
            }]
        }))
        .unwrap();

        let ws = Workspace::new("pipeline-no-link");
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let pipeline = ws.pipeline(SweepMode::CurrentResult, generator.clone());

        let report = pipeline
            .process_search_results(&response, &SilentProgress)
            .await
            .unwrap();

        let requested: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(requested, vec!["/upper.pdf"]);
        assert_eq!(report.scratch_written, 1);
        assert_eq!(report.fetch_failures, 0);
        assert_eq!(report.summaries_generated, 0);
        assert!(generator.prompts().is_empty());
        assert!(ws.files("emails").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_counted_and_skipped() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/gone"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "organic_results": [{"title": "Missing Paper", "link": format!("{}/gone", server.uri())}]
        }))
        .unwrap();

        let ws = Workspace::new("pipeline-404");
        let generator = Arc::new(RecordingGenerator::replying("x"));
        let pipeline = ws.pipeline(SweepMode::CurrentResult, generator.clone());

        let report = pipeline
            .process_search_results(&response, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.emails_written, 0);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_render_failure_skips_output() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/a1", "<p>Alpha findings</p>").await;

        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "organic_results": [{"title": "Alpha", "link": format!("{}/a1", server.uri())}]
        }))
        .unwrap();

        let ws = Workspace::new("pipeline-no-template");
        std::fs::remove_file(&ws.template).unwrap();
        let generator = Arc::new(RecordingGenerator::replying("summary"));
        let pipeline = ws.pipeline(SweepMode::CurrentResult, generator);

        let report = pipeline
            .process_search_results(&response, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.summaries_generated, 1);
        assert_eq!(report.emails_skipped, 1);
        assert!(ws.files("emails").is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_propagates() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/a1", "<p>Alpha findings</p>").await;

        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "organic_results": [{"title": "Alpha", "link": format!("{}/a1", server.uri())}]
        }))
        .unwrap();

        let ws = Workspace::new("pipeline-gen-fail");
        let pipeline = ws.pipeline(
            SweepMode::CurrentResult,
            Arc::new(RecordingGenerator::failing()),
        );

        let err = pipeline
            .process_search_results(&response, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ScholarDigestError::Generation(_)));
    }

    async fn two_result_run(sweep_mode: SweepMode) -> (ProcessReport, Vec<String>) {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/a1", "<p>Alpha findings</p>").await;
        mount_page(&server, "/a2", "<p>Beta findings</p>").await;

        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "organic_results": [
                {"title": "Alpha", "link": format!("{}/a1", server.uri())},
                {"title": "Beta", "link": format!("{}/a2", server.uri())}
            ]
        }))
        .unwrap();

        let ws = Workspace::new(&format!("pipeline-{sweep_mode}"));
        let generator = Arc::new(RecordingGenerator::replying("summary"));
        let pipeline = ws.pipeline(sweep_mode, generator.clone());

        let report = pipeline
            .process_search_results(&response, &SilentProgress)
            .await
            .unwrap();
        (report, summary_prompts(&generator))
    }

    #[tokio::test]
    async fn test_current_result_summarizes_only_own_artifacts() {
        let (report, prompts) = two_result_run(SweepMode::CurrentResult).await;

        assert_eq!(report.summaries_generated, 2);
        assert_eq!(report.emails_written, 2);
        assert!(prompts[0].contains("Alpha findings") && !prompts[0].contains("Beta"));
        assert!(prompts[1].contains("Beta findings") && !prompts[1].contains("Alpha"));
    }

    #[tokio::test]
    async fn test_full_sweep_reconsumes_earlier_artifacts() {
        let (report, prompts) = two_result_run(SweepMode::FullSweep).await;

        assert_eq!(report.summaries_generated, 3);
        assert_eq!(report.emails_written, 3);
        assert!(prompts[0].contains("Alpha findings"));
        assert!(prompts[1].contains("Alpha findings"));
        assert!(prompts[2].contains("Beta findings"));
    }

    #[test]
    fn report_absorb_adds_counts() {
        let mut total = ProcessReport {
            results_processed: 1,
            emails_written: 1,
            ..ProcessReport::default()
        };
        total.absorb(ProcessReport {
            results_processed: 2,
            fetch_failures: 1,
            outputs: vec![OutputDocument {
                path: PathBuf::from("emails/x_email.html"),
                title: "x".into(),
            }],
            ..ProcessReport::default()
        });

        assert_eq!(total.results_processed, 3);
        assert_eq!(total.fetch_failures, 1);
        assert_eq!(total.emails_written, 1);
        assert_eq!(total.outputs.len(), 1);
    }
}
