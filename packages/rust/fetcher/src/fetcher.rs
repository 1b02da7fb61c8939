//! Single-URL content fetcher backed by a scratch directory.
//!
//! Every successful fetch writes exactly one file into the scratch directory,
//! named by [`scratch_file_name`]. Failures write nothing and are returned to
//! the caller, which decides whether to continue.

use std::path::PathBuf;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, info, instrument, warn};
use url::Url;

use scholardigest_shared::{
    ContentFormat, Result, ScholarDigestError, ScratchDocument, scratch_file_name,
};

use crate::extract::extract_text;

/// Browser User-Agent pool; one is picked at random per request so
/// publishers that block non-browser clients still serve the page.
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.110 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.110 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.110 Safari/537.36",
];

/// Downloads articles and resources into a scratch directory.
pub struct ContentFetcher {
    client: Client,
    scratch_dir: PathBuf,
}

impl ContentFetcher {
    /// Create a fetcher writing into `scratch_dir` (created lazily).
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ScholarDigestError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            scratch_dir: scratch_dir.into(),
        })
    }

    /// Fetch `url` using a format string as declared by the search provider.
    ///
    /// Unsupported formats are rejected before any network call.
    pub async fn fetch_declared(&self, url: &str, declared: &str) -> Result<ScratchDocument> {
        let format = match declared.parse::<ContentFormat>() {
            Ok(format) => format,
            Err(e) => {
                warn!(%url, format = declared, "Unsupported file format");
                return Err(e);
            }
        };

        self.fetch(url, format).await
    }

    /// Fetch `url` and persist it as `format`.
    ///
    /// `Html` bodies are reduced to structural text; `Document` bodies are
    /// written byte-for-byte.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str, format: ContentFormat) -> Result<ScratchDocument> {
        let parsed = Url::parse(url)
            .map_err(|e| ScholarDigestError::validation(format!("invalid URL '{url}': {e}")))?;

        let user_agent = pick_user_agent();
        debug!(%url, user_agent, "fetching");

        let response = self
            .client
            .get(parsed.as_str())
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| ScholarDigestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScholarDigestError::Network(format!("{url}: HTTP {status}")));
        }

        std::fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| ScholarDigestError::io(&self.scratch_dir, e))?;

        let path = self.scratch_dir.join(scratch_file_name(url, format));

        match format {
            ContentFormat::Html => {
                let body = response.text().await.map_err(|e| {
                    ScholarDigestError::Network(format!("{url}: body read failed: {e}"))
                })?;
                let text = extract_text(&body);
                std::fs::write(&path, text).map_err(|e| ScholarDigestError::io(&path, e))?;
            }
            ContentFormat::Document => {
                let bytes = response.bytes().await.map_err(|e| {
                    ScholarDigestError::Network(format!("{url}: body read failed: {e}"))
                })?;
                std::fs::write(&path, &bytes).map_err(|e| ScholarDigestError::io(&path, e))?;
            }
        }

        info!(%url, path = %path.display(), "Downloaded {format} file to scratch");

        Ok(ScratchDocument {
            path,
            source_url: url.to_string(),
            format,
        })
    }
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[cfg(test)]
mod fetcher_tests {
    use super::*;
    use std::path::Path;
    use uuid::Uuid;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sd-{label}-{}", Uuid::now_v7()))
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => vec![],
        }
    }

    #[test]
    fn user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&pick_user_agent()));
        }
    }

    #[tokio::test]
    async fn test_html_fetch_writes_extracted_text() {
        let server = wiremock::MockServer::start().await;

        let page = r#"<html><head><script>track()</script></head><body>
            <h1>Deep Learning Review</h1>
            <p>Representation learning.</p>
        </body></html>"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/a1"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let dir = scratch_dir("fetch-html");
        let fetcher = ContentFetcher::new(&dir).unwrap();
        let url = format!("{}/a1", server.uri());
        let doc = fetcher.fetch(&url, ContentFormat::Html).await.unwrap();

        assert_eq!(doc.format, ContentFormat::Html);
        assert!(doc.file_name().starts_with("a1-"));
        assert!(doc.file_name().ends_with(".html"));
        assert_eq!(doc.source_url, url);

        let written = std::fs::read_to_string(&doc.path).unwrap();
        assert_eq!(written, "Deep Learning Review\nRepresentation learning.");
        assert_eq!(files_in(&dir).len(), 1);

        let received = server.received_requests().await.unwrap();
        let ua = received[0]
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(USER_AGENTS.contains(&ua.as_str()));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_document_fetch_writes_raw_bytes() {
        let server = wiremock::MockServer::start().await;

        let mut body = b"%PDF-1.4\n<p>not extracted</p>\n".to_vec();
        body.extend_from_slice(&[0xff, 0xfe, 0x00, 0x42]);

        wiremock::Mock::given(wiremock::matchers::path("/pdf/a1.pdf"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = scratch_dir("fetch-pdf");
        let fetcher = ContentFetcher::new(&dir).unwrap();
        let doc = fetcher
            .fetch(&format!("{}/pdf/a1.pdf", server.uri()), ContentFormat::Document)
            .await
            .unwrap();

        assert!(doc.file_name().ends_with(".pdf"));
        assert_eq!(std::fs::read(&doc.path).unwrap(), body);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_http_error_writes_nothing() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/gone"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = scratch_dir("fetch-404");
        let fetcher = ContentFetcher::new(&dir).unwrap();
        let err = fetcher
            .fetch(&format!("{}/gone", server.uri()), ContentFormat::Html)
            .await
            .unwrap_err();

        assert!(matches!(err, ScholarDigestError::Network(_)));
        assert!(err.to_string().contains("404"));
        assert!(files_in(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_url_writes_nothing() {
        // Bind then drop a listener so nothing is accepting on the port.
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let dir = scratch_dir("fetch-unreachable");
        let fetcher = ContentFetcher::new(&dir).unwrap();
        let result = fetcher
            .fetch(&format!("{uri}/paper"), ContentFormat::Html)
            .await;

        assert!(matches!(result, Err(ScholarDigestError::Network(_))));
        assert!(files_in(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_format_skips_network() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = scratch_dir("fetch-unsupported");
        let fetcher = ContentFetcher::new(&dir).unwrap();
        let err = fetcher
            .fetch_declared(&format!("{}/paper.docx", server.uri()), "docx")
            .await
            .unwrap_err();

        assert!(matches!(err, ScholarDigestError::UnsupportedFormat { .. }));
        assert!(files_in(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let dir = scratch_dir("fetch-invalid");
        let fetcher = ContentFetcher::new(&dir).unwrap();
        let result = fetcher.fetch("not a url", ContentFormat::Html).await;

        assert!(matches!(result, Err(ScholarDigestError::Validation { .. })));
        assert!(files_in(&dir).is_empty());
    }
}
