//! Core domain types for scholardigest runs.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScholarDigestError};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one digest run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Search provider records
// ---------------------------------------------------------------------------

/// A downloadable resource attached to a search result (e.g. a PDF mirror).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Declared format as reported by the provider (`"PDF"`, `"HTML"`, ...).
    #[serde(rename = "file_format", default)]
    pub format: String,
    /// Resource URL.
    #[serde(default)]
    pub link: String,
}

/// One ranked entry of a scholarly search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    /// Article landing page. `None` when the provider omitted it.
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: String,
    /// Flattened from the provider's `publication_info.summary`.
    #[serde(default, deserialize_with = "publication_summary")]
    pub publication_info: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl SearchResult {
    /// The landing-page link, or an empty string when absent.
    pub fn link_or_empty(&self) -> &str {
        self.link.as_deref().unwrap_or("")
    }
}

fn publication_summary<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct PublicationInfo {
        #[serde(default)]
        summary: String,
    }

    Ok(Option::<PublicationInfo>::deserialize(deserializer)?
        .map(|info| info.summary)
        .unwrap_or_default())
}

/// Top-level search provider response. Only `organic_results` is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic_results: Option<Vec<SearchResult>>,
}

impl SearchResponse {
    /// Results in rank order; empty when the key was absent.
    pub fn results(&self) -> &[SearchResult] {
        self.organic_results.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.results().is_empty()
    }
}

// ---------------------------------------------------------------------------
// ContentFormat
// ---------------------------------------------------------------------------

/// How a fetched body is persisted to scratch storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    /// Text extracted from structural HTML tags.
    Html,
    /// Raw binary body (PDF).
    Document,
}

impl ContentFormat {
    /// File extension used for scratch artifacts of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Document => "pdf",
        }
    }
}

impl FromStr for ContentFormat {
    type Err = ScholarDigestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" | "document" => Ok(Self::Document),
            _ => Err(ScholarDigestError::unsupported_format(s)),
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A fetched artifact in the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDocument {
    pub path: PathBuf,
    pub source_url: String,
    pub format: ContentFormat,
}

impl ScratchDocument {
    /// File name within the scratch directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A rendered email written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    pub path: PathBuf,
    /// Title of the search result the email was rendered for.
    pub title: String,
}
