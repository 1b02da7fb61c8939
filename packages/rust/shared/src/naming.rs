//! File naming for scratch artifacts and rendered emails.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

use crate::types::ContentFormat;

/// Longest component we emit, in characters, before the suffix is appended.
const MAX_COMPONENT_CHARS: usize = 150;

/// Hex characters of the URL digest appended to scratch names.
const URL_DIGEST_LEN: usize = 12;

/// Replace characters that are unsafe in a single path component with `_`
/// and cap the length.
fn sanitize_component(raw: &str) -> String {
    static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("valid regex")
    });

    let cleaned = UNSAFE_RE.replace_all(raw, "_");
    cleaned.chars().take(MAX_COMPONENT_CHARS).collect()
}

/// Scratch file name for a fetched URL: `<last-segment>-<digest>.<ext>`.
///
/// The digest keeps names unique across distinct URLs that share a final
/// path segment.
pub fn scratch_file_name(url: &str, format: ContentFormat) -> String {
    let segment = last_path_segment(url);
    let stem = if segment.is_empty() {
        "index".to_string()
    } else {
        sanitize_component(&segment)
    };

    let digest = {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("{:x}", hasher.finalize())
    };

    format!(
        "{stem}-{}.{}",
        &digest[..URL_DIGEST_LEN],
        format.extension()
    )
}

/// Output email name: spaces become underscores, suffixed `_email.html`.
pub fn output_file_name(title: &str) -> String {
    let underscored = title.replace(' ', "_");
    format!("{}_email.html", sanitize_component(&underscored))
}

fn last_path_segment(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("")
            .to_string(),
        Err(_) => url.rsplit('/').next().unwrap_or("").to_string(),
    }
}
