//! Article summarization.

use std::sync::Arc;

use tracing::{debug, instrument};

use scholardigest_shared::{Result, SearchResult};

use crate::generation::TextGenerator;

/// Default word budget requested for each summary.
pub const DEFAULT_WORD_LIMIT: u32 = 400;

/// Borrowed view of the search-result fields echoed into summaries and emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleMeta<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub snippet: &'a str,
    pub publication_info: &'a str,
}

impl<'a> From<&'a SearchResult> for ArticleMeta<'a> {
    fn from(result: &'a SearchResult) -> Self {
        Self {
            title: &result.title,
            link: result.link_or_empty(),
            snippet: &result.snippet,
            publication_info: &result.publication_info,
        }
    }
}

/// Summary settings.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Word budget stated in the prompt. Not enforced on the reply.
    pub word_limit: u32,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            word_limit: DEFAULT_WORD_LIMIT,
        }
    }
}

/// Produces bounded-length summaries with a source metadata footer.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    options: SummaryOptions,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, options: SummaryOptions) -> Self {
        Self { generator, options }
    }

    /// Summarize `text` and append the metadata footer.
    ///
    /// Generator failures propagate unchanged.
    #[instrument(skip_all, fields(title = %meta.title, text_len = text.len()))]
    pub async fn summarize(&self, text: &str, meta: &ArticleMeta<'_>) -> Result<String> {
        let prompt = summary_prompt(text, self.options.word_limit);
        let mut summary = self.generator.generate(&prompt).await?;
        debug!(summary_len = summary.len(), "summary generated");

        summary.push_str(&metadata_footer(meta));
        Ok(summary)
    }
}

/// Prompt asking for a `word_limit`-word structured summary of `text`.
pub fn summary_prompt(text: &str, word_limit: u32) -> String {
    format!(
        "Create a {word_limit}-word summary of the following article, focusing on the key findings and implications.\n\
         \n\
         **Formatting Rules:**\n\
         \n\
         * Use bullet points to list key findings.\n\
         * Use bold text to highlight important terms.\n\
         * Keep sentences concise and clear.\n\
         * Maintain a neutral and objective tone.\n\
         * Do not include any personal opinions or interpretations.\n\
         \n\
         **Article Text:**\n\
         \n\
         {text}\n"
    )
}

/// The four metadata lines appended to every summary.
pub fn metadata_footer(meta: &ArticleMeta<'_>) -> String {
    format!(
        "\n\nTitle: {}\nLink: {}\nSnippet: {}\nPublication Info: {}",
        meta.title, meta.link, meta.snippet, meta.publication_info
    )
}
