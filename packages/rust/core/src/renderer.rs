//! Styled HTML email rendering.
//!
//! The template is handed to the model together with the article fields and
//! the summary; the model fills the `{{...}}` placeholders and applies the
//! house styling.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use scholardigest_shared::{Result, ScholarDigestError};

use crate::generation::TextGenerator;
use crate::summarizer::ArticleMeta;

/// Renders summaries into standalone HTML emails.
pub struct EmailRenderer {
    generator: Arc<dyn TextGenerator>,
    template_path: PathBuf,
}

impl EmailRenderer {
    pub fn new(generator: Arc<dyn TextGenerator>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            template_path: template_path.into(),
        }
    }

    /// Render an email, or `None` when the template is unreadable or the
    /// model call fails. Failures are logged at `warn`.
    pub async fn render(&self, summary: &str, meta: &ArticleMeta<'_>) -> Option<String> {
        match self.try_render(summary, meta).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(title = %meta.title, error = %e, "email rendering failed");
                None
            }
        }
    }

    /// Render an email, returning the model's raw output.
    #[instrument(skip_all, fields(title = %meta.title))]
    pub async fn try_render(&self, summary: &str, meta: &ArticleMeta<'_>) -> Result<String> {
        let template = std::fs::read_to_string(&self.template_path).map_err(|source| {
            ScholarDigestError::TemplateUnavailable {
                path: self.template_path.clone(),
                source,
            }
        })?;

        let prompt = email_prompt(&template, summary, meta);
        let html = self.generator.generate(&prompt).await?;
        debug!(html = %html, "generated styled email");
        Ok(html)
    }
}

/// Prompt asking the model to populate and style `template`.
pub fn email_prompt(template: &str, summary: &str, meta: &ArticleMeta<'_>) -> String {
    format!(
        "Populate the following email template with the provided information and style it according to the instructions below, ensuring all HTML tags are properly closed.\n\
         \n\
         **Title:** {title}\n\
         **Link:** {link}\n\
         **Snippet:** {snippet}\n\
         **Publication Info:** {publication_info}\n\
         **Summary:** {summary}\n\
         \n\
         **Email Template:**\n\
         \n\
         {template}\n\
         \n\
         **Instructions:**\n\
         * Replace the text between the double curly braces (`{{{{}}}}`) in the email template with the corresponding information provided above.\n\
         * For example, replace `{{{{title}}}}` with the value of the **Title** variable.\n\
         * If any tags are missing closing tags, add them to ensure the HTML is well-formed.\n\
         * The email should have a modern and professional look.\n\
         * Use a light grey background color and a white container.\n\
         * The title should be in a blue header with white text.\n\
         * The content should have a dark grey heading and grey paragraph text.\n\
         * Include a light grey footer with a blue link color.\n\
         \n\
         Return ONLY the styled HTML code.\n",
        title = meta.title,
        link = meta.link,
        snippet = meta.snippet,
        publication_info = meta.publication_info,
    )
}
