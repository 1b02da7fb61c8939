//! Test doubles shared by the core unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use scholardigest_shared::{Result, ScholarDigestError};

use crate::generation::TextGenerator;

/// Returns a fixed reply (or a fixed failure) and records every prompt.
pub(crate) struct RecordingGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());

        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(ScholarDigestError::Generation("stub failure".into())),
        }
    }
}
