//! Reasoning service layer.
//!
//! A [`ReasoningService`] turns an ordered list of chat messages into one
//! textual completion. [`StructuredExtractor`] builds the type-specific
//! prompts on top of it and parses the reply into a [`FieldMap`].
//!
//! Two services are provided:
//!
//! - [`OpenAiService`]: any OpenAI-compatible chat completions endpoint
//! - [`MockReasoning`]: scripted replies for tests
//!
//! [`FieldMap`]: crate::models::FieldMap

mod client;
mod mock;
mod openai;
pub mod prompts;

pub use client::StructuredExtractor;
pub use mock::MockReasoning;
pub use openai::OpenAiService;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReasoningError;
use crate::models::DocumentKind;

/// One message of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A stateless completion service shared across ingestion runs.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Request a single completion for `messages`, at temperature 0.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReasoningError>;
}

/// Selects the extraction template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentTag {
    Lease,
    Invoice,
    Contract,
    /// Any other document type, named in the generic template.
    Other(String),
}

impl DocumentTag {
    /// Tag from a free-form type name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "lease" => DocumentTag::Lease,
            "invoice" => DocumentTag::Invoice,
            "contract" => DocumentTag::Contract,
            other => DocumentTag::Other(other.to_string()),
        }
    }
}

impl From<DocumentKind> for DocumentTag {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Lease => DocumentTag::Lease,
            DocumentKind::Invoice => DocumentTag::Invoice,
            DocumentKind::Contract => DocumentTag::Contract,
        }
    }
}

impl fmt::Display for DocumentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentTag::Lease => f.write_str("lease"),
            DocumentTag::Invoice => f.write_str("invoice"),
            DocumentTag::Contract => f.write_str("contract"),
            DocumentTag::Other(name) => f.write_str(name),
        }
    }
}
