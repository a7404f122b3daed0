use std::sync::Arc;
use std::time::Instant;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::prompts::{classification_messages, extraction_messages};
use super::{DocumentTag, ReasoningService};
use crate::error::ReasoningError;
use crate::models::{DocumentKind, FieldMap};

lazy_static! {
    static ref OPENING_FENCE: Regex = Regex::new(r"^```(?:json)?\s*").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"\s*```$").unwrap();
    static ref LOOSE_TYPE: Regex =
        Regex::new(r#"(?i)['"]?document_type['"]?\s*:\s*['"]?([a-z]+)"#).unwrap();
}

/// Structured extraction over a [`ReasoningService`].
///
/// One completion per call, no retries. Cheap to clone.
#[derive(Clone)]
pub struct StructuredExtractor {
    service: Arc<dyn ReasoningService>,
}

impl StructuredExtractor {
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Self { service }
    }

    /// Extract the fields of a `tag` document from `text`.
    ///
    /// A reply that is not a JSON object yields an empty map, which the
    /// mapper rejects. Transport and service failures are returned as
    /// errors instead.
    pub async fn extract_information(
        &self,
        text: &str,
        tag: &DocumentTag,
    ) -> Result<FieldMap, ReasoningError> {
        let started = Instant::now();
        let reply = self.service.complete(&extraction_messages(text, tag)).await?;
        info!(
            "Reasoning extraction for {} took {:?}",
            tag,
            started.elapsed()
        );

        let cleaned = strip_fences(&reply);
        match serde_json::from_str::<Value>(cleaned) {
            Ok(Value::Object(fields)) => {
                debug!("Reply carried {} top-level fields", fields.len());
                Ok(fields)
            }
            Ok(other) => {
                error!("Reasoning reply is JSON but not an object: {}", kind_of(&other));
                Ok(FieldMap::new())
            }
            Err(e) => {
                error!("Error decoding JSON from reasoning reply: {}", e);
                Ok(FieldMap::new())
            }
        }
    }

    /// Classify `text` as a lease, invoice or contract.
    ///
    /// `None` when the reply names anything else or cannot be read.
    pub async fn determine_document_type(
        &self,
        text: &str,
    ) -> Result<Option<DocumentKind>, ReasoningError> {
        let started = Instant::now();
        let reply = self.service.complete(&classification_messages(text)).await?;
        info!("Reasoning classification took {:?}", started.elapsed());

        let Some(name) = classification_name(strip_fences(&reply)) else {
            error!("Could not read a document type from the classification reply");
            return Ok(None);
        };

        match name.parse::<DocumentKind>() {
            Ok(kind) => Ok(Some(kind)),
            Err(_) => {
                warn!("Unknown document type determined: {}", name);
                Ok(None)
            }
        }
    }
}

/// Drop a leading ```` ```json ```` or ```` ``` ```` fence and a trailing ```` ``` ````.
fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let start = OPENING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let body = &trimmed[start..];
    let end = CLOSING_FENCE.find(body).map_or(body.len(), |m| m.start());
    &body[..end]
}

/// The `document_type` value of a classification reply.
///
/// Strict JSON first; the template shows single-quoted examples, so a
/// Python-style dict is read as well.
fn classification_name(reply: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(reply) {
        return value
            .get("document_type")
            .and_then(Value::as_str)
            .map(|name| name.trim().to_lowercase());
    }

    LOOSE_TYPE
        .captures(reply)
        .map(|caps| caps[1].to_lowercase())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::MockReasoning;
    use pretty_assertions::assert_eq;

    fn extractor(mock: &MockReasoning) -> StructuredExtractor {
        StructuredExtractor::new(Arc::new(mock.clone()))
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_fences("{\"a\": \"```\"}"), "{\"a\": \"```\"}");
    }

    #[tokio::test]
    async fn test_extract_fenced_reply() {
        let mock = MockReasoning::new("```json\n{\"Invoice Number\": \"INV-1\"}\n```");
        let fields = extractor(&mock)
            .extract_information("text", &DocumentTag::Invoice)
            .await
            .unwrap();

        assert_eq!(fields.get("Invoice Number"), Some(&Value::from("INV-1")));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_json_reply_is_empty_map() {
        let mock = MockReasoning::new("I could not find an invoice here.");
        let fields = extractor(&mock)
            .extract_information("text", &DocumentTag::Invoice)
            .await
            .unwrap();
        assert!(fields.is_empty());

        let mock = MockReasoning::new("[1, 2, 3]");
        let fields = extractor(&mock)
            .extract_information("text", &DocumentTag::Lease)
            .await
            .unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_is_distinct() {
        let mock = MockReasoning::failing(ReasoningError::Service {
            status: 503,
            body: "overloaded".to_string(),
        });
        let err = extractor(&mock)
            .extract_information("text", &DocumentTag::Contract)
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::Service { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_classification() {
        let cases = [
            ("{\"document_type\": \"Lease\"}", Some(DocumentKind::Lease)),
            ("```json\n{\"document_type\": \"Invoice\"}\n```", Some(DocumentKind::Invoice)),
            ("{'document_type': 'Contract'}", Some(DocumentKind::Contract)),
            ("{\"document_type\": \"Receipt\"}", None),
            ("no idea", None),
        ];

        for (reply, expected) in cases {
            let mock = MockReasoning::new(reply);
            let kind = extractor(&mock).determine_document_type("text").await.unwrap();
            assert_eq!(kind, expected, "reply {reply:?}");
        }
    }
}
