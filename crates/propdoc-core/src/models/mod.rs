//! Data models for the ingestion pipeline.

pub mod config;
pub mod entities;
pub mod records;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Loosely-typed field map returned by the reasoning service.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Document types the pipeline can persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Lease,
    Invoice,
    Contract,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Lease => "lease",
            DocumentKind::Invoice => "invoice",
            DocumentKind::Contract => "contract",
        }
    }

    /// Capitalized label, as returned by classification.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Lease => "Lease",
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Contract => "Contract",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lease" => Ok(DocumentKind::Lease),
            "invoice" => Ok(DocumentKind::Invoice),
            "contract" => Ok(DocumentKind::Contract),
            other => Err(format!("unknown document type: {other}")),
        }
    }
}
