//! Structured queries over note metadata ("Dataview").
//!
//! The dispatcher only sees the [`QueryEngine`] trait. The crate ships one
//! implementation, [`engine::MetadataQueryEngine`], which evaluates a compact
//! DQL subset (see [`query`]) against frontmatter. [`render`] expands fenced
//! `dataview` blocks inside a note into markdown.
//!
//! JavaScript queries (`dataviewjs`) are never evaluated.

pub mod engine;
pub mod query;
pub mod render;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::vault::VaultError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Language of a query submitted for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLanguage {
    Dql,
    Js,
}

impl QueryLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dql => "dql",
            Self::Js => "js",
        }
    }
}

impl std::str::FromStr for QueryLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dql" => Ok(Self::Dql),
            "js" | "javascript" | "dataviewjs" => Ok(Self::Js),
            _ => Err(format!("unknown query type: {s}. Supported: dql, js")),
        }
    }
}

/// Outcome of a dry-run validation. Never mutates anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    pub fn ok(language: QueryLanguage) -> Self {
        Self {
            valid: true,
            query_type: language.as_str().to_string(),
            error: None,
        }
    }

    pub fn invalid(language: QueryLanguage, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            query_type: language.as_str().to_string(),
            error: Some(error.into()),
        }
    }
}

/// A pluggable query backend.
///
/// Implementations are synchronous; a slow backend only holds up the request
/// that called it.
pub trait QueryEngine: Send + Sync {
    /// Run a query and return its typed result.
    fn query(&self, source: &str) -> Result<Value, QueryError>;

    /// Check a query without running it.
    fn validate(&self, source: &str, language: QueryLanguage) -> Validation;
}
