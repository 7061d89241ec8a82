// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for wcagbot

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WcagbotError>;

#[derive(Error, Debug)]
pub enum WcagbotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("Narrative error: {0}")]
    Narrative(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Fatal input errors surfaced to the caller of an audit.
///
/// Serializable so an API layer can hand it back as a structured object.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum AuditError {
    #[error("No URL was provided")]
    MissingUrl,

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Site {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_error_serializes_with_tag() {
        let err = AuditError::Unreachable {
            url: "https://example.invalid/".to_string(),
            reason: "dns".to_string(),
        };
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["error"], "unreachable");
        assert_eq!(json["url"], "https://example.invalid/");
    }

    #[test]
    fn test_missing_url_message() {
        assert_eq!(AuditError::MissingUrl.to_string(), "No URL was provided");
    }
}
