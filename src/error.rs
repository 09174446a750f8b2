//! Error types
//!
//! Only `EngineError` aborts a `detect` call. Matcher and store errors are
//! recovered per rule / per candidate and surface as stats, not failures.

use thiserror::Error;

/// Whole-call failures, raised before any scanning begins
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("campaign id is missing or blank")]
    MissingCampaignId,

    #[error("text is {size} bytes, limit is {limit}")]
    TextTooLarge { size: usize, limit: usize },
}

/// Failure of a single knowledge-store lookup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("knowledge store unavailable: {0}")]
    Unavailable(String),

    #[error("knowledge store lookup timed out")]
    Timeout,

    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// Failure of a single matcher during a scan
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("pattern '{rule}' failed to compile: {message}")]
    Compile { rule: String, message: String },

    #[error("matcher '{rule}' failed: {message}")]
    Runtime { rule: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid engine config: {0}")]
    Invalid(String),
}
