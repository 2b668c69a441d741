//! Error types for the scoring core.
//!
//! Only configuration and cache IO surface as `Err` values. Adapter failures
//! are converted into [`crate::model::ToolOutcome`]s and the fatal-input case
//! is reported as data on the pipeline report.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("failed to (de)serialize cached score: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cache error: {message}")]
    Other { message: String },
}

/// Why a single adapter contributed nothing.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("adapter '{tool}' timed out after {elapsed:?}")]
    Timeout { tool: String, elapsed: Duration },

    #[error("adapter '{tool}' failed: {message}")]
    Failed { tool: String, message: String },

    #[error("adapter '{tool}' panicked: {message}")]
    Panicked { tool: String, message: String },
}

impl AdapterError {
    pub fn from_anyhow(tool: &str, err: &anyhow::Error) -> Self {
        AdapterError::Failed {
            tool: tool.to_string(),
            message: format!("{:#}", err),
        }
    }

    pub fn from_panic(tool: &str, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        AdapterError::Panicked {
            tool: tool.to_string(),
            message,
        }
    }
}

/// Conditions that stop the pipeline before any adapter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum PipelineFatal {
    #[error("document has no extractable text")]
    EmptyDocument,
    #[error("no tokio runtime could be started for the request")]
    RuntimeUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = AdapterError::from_panic("bias", boxed.as_ref());
        assert_eq!(err.to_string(), "adapter 'bias' panicked: boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let err = AdapterError::from_panic("bias", boxed.as_ref());
        assert!(err.to_string().ends_with("owned"));
    }

    #[test]
    fn anyhow_context_chain_is_kept() {
        let err = anyhow::anyhow!("root cause").context("calling model");
        let e = AdapterError::from_anyhow("summary", &err);
        assert_eq!(
            e.to_string(),
            "adapter 'summary' failed: calling model: root cause"
        );
    }
}
