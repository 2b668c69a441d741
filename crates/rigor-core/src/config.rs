use crate::cache::CACHE_VERSION;
use crate::errors::ConfigError;
use crate::model::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Which phase executor to use. `Auto` inspects the caller's runtime once per
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Auto,
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub version: u32,
    /// Minimum share of a snippet's significant words a page must contain.
    pub page_overlap_threshold: f64,
    /// Minimum normalized edit-distance similarity for a fuzzy block match.
    pub fuzzy_match_threshold: f64,
    /// Shortest run of significant words accepted as a phrase match.
    pub phrase_min_words: usize,
    pub adapter_timeout_secs: u64,
    pub tool_timeouts: BTreeMap<ToolKind, u64>,
    pub execution: ExecutionMode,
    pub cache_version: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            page_overlap_threshold: 0.50,
            fuzzy_match_threshold: 0.80,
            phrase_min_words: 3,
            adapter_timeout_secs: 30,
            tool_timeouts: BTreeMap::new(),
            execution: ExecutionMode::Auto,
            cache_version: CACHE_VERSION,
        }
    }
}

impl PipelineConfig {
    pub fn timeout_for(&self, kind: ToolKind) -> Duration {
        let secs = self
            .tool_timeouts
            .get(&kind)
            .copied()
            .unwrap_or(self.adapter_timeout_secs);
        Duration::from_secs(secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_CONFIG_VERSION,
            });
        }
        check_ratio("page_overlap_threshold", self.page_overlap_threshold)?;
        check_ratio("fuzzy_match_threshold", self.fuzzy_match_threshold)?;
        if self.phrase_min_words == 0 {
            return Err(ConfigError::Invalid {
                field: "phrase_min_words",
                reason: "must be at least 1".into(),
            });
        }
        if self.adapter_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "adapter_timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if let Some((kind, _)) = self.tool_timeouts.iter().find(|(_, secs)| **secs == 0) {
            return Err(ConfigError::Invalid {
                field: "tool_timeouts",
                reason: format!("timeout for {} must be greater than 0", kind),
            });
        }
        Ok(())
    }
}

fn check_ratio(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 && v <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is not in (0, 1]", v),
        })
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let cfg = parse_config(&raw).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })?;
    tracing::debug!(path = %path.display(), "loaded pipeline config");
    Ok(cfg)
}

pub fn parse_config(raw: &str) -> Result<PipelineConfig, ConfigError> {
    let cfg: PipelineConfig = if raw.trim().is_empty() {
        PipelineConfig::default()
    } else {
        serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })?
    };
    cfg.validate()?;
    Ok(cfg)
}
