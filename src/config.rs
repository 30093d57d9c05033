//! Engine configuration from JSON or environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{ENV_OVERLAY_OFFSET, ENV_STRATEGY};
use crate::modifier::{Offset, OffsetModifier};
use crate::strategy::{Aggregation, ClosestCenter, ClosestCorner, IntersectionStrategy, RectangleIntersection};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid strategy: {0}")]
    InvalidStrategy(String),
    #[error("invalid overlay offset: {0}")]
    InvalidOffset(String),
    #[error("{var} is not valid unicode")]
    NotUnicode { var: String },
}

/// Which built-in intersection strategy an engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    ClosestCenter,
    RectangleIntersection,
    ClosestCorner {
        #[serde(default)]
        aggregation: Aggregation,
    },
}

impl StrategyKind {
    #[must_use]
    pub fn into_strategy(self) -> Box<dyn IntersectionStrategy> {
        match self {
            Self::ClosestCenter => Box::new(ClosestCenter),
            Self::RectangleIntersection => Box::new(RectangleIntersection),
            Self::ClosestCorner { aggregation } => Box::new(ClosestCorner::new(aggregation)),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    /// `closest-center`, `rectangle-intersection`, or
    /// `closest-corner[:sum|min|average]`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (name, aggregation) = match raw.trim().split_once(':') {
            Some((name, aggregation)) => (name, Some(aggregation)),
            None => (raw.trim(), None),
        };
        match (name, aggregation) {
            ("closest-center", None) => Ok(Self::ClosestCenter),
            ("rectangle-intersection", None) => Ok(Self::RectangleIntersection),
            ("closest-corner", None) => Ok(Self::ClosestCorner { aggregation: Aggregation::default() }),
            ("closest-corner", Some(aggregation)) => {
                let aggregation = aggregation.parse().map_err(ConfigError::InvalidStrategy)?;
                Ok(Self::ClosestCorner { aggregation })
            }
            _ => Err(ConfigError::InvalidStrategy(format!(
                "unknown strategy '{raw}' (expected closest-center, rectangle-intersection, or closest-corner[:sum|min|average])"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: StrategyKind,
    /// Installed as the first modifier stage when present.
    pub overlay_offset: Option<OffsetModifier>,
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed input or unknown strategy kinds.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Build configuration from environment variables.
    ///
    /// Optional:
    /// - `DROPKIT_STRATEGY`: `closest-center` (default), `rectangle-intersection`,
    ///   or `closest-corner[:sum|min|average]`
    /// - `DROPKIT_OVERLAY_OFFSET`: `<x>,<y>`, each `start`, `center`, `end`, or
    ///   a pixel amount
    ///
    /// # Errors
    ///
    /// Returns `InvalidStrategy` or `InvalidOffset` for unparseable values and
    /// `NotUnicode` for a variable that is not valid UTF-8.
    pub fn from_env() -> Result<Self, ConfigError> {
        let strategy = env_var(ENV_STRATEGY)?;
        let offset = env_var(ENV_OVERLAY_OFFSET)?;
        Self::from_vars(strategy.as_deref(), offset.as_deref())
    }

    fn from_vars(strategy: Option<&str>, offset: Option<&str>) -> Result<Self, ConfigError> {
        let strategy = strategy.map(str::parse::<StrategyKind>).transpose()?.unwrap_or_default();
        let overlay_offset = offset.map(parse_offset).transpose()?;
        Ok(Self { strategy, overlay_offset })
    }
}

fn env_var(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { var: key.to_string() }),
    }
}

fn parse_offset(raw: &str) -> Result<OffsetModifier, ConfigError> {
    let Some((x, y)) = raw.split_once(',') else {
        return Err(ConfigError::InvalidOffset(format!("expected '<x>,<y>', got '{raw}'")));
    };
    let x: Offset = x.parse().map_err(ConfigError::InvalidOffset)?;
    let y: Offset = y.parse().map_err(ConfigError::InvalidOffset)?;
    Ok(OffsetModifier::new(x, y))
}
