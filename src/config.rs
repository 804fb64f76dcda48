//! Engine configuration loading from TOML files.
//!
//! Every threshold, weight, and coefficient the engine uses lives here so
//! deployments can tune behavior without code changes. All sections have
//! complete defaults; an empty file is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::arbitrage::ArbitrageConfig;
use crate::domain::correlation::CorrelationTable;
use crate::domain::poisson::DistributionConfig;
use crate::domain::regression::{FactorWeights, ModelConfig};
use crate::domain::signal::SignalThresholds;
use crate::domain::value::StakingConfig;
use crate::error::{ConfigError, Result};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub staking: StakingConfig,

    #[serde(default)]
    pub signals: SignalThresholds,

    #[serde(default)]
    pub arbitrage: ArbitrageConfig,

    #[serde(default)]
    pub distribution: DistributionConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub weights: FactorWeights,

    #[serde(default)]
    pub correlation: CorrelationTable,
}

impl EngineConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: EngineConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        fn fraction(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be in (0, 1], got {value}"),
                });
            }
            Ok(())
        }

        fraction("staking.kelly_fraction", self.staking.kelly_fraction)?;
        fraction("staking.max_stake_fraction", self.staking.max_stake_fraction)?;
        fraction("staking.high_risk_fraction", self.staking.high_risk_fraction)?;

        if self.staking.medium_edge > self.staking.high_edge {
            return Err(ConfigError::InvalidValue {
                field: "staking.medium_edge",
                reason: format!(
                    "must not exceed high_edge ({} > {})",
                    self.staking.medium_edge, self.staking.high_edge
                ),
            }
            .into());
        }

        if self.signals.steam_window_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "signals.steam_window_minutes",
                reason: format!("must be positive, got {}", self.signals.steam_window_minutes),
            }
            .into());
        }
        if self.signals.steam_min_books == 0 {
            return Err(ConfigError::InvalidValue {
                field: "signals.steam_min_books",
                reason: "must be at least 1".into(),
            }
            .into());
        }

        if self.distribution.max_score == 0 {
            return Err(ConfigError::InvalidValue {
                field: "distribution.max_score",
                reason: "must be at least 1".into(),
            }
            .into());
        }

        if !(self.model.league_average_total.is_finite()
            && self.model.league_average_total > 0.0)
        {
            return Err(ConfigError::InvalidValue {
                field: "model.league_average_total",
                reason: format!("must be positive, got {}", self.model.league_average_total),
            }
            .into());
        }
        if !(0.50..=0.92).contains(&self.model.base_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "model.base_confidence",
                reason: format!("must be in [0.50, 0.92], got {}", self.model.base_confidence),
            }
            .into());
        }

        self.correlation.validate()?;

        Ok(())
    }
}
