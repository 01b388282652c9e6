//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the broker API token) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`. Strategy parameters
//! are validated up front: a bad ladder or threshold fails construction
//! instead of surfacing mid-session.

use anyhow::{Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::types::EngineError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub gateway: GatewayConfig,
    pub panel: PanelConfig,
}

/// Strategy and engine parameters.
///
/// Serialized back out by the panel's `/api/config` endpoint, so the form
/// shows the same defaults the engine runs with.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_base_stake")]
    pub base_stake: Decimal,
    /// Martingale stake sequence for PRIMARY mode.
    #[serde(default = "default_stakes")]
    pub primary_stakes: Vec<Decimal>,
    /// Stake sequence for RECOVERY mode (hedge pairs).
    #[serde(default = "default_stakes")]
    pub recovery_stakes: Vec<Decimal>,
    #[serde(default = "default_take_profit")]
    pub take_profit: Decimal,
    #[serde(default = "default_stop_loss")]
    pub stop_loss: Decimal,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: i64,
    /// Recorded for reporting; not enforced as a hard stop.
    #[serde(default = "default_max_trades")]
    pub max_trades: u64,
    /// The digit that fires a signal in either mode.
    #[serde(default = "default_trigger_digit")]
    pub trigger_digit: u8,
    /// When false, PRIMARY ladder overflow resets in place instead of
    /// switching to RECOVERY.
    #[serde(default = "default_true")]
    pub recovery_enabled: bool,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_duration_unit")]
    pub duration_unit: char,
}

fn default_symbol() -> String {
    "R_100".to_string()
}
fn default_base_stake() -> Decimal {
    dec!(0.35)
}
fn default_stakes() -> Vec<Decimal> {
    vec![
        dec!(0.35),
        dec!(0.45),
        dec!(0.90),
        dec!(1.86),
        dec!(3.82),
        dec!(7.82),
        dec!(16.03),
        dec!(32.85),
    ]
}
fn default_take_profit() -> Decimal {
    dec!(1.00)
}
fn default_stop_loss() -> Decimal {
    dec!(-50)
}
fn default_cooldown_ms() -> i64 {
    120_000
}
fn default_min_interval_ms() -> i64 {
    2_000
}
fn default_max_trades() -> u64 {
    99_999
}
fn default_trigger_digit() -> u8 {
    1
}
fn default_true() -> bool {
    true
}
fn default_duration() -> u32 {
    1
}
fn default_duration_unit() -> char {
    't'
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            base_stake: default_base_stake(),
            primary_stakes: default_stakes(),
            recovery_stakes: default_stakes(),
            take_profit: default_take_profit(),
            stop_loss: default_stop_loss(),
            cooldown_ms: default_cooldown_ms(),
            min_interval_ms: default_min_interval_ms(),
            max_trades: default_max_trades(),
            trigger_digit: default_trigger_digit(),
            recovery_enabled: default_true(),
            duration: default_duration(),
            duration_unit: default_duration_unit(),
        }
    }
}

impl EngineConfig {
    /// Validate strategy parameters. Called at construction; a failure here
    /// must prevent the engine from ever starting.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.base_stake <= Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "base_stake must be positive, got {}",
                self.base_stake
            )));
        }
        if self.primary_stakes.is_empty() {
            return Err(EngineError::Config("primary_stakes is empty".into()));
        }
        if self.recovery_enabled && self.recovery_stakes.is_empty() {
            return Err(EngineError::Config(
                "recovery_stakes is empty with recovery enabled".into(),
            ));
        }
        for (label, stakes) in [
            ("primary_stakes", &self.primary_stakes),
            ("recovery_stakes", &self.recovery_stakes),
        ] {
            if let Some(bad) = stakes.iter().find(|s| **s <= Decimal::ZERO) {
                return Err(EngineError::Config(format!(
                    "{label} contains non-positive stake {bad}"
                )));
            }
        }
        if self.take_profit <= Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "take_profit must be positive, got {}",
                self.take_profit
            )));
        }
        if self.stop_loss >= Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "stop_loss must be negative, got {}",
                self.stop_loss
            )));
        }
        if self.cooldown_ms <= 0 {
            return Err(EngineError::Config(format!(
                "cooldown_ms must be positive, got {}",
                self.cooldown_ms
            )));
        }
        if self.min_interval_ms < 0 {
            return Err(EngineError::Config(format!(
                "min_interval_ms must be non-negative, got {}",
                self.min_interval_ms
            )));
        }
        if self.trigger_digit > 9 {
            return Err(EngineError::Config(format!(
                "trigger_digit must be 0-9, got {}",
                self.trigger_digit
            )));
        }
        if self.duration == 0 {
            return Err(EngineError::Config("duration must be at least 1".into()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::milliseconds(self.cooldown_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::milliseconds(self.min_interval_ms)
    }
}

/// Broker gateway connection parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub app_id: String,
    pub api_token_env: String,
}

/// Control panel server parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
