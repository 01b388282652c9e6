//! Shared types for the PULSE engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that broker, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// A single price tick for the traded symbol.
///
/// Ticks arrive in non-decreasing epoch order; ordering and gaps are not
/// validated here. Only the last decimal digit of the 2-dp quote is
/// semantically meaningful to the strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tick {
    pub quote: Decimal,
    pub epoch: DateTime<Utc>,
}

impl Tick {
    pub fn new(quote: Decimal, epoch: DateTime<Utc>) -> Self {
        Self { quote, epoch }
    }

    /// The signal digit: the least-significant digit of the quote rendered
    /// to two decimal places. `1234.51 → 1`, `1234.5 → 0`.
    pub fn signal_digit(&self) -> u8 {
        let hundredths = (self.quote.round_dp(2) * dec!(100)).trunc();
        let n = hundredths.to_i128().unwrap_or(0);
        n.rem_euclid(10) as u8
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.quote.round_dp(2), self.epoch.timestamp())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Trading mode.
///
/// PRIMARY trades a single directional digit contract; RECOVERY hedges with
/// two complementary boundary contracts after the primary ladder is
/// exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Primary,
    Recovery,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Primary => write!(f, "PRIMARY"),
            Mode::Recovery => write!(f, "RECOVERY"),
        }
    }
}

/// Binary-option contract classes used by the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    DigitOdd,
    DigitOver,
    DigitUnder,
}

impl ContractType {
    /// Wire name expected by the broker API.
    pub fn api_name(&self) -> &'static str {
        match self {
            ContractType::DigitOdd => "DIGITODD",
            ContractType::DigitOver => "DIGITOVER",
            ContractType::DigitUnder => "DIGITUNDER",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Top-level engine lifecycle state, derived for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Stopped,
    Running,
    AwaitingSettlement,
    Cooldown,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Stopped => write!(f, "STOPPED"),
            EngineStatus::Running => write!(f, "RUNNING"),
            EngineStatus::AwaitingSettlement => write!(f, "AWAITING_SETTLEMENT"),
            EngineStatus::Cooldown => write!(f, "COOLDOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Trade & position types
// ---------------------------------------------------------------------------

/// A fully specified order the engine wants placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeInstruction {
    pub contract_type: ContractType,
    /// Digit barrier for OVER/UNDER contracts; None for ODD.
    pub barrier: Option<u8>,
    pub stake: Decimal,
}

impl fmt::Display for TradeInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.barrier {
            Some(b) => write!(f, "{} {} @ ${}", self.contract_type, b, self.stake),
            None => write!(f, "{} @ ${}", self.contract_type, self.stake),
        }
    }
}

/// Receipt returned by the broker when an order is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePlacement {
    pub contract_id: String,
    pub price: Decimal,
}

/// An outstanding position awaiting settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub contract_id: String,
    pub contract_type: ContractType,
    pub mode: Mode,
    pub stake: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl fmt::Display for OpenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ${} ({})",
            self.mode, self.contract_type, self.stake, self.contract_id,
        )
    }
}

/// The broker's view of a contract's settlement state.
///
/// `is_settled == false` means the contract is still open; poll again on the
/// next cycle. A missing response (`None` from the broker call) means the
/// same thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub is_settled: bool,
    pub profit: Decimal,
    pub status: String,
}

impl Settlement {
    pub fn is_win(&self) -> bool {
        self.profit > Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Session types
// ---------------------------------------------------------------------------

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    TakeProfit,
    StopLoss,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::TakeProfit => write!(f, "TAKE_PROFIT"),
            SessionOutcome::StopLoss => write!(f, "STOP_LOSS"),
        }
    }
}

/// Archived summary of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub ended_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
    pub profit: Decimal,
    pub trade_count: u64,
    pub final_mode: Mode,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session {} | {} | profit=${} | trades={} | mode={}",
            self.id, self.outcome, self.profit, self.trade_count, self.final_mode,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for PULSE.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Placement rejected by broker: {message}")]
    Placement { message: String },

    #[error("Settlement check failed: {message}")]
    SettlementCheck { message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
