//! Typed engine events.
//!
//! The engine reports every state transition through an [`EventSink`]
//! rather than free-form log text, so the panel and the logs classify
//! events by type instead of string-matching messages. The production
//! sink ([`EventLog`]) forwards to `tracing` and keeps a bounded ring
//! buffer for the control panel.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::types::{ContractType, Mode, SessionOutcome};

// ---------------------------------------------------------------------------
// Event type
// ---------------------------------------------------------------------------

/// Every observable transition the engine makes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    EngineStarted {
        mode: Mode,
    },
    EngineStopped,
    SignalFired {
        mode: Mode,
        digit: u8,
    },
    TradePlaced {
        contract_id: String,
        contract_type: ContractType,
        barrier: Option<u8>,
        stake: Decimal,
    },
    PlacementFailed {
        contract_type: ContractType,
        message: String,
    },
    /// One leg of a hedge pair settled; state is untouched until all legs close.
    LegSettled {
        contract_id: String,
        profit: Decimal,
    },
    /// All outstanding legs settled; ladder/mode/session updated.
    SettlementApplied {
        profit: Decimal,
        win: bool,
        mode: Mode,
        session_profit: Decimal,
    },
    ModeChanged {
        from: Mode,
        to: Mode,
    },
    /// A ladder ran out of rungs and was reset in place (no mode switch).
    LadderSaturated {
        mode: Mode,
    },
    SessionEnded {
        outcome: SessionOutcome,
        profit: Decimal,
        trade_count: u64,
    },
    CooldownStarted {
        until: DateTime<Utc>,
    },
    CooldownFinished,
    PositionsAbandoned {
        contract_ids: Vec<String>,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::EngineStarted { mode } => {
                write!(f, ">>> ENGINE STARTED ({mode}) <<<")
            }
            EngineEvent::EngineStopped => write!(f, ">>> ENGINE STOPPED <<<"),
            EngineEvent::SignalFired { mode, digit } => {
                write!(f, "Signal: digit {digit} ({mode})")
            }
            EngineEvent::TradePlaced {
                contract_id,
                contract_type,
                barrier,
                stake,
            } => match barrier {
                Some(b) => write!(
                    f,
                    "Trade placed: {contract_type} {b} @ ${stake} → {contract_id}"
                ),
                None => write!(f, "Trade placed: {contract_type} @ ${stake} → {contract_id}"),
            },
            EngineEvent::PlacementFailed {
                contract_type,
                message,
            } => write!(f, "Placement failed ({contract_type}): {message}"),
            EngineEvent::LegSettled {
                contract_id,
                profit,
            } => write!(f, "Leg {contract_id} closed, profit ${profit}"),
            EngineEvent::SettlementApplied {
                profit,
                win,
                mode,
                session_profit,
            } => {
                let tag = if *win { "WIN" } else { "LOSS" };
                write!(f, "{tag} ({mode}): ${profit} | session ${session_profit}")
            }
            EngineEvent::ModeChanged { from, to } => {
                write!(f, "Mode switch: {from} → {to}")
            }
            EngineEvent::LadderSaturated { mode } => {
                write!(f, "Max ladder level reached ({mode}), resetting")
            }
            EngineEvent::SessionEnded {
                outcome,
                profit,
                trade_count,
            } => write!(
                f,
                "Session end ({outcome}): profit ${profit} over {trade_count} trades"
            ),
            EngineEvent::CooldownStarted { until } => {
                write!(f, "COOLDOWN until {}", until.to_rfc3339())
            }
            EngineEvent::CooldownFinished => {
                write!(f, "COOLDOWN complete, restarting session")
            }
            EngineEvent::PositionsAbandoned { contract_ids } => write!(
                f,
                "Stopped with unsettled positions: {}",
                contract_ids.join(", ")
            ),
        }
    }
}

impl EngineEvent {
    /// Whether this event represents a degraded or lossy condition.
    fn is_warning(&self) -> bool {
        matches!(
            self,
            EngineEvent::PlacementFailed { .. }
                | EngineEvent::LadderSaturated { .. }
                | EngineEvent::PositionsAbandoned { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Consumer of engine events. The engine holds exactly one sink and calls it
/// synchronously inside its tick-processing critical section, so
/// implementations must be cheap and non-blocking.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Sink that drops everything. Useful as a default in tests.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// A rendered log line retained for the panel.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    #[serde(flatten)]
    pub event: EngineEvent,
}

/// Ring buffer capacity. The panel never needs more than the recent past.
const LOG_CAPACITY: usize = 100;

/// Production sink: forwards to `tracing` and retains the last
/// [`LOG_CAPACITY`] entries for the control panel.
pub struct EventLog {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)),
        }
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    /// The trailing `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap();
        let start = entries.len().saturating_sub(n);
        entries.iter().skip(start).cloned().collect()
    }

    /// Drop all retained entries (a fresh engine start clears the panel).
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: EngineEvent) {
        if event.is_warning() {
            warn!(event = %event, "engine event");
        } else {
            info!(event = %event, "engine event");
        }

        let entry = LogEntry {
            timestamp: Utc::now().format("%H:%M:%S").to_string(),
            message: event.to_string(),
            event,
        };

        let mut entries = self.entries.lock().unwrap();
        if entries.len() == LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
