//! Trade engine — the orchestrating state machine.
//!
//! Consumes tick events one at a time and drives everything else: cooldown
//! scheduling, settlement polling, rate limiting, signal evaluation, and
//! trade placement. All mutable state lives here; the strategy components
//! are value types mutated only through transitions invoked from this
//! module.

pub mod monitor;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broker::BrokerClient;
use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventSink};
use crate::strategy::modes::{LossOutcome, ModeController, WinOutcome};
use crate::strategy::session::SessionTracker;
use crate::strategy::signal::SignalEvaluator;
use crate::types::{
    EngineError, EngineStatus, Mode, OpenPosition, SessionSummary, Tick, TradeInstruction,
};

use monitor::ContractMonitor;

/// Trailing window of recent signal digits kept for status reporting.
const DIGIT_HISTORY_CAP: usize = 5;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of the engine for the control panel.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub status: EngineStatus,
    pub mode: Mode,
    pub session_profit: Decimal,
    pub trade_count: u64,
    pub ladder_index: usize,
    pub current_stake: Decimal,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub open_contracts: Vec<String>,
    pub recent_digits: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct TradeEngine {
    config: EngineConfig,
    broker: Arc<dyn BrokerClient>,
    events: Arc<dyn EventSink>,
    evaluator: SignalEvaluator,
    modes: ModeController,
    session: SessionTracker,
    monitor: ContractMonitor,
    is_running: bool,
    last_trade_time: Option<DateTime<Utc>>,
    digit_history: VecDeque<u8>,
    completed_sessions: Vec<SessionSummary>,
}

impl TradeEngine {
    /// Build an engine from validated configuration. Fails fast on a bad
    /// ladder or threshold; a constructed engine can always start.
    pub fn new(
        config: EngineConfig,
        broker: Arc<dyn BrokerClient>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let evaluator = SignalEvaluator::new(config.trigger_digit);
        let modes = ModeController::new(
            config.primary_stakes.clone(),
            config.recovery_stakes.clone(),
            config.base_stake,
            config.recovery_enabled,
        );
        let session = SessionTracker::new(config.take_profit, config.stop_loss, config.cooldown());

        Ok(Self {
            config,
            broker,
            events,
            evaluator,
            modes,
            session,
            monitor: ContractMonitor::new(),
            is_running: false,
            last_trade_time: None,
            digit_history: VecDeque::with_capacity(DIGIT_HISTORY_CAP),
            completed_sessions: Vec::new(),
        })
    }

    // -- Control surface ---------------------------------------------------

    /// Begin a fresh session and start consuming ticks.
    pub fn start(&mut self) {
        if self.is_running {
            return;
        }
        self.is_running = true;
        self.session.reset();
        self.modes.reset();
        self.last_trade_time = None;
        self.digit_history.clear();
        info!(
            symbol = %self.config.symbol,
            trigger_digit = self.config.trigger_digit,
            stakes = ?self.config.primary_stakes,
            "Engine started"
        );
        self.events.emit(EngineEvent::EngineStarted {
            mode: self.modes.mode(),
        });
    }

    /// Halt the engine. Outstanding positions are abandoned, not settled —
    /// they continue to exist at the broker but are no longer tracked.
    pub fn stop(&mut self) {
        if !self.is_running {
            return;
        }
        self.is_running = false;
        let abandoned = self.monitor.abandon();
        if !abandoned.is_empty() {
            warn!(
                contract_ids = ?abandoned,
                "Stopping with unsettled positions; they are no longer tracked"
            );
            self.events.emit(EngineEvent::PositionsAbandoned {
                contract_ids: abandoned,
            });
        }
        self.events.emit(EngineEvent::EngineStopped);
    }

    /// Generic command dispatcher for the control surface. Unrecognized
    /// commands are logged and have no effect.
    pub fn handle_command(&mut self, command: &str) {
        match command.to_lowercase().as_str() {
            "start" => self.start(),
            "stop" => self.stop(),
            other => warn!(command = other, "Unknown command"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Derived lifecycle state.
    pub fn status(&self) -> EngineStatus {
        if !self.is_running {
            EngineStatus::Stopped
        } else if self.session.in_cooldown() {
            EngineStatus::Cooldown
        } else if self.monitor.is_waiting() {
            EngineStatus::AwaitingSettlement
        } else {
            EngineStatus::Running
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            status: self.status(),
            mode: self.modes.mode(),
            session_profit: self.session.session_profit(),
            trade_count: self.session.trade_count(),
            ladder_index: self.modes.ladder_index(),
            current_stake: self.modes.current_stake(),
            cooldown_until: self.session.cooldown_until(),
            open_contracts: self
                .monitor
                .open_positions()
                .iter()
                .map(|p| p.contract_id.clone())
                .collect(),
            recent_digits: self.digit_history.iter().copied().collect(),
        }
    }

    /// Sessions completed since the last call. The caller owns archiving.
    pub fn drain_completed_sessions(&mut self) -> Vec<SessionSummary> {
        std::mem::take(&mut self.completed_sessions)
    }

    // -- Tick pipeline -----------------------------------------------------

    /// Process one tick to completion. The caller must not deliver the next
    /// tick until this returns; the engine is a single consistency unit.
    pub async fn on_tick(&mut self, tick: Tick) {
        if !self.is_running {
            return;
        }
        let now = tick.epoch;

        // Cooldown gates everything else.
        if self.session.in_cooldown() {
            if self.session.is_cooldown_expired(now) {
                self.events.emit(EngineEvent::CooldownFinished);
                self.session.reset();
                self.modes.reset();
                self.last_trade_time = Some(now);
            } else {
                return;
            }
        }

        let digit = tick.signal_digit();
        self.record_digit(digit);

        // While a position is outstanding, ticks drive settlement polling
        // instead of signal evaluation.
        if self.monitor.is_waiting() {
            self.poll_settlement(now).await;
            return;
        }

        // Rate limiting: minimum interval between placements.
        if let Some(last) = self.last_trade_time {
            if now - last < self.config.min_interval() {
                return;
            }
        }

        let stake = self.modes.current_stake();
        if let Some(instructions) = self.evaluator.evaluate(self.modes.mode(), tick, stake) {
            self.events.emit(EngineEvent::SignalFired {
                mode: self.modes.mode(),
                digit,
            });
            self.place_all(instructions, now).await;
        }
    }

    fn record_digit(&mut self, digit: u8) {
        if self.digit_history.len() == DIGIT_HISTORY_CAP {
            self.digit_history.pop_front();
        }
        self.digit_history.push_back(digit);
    }

    async fn place_all(&mut self, instructions: Vec<TradeInstruction>, now: DateTime<Utc>) {
        let mut placed_any = false;
        for instruction in instructions {
            match self
                .broker
                .place_trade(
                    instruction.contract_type,
                    instruction.stake,
                    self.config.duration,
                    self.config.duration_unit,
                    instruction.barrier,
                )
                .await
            {
                Ok(placement) => {
                    self.monitor.track(OpenPosition {
                        contract_id: placement.contract_id.clone(),
                        contract_type: instruction.contract_type,
                        mode: self.modes.mode(),
                        stake: instruction.stake,
                        placed_at: now,
                    });
                    self.session.record_trade();
                    placed_any = true;
                    self.events.emit(EngineEvent::TradePlaced {
                        contract_id: placement.contract_id,
                        contract_type: instruction.contract_type,
                        barrier: instruction.barrier,
                        stake: instruction.stake,
                    });
                }
                Err(e) => {
                    warn!(
                        contract_type = %instruction.contract_type,
                        error = %e,
                        "Placement failed; state unchanged"
                    );
                    self.events.emit(EngineEvent::PlacementFailed {
                        contract_type: instruction.contract_type,
                        message: e.to_string(),
                    });
                }
            }
        }
        if placed_any {
            self.last_trade_time = Some(now);
        }
    }

    async fn poll_settlement(&mut self, now: DateTime<Utc>) {
        let outcome = self.monitor.poll(self.broker.as_ref()).await;

        for (contract_id, profit) in outcome.newly_settled {
            self.events.emit(EngineEvent::LegSettled {
                contract_id,
                profit,
            });
        }

        if let Some(combined) = outcome.completed {
            self.apply_settlement(combined.profit, now);
        }
    }

    /// Apply a fully realized settlement: session accounting first, then —
    /// if the session survives — the ladder/mode transition.
    fn apply_settlement(&mut self, profit: Decimal, now: DateTime<Utc>) {
        let mode_at_settlement = self.modes.mode();
        let win = profit > Decimal::ZERO;
        let threshold = self.session.record_settlement(profit);

        self.events.emit(EngineEvent::SettlementApplied {
            profit,
            win,
            mode: mode_at_settlement,
            session_profit: self.session.session_profit(),
        });

        if let Some(outcome) = threshold {
            let summary = SessionSummary {
                id: Uuid::new_v4().to_string(),
                ended_at: now,
                outcome,
                profit: self.session.session_profit(),
                trade_count: self.session.trade_count(),
                final_mode: mode_at_settlement,
            };
            info!(%summary, "Session ended");
            self.events.emit(EngineEvent::SessionEnded {
                outcome,
                profit: summary.profit,
                trade_count: summary.trade_count,
            });
            self.completed_sessions.push(summary);

            let until = self.session.enter_cooldown(now);
            self.events.emit(EngineEvent::CooldownStarted { until });
            return;
        }

        if win {
            if self.modes.apply_win() == WinOutcome::RecoveredToPrimary {
                self.events.emit(EngineEvent::ModeChanged {
                    from: Mode::Recovery,
                    to: Mode::Primary,
                });
            }
        } else {
            match self.modes.apply_loss() {
                LossOutcome::Escalated => {}
                LossOutcome::SwitchedToRecovery => {
                    self.events.emit(EngineEvent::ModeChanged {
                        from: Mode::Primary,
                        to: Mode::Recovery,
                    });
                }
                LossOutcome::Saturated => {
                    self.events.emit(EngineEvent::LadderSaturated {
                        mode: self.modes.mode(),
                    });
                }
            }
            debug!(
                stake = %self.modes.current_stake(),
                mode = %self.modes.mode(),
                "Next stake"
            );
        }

        self.last_trade_time = Some(now);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
