//! Session accounting.
//!
//! Accumulates realized profit for the current session, evaluates the
//! take-profit/stop-loss thresholds, and owns the cooldown deadline.
//! Thresholds are checked only when a settlement is recorded, never
//! speculatively.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::types::SessionOutcome;

#[derive(Debug, Clone)]
pub struct SessionTracker {
    session_profit: Decimal,
    trade_count: u64,
    take_profit: Decimal,
    stop_loss: Decimal,
    cooldown_duration: Duration,
    cooldown_until: Option<DateTime<Utc>>,
}

impl SessionTracker {
    pub fn new(take_profit: Decimal, stop_loss: Decimal, cooldown_duration: Duration) -> Self {
        Self {
            session_profit: Decimal::ZERO,
            trade_count: 0,
            take_profit,
            stop_loss,
            cooldown_duration,
            cooldown_until: None,
        }
    }

    /// Add a realized settlement to the session total and report whether a
    /// threshold has been crossed.
    pub fn record_settlement(&mut self, profit: Decimal) -> Option<SessionOutcome> {
        self.session_profit += profit;
        if self.session_profit >= self.take_profit {
            Some(SessionOutcome::TakeProfit)
        } else if self.session_profit <= self.stop_loss {
            Some(SessionOutcome::StopLoss)
        } else {
            None
        }
    }

    /// Count a placement toward this session.
    pub fn record_trade(&mut self) {
        self.trade_count += 1;
    }

    /// Start the post-session cooldown.
    pub fn enter_cooldown(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let until = now + self.cooldown_duration;
        self.cooldown_until = Some(until);
        until
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown_until.is_some()
    }

    pub fn is_cooldown_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.cooldown_until, Some(until) if now >= until)
    }

    /// Start a brand-new session: profit and trade count to zero, cooldown
    /// cleared. Ladder/mode reset is the engine's job.
    pub fn reset(&mut self) {
        self.session_profit = Decimal::ZERO;
        self.trade_count = 0;
        self.cooldown_until = None;
    }

    pub fn session_profit(&self) -> Decimal {
        self.session_profit
    }

    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }
}
