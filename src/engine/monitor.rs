//! Contract monitor.
//!
//! Tracks the outstanding position(s) — one in PRIMARY, up to two in
//! RECOVERY — and polls the broker for settlement. Settled legs are banked
//! internally; a combined outcome is reported only once, when the last
//! outstanding leg closes. Until then, polling never mutates anything
//! outside this struct, which is what makes repeated polls idempotent with
//! respect to ladder, mode, and session state.

use rust_decimal::Decimal;
use tracing::warn;

use crate::broker::BrokerClient;
use crate::types::OpenPosition;

/// The aggregate result of a fully settled position set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedSettlement {
    /// Summed realized profit across all legs.
    pub profit: Decimal,
    pub legs: usize,
}

/// What one polling pass observed.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Legs that settled during this pass: (contract id, realized profit).
    pub newly_settled: Vec<(String, Decimal)>,
    /// Present when no open legs remain; the signal to apply win/loss rules.
    pub completed: Option<CombinedSettlement>,
}

#[derive(Debug, Default)]
pub struct ContractMonitor {
    open: Vec<OpenPosition>,
    banked: Vec<(String, Decimal)>,
}

impl ContractMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin monitoring a freshly placed position.
    pub fn track(&mut self, position: OpenPosition) {
        self.open.push(position);
    }

    /// True while any leg is still awaiting settlement.
    pub fn is_waiting(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn open_positions(&self) -> &[OpenPosition] {
        &self.open
    }

    /// Poll every open leg once. A broker failure on one leg leaves that leg
    /// open for the next pass; it never aborts the others.
    pub async fn poll(&mut self, broker: &dyn BrokerClient) -> PollOutcome {
        let mut newly_settled = Vec::new();
        let mut still_open = Vec::new();

        for position in self.open.drain(..) {
            match broker.check_settlement(&position.contract_id).await {
                Ok(Some(settlement)) if settlement.is_settled => {
                    newly_settled.push((position.contract_id.clone(), settlement.profit));
                    self.banked.push((position.contract_id, settlement.profit));
                }
                Ok(_) => still_open.push(position),
                Err(e) => {
                    warn!(
                        contract_id = %position.contract_id,
                        error = %e,
                        "Settlement check failed, retrying next cycle"
                    );
                    still_open.push(position);
                }
            }
        }
        self.open = still_open;

        let completed = if self.open.is_empty() && !self.banked.is_empty() {
            let profit = self.banked.iter().map(|(_, p)| *p).sum();
            let legs = self.banked.len();
            self.banked.clear();
            Some(CombinedSettlement { profit, legs })
        } else {
            None
        };

        PollOutcome {
            newly_settled,
            completed,
        }
    }

    /// Stop tracking everything. Returns the contract ids that were still
    /// open so the caller can report them as abandoned.
    pub fn abandon(&mut self) -> Vec<String> {
        self.banked.clear();
        self.open.drain(..).map(|p| p.contract_id).collect()
    }
}
