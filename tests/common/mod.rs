//! Mock broker for integration testing.
//!
//! Provides a deterministic `BrokerClient` implementation that accepts
//! placements, hands out sequential contract ids, and settles contracts
//! exactly when the test script says so — all in-memory with no external
//! dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use pulse::broker::BrokerClient;
use pulse::types::{ContractType, Settlement, TradePlacement};

/// A placement the mock accepted, in order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub contract_id: String,
    pub contract_type: ContractType,
    pub stake: Decimal,
    pub barrier: Option<u8>,
}

/// A mock broker for deterministic testing.
///
/// All state is in-memory. Settlements are scripted per contract id from
/// test code; until scripted, a contract polls as "no data yet".
pub struct MockBroker {
    next_id: Mutex<u64>,
    placements: Mutex<Vec<PlacedOrder>>,
    settlements: Mutex<HashMap<String, Settlement>>,
    /// If set, all operations will return this error.
    force_error: Mutex<Option<String>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(0),
            placements: Mutex::new(Vec::new()),
            settlements: Mutex::new(HashMap::new()),
            force_error: Mutex::new(None),
        }
    }

    /// Script a contract to settle with the given profit on the next poll.
    pub fn settle(&self, contract_id: &str, profit: Decimal) {
        self.settlements.lock().unwrap().insert(
            contract_id.to_string(),
            Settlement {
                is_settled: true,
                profit,
                status: if profit > Decimal::ZERO { "won" } else { "lost" }.to_string(),
            },
        );
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// All placements recorded so far, in order.
    pub fn placed(&self) -> Vec<PlacedOrder> {
        self.placements.lock().unwrap().clone()
    }

    /// Contract id of the most recent placement.
    pub fn last_contract_id(&self) -> String {
        self.placements
            .lock()
            .unwrap()
            .last()
            .expect("no placements recorded")
            .contract_id
            .clone()
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerClient for MockBroker {
    async fn place_trade(
        &self,
        contract_type: ContractType,
        stake: Decimal,
        _duration: u32,
        _duration_unit: char,
        barrier: Option<u8>,
    ) -> Result<TradePlacement> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let contract_id = format!("MOCK-{}", *next);

        self.placements.lock().unwrap().push(PlacedOrder {
            contract_id: contract_id.clone(),
            contract_type,
            stake,
            barrier,
        });

        Ok(TradePlacement {
            contract_id,
            price: stake,
        })
    }

    async fn check_settlement(&self, contract_id: &str) -> Result<Option<Settlement>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self.settlements.lock().unwrap().get(contract_id).cloned())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
