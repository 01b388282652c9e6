//! Broker integration.
//!
//! Defines the `BrokerClient` trait the engine trades through. The
//! production implementation is an HTTP gateway client; tests provide a
//! deterministic in-memory broker. Both placement and settlement checks are
//! fallible and asynchronous; the engine treats any failure as transient
//! and retries on the next eligible tick.

pub mod gateway;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{ContractType, Settlement, TradePlacement};

/// Abstraction over the broker's trade API.
///
/// Implementors place binary-option contracts and report their settlement
/// state. `check_settlement` returning `Ok(None)` means the broker had no
/// data for the contract yet — not an error, poll again next cycle.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Place a contract. Returns the broker's contract id and fill price.
    async fn place_trade(
        &self,
        contract_type: ContractType,
        stake: Decimal,
        duration: u32,
        duration_unit: char,
        barrier: Option<u8>,
    ) -> Result<TradePlacement>;

    /// Query the settlement state of an outstanding contract.
    async fn check_settlement(&self, contract_id: &str) -> Result<Option<Settlement>>;

    /// Broker name for logging and identification.
    fn name(&self) -> &str;
}
