//! HTTP gateway broker client.
//!
//! Talks JSON to a broker gateway exposing the usual two-step
//! proposal → buy flow and an open-contract settlement query. The API token
//! is held as a `SecretString` and attached as a bearer header; it never
//! appears in logs or serialized payloads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::broker::BrokerClient;
use crate::config::GatewayConfig;
use crate::types::{ContractType, EngineError, Settlement, TradePlacement};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProposalResponse {
    error: Option<ApiError>,
    proposal: Option<Proposal>,
}

#[derive(Debug, Deserialize)]
struct Proposal {
    id: String,
    #[allow(dead_code)]
    ask_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct BuyResponse {
    error: Option<ApiError>,
    buy: Option<BuyReceipt>,
}

#[derive(Debug, Deserialize)]
struct BuyReceipt {
    contract_id: String,
    buy_price: Decimal,
}

#[derive(Debug, Deserialize)]
struct OpenContractResponse {
    proposal_open_contract: Option<OpenContract>,
}

#[derive(Debug, Deserialize)]
struct OpenContract {
    is_sold: bool,
    profit: Decimal,
    status: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    symbol: String,
    token: SecretString,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig, symbol: String, token: SecretString) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            symbol,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Proposal request body for a contract. Barrier is attached only for
    /// OVER/UNDER contracts.
    fn proposal_payload(
        &self,
        contract_type: ContractType,
        stake: Decimal,
        duration: u32,
        duration_unit: char,
        barrier: Option<u8>,
    ) -> serde_json::Value {
        let mut payload = json!({
            "app_id": self.app_id,
            "contract_type": contract_type.api_name(),
            "symbol": self.symbol,
            "duration": duration,
            "duration_unit": duration_unit.to_string(),
            "basis": "stake",
            "amount": stake,
        });
        if let Some(b) = barrier {
            payload["barrier"] = json!(b.to_string());
        }
        payload
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(self.token.expose_secret())
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Gateway request failed: {path}"))?
            .error_for_status()
            .with_context(|| format!("Gateway returned error status: {path}"))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode gateway response: {path}"))
    }
}

#[async_trait]
impl BrokerClient for GatewayClient {
    async fn place_trade(
        &self,
        contract_type: ContractType,
        stake: Decimal,
        duration: u32,
        duration_unit: char,
        barrier: Option<u8>,
    ) -> Result<TradePlacement> {
        let payload = self.proposal_payload(contract_type, stake, duration, duration_unit, barrier);
        let proposal: ProposalResponse = self.post("proposal", &payload).await?;

        if let Some(err) = proposal.error {
            return Err(EngineError::Placement {
                message: err.message,
            }
            .into());
        }
        let proposal = proposal.proposal.ok_or_else(|| EngineError::Placement {
            message: "gateway returned neither proposal nor error".into(),
        })?;

        let buy: BuyResponse = self
            .post("buy", &json!({ "buy": proposal.id, "price": stake }))
            .await?;

        if let Some(err) = buy.error {
            return Err(EngineError::Placement {
                message: err.message,
            }
            .into());
        }
        let receipt = buy.buy.ok_or_else(|| EngineError::Placement {
            message: "gateway returned neither receipt nor error".into(),
        })?;

        debug!(
            contract_id = %receipt.contract_id,
            price = %receipt.buy_price,
            "Contract bought"
        );

        Ok(TradePlacement {
            contract_id: receipt.contract_id,
            price: receipt.buy_price,
        })
    }

    async fn check_settlement(&self, contract_id: &str) -> Result<Option<Settlement>> {
        let response: OpenContractResponse = self
            .post(
                "proposal_open_contract",
                &json!({ "contract_id": contract_id }),
            )
            .await?;

        Ok(response.proposal_open_contract.map(|c| Settlement {
            is_settled: c.is_sold,
            profit: c.profit,
            status: c.status,
        }))
    }

    fn name(&self) -> &str {
        "gateway"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
