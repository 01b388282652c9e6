//! PULSE — Autonomous Digit-Trading Engine for Synthetic Indices
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the broker gateway, engine, and control panel together, and runs
//! the single-consumer tick loop with graceful shutdown.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use pulse::broker::gateway::GatewayClient;
use pulse::broker::BrokerClient;
use pulse::config::AppConfig;
use pulse::engine::TradeEngine;
use pulse::events::EventLog;
use pulse::panel;
use pulse::panel::routes::PanelState;
use pulse::storage;
use pulse::types::Tick;

const BANNER: &str = r#"
 ____  _   _ _     ____  _____
|  _ \| | | | |   / ___|| ____|
| |_) | | | | |   \___ \|  _|
|  __/| |_| | |___ ___) | |___
|_|    \___/|_____|____/|_____|

  Autonomous Digit-Trading Engine for Synthetic Indices
  v0.1.0
"#;

/// Tick channel depth. The engine drains one tick at a time; a burst beyond
/// this simply backpressures the transport shell.
const TICK_CHANNEL_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load and validate configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        symbol = %cfg.engine.symbol,
        trigger_digit = cfg.engine.trigger_digit,
        take_profit = %cfg.engine.take_profit,
        stop_loss = %cfg.engine.stop_loss,
        recovery = cfg.engine.recovery_enabled,
        "PULSE starting up"
    );

    // -- Initialise components -------------------------------------------

    let token = match AppConfig::resolve_env(&cfg.gateway.api_token_env) {
        Ok(value) => SecretString::new(value),
        Err(_) => {
            warn!(
                env = %cfg.gateway.api_token_env,
                "No API token configured — placements will fail until it is set"
            );
            SecretString::new(String::new())
        }
    };

    let broker: Arc<dyn BrokerClient> = Arc::new(GatewayClient::new(
        &cfg.gateway,
        cfg.engine.symbol.clone(),
        token,
    )?);
    info!(
        broker = broker.name(),
        gateway = %cfg.gateway.base_url,
        "Broker gateway initialised"
    );

    let events = Arc::new(EventLog::new());
    let engine = TradeEngine::new(cfg.engine.clone(), broker, events.clone())?;

    let (tick_tx, mut tick_rx) = mpsc::channel::<Tick>(TICK_CHANNEL_DEPTH);
    let state = Arc::new(PanelState {
        engine: Mutex::new(engine),
        events,
        tick_tx,
        engine_config: cfg.engine.clone(),
    });

    if cfg.panel.enabled {
        panel::spawn_panel(state.clone(), cfg.panel.port)?;
    }

    // -- Tick loop --------------------------------------------------------

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering tick loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            maybe_tick = tick_rx.recv() => {
                let Some(tick) = maybe_tick else { break };

                // One tick processed to completion before the next; the
                // panel takes the same lock for start/stop/status.
                let mut engine = state.engine.lock().await;
                engine.on_tick(tick).await;
                let completed = engine.drain_completed_sessions();
                drop(engine);

                if let Err(e) = storage::archive_sessions(&completed, None) {
                    error!(error = %e, "Failed to archive sessions");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // -- Shutdown ----------------------------------------------------------

    let mut engine = state.engine.lock().await;
    engine.stop();
    let completed = engine.drain_completed_sessions();
    let snapshot = engine.snapshot();
    drop(engine);

    storage::archive_sessions(&completed, None)?;
    info!(
        session_profit = %snapshot.session_profit,
        trades = snapshot.trade_count,
        "PULSE shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pulse=info"));

    let json_logging = std::env::var("PULSE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
