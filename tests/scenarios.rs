//! End-to-end engine scenarios.
//!
//! Drives the full engine with synthetic ticks against the scripted mock
//! broker: ladder progression, session thresholds, cooldown behavior, mode
//! switching, hedge-pair settlement, and the rate limiter.

mod common;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use common::MockBroker;
use pulse::config::EngineConfig;
use pulse::engine::TradeEngine;
use pulse::events::EventLog;
use pulse::types::{ContractType, EngineStatus, Mode, SessionOutcome, Tick};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A tick whose 2-dp quote ends in `digit`, at `secs` on the epoch clock.
fn tick_at(secs: i64, digit: u8) -> Tick {
    Tick::new(
        dec!(1234) + Decimal::new(digit as i64, 2),
        Utc.timestamp_opt(secs, 0).unwrap(),
    )
}

fn engine_with(broker: Arc<MockBroker>, cfg: EngineConfig) -> (TradeEngine, Arc<EventLog>) {
    let events = Arc::new(EventLog::new());
    let engine = TradeEngine::new(cfg, broker, events.clone()).expect("valid test config");
    (engine, events)
}

fn base_config() -> EngineConfig {
    EngineConfig {
        primary_stakes: vec![dec!(1), dec!(2), dec!(4)],
        recovery_stakes: vec![dec!(2), dec!(3)],
        base_stake: dec!(1),
        take_profit: dec!(100),
        stop_loss: dec!(-100),
        min_interval_ms: 2_000,
        cooldown_ms: 120_000,
        trigger_digit: 1,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Scenario A — ladder progression and session accounting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_two_losses_then_win() {
    let broker = Arc::new(MockBroker::new());
    let (mut engine, _) = engine_with(broker.clone(), base_config());
    engine.start();

    // First trade at stake 1 loses
    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-1));
    engine.on_tick(tick_at(3, 0)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.session_profit, dec!(-1));
    assert_eq!(snap.current_stake, dec!(2));

    // Second trade at stake 2 loses
    engine.on_tick(tick_at(6, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-1));
    engine.on_tick(tick_at(9, 0)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.session_profit, dec!(-2));
    assert_eq!(snap.current_stake, dec!(4));

    // Third trade at stake 4 wins
    engine.on_tick(tick_at(12, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(8));
    engine.on_tick(tick_at(15, 0)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.session_profit, dec!(6));
    assert_eq!(snap.current_stake, dec!(1));
    assert_eq!(snap.ladder_index, 0);

    // The broker saw exactly the ladder's stake sequence
    let stakes: Vec<Decimal> = broker.placed().iter().map(|p| p.stake).collect();
    assert_eq!(stakes, vec![dec!(1), dec!(2), dec!(4)]);
}

// ---------------------------------------------------------------------------
// Scenario B — stop-loss ends the session and suppresses signals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_b_stop_loss_enters_cooldown() {
    let broker = Arc::new(MockBroker::new());
    let cfg = EngineConfig {
        primary_stakes: vec![dec!(5), dec!(5), dec!(5)],
        stop_loss: dec!(-10),
        ..base_config()
    };
    let (mut engine, _) = engine_with(broker.clone(), cfg);
    engine.start();

    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-4));
    engine.on_tick(tick_at(3, 0)).await;

    engine.on_tick(tick_at(6, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-6));
    engine.on_tick(tick_at(9, 0)).await;

    // Cumulative -10 hit the stop-loss exactly
    assert_eq!(engine.status(), EngineStatus::Cooldown);
    let sessions = engine.drain_completed_sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].outcome, SessionOutcome::StopLoss);
    assert_eq!(sessions[0].profit, dec!(-10));

    // An otherwise-valid signal tick during cooldown places nothing
    engine.on_tick(tick_at(12, 1)).await;
    assert_eq!(broker.placed().len(), 2);
    assert_eq!(engine.status(), EngineStatus::Cooldown);
}

#[tokio::test]
async fn cooldown_expiry_resets_session_and_resumes() {
    let broker = Arc::new(MockBroker::new());
    let cfg = EngineConfig {
        primary_stakes: vec![dec!(5)],
        stop_loss: dec!(-4),
        recovery_enabled: false,
        recovery_stakes: vec![],
        cooldown_ms: 120_000,
        ..base_config()
    };
    let (mut engine, _) = engine_with(broker.clone(), cfg);
    engine.start();

    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-5));
    engine.on_tick(tick_at(3, 0)).await;
    assert_eq!(engine.status(), EngineStatus::Cooldown);

    // Cooldown runs from t=3 for 120s; t=60 is still suppressed
    engine.on_tick(tick_at(60, 1)).await;
    assert_eq!(broker.placed().len(), 1);

    // Expiry resets profit and mode and allows trading again
    engine.on_tick(tick_at(123, 0)).await;
    assert_eq!(engine.status(), EngineStatus::Running);
    let snap = engine.snapshot();
    assert_eq!(snap.session_profit, Decimal::ZERO);
    assert_eq!(snap.mode, Mode::Primary);
    assert_eq!(snap.trade_count, 0);

    engine.on_tick(tick_at(126, 1)).await;
    assert_eq!(broker.placed().len(), 2);
}

// ---------------------------------------------------------------------------
// Scenario C — primary ladder overflow switches to recovery hedging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_c_overflow_produces_hedge_pair() {
    let broker = Arc::new(MockBroker::new());
    let cfg = EngineConfig {
        primary_stakes: vec![dec!(1)],
        recovery_stakes: vec![dec!(2), dec!(3)],
        ..base_config()
    };
    let (mut engine, events) = engine_with(broker.clone(), cfg);
    engine.start();

    // Single-rung primary ladder: one loss overflows straight to RECOVERY
    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-1));
    engine.on_tick(tick_at(3, 0)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.mode, Mode::Recovery);
    assert_eq!(snap.ladder_index, 0);
    assert!(events
        .entries()
        .iter()
        .any(|e| e.message.contains("PRIMARY → RECOVERY")));

    // The next trigger tick places both hedge legs at the recovery stake
    engine.on_tick(tick_at(6, 1)).await;
    let placed = broker.placed();
    assert_eq!(placed.len(), 3);
    assert_eq!(placed[1].contract_type, ContractType::DigitOver);
    assert_eq!(placed[1].barrier, Some(5));
    assert_eq!(placed[2].contract_type, ContractType::DigitUnder);
    assert_eq!(placed[2].barrier, Some(6));
    assert_eq!(placed[1].stake, dec!(2));
    assert_eq!(placed[2].stake, dec!(2));
    assert_eq!(engine.status(), EngineStatus::AwaitingSettlement);
    assert_eq!(engine.snapshot().open_contracts.len(), 2);
}

// ---------------------------------------------------------------------------
// Scenario D — a recovery win reverts to primary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_d_recovery_win_reverts_to_primary() {
    let broker = Arc::new(MockBroker::new());
    let cfg = EngineConfig {
        primary_stakes: vec![dec!(1)],
        recovery_stakes: vec![dec!(2), dec!(3)],
        ..base_config()
    };
    let (mut engine, _) = engine_with(broker.clone(), cfg);
    engine.start();

    // Into RECOVERY via an immediate overflow
    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-1));
    engine.on_tick(tick_at(3, 0)).await;

    // Escalate the recovery ladder so the win isn't from rung 0
    engine.on_tick(tick_at(6, 1)).await;
    let placed = broker.placed();
    broker.settle(&placed[1].contract_id, dec!(-2));
    broker.settle(&placed[2].contract_id, dec!(-2));
    engine.on_tick(tick_at(9, 0)).await;
    assert_eq!(engine.snapshot().ladder_index, 1);

    // Hedge pair nets positive this time
    engine.on_tick(tick_at(12, 1)).await;
    let placed = broker.placed();
    broker.settle(&placed[3].contract_id, dec!(6));
    broker.settle(&placed[4].contract_id, dec!(-3));
    engine.on_tick(tick_at(15, 0)).await;

    let snap = engine.snapshot();
    assert_eq!(snap.mode, Mode::Primary);
    assert_eq!(snap.ladder_index, 0);
    // -1 -4 +3 across the session
    assert_eq!(snap.session_profit, dec!(-2));
}

// ---------------------------------------------------------------------------
// Idempotence and partial settlement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsettled_polls_never_mutate_state() {
    let broker = Arc::new(MockBroker::new());
    let (mut engine, _) = engine_with(broker.clone(), base_config());
    engine.start();

    engine.on_tick(tick_at(0, 1)).await;
    let before = engine.snapshot();

    for secs in [3, 6, 9, 12] {
        engine.on_tick(tick_at(secs, 1)).await;
        let after = engine.snapshot();
        assert_eq!(after.session_profit, before.session_profit);
        assert_eq!(after.ladder_index, before.ladder_index);
        assert_eq!(after.mode, before.mode);
        assert_eq!(after.trade_count, before.trade_count);
        assert_eq!(after.status, EngineStatus::AwaitingSettlement);
    }
    // Still exactly one placement despite four trigger digits
    assert_eq!(broker.placed().len(), 1);
}

#[tokio::test]
async fn partial_hedge_settlement_applies_nothing() {
    let broker = Arc::new(MockBroker::new());
    let cfg = EngineConfig {
        primary_stakes: vec![dec!(1)],
        recovery_stakes: vec![dec!(2)],
        ..base_config()
    };
    let (mut engine, _) = engine_with(broker.clone(), cfg);
    engine.start();

    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(-1));
    engine.on_tick(tick_at(3, 0)).await;
    engine.on_tick(tick_at(6, 1)).await; // hedge pair placed

    // Only the OVER leg settles
    let placed = broker.placed();
    broker.settle(&placed[1].contract_id, dec!(4));

    engine.on_tick(tick_at(9, 0)).await;
    engine.on_tick(tick_at(12, 0)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.session_profit, dec!(-1)); // untouched
    assert_eq!(snap.mode, Mode::Recovery);
    assert_eq!(snap.status, EngineStatus::AwaitingSettlement);
    assert_eq!(snap.open_contracts.len(), 1);

    // The UNDER leg settles; exactly one combined update lands
    broker.settle(&placed[2].contract_id, dec!(-2));
    engine.on_tick(tick_at(15, 0)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.session_profit, dec!(1)); // -1 + (4 - 2)
    assert_eq!(snap.mode, Mode::Primary); // net win recovered
    assert_eq!(snap.status, EngineStatus::Running);
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn placements_respect_min_interval() {
    let broker = Arc::new(MockBroker::new());
    let (mut engine, _) = engine_with(broker.clone(), base_config());
    engine.start();

    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(1));
    engine.on_tick(tick_at(1, 0)).await; // settles, stamps t=1

    // t=2 is inside the 2s window from the settlement stamp
    engine.on_tick(tick_at(2, 1)).await;
    assert_eq!(broker.placed().len(), 1);

    // t=3 is at the boundary — allowed
    engine.on_tick(tick_at(3, 1)).await;
    assert_eq!(broker.placed().len(), 2);
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn placement_failure_is_retried_on_next_signal() {
    let broker = Arc::new(MockBroker::new());
    let (mut engine, _) = engine_with(broker.clone(), base_config());
    engine.start();

    broker.set_error("gateway unreachable");
    engine.on_tick(tick_at(0, 1)).await;
    assert!(broker.placed().is_empty());
    assert_eq!(engine.status(), EngineStatus::Running);
    assert_eq!(engine.snapshot().trade_count, 0);

    broker.clear_error();
    engine.on_tick(tick_at(3, 1)).await;
    assert_eq!(broker.placed().len(), 1);
    assert_eq!(engine.snapshot().trade_count, 1);
}

#[tokio::test]
async fn settlement_failure_keeps_position_open() {
    let broker = Arc::new(MockBroker::new());
    let (mut engine, _) = engine_with(broker.clone(), base_config());
    engine.start();

    engine.on_tick(tick_at(0, 1)).await;
    broker.settle(&broker.last_contract_id(), dec!(1));

    broker.set_error("gateway unreachable");
    engine.on_tick(tick_at(3, 0)).await;
    assert_eq!(engine.status(), EngineStatus::AwaitingSettlement);
    assert_eq!(engine.snapshot().session_profit, Decimal::ZERO);

    broker.clear_error();
    engine.on_tick(tick_at(6, 0)).await;
    assert_eq!(engine.status(), EngineStatus::Running);
    assert_eq!(engine.snapshot().session_profit, dec!(1));
}

// ---------------------------------------------------------------------------
// Recovery disabled
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recovery_disabled_never_hedges() {
    let broker = Arc::new(MockBroker::new());
    let cfg = EngineConfig {
        primary_stakes: vec![dec!(1)],
        recovery_stakes: vec![],
        recovery_enabled: false,
        ..base_config()
    };
    let (mut engine, _) = engine_with(broker.clone(), cfg);
    engine.start();

    // Overflow the single-rung ladder twice
    for start in [0, 6] {
        engine.on_tick(tick_at(start, 1)).await;
        broker.settle(&broker.last_contract_id(), dec!(-1));
        engine.on_tick(tick_at(start + 3, 0)).await;
        assert_eq!(engine.snapshot().mode, Mode::Primary);
        assert_eq!(engine.snapshot().ladder_index, 0);
    }

    // Every placement stayed a single DIGITODD
    let placed = broker.placed();
    assert_eq!(placed.len(), 2);
    assert!(placed
        .iter()
        .all(|p| p.contract_type == ContractType::DigitOdd && p.barrier.is_none()));
}
