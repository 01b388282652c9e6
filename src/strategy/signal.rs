//! Signal evaluation.
//!
//! Pure function of (mode, tick): fires when the tick's signal digit equals
//! the configured trigger digit. PRIMARY produces a single DIGITODD
//! instruction; RECOVERY produces the hedge pair — DIGITOVER with barrier 5
//! and DIGITUNDER with barrier 6 — intended to profit regardless of
//! short-term direction.

use rust_decimal::Decimal;

use crate::types::{ContractType, Mode, Tick, TradeInstruction};

/// Barrier for the recovery OVER leg.
const OVER_BARRIER: u8 = 5;
/// Barrier for the recovery UNDER leg.
const UNDER_BARRIER: u8 = 6;

#[derive(Debug, Clone, Copy)]
pub struct SignalEvaluator {
    trigger_digit: u8,
}

impl SignalEvaluator {
    pub fn new(trigger_digit: u8) -> Self {
        Self { trigger_digit }
    }

    pub fn trigger_digit(&self) -> u8 {
        self.trigger_digit
    }

    /// Evaluate one tick. Returns the instruction(s) to place, or None when
    /// the digit does not trigger. No side effects.
    pub fn evaluate(&self, mode: Mode, tick: Tick, stake: Decimal) -> Option<Vec<TradeInstruction>> {
        if tick.signal_digit() != self.trigger_digit {
            return None;
        }

        let instructions = match mode {
            Mode::Primary => vec![TradeInstruction {
                contract_type: ContractType::DigitOdd,
                barrier: None,
                stake,
            }],
            Mode::Recovery => vec![
                TradeInstruction {
                    contract_type: ContractType::DigitOver,
                    barrier: Some(OVER_BARRIER),
                    stake,
                },
                TradeInstruction {
                    contract_type: ContractType::DigitUnder,
                    barrier: Some(UNDER_BARRIER),
                    stake,
                },
            ],
        };

        Some(instructions)
    }
}
