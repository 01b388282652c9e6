//! Martingale stake ladder.
//!
//! An ordered sequence of stake amounts with a current index. A win resets
//! to the bottom rung; a loss climbs one rung. Climbing past the top rung
//! signals overflow — the caller (the mode controller) decides whether that
//! means a mode switch or an in-place reset.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A stake sequence with a cursor.
#[derive(Debug, Clone)]
pub struct StakeLadder {
    stakes: Vec<Decimal>,
    base_stake: Decimal,
    index: usize,
}

impl StakeLadder {
    pub fn new(stakes: Vec<Decimal>, base_stake: Decimal) -> Self {
        Self {
            stakes,
            base_stake,
            index: 0,
        }
    }

    /// The stake at the current rung. If the cursor is somehow past the end
    /// (transiently possible between an overflow and the caller's reset),
    /// falls back to twice the base stake.
    pub fn current_stake(&self) -> Decimal {
        self.stakes
            .get(self.index)
            .copied()
            .unwrap_or(self.base_stake * dec!(2))
    }

    /// A win drops back to the bottom rung.
    pub fn on_win(&mut self) {
        self.index = 0;
    }

    /// A loss climbs one rung. Returns true when the cursor has moved past
    /// the top rung; the caller must follow up with [`reset`](Self::reset)
    /// once it has decided what the overflow means.
    pub fn on_loss(&mut self) -> bool {
        self.index += 1;
        self.index >= self.stakes.len()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }
}
