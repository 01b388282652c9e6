//! Mode controller.
//!
//! Finite-state machine over {PRIMARY, RECOVERY}, each mode owning an
//! independently configured stake ladder. Transitions fire only on
//! settlement outcomes, never on unsettled ticks — the engine guarantees
//! that by construction.

use rust_decimal::Decimal;

use crate::strategy::ladder::StakeLadder;
use crate::types::Mode;

/// What a loss did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossOutcome {
    /// Climbed one rung within the active ladder.
    Escalated,
    /// PRIMARY ladder exhausted; now in RECOVERY at rung 0.
    SwitchedToRecovery,
    /// Ladder exhausted with nowhere to escalate; reset in place at rung 0.
    Saturated,
}

/// What a win did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinOutcome {
    /// Ladder reset; mode unchanged.
    LadderReset,
    /// RECOVERY succeeded; back in PRIMARY at rung 0.
    RecoveredToPrimary,
}

/// Owns the current mode and both ladders.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    primary: StakeLadder,
    recovery: StakeLadder,
    recovery_enabled: bool,
}

impl ModeController {
    pub fn new(
        primary_stakes: Vec<Decimal>,
        recovery_stakes: Vec<Decimal>,
        base_stake: Decimal,
        recovery_enabled: bool,
    ) -> Self {
        Self {
            mode: Mode::Primary,
            primary: StakeLadder::new(primary_stakes, base_stake),
            recovery: StakeLadder::new(recovery_stakes, base_stake),
            recovery_enabled,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Rung index of the active ladder.
    pub fn ladder_index(&self) -> usize {
        self.active().index()
    }

    /// Stake at the active ladder's current rung.
    pub fn current_stake(&self) -> Decimal {
        self.active().current_stake()
    }

    fn active(&self) -> &StakeLadder {
        match self.mode {
            Mode::Primary => &self.primary,
            Mode::Recovery => &self.recovery,
        }
    }

    /// Apply a winning settlement: reset ladders, and if the win happened in
    /// RECOVERY, revert to PRIMARY.
    pub fn apply_win(&mut self) -> WinOutcome {
        self.primary.on_win();
        self.recovery.on_win();
        match self.mode {
            Mode::Recovery => {
                self.mode = Mode::Primary;
                WinOutcome::RecoveredToPrimary
            }
            Mode::Primary => WinOutcome::LadderReset,
        }
    }

    /// Apply a losing settlement: climb the active ladder, switching to
    /// RECOVERY (or resetting in place) on overflow.
    pub fn apply_loss(&mut self) -> LossOutcome {
        match self.mode {
            Mode::Primary => {
                if self.primary.on_loss() {
                    self.primary.reset();
                    if self.recovery_enabled {
                        self.mode = Mode::Recovery;
                        self.recovery.reset();
                        LossOutcome::SwitchedToRecovery
                    } else {
                        LossOutcome::Saturated
                    }
                } else {
                    LossOutcome::Escalated
                }
            }
            Mode::Recovery => {
                if self.recovery.on_loss() {
                    // No further escalation exists past RECOVERY.
                    self.recovery.reset();
                    LossOutcome::Saturated
                } else {
                    LossOutcome::Escalated
                }
            }
        }
    }

    /// Return to the initial state: PRIMARY, both ladders at rung 0.
    pub fn reset(&mut self) {
        self.mode = Mode::Primary;
        self.primary.reset();
        self.recovery.reset();
    }
}
