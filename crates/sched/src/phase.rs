//! Tick phases and subscriber capability sets.
//!
//! A tick is one full pass through fixed -> early -> main -> late. A
//! subscriber declares which phases it participates in once, as a
//! [`PhaseSet`]; entries consult that declared set at registration time
//! and again when deferred mutations are applied, so no dynamic type
//! inspection is ever needed.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One of the four per-tick execution phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Fixed-step simulation phase (physics cadence).
    Fixed,
    /// Early per-frame phase, before the main phase.
    Early,
    /// Main per-frame phase.
    Main,
    /// Late per-frame phase, after all main work.
    Late,
}

impl Phase {
    /// All phases in per-tick execution order.
    pub const ALL: [Phase; 4] = [Phase::Fixed, Phase::Early, Phase::Main, Phase::Late];

    /// The singleton capability set for this phase.
    pub fn as_set(self) -> PhaseSet {
        match self {
            Phase::Fixed => PhaseSet::FIXED,
            Phase::Early => PhaseSet::EARLY,
            Phase::Main => PhaseSet::MAIN,
            Phase::Late => PhaseSet::LATE,
        }
    }

    /// Dense index used for per-phase membership storage.
    pub(crate) fn index(self) -> usize {
        match self {
            Phase::Fixed => 0,
            Phase::Early => 1,
            Phase::Main => 2,
            Phase::Late => 3,
        }
    }
}

bitflags! {
    /// The set of phases a subscriber participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhaseSet: u8 {
        /// Participates in the fixed phase.
        const FIXED = 1 << 0;
        /// Participates in the early phase.
        const EARLY = 1 << 1;
        /// Participates in the main phase.
        const MAIN = 1 << 2;
        /// Participates in the late phase.
        const LATE = 1 << 3;
    }
}

impl PhaseSet {
    /// Whether the set contains `phase`.
    pub fn has(self, phase: Phase) -> bool {
        self.contains(phase.as_set())
    }
}
