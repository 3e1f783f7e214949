//! Field position policy: Delta Yards restarts and bonus possessions.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::constants::FIELD_LENGTH;
use crate::state::TeamSide;

/// Starting spot for a team whose score differential is `differential`
/// (own points minus opponent points). Recomputed from the live score at
/// every restart.
#[must_use]
pub fn delta_start(differential: i32, cfg: &FieldConfig) -> i32 {
    let base = cfg.delta_base;
    let spot = match differential {
        d if d > 0 => base.saturating_sub(d).max(1),
        d if d < 0 => base.saturating_add(d.saturating_neg()).min(cfg.trailing_cap),
        _ => base,
    };
    spot.clamp(1, FIELD_LENGTH - 1)
}

/// An extra possession owed to a team that threw an interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusEntry {
    /// The intercepted team, who will receive the possession.
    pub beneficiary: TeamSide,
    /// The team whose next completed drive triggers the grant.
    pub interceptor: TeamSide,
    /// True once the interceptor has started the drive that triggers the grant.
    pub armed: bool,
}

/// Pending bonus possessions, at most one per beneficiary.
///
/// An entry waits until the interceptor completes its next drive. It then
/// becomes owed: the beneficiary plays its natural next possession and the
/// bonus drive follows it, before the ball changes hands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusQueue {
    pending: Vec<BonusEntry>,
    owed: Vec<TeamSide>,
    queued: u32,
    granted: u32,
    cancelled: u32,
}

impl BonusQueue {
    /// Record an interception thrown by `thrower`.
    ///
    /// Any bonus the thrower was owed as interceptor-in-waiting is cancelled
    /// first: a bonus earned against the thrower is void once the thrower
    /// gives the ball away itself. Returns whether a new entry was queued.
    pub fn on_interception(&mut self, thrower: TeamSide) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.interceptor != thrower);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            self.cancelled += u32::try_from(dropped).unwrap_or(u32::MAX);
            debug!("bonus for {} cancelled", thrower.opponent().label());
        }
        self.queue(thrower, thrower.opponent())
    }

    /// Queue a bonus for `beneficiary`; a second one, pending or owed, does not stack.
    pub fn queue(&mut self, beneficiary: TeamSide, interceptor: TeamSide) -> bool {
        if self.is_owed(beneficiary)
            || self.pending.iter().any(|e| e.beneficiary == beneficiary)
        {
            return false;
        }
        self.pending.push(BonusEntry {
            beneficiary,
            interceptor,
            armed: false,
        });
        self.queued += 1;
        true
    }

    /// Note that `team` started a drive; arms entries it triggers.
    pub fn on_drive_start(&mut self, team: TeamSide) {
        for entry in &mut self.pending {
            if entry.interceptor == team {
                entry.armed = true;
            }
        }
    }

    /// `team` finished a drive. Every armed entry it triggers becomes owed;
    /// returns the beneficiaries that moved.
    pub fn settle(&mut self, team: TeamSide) -> Vec<TeamSide> {
        let mut moved = Vec::new();
        self.pending.retain(|e| {
            if e.interceptor == team && e.armed {
                moved.push(e.beneficiary);
                false
            } else {
                true
            }
        });
        for beneficiary in &moved {
            if !self.owed.contains(beneficiary) {
                self.owed.push(*beneficiary);
            }
        }
        moved
    }

    /// Claim the bonus drive owed to `team`, if any.
    pub fn take_owed(&mut self, team: TeamSide) -> bool {
        let Some(index) = self.owed.iter().position(|t| *t == team) else {
            return false;
        };
        self.owed.remove(index);
        self.granted += 1;
        true
    }

    /// Drop every pending and owed entry (half or game over).
    pub fn cancel_all(&mut self) {
        let dropped = self.pending.len() + self.owed.len();
        self.cancelled += u32::try_from(dropped).unwrap_or(u32::MAX);
        self.pending.clear();
        self.owed.clear();
    }

    #[must_use]
    pub fn is_owed(&self, team: TeamSide) -> bool {
        self.owed.contains(&team)
    }

    #[must_use]
    pub fn pending_for(&self, beneficiary: TeamSide) -> Option<&BonusEntry> {
        self.pending.iter().find(|e| e.beneficiary == beneficiary)
    }

    #[must_use]
    pub fn pending(&self) -> &[BonusEntry] {
        &self.pending
    }

    #[must_use]
    pub const fn queued(&self) -> u32 {
        self.queued
    }

    #[must_use]
    pub const fn granted(&self) -> u32 {
        self.granted
    }

    #[must_use]
    pub const fn cancelled(&self) -> u32 {
        self.cancelled
    }
}
