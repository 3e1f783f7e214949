//! Per-team composure: a morale-like scalar that modulates contest volatility.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ComposureConfig;
use crate::constants::EXPLOSIVE_GAIN_YARDS;
use crate::play::{OutcomeKind, PlayOutcome};
use crate::state::{TeamPair, TeamSide};

/// Threshold state of a team's composure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComposureState {
    Tilt,
    Steady,
    Surge,
}

/// Contest modifiers derived from composure, bounded by the config range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volatility {
    /// Multiplier on fumble and miscue probabilities.
    pub miscue: f64,
    /// Multiplier on awareness-derived contest terms.
    pub awareness: f64,
}

impl Volatility {
    pub const CALM: Self = Self {
        miscue: 1.0,
        awareness: 1.0,
    };
}

impl Default for Volatility {
    fn default() -> Self {
        Self::CALM
    }
}

/// Composure for both teams, scoped to one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposureTracker {
    values: TeamPair<f64>,
    config: ComposureConfig,
}

impl ComposureTracker {
    #[must_use]
    pub fn new(config: &ComposureConfig) -> Self {
        Self {
            values: TeamPair::new(config.baseline, config.baseline),
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn value(&self, team: TeamSide) -> f64 {
        *self.values.get(team)
    }

    #[must_use]
    pub fn state(&self, team: TeamSide) -> ComposureState {
        let value = self.value(team);
        if value < self.config.tilt_below {
            ComposureState::Tilt
        } else if value > self.config.surge_above {
            ComposureState::Surge
        } else {
            ComposureState::Steady
        }
    }

    /// Contest modifiers for `team` at its current composure.
    #[must_use]
    pub fn volatility(&self, team: TeamSide) -> Volatility {
        let value = self.value(team);
        let cfg = &self.config;
        match self.state(team) {
            ComposureState::Steady => Volatility::CALM,
            ComposureState::Tilt => {
                let span = (cfg.tilt_below - cfg.floor).max(1.0);
                let depth = ((cfg.tilt_below - value) / span).clamp(0.0, 1.0);
                Volatility {
                    miscue: 0.5f64.mul_add(depth, 1.0),
                    awareness: 0.1f64.mul_add(-depth, 1.0),
                }
            }
            ComposureState::Surge => {
                let span = (cfg.ceiling - cfg.surge_above).max(1.0);
                let depth = ((value - cfg.surge_above) / span).clamp(0.0, 1.0);
                Volatility {
                    miscue: 0.25f64.mul_add(-depth, 1.0),
                    awareness: 0.06f64.mul_add(depth, 1.0),
                }
            }
        }
    }

    fn shift(&mut self, team: TeamSide, delta: f64) {
        let before = self.state(team);
        let (floor, ceiling) = (self.config.floor, self.config.ceiling);
        let value = self.values.get_mut(team);
        *value = (*value + delta).clamp(floor, ceiling);
        let after = self.state(team);
        if before != after {
            debug!(
                "composure {} {:?} -> {:?} ({:.1})",
                team.label(),
                before,
                after,
                self.value(team)
            );
        }
    }

    /// Apply swings for a resolved play.
    pub fn apply(&mut self, outcome: &PlayOutcome, points: Option<(TeamSide, u32)>) {
        let offense = outcome.offense;
        let defense = offense.opponent();
        let cfg = self.config.clone();
        if let Some((scorer, pts)) = points {
            let swing = match &outcome.kind {
                OutcomeKind::Touchdown
                | OutcomeKind::InterceptionReturnTouchdown { .. }
                | OutcomeKind::BlockedKickReturnTouchdown { .. }
                | OutcomeKind::MissedKickReturn { .. }
                | OutcomeKind::Punt { .. }
                    if pts > 2 =>
                {
                    cfg.touchdown_swing
                }
                OutcomeKind::DropKickGood { .. } | OutcomeKind::PlaceKickGood { .. } => {
                    cfg.kick_swing
                }
                _ => cfg.minor_swing,
            };
            self.shift(scorer, swing);
            self.shift(scorer.opponent(), -swing);
        }
        if outcome.is_turnover() {
            self.shift(defense, cfg.takeaway_gain);
            self.shift(offense, -cfg.giveaway_loss);
        }
        if matches!(
            outcome.kind,
            OutcomeKind::Sack | OutcomeKind::Safety { sack: true }
        ) {
            self.shift(defense, cfg.sack_gain);
            self.shift(offense, -cfg.sack_loss);
        }
        if matches!(outcome.kind, OutcomeKind::Gain) && outcome.yards >= EXPLOSIVE_GAIN_YARDS {
            self.shift(offense, cfg.explosive_swing);
            self.shift(defense, -cfg.explosive_swing);
        }
    }

    /// Close a fraction of each team's gap to baseline; run at every drive start.
    pub fn decay(&mut self) {
        let baseline = self.config.baseline;
        let rate = self.config.drive_decay;
        for team in TeamSide::ALL {
            let value = self.values.get_mut(team);
            *value += (baseline - *value) * rate;
        }
    }

    #[must_use]
    pub const fn values(&self) -> TeamPair<f64> {
        self.values
    }
}
