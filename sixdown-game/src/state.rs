//! Possession state owned by the drive state machine.
use serde::{Deserialize, Serialize};

use crate::constants::{DOWNS_PER_SERIES, FIELD_LENGTH, KICK_MODE_DOWN};
use crate::error::InvariantViolation;
use crate::field::BonusQueue;

/// One of the two teams in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub const ALL: [Self; 2] = [Self::Home, Self::Away];

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

/// A value held once per team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPair<T> {
    pub home: T,
    pub away: T,
}

impl<T> TeamPair<T> {
    pub const fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub const fn get(&self, side: TeamSide) -> &T {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn get_mut(&mut self, side: TeamSide) -> &mut T {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(TeamSide, &T) -> U) -> TeamPair<U> {
        TeamPair {
            home: f(TeamSide::Home, &self.home),
            away: f(TeamSide::Away, &self.away),
        }
    }
}

/// Running score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    #[must_use]
    pub const fn of(&self, side: TeamSide) -> u32 {
        match side {
            TeamSide::Home => self.home,
            TeamSide::Away => self.away,
        }
    }

    pub fn add(&mut self, side: TeamSide, points: u32) {
        match side {
            TeamSide::Home => self.home = self.home.saturating_add(points),
            TeamSide::Away => self.away = self.away.saturating_add(points),
        }
    }

    /// Points `side` leads by; negative when trailing.
    #[must_use]
    pub fn differential(&self, side: TeamSide) -> i32 {
        let own = i64::from(self.of(side));
        let opp = i64::from(self.of(side.opponent()));
        i32::try_from(own - opp).unwrap_or(if own > opp { i32::MAX } else { i32::MIN })
    }
}

/// Which part of a series the offense is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesPhase {
    /// Downs 1-3.
    Advancing,
    /// Down 4, where kick-mode is decided.
    Decision,
    /// Downs 5-6 after committing to kick-mode.
    Specialist,
}

/// Mutable game state. Field position is measured from the possessing
/// team's own goal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub possession: TeamSide,
    pub down: u8,
    pub distance: i32,
    pub spot: i32,
    pub quarter: u8,
    pub clock: u32,
    pub score: Score,
    pub kick_mode: bool,
    pub bonus: BonusQueue,
}

impl GameState {
    #[must_use]
    pub fn kickoff(receiving: TeamSide, quarter_seconds: u32) -> Self {
        Self {
            possession: receiving,
            down: 1,
            distance: 0,
            spot: 0,
            quarter: 1,
            clock: quarter_seconds,
            score: Score::default(),
            kick_mode: false,
            bonus: BonusQueue::default(),
        }
    }

    /// Hand the ball to `team` with a fresh series at `spot`.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::FieldPosition`] when `spot` is not live.
    pub fn start_possession(
        &mut self,
        team: TeamSide,
        spot: i32,
        series_distance: i32,
    ) -> Result<(), InvariantViolation> {
        if !(1..FIELD_LENGTH).contains(&spot) {
            return Err(InvariantViolation::FieldPosition(spot));
        }
        self.possession = team;
        self.spot = spot;
        self.reset_series(series_distance);
        Ok(())
    }

    /// First down at the current spot.
    pub fn reset_series(&mut self, series_distance: i32) {
        self.down = 1;
        self.distance = series_distance.min(FIELD_LENGTH - self.spot).max(1);
        self.kick_mode = false;
    }

    #[must_use]
    pub const fn phase(&self) -> SeriesPhase {
        match self.down {
            KICK_MODE_DOWN => SeriesPhase::Decision,
            down if down > KICK_MODE_DOWN && self.kick_mode => SeriesPhase::Specialist,
            _ => SeriesPhase::Advancing,
        }
    }

    /// Yards to the opponent's goal line.
    #[must_use]
    pub const fn yards_to_goal(&self) -> i32 {
        FIELD_LENGTH - self.spot
    }

    #[must_use]
    pub fn offense_lead(&self) -> i32 {
        self.score.differential(self.possession)
    }

    /// Verify down and field position are inside their live ranges.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        if !(1..=DOWNS_PER_SERIES).contains(&self.down) {
            return Err(InvariantViolation::Down(self.down));
        }
        if !(1..FIELD_LENGTH).contains(&self.spot) {
            return Err(InvariantViolation::FieldPosition(self.spot));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differential_is_signed_per_side() {
        let score = Score { home: 18, away: 3 };
        assert_eq!(score.differential(TeamSide::Home), 15);
        assert_eq!(score.differential(TeamSide::Away), -15);
    }

    #[test]
    fn series_distance_respects_goal_line() {
        let mut state = GameState::kickoff(TeamSide::Home, 900);
        state.start_possession(TeamSide::Away, 88, 20).unwrap();
        assert_eq!(state.distance, 12);
        assert_eq!(state.down, 1);
        assert_eq!(state.possession, TeamSide::Away);
        state.start_possession(TeamSide::Home, 30, 20).unwrap();
        assert_eq!(state.distance, 20);
    }

    #[test]
    fn dead_spots_are_rejected() {
        let mut state = GameState::kickoff(TeamSide::Home, 900);
        assert_eq!(
            state.start_possession(TeamSide::Home, 0, 20),
            Err(InvariantViolation::FieldPosition(0))
        );
        assert_eq!(
            state.start_possession(TeamSide::Home, 100, 20),
            Err(InvariantViolation::FieldPosition(100))
        );
    }

    #[test]
    fn phase_follows_down_and_kick_mode() {
        let mut state = GameState::kickoff(TeamSide::Home, 900);
        state.start_possession(TeamSide::Home, 40, 20).unwrap();
        assert_eq!(state.phase(), SeriesPhase::Advancing);
        state.down = 4;
        assert_eq!(state.phase(), SeriesPhase::Decision);
        state.down = 5;
        assert_eq!(state.phase(), SeriesPhase::Advancing);
        state.kick_mode = true;
        assert_eq!(state.phase(), SeriesPhase::Specialist);
        state.down = 7;
        assert_eq!(state.check(), Err(InvariantViolation::Down(7)));
    }
}
