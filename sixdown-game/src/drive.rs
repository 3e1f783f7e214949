//! Drive state machine: applies resolved plays to [`GameState`] and decides
//! when a possession ends and where the next one starts.
use serde::{Deserialize, Serialize};

use crate::config::{FieldConfig, ScoringConfig};
use crate::constants::{DOWNS_PER_SERIES, FIELD_LENGTH};
use crate::error::InvariantViolation;
use crate::field::delta_start;
use crate::play::{OutcomeKind, PlayOutcome, PuntResult};
use crate::state::{GameState, TeamSide};

/// How a drive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DriveResult {
    Touchdown,
    DropKick,
    PlaceKick,
    Safety,
    Pindown,
    Punt,
    PuntReturnTouchdown,
    Interception,
    InterceptionTouchdown,
    Fumble,
    BlockedKick,
    BlockedKickTouchdown,
    MissedKick,
    MissedKickTouchdown,
    TurnoverOnDowns,
    EndOfHalf,
    EndOfGame,
}

impl DriveResult {
    /// Drives that ended with points for the team that had the ball.
    #[must_use]
    pub const fn offense_scored(self) -> bool {
        matches!(
            self,
            Self::Touchdown | Self::DropKick | Self::PlaceKick | Self::Pindown
        )
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Touchdown => "touchdown",
            Self::DropKick => "drop kick",
            Self::PlaceKick => "place kick",
            Self::Safety => "safety",
            Self::Pindown => "pindown",
            Self::Punt => "punt",
            Self::PuntReturnTouchdown => "punt return touchdown",
            Self::Interception => "interception",
            Self::InterceptionTouchdown => "pick six",
            Self::Fumble => "fumble",
            Self::BlockedKick => "blocked kick",
            Self::BlockedKickTouchdown => "blocked kick touchdown",
            Self::MissedKick => "missed kick",
            Self::MissedKickTouchdown => "missed kick touchdown",
            Self::TurnoverOnDowns => "turnover on downs",
            Self::EndOfHalf => "end of half",
            Self::EndOfGame => "end of game",
        }
    }
}

/// Where the next possession starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartKind {
    /// Delta Yards restart from the live differential.
    Restart,
    /// Live-ball return spot.
    Return,
    /// Bonus possession after an interception.
    Bonus,
}

/// Next possession as decided by the drive machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Possession {
    pub team: TeamSide,
    pub spot: i32,
    pub start: StartKind,
}

/// Result of applying one play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Same offense snaps again.
    Continue { first_down: bool },
    /// Possession is over.
    DriveEnd {
        result: DriveResult,
        next: Possession,
    },
}

/// Delta Yards restart for `team` at the current score.
#[must_use]
pub fn restart(state: &GameState, team: TeamSide, field: &FieldConfig) -> Possession {
    Possession {
        team,
        spot: delta_start(state.score.differential(team), field),
        start: StartKind::Restart,
    }
}

/// Turn a failed sixth-down play into a turnover on downs.
///
/// Only plays that would otherwise keep the ball are wrapped; a play that
/// already changes possession stands on its own.
pub fn enforce_last_down(state: &GameState, outcome: &mut PlayOutcome) {
    if state.down < DOWNS_PER_SERIES || !outcome.kind.keeps_possession(outcome.offense) {
        return;
    }
    if outcome.net_yards() >= state.distance {
        return;
    }
    let inner = std::mem::replace(&mut outcome.kind, OutcomeKind::Kneel);
    outcome.kind = OutcomeKind::TurnoverOnDowns {
        play: Box::new(inner),
    };
}

fn classify(kind: &OutcomeKind) -> DriveResult {
    match kind {
        OutcomeKind::Touchdown => DriveResult::Touchdown,
        OutcomeKind::DropKickGood { .. } => DriveResult::DropKick,
        OutcomeKind::PlaceKickGood { .. } => DriveResult::PlaceKick,
        OutcomeKind::Safety { .. } => DriveResult::Safety,
        OutcomeKind::Pindown { .. }
        | OutcomeKind::Punt {
            result: PuntResult::Pindown,
            ..
        } => DriveResult::Pindown,
        OutcomeKind::Punt {
            result: PuntResult::ReturnTouchdown { .. },
            ..
        } => DriveResult::PuntReturnTouchdown,
        OutcomeKind::Punt { .. } => DriveResult::Punt,
        OutcomeKind::Interception { .. } => DriveResult::Interception,
        OutcomeKind::InterceptionReturnTouchdown { .. } => DriveResult::InterceptionTouchdown,
        OutcomeKind::FumbleRecovered { .. } => DriveResult::Fumble,
        OutcomeKind::BlockedKick { .. } => DriveResult::BlockedKick,
        OutcomeKind::BlockedKickReturnTouchdown { .. } => DriveResult::BlockedKickTouchdown,
        OutcomeKind::MissedKickReturn {
            touchdown: true, ..
        } => DriveResult::MissedKickTouchdown,
        OutcomeKind::MissedKickReturn { .. } => DriveResult::MissedKick,
        OutcomeKind::TurnoverOnDowns { .. } => DriveResult::TurnoverOnDowns,
        // Possession-keeping plays only end a drive when the clock does.
        OutcomeKind::Gain | OutcomeKind::KickPassIncomplete | OutcomeKind::Sack | OutcomeKind::Kneel => {
            DriveResult::EndOfHalf
        }
    }
}

/// Apply a resolved play: score, move the ball and manage downs, or end the
/// drive and name the next possession.
///
/// # Errors
///
/// Returns an [`InvariantViolation`] when the play would leave the ball off
/// the live field or past the sixth down. Nothing is clamped.
pub fn apply_outcome(
    state: &mut GameState,
    outcome: &PlayOutcome,
    scoring: &ScoringConfig,
    field: &FieldConfig,
) -> Result<Transition, InvariantViolation> {
    let offense = outcome.offense;
    let defense = offense.opponent();
    if let Some((team, points)) = outcome.points(scoring) {
        state.score.add(team, points);
    }

    if outcome.kind.keeps_possession(offense) {
        let net = outcome.net_yards();
        let spot = state.spot + net;
        if !(1..FIELD_LENGTH).contains(&spot) {
            return Err(InvariantViolation::FieldPosition(spot));
        }
        state.spot = spot;
        if net >= state.distance {
            state.reset_series(field.series_distance);
            return Ok(Transition::Continue { first_down: true });
        }
        state.down += 1;
        state.distance -= net;
        if state.down > DOWNS_PER_SERIES {
            return Err(InvariantViolation::Down(state.down));
        }
        return Ok(Transition::Continue { first_down: false });
    }

    let result = classify(&outcome.kind);
    let scorer = outcome.points(scoring).map(|(team, _)| team);
    let next = match &outcome.kind {
        OutcomeKind::Punt {
            result: PuntResult::Returned { start, .. },
            ..
        } => Possession {
            team: defense,
            spot: *start,
            start: StartKind::Return,
        },
        OutcomeKind::MissedKickReturn {
            return_yards,
            touchdown: false,
            ..
        } => Possession {
            team: defense,
            spot: (*return_yards).max(1),
            start: StartKind::Return,
        },
        // The conceding side of a safety takes the ball back.
        OutcomeKind::Safety { .. } => restart(state, offense, field),
        _ => match scorer {
            Some(team) => restart(state, team.opponent(), field),
            None => restart(state, defense, field),
        },
    };
    if !(1..FIELD_LENGTH).contains(&next.spot) {
        return Err(InvariantViolation::FieldPosition(next.spot));
    }
    Ok(Transition::DriveEnd { result, next })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::{Actors, InterceptionKind, KickKind, PlayCategory};
    use smallvec::smallvec;

    fn state_at(spot: i32, down: u8, distance: i32) -> GameState {
        let mut state = GameState::kickoff(TeamSide::Home, 900);
        state.start_possession(TeamSide::Home, spot, 20).unwrap();
        state.down = down;
        state.distance = distance;
        state
    }

    fn play(category: PlayCategory, yards: i32, kind: OutcomeKind) -> PlayOutcome {
        PlayOutcome {
            offense: TeamSide::Home,
            category,
            yards,
            kind,
            actors: Actors::default(),
            penalty: None,
            credits: smallvec![],
        }
    }

    #[test]
    fn gains_advance_downs_and_convert() {
        let mut state = state_at(30, 1, 20);
        let cfg = (ScoringConfig::default(), FieldConfig::default());
        let t = apply_outcome(&mut state, &play(PlayCategory::Dive, 7, OutcomeKind::Gain), &cfg.0, &cfg.1)
            .unwrap();
        assert_eq!(t, Transition::Continue { first_down: false });
        assert_eq!((state.down, state.distance, state.spot), (2, 13, 37));
        let t = apply_outcome(&mut state, &play(PlayCategory::Sweep, 15, OutcomeKind::Gain), &cfg.0, &cfg.1)
            .unwrap();
        assert_eq!(t, Transition::Continue { first_down: true });
        assert_eq!((state.down, state.distance, state.spot), (1, 20, 52));
    }

    #[test]
    fn first_down_near_goal_is_goal_to_go() {
        let mut state = state_at(70, 3, 4);
        apply_outcome(
            &mut state,
            &play(PlayCategory::Power, 18, OutcomeKind::Gain),
            &ScoringConfig::default(),
            &FieldConfig::default(),
        )
        .unwrap();
        assert_eq!((state.down, state.distance), (1, 12));
    }

    #[test]
    fn failed_sixth_down_becomes_turnover_on_downs() {
        let state = state_at(50, 6, 5);
        let mut outcome = play(PlayCategory::Dive, 3, OutcomeKind::Gain);
        enforce_last_down(&state, &mut outcome);
        assert!(matches!(outcome.kind, OutcomeKind::TurnoverOnDowns { .. }));
        let mut state = state;
        let t = apply_outcome(&mut state, &outcome, &ScoringConfig::default(), &FieldConfig::default())
            .unwrap();
        match t {
            Transition::DriveEnd { result, next } => {
                assert_eq!(result, DriveResult::TurnoverOnDowns);
                assert_eq!(next.team, TeamSide::Away);
                assert_eq!(next.start, StartKind::Restart);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sixth_down_conversion_is_not_wrapped() {
        let state = state_at(50, 6, 5);
        let mut outcome = play(PlayCategory::Dive, 5, OutcomeKind::Gain);
        enforce_last_down(&state, &mut outcome);
        assert_eq!(outcome.kind, OutcomeKind::Gain);
    }

    #[test]
    fn scores_restart_the_non_scoring_team_by_differential() {
        let mut state = state_at(95, 1, 5);
        state.score.home = 6;
        let t = apply_outcome(
            &mut state,
            &play(PlayCategory::Dive, 5, OutcomeKind::Touchdown),
            &ScoringConfig::default(),
            &FieldConfig::default(),
        )
        .unwrap();
        assert_eq!(state.score.home, 15);
        let Transition::DriveEnd { next, .. } = t else {
            panic!("drive should end");
        };
        assert_eq!(next.team, TeamSide::Away);
        assert_eq!(next.spot, 35);
    }

    #[test]
    fn interceptions_hand_the_ball_over_at_a_restart() {
        let mut state = state_at(40, 2, 11);
        state.score.away = 12;
        let t = apply_outcome(
            &mut state,
            &play(
                PlayCategory::DeepKickPass,
                0,
                OutcomeKind::Interception {
                    kind: InterceptionKind::KickPass,
                    return_yards: 14,
                },
            ),
            &ScoringConfig::default(),
            &FieldConfig::default(),
        )
        .unwrap();
        let Transition::DriveEnd { result, next } = t else {
            panic!("drive should end");
        };
        assert_eq!(result, DriveResult::Interception);
        assert_eq!(next.team, TeamSide::Away);
        assert_eq!(next.spot, 8);
    }

    #[test]
    fn punt_returns_start_at_the_return_spot() {
        let mut state = state_at(30, 4, 12);
        let t = apply_outcome(
            &mut state,
            &play(
                PlayCategory::Punt,
                0,
                OutcomeKind::Punt {
                    distance: 45,
                    result: PuntResult::Returned {
                        return_yards: 6,
                        start: 31,
                    },
                },
            ),
            &ScoringConfig::default(),
            &FieldConfig::default(),
        )
        .unwrap();
        assert_eq!(
            t,
            Transition::DriveEnd {
                result: DriveResult::Punt,
                next: Possession {
                    team: TeamSide::Away,
                    spot: 31,
                    start: StartKind::Return,
                },
            }
        );
    }

    #[test]
    fn blocked_kick_recovered_by_offense_keeps_the_series() {
        let mut state = state_at(70, 5, 8);
        state.kick_mode = true;
        let t = apply_outcome(
            &mut state,
            &play(
                PlayCategory::DropKick,
                -7,
                OutcomeKind::BlockedKick {
                    kick: KickKind::DropKick,
                    recovered_by: TeamSide::Home,
                    return_yards: 0,
                },
            ),
            &ScoringConfig::default(),
            &FieldConfig::default(),
        )
        .unwrap();
        assert_eq!(t, Transition::Continue { first_down: false });
        assert_eq!((state.down, state.distance, state.spot), (6, 15, 63));
    }

    #[test]
    fn illegal_spots_are_errors_not_clamps() {
        let mut state = state_at(3, 2, 10);
        let err = apply_outcome(
            &mut state,
            &play(PlayCategory::Sweep, -5, OutcomeKind::Gain),
            &ScoringConfig::default(),
            &FieldConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, InvariantViolation::FieldPosition(-2));
    }
}
