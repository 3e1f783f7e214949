use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::ledger::{Credits, StatKind, TeamDeltas};
use crate::play::category::{PlayCategory, PlayFamily};
use crate::roster::PlayerId;
use crate::state::TeamSide;

/// Which kind of kick a kicking outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KickKind {
    DropKick,
    PlaceKick,
    Punt,
}

impl KickKind {
    #[must_use]
    pub const fn from_category(category: PlayCategory) -> Option<Self> {
        match category {
            PlayCategory::DropKick => Some(Self::DropKick),
            PlayCategory::PlaceKick => Some(Self::PlaceKick),
            PlayCategory::Punt => Some(Self::Punt),
            _ => None,
        }
    }

    const fn attempt_stat(self) -> StatKind {
        match self {
            Self::DropKick => StatKind::DropKicksAttempted,
            Self::PlaceKick => StatKind::PlaceKicksAttempted,
            Self::Punt => StatKind::Punts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterceptionKind {
    Lateral,
    KickPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuntResult {
    /// Fielded and returned; `start` is the receiving team's new spot.
    Returned { return_yards: i32, start: i32 },
    ReturnTouchdown { return_yards: i32 },
    /// Downed in the receiving team's end zone: one point to the kicking team.
    Pindown,
    Touchback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyKind {
    Holding,
    Offside,
}

/// A flag assessed on the snap, resolved before the ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub kind: PenaltyKind,
    pub team: TeamSide,
    pub player: PlayerId,
    /// Yards walked off, always positive.
    pub yards: i32,
}

impl Penalty {
    /// Field movement for `offense`: negative when the offense is flagged.
    #[must_use]
    pub fn field_effect(&self, offense: TeamSide) -> i32 {
        if self.team == offense {
            -self.yards
        } else {
            self.yards
        }
    }
}

/// Variant-specific result of a play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Gain,
    KickPassIncomplete,
    Touchdown,
    DropKickGood { distance: i32 },
    PlaceKickGood { distance: i32 },
    Safety { sack: bool },
    /// A missed scoring kick downed in the defense's end zone.
    Pindown { kick: KickKind, distance: i32 },
    FumbleRecovered { by: TeamSide },
    Interception {
        kind: InterceptionKind,
        return_yards: i32,
    },
    InterceptionReturnTouchdown {
        kind: InterceptionKind,
        return_yards: i32,
    },
    Sack,
    BlockedKick {
        kick: KickKind,
        recovered_by: TeamSide,
        return_yards: i32,
    },
    BlockedKickReturnTouchdown { kick: KickKind, return_yards: i32 },
    MissedKickReturn {
        kick: KickKind,
        distance: i32,
        return_yards: i32,
        touchdown: bool,
    },
    /// The sixth-down play failed; `play` is what actually happened on it.
    TurnoverOnDowns { play: Box<OutcomeKind> },
    Punt { distance: i32, result: PuntResult },
    Kneel,
}

/// Participants named in the play description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actors {
    /// Ball carrier, kick-passer, lateral initiator or kicker.
    pub primary: Option<PlayerId>,
    /// Target receiver.
    pub secondary: Option<PlayerId>,
    /// Tackler, interceptor, rusher, blocker or returner.
    pub defender: Option<PlayerId>,
}

/// Immutable result of one snap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOutcome {
    /// The team that initiated the play, captured before any possession change.
    pub offense: TeamSide,
    pub category: PlayCategory,
    /// Final scrimmage yards for the offense.
    pub yards: i32,
    pub kind: OutcomeKind,
    pub actors: Actors,
    pub penalty: Option<Penalty>,
    pub credits: Credits,
}

fn bump(deltas: &mut TeamDeltas, team: TeamSide, kind: StatKind, value: i64) {
    if value != 0 {
        *deltas.entry((team, kind)).or_insert(0) += value;
    }
}

impl OutcomeKind {
    /// Points scored on the play and the team that earned them.
    #[must_use]
    pub fn points(&self, offense: TeamSide, scoring: &ScoringConfig) -> Option<(TeamSide, u32)> {
        let defense = offense.opponent();
        match self {
            Self::Touchdown => Some((offense, scoring.touchdown)),
            Self::DropKickGood { .. } => Some((offense, scoring.drop_kick)),
            Self::PlaceKickGood { .. } => Some((offense, scoring.place_kick)),
            Self::Safety { .. } => Some((defense, scoring.safety)),
            Self::Pindown { .. }
            | Self::Punt {
                result: PuntResult::Pindown,
                ..
            } => Some((offense, scoring.pindown)),
            Self::InterceptionReturnTouchdown { .. }
            | Self::BlockedKickReturnTouchdown { .. }
            | Self::MissedKickReturn {
                touchdown: true, ..
            }
            | Self::Punt {
                result: PuntResult::ReturnTouchdown { .. },
                ..
            } => Some((defense, scoring.touchdown)),
            Self::TurnoverOnDowns { play } => play.points(offense, scoring),
            _ => None,
        }
    }

    /// Whether the defense took the ball away.
    #[must_use]
    pub fn is_turnover(&self, offense: TeamSide) -> bool {
        match self {
            Self::Interception { .. }
            | Self::InterceptionReturnTouchdown { .. }
            | Self::BlockedKickReturnTouchdown { .. }
            | Self::TurnoverOnDowns { .. } => true,
            Self::FumbleRecovered { by } => *by != offense,
            Self::BlockedKick { recovered_by, .. } => *recovered_by != offense,
            _ => false,
        }
    }

    /// Interceptions are the only turnovers that queue a bonus possession.
    #[must_use]
    pub const fn interception(&self) -> bool {
        matches!(
            self,
            Self::Interception { .. } | Self::InterceptionReturnTouchdown { .. }
        )
    }

    /// Plays after which the same offense keeps snapping.
    #[must_use]
    pub fn keeps_possession(&self, offense: TeamSide) -> bool {
        match self {
            Self::Gain | Self::KickPassIncomplete | Self::Sack | Self::Kneel => true,
            Self::FumbleRecovered { by } => *by == offense,
            Self::BlockedKick { recovered_by, .. } => *recovered_by == offense,
            _ => false,
        }
    }

    fn add_deltas(&self, category: PlayCategory, yards: i32, offense: TeamSide, out: &mut TeamDeltas) {
        let defense = offense.opponent();
        let y = i64::from(yards);
        let scrimmage = |out: &mut TeamDeltas| match category.family() {
            PlayFamily::Run => {
                bump(out, offense, StatKind::RushAttempts, 1);
                bump(out, offense, StatKind::RushYards, y);
            }
            PlayFamily::Lateral => {
                bump(out, offense, StatKind::LateralChains, 1);
                bump(out, offense, StatKind::LateralYards, y);
            }
            PlayFamily::KickPass => {
                bump(out, offense, StatKind::KickPassAttempts, 1);
                bump(out, offense, StatKind::KickPassCompletions, 1);
                bump(out, offense, StatKind::KickPassYards, y);
                bump(out, offense, StatKind::Receptions, 1);
                bump(out, offense, StatKind::ReceivingYards, y);
            }
            PlayFamily::Kicking | PlayFamily::Clock => {}
        };
        let attempt = |out: &mut TeamDeltas| {
            if let Some(kick) = KickKind::from_category(category) {
                bump(out, offense, kick.attempt_stat(), 1);
            }
        };
        let pass_attempt = |out: &mut TeamDeltas| match category.family() {
            PlayFamily::Lateral => bump(out, offense, StatKind::LateralChains, 1),
            _ => bump(out, offense, StatKind::KickPassAttempts, 1),
        };
        match self {
            Self::Gain => scrimmage(out),
            Self::Touchdown => {
                scrimmage(out);
                bump(out, offense, StatKind::Touchdowns, 1);
            }
            Self::Safety { sack: true } => {
                bump(out, defense, StatKind::Sacks, 1);
                bump(out, defense, StatKind::SackYardsLost, -y);
                bump(out, defense, StatKind::Safeties, 1);
            }
            Self::Safety { sack: false } => {
                scrimmage(out);
                bump(out, defense, StatKind::Safeties, 1);
            }
            Self::Sack => {
                bump(out, defense, StatKind::Sacks, 1);
                bump(out, defense, StatKind::SackYardsLost, -y);
            }
            Self::KickPassIncomplete => bump(out, offense, StatKind::KickPassAttempts, 1),
            Self::FumbleRecovered { by } => {
                scrimmage(out);
                if *by == offense {
                    bump(out, offense, StatKind::FumbleRecoveries, 1);
                } else {
                    bump(out, offense, StatKind::FumblesLost, 1);
                    bump(out, defense, StatKind::FumbleRecoveries, 1);
                }
            }
            Self::Interception { return_yards, .. } => {
                pass_attempt(out);
                bump(out, offense, StatKind::InterceptionsThrown, 1);
                bump(out, defense, StatKind::Interceptions, 1);
                bump(out, defense, StatKind::InterceptionReturnYards, i64::from(*return_yards));
            }
            Self::InterceptionReturnTouchdown { return_yards, .. } => {
                pass_attempt(out);
                bump(out, offense, StatKind::InterceptionsThrown, 1);
                bump(out, defense, StatKind::Interceptions, 1);
                bump(out, defense, StatKind::InterceptionReturnYards, i64::from(*return_yards));
                bump(out, defense, StatKind::Touchdowns, 1);
            }
            Self::DropKickGood { .. } => {
                attempt(out);
                bump(out, offense, StatKind::DropKicksMade, 1);
            }
            Self::PlaceKickGood { .. } => {
                attempt(out);
                bump(out, offense, StatKind::PlaceKicksMade, 1);
            }
            Self::Pindown { .. } => {
                attempt(out);
                bump(out, offense, StatKind::Pindowns, 1);
            }
            Self::MissedKickReturn {
                return_yards,
                touchdown,
                ..
            } => {
                attempt(out);
                bump(out, defense, StatKind::KickReturnYards, i64::from(*return_yards));
                if *touchdown {
                    bump(out, defense, StatKind::Touchdowns, 1);
                }
            }
            Self::BlockedKick {
                recovered_by,
                return_yards,
                ..
            } => {
                attempt(out);
                bump(out, defense, StatKind::KicksBlocked, 1);
                if *recovered_by == defense {
                    bump(out, defense, StatKind::KickReturnYards, i64::from(*return_yards));
                } else {
                    bump(out, offense, StatKind::BlockedKickYardsLost, -y);
                }
            }
            Self::BlockedKickReturnTouchdown { return_yards, .. } => {
                attempt(out);
                bump(out, defense, StatKind::KicksBlocked, 1);
                bump(out, defense, StatKind::KickReturnYards, i64::from(*return_yards));
                bump(out, defense, StatKind::Touchdowns, 1);
            }
            Self::Punt { distance, result } => {
                bump(out, offense, StatKind::Punts, 1);
                bump(out, offense, StatKind::PuntYards, i64::from(*distance));
                match result {
                    PuntResult::Returned { return_yards, .. } => {
                        bump(out, defense, StatKind::KickReturnYards, i64::from(*return_yards));
                    }
                    PuntResult::ReturnTouchdown { return_yards } => {
                        bump(out, defense, StatKind::KickReturnYards, i64::from(*return_yards));
                        bump(out, defense, StatKind::Touchdowns, 1);
                    }
                    PuntResult::Pindown => bump(out, offense, StatKind::Pindowns, 1),
                    PuntResult::Touchback => {}
                }
            }
            Self::TurnoverOnDowns { play } => play.add_deltas(category, yards, offense, out),
            Self::Kneel => {
                bump(out, offense, StatKind::RushAttempts, 1);
                bump(out, offense, StatKind::RushYards, y);
            }
        }
    }

    /// Short lowercase tag used in logs and reports.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Gain => "gain",
            Self::KickPassIncomplete => "incomplete",
            Self::Touchdown => "touchdown",
            Self::DropKickGood { .. } => "drop kick good",
            Self::PlaceKickGood { .. } => "place kick good",
            Self::Safety { .. } => "safety",
            Self::Pindown { .. } => "pindown",
            Self::FumbleRecovered { .. } => "fumble",
            Self::Interception { .. } => "interception",
            Self::InterceptionReturnTouchdown { .. } => "pick six",
            Self::Sack => "sack",
            Self::BlockedKick { .. } => "blocked kick",
            Self::BlockedKickReturnTouchdown { .. } => "blocked kick returned for touchdown",
            Self::MissedKickReturn { .. } => "missed kick returned",
            Self::TurnoverOnDowns { .. } => "turnover on downs",
            Self::Punt { .. } => "punt",
            Self::Kneel => "kneel",
        }
    }
}

impl PlayOutcome {
    /// Team-level stat deltas derived from the structural fields alone.
    ///
    /// This is computed independently of [`PlayOutcome::credits`] so the two
    /// can be reconciled.
    #[must_use]
    pub fn team_deltas(&self) -> TeamDeltas {
        let mut deltas = TeamDeltas::new();
        self.kind
            .add_deltas(self.category, self.yards, self.offense, &mut deltas);
        if let Some(penalty) = self.penalty {
            bump(&mut deltas, penalty.team, StatKind::Penalties, 1);
            bump(&mut deltas, penalty.team, StatKind::PenaltyYards, i64::from(penalty.yards));
        }
        deltas
    }

    #[must_use]
    pub fn points(&self, scoring: &ScoringConfig) -> Option<(TeamSide, u32)> {
        self.kind.points(self.offense, scoring)
    }

    #[must_use]
    pub fn is_turnover(&self) -> bool {
        self.kind.is_turnover(self.offense)
    }

    /// Net field movement for the offense, penalty included.
    #[must_use]
    pub fn net_yards(&self) -> i32 {
        self.yards + self.penalty.map_or(0, |p| p.field_effect(self.offense))
    }
}
