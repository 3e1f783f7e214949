//! Append-only stat ledger with one write per play.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::InvariantViolation;
use crate::roster::PlayerId;
use crate::state::TeamSide;

/// Statistic kinds tracked per participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    RushAttempts,
    RushYards,
    LateralChains,
    LateralYards,
    KickPassAttempts,
    KickPassCompletions,
    KickPassYards,
    Receptions,
    ReceivingYards,
    InterceptionsThrown,
    Interceptions,
    InterceptionReturnYards,
    FumblesLost,
    FumbleRecoveries,
    Sacks,
    SackYardsLost,
    Tackles,
    Touchdowns,
    DropKicksAttempted,
    DropKicksMade,
    PlaceKicksAttempted,
    PlaceKicksMade,
    Punts,
    PuntYards,
    Pindowns,
    KickReturnYards,
    KicksBlocked,
    /// Ground given up by a kicking unit whose blocked kick it recovered.
    BlockedKickYardsLost,
    Safeties,
    Penalties,
    PenaltyYards,
}

impl StatKind {
    pub const ALL: [Self; 31] = [
        Self::RushAttempts,
        Self::RushYards,
        Self::LateralChains,
        Self::LateralYards,
        Self::KickPassAttempts,
        Self::KickPassCompletions,
        Self::KickPassYards,
        Self::Receptions,
        Self::ReceivingYards,
        Self::InterceptionsThrown,
        Self::Interceptions,
        Self::InterceptionReturnYards,
        Self::FumblesLost,
        Self::FumbleRecoveries,
        Self::Sacks,
        Self::SackYardsLost,
        Self::Tackles,
        Self::Touchdowns,
        Self::DropKicksAttempted,
        Self::DropKicksMade,
        Self::PlaceKicksAttempted,
        Self::PlaceKicksMade,
        Self::Punts,
        Self::PuntYards,
        Self::Pindowns,
        Self::KickReturnYards,
        Self::KicksBlocked,
        Self::BlockedKickYardsLost,
        Self::Safeties,
        Self::Penalties,
        Self::PenaltyYards,
    ];

    /// Whether the team-level total is derivable from the play log alone.
    /// Tackles are an individual credit with no structural counterpart.
    #[must_use]
    pub const fn reconciles_with_log(self) -> bool {
        !matches!(self, Self::Tackles)
    }

    /// Signed contribution of one credit of this kind to the offense's field
    /// movement. Receiving yards mirror kick-pass yards and are not counted
    /// twice; return and penalty yards move the ball outside `yards`.
    #[must_use]
    pub const fn offense_movement(self, value: i64) -> i64 {
        match self {
            Self::RushYards | Self::LateralYards | Self::KickPassYards => value,
            Self::SackYardsLost | Self::BlockedKickYardsLost => -value,
            _ => 0,
        }
    }

    /// Yardage kinds, as opposed to event counts.
    #[must_use]
    pub const fn is_yardage(self) -> bool {
        matches!(
            self,
            Self::RushYards
                | Self::LateralYards
                | Self::KickPassYards
                | Self::ReceivingYards
                | Self::InterceptionReturnYards
                | Self::SackYardsLost
                | Self::BlockedKickYardsLost
                | Self::PuntYards
                | Self::KickReturnYards
                | Self::PenaltyYards
        )
    }
}

/// One credited statistic for one participant on one play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub team: TeamSide,
    pub player: PlayerId,
    pub kind: StatKind,
    pub value: i64,
}

impl Credit {
    #[must_use]
    pub const fn new(team: TeamSide, player: PlayerId, kind: StatKind, value: i64) -> Self {
        Self {
            team,
            player,
            kind,
            value,
        }
    }

    #[must_use]
    pub const fn one(team: TeamSide, player: PlayerId, kind: StatKind) -> Self {
        Self::new(team, player, kind, 1)
    }
}

/// Credits attached to a single play.
pub type Credits = SmallVec<[Credit; 8]>;

/// Totals per [`StatKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine(BTreeMap<StatKind, i64>);

impl StatLine {
    #[must_use]
    pub fn get(&self, kind: StatKind) -> i64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kind: StatKind, value: i64) {
        *self.0.entry(kind).or_insert(0) += value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKind, i64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| *v == 0)
    }
}

/// Team-level deltas keyed by `(team, kind)`.
pub type TeamDeltas = BTreeMap<(TeamSide, StatKind), i64>;

/// Sum credits into team deltas, keeping only log-reconcilable kinds.
#[must_use]
pub fn sum_credits(credits: &[Credit]) -> TeamDeltas {
    let mut deltas = TeamDeltas::new();
    for credit in credits {
        if credit.kind.reconciles_with_log() {
            *deltas.entry((credit.team, credit.kind)).or_insert(0) += credit.value;
        }
    }
    deltas.retain(|_, v| *v != 0);
    deltas
}

/// Compare two delta maps, reporting the first disagreement.
///
/// # Errors
///
/// Returns [`InvariantViolation::LedgerMismatch`] naming the team and stat.
pub fn compare_deltas(ledger: &TeamDeltas, log: &TeamDeltas) -> Result<(), InvariantViolation> {
    let keys: BTreeSet<_> = ledger.keys().chain(log.keys()).copied().collect();
    for (team, stat) in keys {
        let l = ledger.get(&(team, stat)).copied().unwrap_or(0);
        let g = log.get(&(team, stat)).copied().unwrap_or(0);
        if l != g {
            return Err(InvariantViolation::LedgerMismatch {
                team,
                stat,
                ledger: l,
                log: g,
            });
        }
    }
    Ok(())
}

/// Per-game accumulator keyed by `(team, participant, kind)`.
#[derive(Debug, Clone, Default)]
pub struct StatLedger {
    lines: BTreeMap<(TeamSide, PlayerId), StatLine>,
    written: BTreeSet<usize>,
}

impl StatLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write all credits of play `play_index` in one call.
    ///
    /// # Errors
    ///
    /// Rejects a second write for the same play and a play that credits the
    /// same participant with the same kind twice.
    pub fn record(&mut self, play_index: usize, credits: &[Credit]) -> Result<(), InvariantViolation> {
        if self.written.contains(&play_index) {
            return Err(InvariantViolation::DuplicateWrite(play_index));
        }
        let mut keys = BTreeSet::new();
        for credit in credits {
            if !keys.insert((credit.team, credit.player, credit.kind)) {
                return Err(InvariantViolation::DuplicateCredit { kind: credit.kind });
            }
        }
        self.written.insert(play_index);
        for credit in credits {
            self.lines
                .entry((credit.team, credit.player))
                .or_default()
                .add(credit.kind, credit.value);
        }
        Ok(())
    }

    #[must_use]
    pub fn plays_written(&self) -> usize {
        self.written.len()
    }

    #[must_use]
    pub fn participant(&self, team: TeamSide, player: PlayerId) -> Option<&StatLine> {
        self.lines.get(&(team, player))
    }

    /// Every participant line, ordered by team then id.
    pub fn lines(&self) -> impl Iterator<Item = (TeamSide, PlayerId, &StatLine)> + '_ {
        self.lines.iter().map(|((t, p), line)| (*t, *p, line))
    }

    /// Team totals as the sum of participant totals.
    #[must_use]
    pub fn team_totals(&self, team: TeamSide) -> StatLine {
        let mut total = StatLine::default();
        for ((side, _), line) in &self.lines {
            if *side == team {
                for (kind, value) in line.iter() {
                    total.add(kind, value);
                }
            }
        }
        total
    }

    /// Team totals in delta form, for comparison against a log sum.
    #[must_use]
    pub fn team_deltas(&self) -> TeamDeltas {
        let mut deltas = TeamDeltas::new();
        for team in TeamSide::ALL {
            for (kind, value) in self.team_totals(team).iter() {
                if kind.reconciles_with_log() && value != 0 {
                    deltas.insert((team, kind), value);
                }
            }
        }
        deltas
    }
}
