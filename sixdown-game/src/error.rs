//! Error types surfaced by the simulation engine.

use thiserror::Error;

use crate::ledger::StatKind;
use crate::state::TeamSide;

/// Configuration defects detected before the first snap.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("team `{team}` has no participant for required role {role}")]
    MissingRole { team: String, role: &'static str },
    #[error("team `{team}` lists participant id {id} more than once")]
    DuplicateParticipant { team: String, id: u16 },
    #[error("team `{team}` has an empty name")]
    EmptyTeamName { team: String },
    #[error("participant {id} rating `{field}` is {value}, expected 1..=99")]
    RatingOutOfRange {
        id: u16,
        field: &'static str,
        value: u8,
    },
    #[error("team `{team}` receiver rank {rank} is outside 1..=5 or duplicated")]
    ReceiverRank { team: String, rank: u8 },
    #[error("identity `{identity}` is missing weight for `{key}`")]
    MissingWeight { identity: String, key: String },
    #[error("identity `{identity}` weight `{key}` must be finite and non-negative, got {value}")]
    InvalidWeight {
        identity: String,
        key: String,
        value: f64,
    },
    #[error("identity `{identity}` has no positive weight in family `{family}`")]
    EmptyFamily {
        identity: String,
        family: &'static str,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// A coaching profile that could not be reconstructed from its ratings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoachingError {
    #[error("coach rating `{field}` is {value}, expected 0..=100")]
    RatingOutOfRange { field: &'static str, value: f64 },
    #[error("coach rating `{field}` is not finite")]
    NonFinite { field: &'static str },
    #[error("countermeasure weights sum to zero")]
    DegenerateProfile,
}

/// Fatal engine defects. These abort the game instead of being clamped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("field position {0} left the live range 1..=99")]
    FieldPosition(i32),
    #[error("down {0} left the range 1..=6")]
    Down(u8),
    #[error("play {0} was written to the ledger twice")]
    DuplicateWrite(usize),
    #[error("play credited {kind:?} to the same participant twice")]
    DuplicateCredit { kind: StatKind },
    #[error("{team:?} {stat:?}: ledger total {ledger} differs from play log total {log}")]
    LedgerMismatch {
        team: TeamSide,
        stat: StatKind,
        ledger: i64,
        log: i64,
    },
    #[error("outcome recorded for {recorded:?} but {actual:?} initiated the play")]
    Attribution { recorded: TeamSide, actual: TeamSide },
}

/// Umbrella error returned by [`crate::simulate_game`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invariant violated at play {play_index}: {violation}")]
    Invariant {
        play_index: usize,
        violation: InvariantViolation,
    },
}

impl SimError {
    /// Play index at which the game aborted, when the failure happened mid-game.
    #[must_use]
    pub const fn play_index(&self) -> Option<usize> {
        match self {
            Self::Config(_) => None,
            Self::Invariant { play_index, .. } => Some(*play_index),
        }
    }
}
