//! Play categories, formations and the outcome of a single snap.

pub mod category;
pub mod outcome;

pub use category::{DefensiveCall, Formation, Personnel, PlayCategory, PlayFamily};
pub use outcome::{
    Actors, InterceptionKind, KickKind, OutcomeKind, Penalty, PenaltyKind, PlayOutcome,
    PuntResult,
};
