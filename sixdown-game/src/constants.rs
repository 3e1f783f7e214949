//! Centralized rule and tuning constants for the six-down engine.
//!
//! Structural values (field length, downs) are fixed by the rules. Balance
//! values that tuning runs adjust live in [`crate::config::EngineConfig`];
//! the contest tables below only change through reviewed code.

// Field geometry -------------------------------------------------------------
pub const FIELD_LENGTH: i32 = 100;
pub const DOWNS_PER_SERIES: u8 = 6;
pub(crate) const KICK_MODE_DOWN: u8 = 4;
/// Snap-and-hold depth added to the line of scrimmage for scoring kicks.
pub(crate) const KICK_SETBACK_YARDS: i32 = 10;
/// Blocked kicks are recovered this far behind the line of scrimmage.
pub(crate) const BLOCKED_KICK_LOSS: i32 = 7;
pub(crate) const KNEEL_LOSS: i32 = 1;
pub(crate) const VICTORY_FORMATION_SECONDS: u32 = 120;
pub(crate) const EXPLOSIVE_GAIN_YARDS: i32 = 20;

// Clock ----------------------------------------------------------------------
pub(crate) const KNEEL_SECONDS: f64 = 40.0;
pub(crate) const INCOMPLETE_SECONDS: f64 = 8.0;
pub(crate) const SCORING_PLAY_SECONDS: f64 = 10.0;
pub(crate) const KICK_PLAY_SECONDS: f64 = 12.0;
pub(crate) const TEMPO_JITTER_SECONDS: f64 = 3.0;

// Contest weights --------------------------------------------------------------
/// Scale from a contest edge (offense minus defense score) to yards.
pub(crate) const EDGE_YARD_SCALE: f64 = 0.06;
/// Scale from a contest edge to a probability shift.
pub(crate) const EDGE_PROBABILITY_SCALE: f64 = 0.008;
pub(crate) const HEAVY_BLOCKING_BONUS: f64 = 1.1;
pub(crate) const SPREAD_SKILL_BONUS: f64 = 1.08;

// Run family -------------------------------------------------------------------
pub(crate) const DIVE_GAIN: (f64, f64) = (3.5, 3.0);
pub(crate) const POWER_GAIN: (f64, f64) = (4.0, 3.5);
pub(crate) const SWEEP_GAIN: (f64, f64) = (5.0, 6.0);
pub(crate) const COUNTER_GAIN: (f64, f64) = (4.5, 5.5);
pub(crate) const LATERAL_GAIN: (f64, f64) = (7.0, 9.0);
pub(crate) const FUMBLE_BASE: f64 = 0.012;
pub(crate) const FUMBLE_RECOVERY_BY_OFFENSE: f64 = 0.45;
pub(crate) const LATERAL_FAILURE_BASE: f64 = 0.22;
pub(crate) const LATERAL_INTERCEPTION_SHARE: f64 = 0.18;
pub(crate) const LATERAL_FAILURE_LOSS: (f64, f64) = (-3.0, 2.0);

// Kick-pass family -------------------------------------------------------------
pub(crate) const SHORT_PASS_GAIN: (f64, f64) = (9.0, 5.0);
pub(crate) const DEEP_PASS_GAIN: (f64, f64) = (22.0, 9.0);
pub(crate) const SHORT_COMPLETION_BASE: f64 = 0.66;
pub(crate) const DEEP_COMPLETION_BASE: f64 = 0.40;
pub(crate) const SHORT_INTERCEPTION_BASE: f64 = 0.025;
pub(crate) const DEEP_INTERCEPTION_BASE: f64 = 0.055;
pub(crate) const SACK_BASE: f64 = 0.06;
pub(crate) const SACK_BLITZ_BONUS: f64 = 0.06;
pub(crate) const SACK_LOSS: (f64, f64) = (6.0, 3.0);
pub(crate) const RECEIVER_RANK_WEIGHTS: [f64; 5] = [0.35, 0.25, 0.18, 0.12, 0.10];
/// Depth past the line of scrimmage at which passes are picked off.
pub(crate) const SHORT_PASS_DEPTH: i32 = 8;
pub(crate) const DEEP_PASS_DEPTH: i32 = 22;
/// Coverage loosens by this share of blitz intensity when extra rushers come.
pub(crate) const BLITZ_COVERAGE_COST: f64 = 0.06;

// Breakaway ----------------------------------------------------------------------
pub(crate) const BREAKAWAY_DIVE: f64 = 0.03;
pub(crate) const BREAKAWAY_POWER: f64 = 0.025;
pub(crate) const BREAKAWAY_SWEEP: f64 = 0.08;
pub(crate) const BREAKAWAY_COUNTER: f64 = 0.07;
pub(crate) const BREAKAWAY_LATERAL: f64 = 0.10;
pub(crate) const BREAKAWAY_SHORT_PASS: f64 = 0.05;
pub(crate) const BREAKAWAY_DEEP_PASS: f64 = 0.12;
/// Gains below this do not qualify for a breakaway roll.
pub(crate) const BREAKAWAY_MIN_GAIN: i32 = 4;
pub(crate) const BREAKAWAY_EXTRA: (f64, f64) = (18.0, 12.0);

// Kicking ------------------------------------------------------------------------
pub(crate) const DROP_KICK_MAKE_BASE: f64 = 0.78;
pub(crate) const PLACE_KICK_MAKE_BASE: f64 = 0.90;
pub(crate) const DROP_KICK_DECAY_PER_YARD: f64 = 0.018;
pub(crate) const PLACE_KICK_DECAY_PER_YARD: f64 = 0.012;
pub(crate) const KICK_DECAY_START: i32 = 20;
pub(crate) const PLACE_KICK_RANGE_BASE: f64 = 40.0;
pub(crate) const DROP_KICK_RANGE_SHORTFALL: f64 = 8.0;
pub(crate) const KICK_RANGE_PER_POWER: f64 = 0.2;
pub(crate) const BLOCK_BASE: f64 = 0.03;
pub(crate) const BLOCKED_KICK_DEFENSE_RECOVERY: f64 = 0.6;
pub(crate) const PUNT_BASE_DISTANCE: f64 = 35.0;
pub(crate) const PUNT_DISTANCE_PER_POWER: f64 = 0.2;
pub(crate) const PUNT_SPREAD: f64 = 6.0;
/// Punts landing deeper than this past the goal line are dead balls.
pub(crate) const PUNT_TOUCHBACK_DEPTH: i32 = 10;
pub(crate) const RETURN_GAIN: (f64, f64) = (9.0, 7.0);
pub(crate) const END_ZONE_RETURN_FAILURE: f64 = 0.35;
pub(crate) const RETURN_BREAKAWAY: f64 = 0.04;

// Officiating --------------------------------------------------------------------
pub(crate) const HOLDING_YARDS: i32 = 10;
pub(crate) const OFFSIDE_YARDS: i32 = 5;

// Fatigue ------------------------------------------------------------------------
pub(crate) const FATIGUE_PER_SNAP: f64 = 0.0012;
pub(crate) const FATIGUE_CAP: f64 = 0.08;
