use serde::{Deserialize, Serialize};

/// Offensive play categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayCategory {
    Dive,
    Power,
    Sweep,
    Counter,
    LateralChain,
    ShortKickPass,
    DeepKickPass,
    DropKick,
    PlaceKick,
    Punt,
    Kneel,
}

/// Broad grouping used by situational boosts and identity validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayFamily {
    Run,
    Lateral,
    KickPass,
    Kicking,
    Clock,
}

impl PlayFamily {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Lateral => "lateral",
            Self::KickPass => "kick-pass",
            Self::Kicking => "kicking",
            Self::Clock => "clock",
        }
    }
}

impl PlayCategory {
    /// Categories an identity must weight; `Kneel` is situational only.
    pub const CALLABLE: [Self; 10] = [
        Self::Dive,
        Self::Power,
        Self::Sweep,
        Self::Counter,
        Self::LateralChain,
        Self::ShortKickPass,
        Self::DeepKickPass,
        Self::DropKick,
        Self::PlaceKick,
        Self::Punt,
    ];

    pub const KICKS: [Self; 3] = [Self::DropKick, Self::PlaceKick, Self::Punt];

    #[must_use]
    pub const fn family(self) -> PlayFamily {
        match self {
            Self::Dive | Self::Power | Self::Sweep | Self::Counter => PlayFamily::Run,
            Self::LateralChain => PlayFamily::Lateral,
            Self::ShortKickPass | Self::DeepKickPass => PlayFamily::KickPass,
            Self::DropKick | Self::PlaceKick | Self::Punt => PlayFamily::Kicking,
            Self::Kneel => PlayFamily::Clock,
        }
    }

    /// Categories bounded by the selector's risk ceiling.
    #[must_use]
    pub const fn is_risk(self) -> bool {
        matches!(self, Self::LateralChain | Self::DeepKickPass)
    }

    #[must_use]
    pub const fn is_kick(self) -> bool {
        matches!(self.family(), PlayFamily::Kicking)
    }

    #[must_use]
    pub const fn is_scoring_kick(self) -> bool {
        matches!(self, Self::DropKick | Self::PlaceKick)
    }

    #[must_use]
    pub const fn is_ground(self) -> bool {
        matches!(self.family(), PlayFamily::Run)
    }

    /// Lateral and kick-pass plays: the "air" side of the playbook.
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self.family(), PlayFamily::Lateral | PlayFamily::KickPass)
    }

    /// Categories the defense can learn to read.
    #[must_use]
    pub const fn is_adaptable(self) -> bool {
        self.is_ground() || self.is_air()
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dive => "dive",
            Self::Power => "power",
            Self::Sweep => "sweep",
            Self::Counter => "counter",
            Self::LateralChain => "lateral chain",
            Self::ShortKickPass => "short kick-pass",
            Self::DeepKickPass => "deep kick-pass",
            Self::DropKick => "drop kick",
            Self::PlaceKick => "place kick",
            Self::Punt => "punt",
            Self::Kneel => "kneel",
        }
    }
}

/// Offensive formation drawn alongside each play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Formation {
    Balanced,
    Heavy,
    Spread,
    Kick,
}

impl Formation {
    /// Formations available to non-kicking plays.
    pub const SCRIMMAGE: [Self; 3] = [Self::Balanced, Self::Heavy, Self::Spread];
}

/// Defensive personnel package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Personnel {
    Base,
    GoalLine,
    Nickel,
    Dime,
}

impl Personnel {
    pub const ALL: [Self; 4] = [Self::Base, Self::GoalLine, Self::Nickel, Self::Dime];

    /// Multiplier on the defense's run-stopping score.
    #[must_use]
    pub const fn run_factor(self) -> f64 {
        match self {
            Self::Base => 1.0,
            Self::GoalLine => 1.08,
            Self::Nickel => 0.96,
            Self::Dime => 0.92,
        }
    }

    /// Multiplier on the defense's coverage score.
    #[must_use]
    pub const fn coverage_factor(self) -> f64 {
        match self {
            Self::Base => 1.0,
            Self::GoalLine => 0.92,
            Self::Nickel => 1.05,
            Self::Dime => 1.09,
        }
    }
}

/// The defense's call for a single snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefensiveCall {
    pub personnel: Personnel,
    pub blitz: bool,
}

impl Default for DefensiveCall {
    fn default() -> Self {
        Self {
            personnel: Personnel::Base,
            blitz: false,
        }
    }
}
