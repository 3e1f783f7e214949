//! Game-day weather and its global contest modifiers.
use serde::{Deserialize, Serialize};

/// Weather conditions for a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Snow,
    Wind,
    Heat,
}

impl Weather {
    pub const ALL: [Self; 5] = [Self::Clear, Self::Rain, Self::Snow, Self::Wind, Self::Heat];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Wind => "wind",
            Self::Heat => "heat",
        }
    }

    /// Parse a label as used on the command line.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Multipliers applied to every snap of the game.
    #[must_use]
    pub const fn effect(self) -> WeatherEffect {
        match self {
            Self::Clear => WeatherEffect::NEUTRAL,
            Self::Rain => WeatherEffect {
                fumble: 1.35,
                kick_accuracy: 0.92,
                kick_distance: 0.95,
                fatigue: 1.1,
            },
            Self::Snow => WeatherEffect {
                fumble: 1.5,
                kick_accuracy: 0.86,
                kick_distance: 0.85,
                fatigue: 1.2,
            },
            Self::Wind => WeatherEffect {
                fumble: 1.0,
                kick_accuracy: 0.8,
                kick_distance: 0.9,
                fatigue: 1.0,
            },
            Self::Heat => WeatherEffect {
                fumble: 1.08,
                kick_accuracy: 1.0,
                kick_distance: 1.03,
                fatigue: 1.5,
            },
        }
    }
}

/// Global modifiers derived from [`Weather`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherEffect {
    pub fumble: f64,
    pub kick_accuracy: f64,
    pub kick_distance: f64,
    pub fatigue: f64,
}

impl WeatherEffect {
    pub const NEUTRAL: Self = Self {
        fumble: 1.0,
        kick_accuracy: 1.0,
        kick_distance: 1.0,
        fatigue: 1.0,
    };
}

impl Default for WeatherEffect {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
