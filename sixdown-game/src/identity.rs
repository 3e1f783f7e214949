//! Offensive and defensive identities: required weights plus an open
//! extension map of named numeric overrides.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::play::{Formation, Personnel, PlayCategory, PlayFamily};

/// Named numeric overrides consulted by the engine with documented defaults.
/// Unknown keys are carried but ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionMap(BTreeMap<String, f64>);

impl ExtensionMap {
    #[must_use]
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.0
            .get(key)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Documented offense extension keys.
pub mod offense_keys {
    pub const SHORT_YARDAGE_POWER_BOOST: (&str, f64) = ("short_yardage_power_boost", 1.5);
    pub const LONG_YARDAGE_AIR_BOOST: (&str, f64) = ("long_yardage_air_boost", 1.4);
    pub const RED_ZONE_GROUND_BOOST: (&str, f64) = ("red_zone_ground_boost", 1.4);
    pub const KICK_RANGE_BOOST: (&str, f64) = ("kick_range_boost", 1.5);
    pub const RISK_CEILING: (&str, f64) = ("risk_ceiling", 0.35);
    pub const DECEPTION: (&str, f64) = ("deception", 50.0);
    pub const BREAKAWAY_BONUS: (&str, f64) = ("breakaway_bonus", 0.0);
}

/// Documented defense extension keys.
pub mod defense_keys {
    pub const INSTINCT_BONUS: (&str, f64) = ("instinct_bonus", 0.0);
    pub const COVERAGE_BIAS: (&str, f64) = ("coverage_bias", 0.0);
    pub const LATERAL_PURSUIT: (&str, f64) = ("lateral_pursuit", 1.0);
}

fn check_weight(identity: &str, key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidWeight {
            identity: identity.to_string(),
            key: key.to_string(),
            value,
        });
    }
    Ok(())
}

fn default_formation_weights() -> BTreeMap<Formation, f64> {
    BTreeMap::from([
        (Formation::Balanced, 0.5),
        (Formation::Heavy, 0.25),
        (Formation::Spread, 0.25),
    ])
}

/// How a team attacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffensiveIdentity {
    pub name: String,
    /// Base weight for every callable category.
    pub category_weights: BTreeMap<PlayCategory, f64>,
    #[serde(default = "default_formation_weights")]
    pub formation_weights: BTreeMap<Formation, f64>,
    /// Base seconds consumed per snap.
    pub tempo: f64,
    /// 0 = never commits to kick-mode early, 1 = kicks at the first chance.
    pub kick_aggression: f64,
    #[serde(default)]
    pub extensions: ExtensionMap,
}

impl OffensiveIdentity {
    #[must_use]
    pub fn weight(&self, category: PlayCategory) -> f64 {
        self.category_weights.get(&category).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn ext(&self, key: (&str, f64)) -> f64 {
        self.extensions.get_or(key.0, key.1)
    }

    /// # Errors
    ///
    /// Rejects missing or invalid category weights, a family with no positive
    /// weight, and tempo or kick aggression outside their bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in PlayCategory::CALLABLE {
            let Some(weight) = self.category_weights.get(&category) else {
                return Err(ConfigError::MissingWeight {
                    identity: self.name.clone(),
                    key: category.label().to_string(),
                });
            };
            check_weight(&self.name, category.label(), *weight)?;
        }
        if let Some(weight) = self.category_weights.get(&PlayCategory::Kneel) {
            check_weight(&self.name, PlayCategory::Kneel.label(), *weight)?;
        }
        for family in [PlayFamily::Run, PlayFamily::Kicking] {
            let total: f64 = PlayCategory::CALLABLE
                .into_iter()
                .filter(|c| c.family() == family)
                .map(|c| self.weight(c))
                .sum();
            if total <= 0.0 {
                return Err(ConfigError::EmptyFamily {
                    identity: self.name.clone(),
                    family: family.label(),
                });
            }
        }
        for (formation, weight) in &self.formation_weights {
            check_weight(&self.name, &format!("{formation:?}"), *weight)?;
        }
        let scrimmage: f64 = Formation::SCRIMMAGE
            .into_iter()
            .map(|f| self.formation_weights.get(&f).copied().unwrap_or(0.0))
            .sum();
        if scrimmage <= 0.0 {
            return Err(ConfigError::EmptyFamily {
                identity: self.name.clone(),
                family: "formation",
            });
        }
        if !(10.0..=45.0).contains(&self.tempo) {
            return Err(ConfigError::RangeViolation {
                field: "offense.tempo",
                min: 10.0,
                max: 45.0,
                value: self.tempo,
            });
        }
        if !(0.0..=1.0).contains(&self.kick_aggression) {
            return Err(ConfigError::RangeViolation {
                field: "offense.kick_aggression",
                min: 0.0,
                max: 1.0,
                value: self.kick_aggression,
            });
        }
        let ceiling = self.ext(offense_keys::RISK_CEILING);
        if !(0.05..=1.0).contains(&ceiling) {
            return Err(ConfigError::RangeViolation {
                field: "offense.risk_ceiling",
                min: 0.05,
                max: 1.0,
                value: ceiling,
            });
        }
        Ok(())
    }
}

/// How a team defends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefensiveIdentity {
    pub name: String,
    pub personnel_weights: BTreeMap<Personnel, f64>,
    /// Chance of sending extra rushers on a snap.
    pub blitz_rate: f64,
    /// Strength of a blitz when sent, 0..=1.
    pub blitz_intensity: f64,
    #[serde(default)]
    pub extensions: ExtensionMap,
}

impl DefensiveIdentity {
    #[must_use]
    pub fn ext(&self, key: (&str, f64)) -> f64 {
        self.extensions.get_or(key.0, key.1)
    }

    /// # Errors
    ///
    /// Rejects invalid personnel weights and blitz parameters outside 0..=1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut total = 0.0;
        for (personnel, weight) in &self.personnel_weights {
            check_weight(&self.name, &format!("{personnel:?}"), *weight)?;
            total += weight;
        }
        if total <= 0.0 {
            return Err(ConfigError::EmptyFamily {
                identity: self.name.clone(),
                family: "personnel",
            });
        }
        for (field, value) in [
            ("defense.blitz_rate", self.blitz_rate),
            ("defense.blitz_intensity", self.blitz_intensity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field,
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// A team's full identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub offense: OffensiveIdentity,
    pub defense: DefensiveIdentity,
}

impl TeamIdentity {
    /// # Errors
    ///
    /// Propagates the first offensive or defensive defect.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.offense.validate()?;
        self.defense.validate()
    }
}

/// Identities for both sides of a matchup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupIdentities {
    pub home: TeamIdentity,
    pub away: TeamIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{balanced_identity, ground_identity};

    #[test]
    fn demo_identities_validate() {
        balanced_identity().validate().unwrap();
        ground_identity().validate().unwrap();
    }

    #[test]
    fn missing_category_weight_fails_fast() {
        let mut identity = balanced_identity();
        identity.offense.category_weights.remove(&PlayCategory::Counter);
        assert_eq!(
            identity.validate(),
            Err(ConfigError::MissingWeight {
                identity: identity.offense.name.clone(),
                key: "counter".into()
            })
        );
    }

    #[test]
    fn negative_or_nan_weights_are_rejected() {
        let mut identity = balanced_identity();
        identity
            .offense
            .category_weights
            .insert(PlayCategory::Sweep, f64::NAN);
        assert!(matches!(
            identity.validate(),
            Err(ConfigError::InvalidWeight { .. })
        ));
        let mut identity = balanced_identity();
        identity
            .defense
            .personnel_weights
            .insert(Personnel::Dime, -1.0);
        assert!(matches!(
            identity.validate(),
            Err(ConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn zeroed_run_family_is_rejected() {
        let mut identity = balanced_identity();
        for category in [
            PlayCategory::Dive,
            PlayCategory::Power,
            PlayCategory::Sweep,
            PlayCategory::Counter,
        ] {
            identity.offense.category_weights.insert(category, 0.0);
        }
        assert!(matches!(
            identity.validate(),
            Err(ConfigError::EmptyFamily { family: "run", .. })
        ));
    }

    #[test]
    fn extensions_fall_back_to_documented_defaults() {
        let mut identity = balanced_identity();
        assert!((identity.offense.ext(offense_keys::RISK_CEILING) - 0.35).abs() < f64::EPSILON);
        identity.offense.extensions.set("deception", 72.0);
        identity.offense.extensions.set("unknown_style_knob", 3.0);
        assert!((identity.offense.ext(offense_keys::DECEPTION) - 72.0).abs() < f64::EPSILON);
        identity.validate().unwrap();
    }

    #[test]
    fn extension_map_deserializes_from_plain_object() {
        let map: ExtensionMap =
            serde_json::from_str(r#"{"lateral_pursuit": 1.2, "coverage_bias": 0.1}"#).unwrap();
        assert!((map.get_or("lateral_pursuit", 1.0) - 1.2).abs() < f64::EPSILON);
        assert!((map.get_or("instinct_bonus", 0.0)).abs() < f64::EPSILON);
    }
}
