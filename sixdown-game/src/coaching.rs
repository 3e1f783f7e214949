//! Coaching influence: a per-game lead-management profile and the per-drive
//! modifier snapshot it produces for the selector and drive state machine.
//!
//! Data flows one way. The profile is derived once per game; a snapshot is
//! recomputed from the score differential at the start of every drive and
//! nothing downstream writes back into it.
use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoachingError;
use crate::identity::TeamIdentity;
use crate::numbers::{clamp_probability, smoothstep};
use crate::play::{Formation, PlayCategory, PlayFamily};
use crate::rng::roll_chance;

/// Coaching personality ratings on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoachRatings {
    pub aggression: f64,
    pub patience: f64,
    pub adaptability: f64,
    pub risk_tolerance: f64,
    pub clock_discipline: f64,
}

impl CoachRatings {
    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("aggression", self.aggression),
            ("patience", self.patience),
            ("adaptability", self.adaptability),
            ("risk_tolerance", self.risk_tolerance),
            ("clock_discipline", self.clock_discipline),
        ]
    }
}

/// Lead-management countermeasure tendencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Countermeasure {
    AggressiveHold,
    BandRegulated,
    ClockControl,
    ScoreTrade,
    LowVarianceScore,
}

impl Countermeasure {
    pub const ALL: [Self; 5] = [
        Self::AggressiveHold,
        Self::BandRegulated,
        Self::ClockControl,
        Self::ScoreTrade,
        Self::LowVarianceScore,
    ];

    /// Effect table when protecting a lead. Trailing mirrors it around 1.
    const fn lead_table(self) -> EffectTable {
        match self {
            Self::AggressiveHold => EffectTable {
                run: 0.95,
                air: 1.15,
                risk: 1.1,
                drop_kick: 1.0,
                place_kick: 0.95,
                punt: 0.9,
                heavy: 0.9,
                spread: 1.15,
                tempo: 0.9,
                kick_threshold: 1.1,
            },
            Self::BandRegulated => EffectTable {
                run: 1.05,
                air: 1.0,
                risk: 0.95,
                drop_kick: 1.0,
                place_kick: 1.05,
                punt: 1.0,
                heavy: 1.05,
                spread: 1.0,
                tempo: 1.05,
                kick_threshold: 0.95,
            },
            Self::ClockControl => EffectTable {
                run: 1.25,
                air: 0.8,
                risk: 0.6,
                drop_kick: 0.9,
                place_kick: 1.0,
                punt: 1.1,
                heavy: 1.3,
                spread: 0.8,
                tempo: 1.3,
                kick_threshold: 0.9,
            },
            Self::ScoreTrade => EffectTable {
                run: 0.95,
                air: 1.1,
                risk: 1.05,
                drop_kick: 1.2,
                place_kick: 1.1,
                punt: 0.85,
                heavy: 0.95,
                spread: 1.1,
                tempo: 0.85,
                kick_threshold: 0.85,
            },
            Self::LowVarianceScore => EffectTable {
                run: 1.1,
                air: 0.95,
                risk: 0.5,
                drop_kick: 1.05,
                place_kick: 1.3,
                punt: 1.0,
                heavy: 1.1,
                spread: 0.95,
                tempo: 1.1,
                kick_threshold: 0.75,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EffectTable {
    run: f64,
    air: f64,
    risk: f64,
    drop_kick: f64,
    place_kick: f64,
    punt: f64,
    heavy: f64,
    spread: f64,
    tempo: f64,
    kick_threshold: f64,
}

impl EffectTable {
    fn category(&self, category: PlayCategory) -> f64 {
        let base = match category.family() {
            PlayFamily::Run => self.run,
            PlayFamily::Lateral | PlayFamily::KickPass => self.air,
            PlayFamily::Kicking => match category {
                PlayCategory::DropKick => self.drop_kick,
                PlayCategory::PlaceKick => self.place_kick,
                _ => self.punt,
            },
            PlayFamily::Clock => 1.0,
        };
        if category.is_risk() {
            base * self.risk
        } else {
            base
        }
    }

    const fn formation(&self, formation: Formation) -> f64 {
        match formation {
            Formation::Heavy => self.heavy,
            Formation::Spread => self.spread,
            Formation::Balanced | Formation::Kick => 1.0,
        }
    }
}

/// Mirror a lead-protection factor for a trailing team.
fn mirrored(value: f64, trailing: bool) -> f64 {
    if trailing { (2.0 - value).max(0.2) } else { value }
}

/// Per-game coaching profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingProfile {
    /// Normalized weights across [`Countermeasure::ALL`].
    pub weights: BTreeMap<Countermeasure, f64>,
    /// Points of lead or deficit at which the profile reaches full strength.
    pub sensitivity: f64,
    pub personality: BTreeMap<PlayCategory, f64>,
    pub tempo_bias: f64,
    pub base_kick_threshold: f64,
}

impl CoachingProfile {
    /// Baseline behaviour: no lead management, no personality shifts.
    #[must_use]
    pub fn neutral(identity: &TeamIdentity) -> Self {
        Self {
            weights: Countermeasure::ALL.into_iter().map(|c| (c, 0.0)).collect(),
            sensitivity: 24.0,
            personality: BTreeMap::new(),
            tempo_bias: 1.0,
            base_kick_threshold: base_kick_threshold(identity),
        }
    }

    /// Rebuild a coach's profile from personality ratings and identity.
    ///
    /// # Errors
    ///
    /// Returns a [`CoachingError`] when a rating is non-finite or outside
    /// 0..=100, or when every countermeasure weight comes out zero.
    pub fn reconstruct(
        ratings: &CoachRatings,
        identity: &TeamIdentity,
    ) -> Result<Self, CoachingError> {
        for (field, value) in ratings.fields() {
            if !value.is_finite() {
                return Err(CoachingError::NonFinite { field });
            }
            if !(0.0..=100.0).contains(&value) {
                return Err(CoachingError::RatingOutOfRange { field, value });
            }
        }
        let CoachRatings {
            aggression,
            patience,
            adaptability,
            risk_tolerance,
            clock_discipline,
        } = *ratings;
        let kick_lean = identity.offense.kick_aggression * 20.0;
        let raw = [
            (Countermeasure::AggressiveHold, aggression * 0.6 + risk_tolerance * 0.4),
            (Countermeasure::BandRegulated, patience * 0.5 + adaptability * 0.5),
            (Countermeasure::ClockControl, clock_discipline * 0.7 + patience * 0.3),
            (Countermeasure::ScoreTrade, aggression * 0.5 + (100.0 - patience) * 0.5),
            (
                Countermeasure::LowVarianceScore,
                (100.0 - risk_tolerance) * 0.6 + clock_discipline * 0.4 + kick_lean,
            ),
        ];
        let total: f64 = raw.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(CoachingError::DegenerateProfile);
        }
        let weights = raw.into_iter().map(|(c, w)| (c, w / total)).collect();

        let risk_lean = 0.3f64.mul_add(aggression / 100.0, 0.85);
        let mut personality = BTreeMap::new();
        personality.insert(PlayCategory::LateralChain, risk_lean);
        personality.insert(
            PlayCategory::DeepKickPass,
            risk_lean * 0.2f64.mul_add(risk_tolerance / 100.0, 0.9),
        );
        personality.insert(PlayCategory::Punt, 0.2f64.mul_add(-aggression / 100.0, 1.1));
        personality.insert(PlayCategory::Power, 0.1f64.mul_add(patience / 100.0, 0.95));

        Ok(Self {
            weights,
            sensitivity: 0.18f64.mul_add(-adaptability, 24.0),
            personality,
            tempo_bias: 0.1f64.mul_add(clock_discipline / 100.0, 0.95),
            base_kick_threshold: base_kick_threshold(identity),
        })
    }

    /// Dominant countermeasure, for reports.
    #[must_use]
    pub fn dominant(&self) -> Option<Countermeasure> {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(c, _)| *c)
    }

    /// Ramp from 0 to 1 as the absolute differential approaches sensitivity.
    #[must_use]
    pub fn ramp(&self, differential: i32) -> f64 {
        if self.sensitivity <= 0.0 {
            return 1.0;
        }
        smoothstep(f64::from(differential.unsigned_abs()) / self.sensitivity)
    }

    /// Modifier snapshot for a drive starting at `differential` (own minus opponent).
    #[must_use]
    pub fn snapshot(&self, differential: i32) -> CoachingSnapshot {
        let ramp = self.ramp(differential);
        let trailing = differential < 0;
        let blend = |pick: &dyn Fn(&EffectTable) -> f64| -> f64 {
            let shift: f64 = self
                .weights
                .iter()
                .map(|(c, w)| w * (mirrored(pick(&c.lead_table()), trailing) - 1.0))
                .sum();
            ramp.mul_add(shift, 1.0).max(0.05)
        };
        let category = PlayCategory::CALLABLE
            .into_iter()
            .map(|c| {
                let personality = self.personality.get(&c).copied().unwrap_or(1.0);
                (c, blend(&|t: &EffectTable| t.category(c)) * personality)
            })
            .collect();
        let formation = Formation::SCRIMMAGE
            .into_iter()
            .map(|f| (f, blend(&|t: &EffectTable| t.formation(f))))
            .collect();
        CoachingSnapshot {
            differential,
            ramp,
            category,
            formation,
            tempo: blend(&|t: &EffectTable| t.tempo) * self.tempo_bias,
            kick_threshold: self.base_kick_threshold * blend(&|t: &EffectTable| t.kick_threshold),
        }
    }
}

fn base_kick_threshold(identity: &TeamIdentity) -> f64 {
    8.0f64.mul_add(-identity.offense.kick_aggression, 14.0)
}

/// Coaching modifiers frozen for one drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingSnapshot {
    pub differential: i32,
    pub ramp: f64,
    pub category: BTreeMap<PlayCategory, f64>,
    pub formation: BTreeMap<Formation, f64>,
    pub tempo: f64,
    /// Distance-to-go at or beyond which down 4 commits to kick-mode.
    pub kick_threshold: f64,
}

impl CoachingSnapshot {
    #[must_use]
    pub fn category_mult(&self, category: PlayCategory) -> f64 {
        self.category.get(&category).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn formation_mult(&self, formation: Formation) -> f64 {
        self.formation.get(&formation).copied().unwrap_or(1.0)
    }

    /// Down-4 decision. In scoring-kick range the bar is halved. Within a
    /// yard of the bar the call is a coin flip on the coaching stream.
    pub fn commit_kick_mode<R: Rng + ?Sized>(
        &self,
        distance: i32,
        in_kick_range: bool,
        rng: &mut R,
    ) -> bool {
        let threshold = if in_kick_range {
            self.kick_threshold * 0.5
        } else {
            self.kick_threshold
        };
        let gap = f64::from(distance) - threshold;
        if gap.abs() < 1.0 {
            return roll_chance(rng, clamp_probability(0.5 + gap * 0.5));
        }
        gap > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::balanced_identity;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn coach() -> CoachRatings {
        CoachRatings {
            aggression: 40.0,
            patience: 70.0,
            adaptability: 60.0,
            risk_tolerance: 30.0,
            clock_discipline: 85.0,
        }
    }

    #[test]
    fn profile_weights_are_normalized() {
        let profile = CoachingProfile::reconstruct(&coach(), &balanced_identity()).unwrap();
        let total: f64 = profile.weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(profile.dominant(), Some(Countermeasure::LowVarianceScore));
        assert!((profile.sensitivity - 13.2).abs() < 1e-9);
    }

    #[test]
    fn invalid_ratings_fail_reconstruction() {
        let mut ratings = coach();
        ratings.patience = 140.0;
        assert_eq!(
            CoachingProfile::reconstruct(&ratings, &balanced_identity()),
            Err(CoachingError::RatingOutOfRange {
                field: "patience",
                value: 140.0
            })
        );
        ratings.patience = f64::NAN;
        assert_eq!(
            CoachingProfile::reconstruct(&ratings, &balanced_identity()),
            Err(CoachingError::NonFinite { field: "patience" })
        );
    }

    #[test]
    fn tied_game_applies_only_personality() {
        let profile = CoachingProfile::reconstruct(&coach(), &balanced_identity()).unwrap();
        let snap = profile.snapshot(0);
        assert!(snap.ramp.abs() < f64::EPSILON);
        assert!((snap.category_mult(PlayCategory::Dive) - 1.0).abs() < 1e-12);
        assert!(
            (snap.category_mult(PlayCategory::LateralChain) - profile.personality[&PlayCategory::LateralChain])
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn ramp_is_continuous_not_a_switch() {
        let profile = CoachingProfile::reconstruct(&coach(), &balanced_identity()).unwrap();
        let mut last = 0.0;
        for lead in 0..=20 {
            let ramp = profile.ramp(lead);
            assert!(ramp >= last);
            assert!(ramp - last < 0.2, "jump at lead {lead}");
            last = ramp;
        }
        assert!((profile.ramp(40) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clock_control_coach_runs_more_when_leading_and_less_when_trailing() {
        let profile = CoachingProfile::reconstruct(&coach(), &balanced_identity()).unwrap();
        let leading = profile.snapshot(18);
        let trailing = profile.snapshot(-18);
        assert!(leading.category_mult(PlayCategory::Power) > 1.0);
        assert!(trailing.category_mult(PlayCategory::Power) < leading.category_mult(PlayCategory::Power));
        assert!(leading.tempo > trailing.tempo);
        assert!(leading.formation_mult(Formation::Heavy) > trailing.formation_mult(Formation::Heavy));
    }

    #[test]
    fn neutral_profile_is_flat() {
        let identity = balanced_identity();
        let snap = CoachingProfile::neutral(&identity).snapshot(-30);
        for category in PlayCategory::CALLABLE {
            assert!((snap.category_mult(category) - 1.0).abs() < 1e-12);
        }
        assert!((snap.tempo - 1.0).abs() < 1e-12);
        let expected = 14.0 - 8.0 * identity.offense.kick_aggression;
        assert!((snap.kick_threshold - expected).abs() < 1e-12);
    }

    #[test]
    fn kick_mode_follows_threshold_away_from_the_margin() {
        let identity = balanced_identity();
        let snap = CoachingProfile::neutral(&identity).snapshot(0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(snap.commit_kick_mode(19, false, &mut rng));
        assert!(!snap.commit_kick_mode(1, false, &mut rng));
    }
}
