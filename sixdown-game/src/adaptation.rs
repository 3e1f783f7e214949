//! Defensive adaptation: the defense learns to read overused categories.
use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::AdaptationConfig;
use crate::numbers::floor_yards;
use crate::play::PlayCategory;
use crate::rng::roll_chance;

/// What the defense knows about the offense's tendencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveInputs {
    /// Defense read rating (back-seven awareness plus identity bonus).
    pub instinct: f64,
    /// Offense disguise rating.
    pub deception: f64,
}

/// A change to the suppression table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AdaptationEvent {
    Solved { category: PlayCategory, chance: f64 },
    Decayed { category: PlayCategory, strength: f64 },
    Cleared { category: PlayCategory },
    HalftimeSolved { category: PlayCategory, chance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Suppression {
    strength: f64,
    avoided: u32,
}

/// Per-defense tracker of category calls and active suppressions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptationTracker {
    drive_counts: BTreeMap<PlayCategory, u32>,
    half_counts: BTreeMap<PlayCategory, u32>,
    suppressed: BTreeMap<PlayCategory, Suppression>,
    solve_rolls: u32,
}

/// Probability that a defense solves a category.
#[must_use]
pub fn solve_chance(cfg: &AdaptationConfig, inputs: SolveInputs, excess: u32) -> f64 {
    let instinct = (inputs.instinct - 50.0) / 100.0 * cfg.instinct_scale;
    let deception = (inputs.deception - 50.0) / 100.0 * cfg.deception_scale;
    let frequency = cfg.excess_step * f64::from(excess);
    (cfg.base_chance + instinct + frequency - deception).clamp(0.0, cfg.max_solve_chance)
}

impl AdaptationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_drive(&mut self) {
        self.drive_counts.clear();
    }

    #[must_use]
    pub fn drive_count(&self, category: PlayCategory) -> u32 {
        self.drive_counts.get(&category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn half_count(&self, category: PlayCategory) -> u32 {
        self.half_counts.get(&category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_suppressed(&self, category: PlayCategory) -> bool {
        self.suppressed.contains_key(&category)
    }

    #[must_use]
    pub const fn solve_rolls(&self) -> u32 {
        self.solve_rolls
    }

    /// Output multiplier for `category` (1.0 when unsolved).
    #[must_use]
    pub fn multiplier(&self, category: PlayCategory, cfg: &AdaptationConfig) -> f64 {
        self.suppressed
            .get(&category)
            .map_or(1.0, |s| cfg.suppression.mul_add(-s.strength, 1.0))
    }

    /// Shrink a positive gain by the suppression multiplier; losses pass through.
    #[must_use]
    pub fn suppress_yards(&self, category: PlayCategory, yards: i32, cfg: &AdaptationConfig) -> i32 {
        if yards <= 0 {
            return yards;
        }
        floor_yards(f64::from(yards) * self.multiplier(category, cfg))
    }

    /// Count a call and roll a solve check once a threshold is crossed.
    ///
    /// The adaptation stream is only drawn from when a check actually happens.
    pub fn record_call<R: Rng + ?Sized>(
        &mut self,
        category: PlayCategory,
        inputs: SolveInputs,
        cfg: &AdaptationConfig,
        rng: &mut R,
    ) -> Vec<AdaptationEvent> {
        let mut events = Vec::new();
        if category == PlayCategory::Kneel {
            return events;
        }
        self.track_avoidance(category, cfg, &mut events);
        if !category.is_adaptable() {
            return events;
        }
        let drive = {
            let count = self.drive_counts.entry(category).or_insert(0);
            *count += 1;
            *count
        };
        let half = {
            let count = self.half_counts.entry(category).or_insert(0);
            *count += 1;
            *count
        };
        if self.is_suppressed(category) {
            return events;
        }
        let drive_excess = drive.checked_sub(cfg.drive_threshold);
        let half_excess = half.checked_sub(cfg.half_threshold);
        let excess = match (drive_excess, half_excess) {
            (None, None) => return events,
            (a, b) => a.unwrap_or(0).max(b.unwrap_or(0)),
        };
        let chance = solve_chance(cfg, inputs, excess);
        self.solve_rolls += 1;
        if roll_chance(rng, chance) {
            self.suppressed.insert(
                category,
                Suppression {
                    strength: 1.0,
                    avoided: 0,
                },
            );
            events.push(AdaptationEvent::Solved { category, chance });
        }
        events
    }

    fn track_avoidance(
        &mut self,
        called: PlayCategory,
        cfg: &AdaptationConfig,
        events: &mut Vec<AdaptationEvent>,
    ) {
        let mut cleared = Vec::new();
        for (category, suppression) in &mut self.suppressed {
            if *category == called {
                suppression.avoided = 0;
                continue;
            }
            suppression.avoided += 1;
            if suppression.avoided >= cfg.avoid_plays {
                suppression.avoided = 0;
                suppression.strength -= cfg.decay_step;
                if suppression.strength <= 0.0 {
                    cleared.push(*category);
                } else {
                    events.push(AdaptationEvent::Decayed {
                        category: *category,
                        strength: suppression.strength,
                    });
                }
            }
        }
        for category in cleared {
            self.suppressed.remove(&category);
            events.push(AdaptationEvent::Cleared { category });
        }
    }

    /// Most-called category of the half; ties break toward category order.
    #[must_use]
    pub fn most_used(&self) -> Option<PlayCategory> {
        self.half_counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(c, _)| *c)
    }

    /// Re-roll toward the offense's favourite first-half category, then
    /// reset the half window.
    pub fn halftime<R: Rng + ?Sized>(
        &mut self,
        inputs: SolveInputs,
        cfg: &AdaptationConfig,
        rng: &mut R,
    ) -> Option<AdaptationEvent> {
        let target = self.most_used();
        self.half_counts.clear();
        self.drive_counts.clear();
        let category = target?;
        let chance = (solve_chance(cfg, inputs, 0) + cfg.halftime_bonus).min(cfg.max_solve_chance);
        self.solve_rolls += 1;
        if !roll_chance(rng, chance) {
            return None;
        }
        self.suppressed.insert(
            category,
            Suppression {
                strength: 1.0,
                avoided: 0,
            },
        );
        Some(AdaptationEvent::HalftimeSolved { category, chance })
    }

    /// Categories currently suppressed with their multipliers.
    #[must_use]
    pub fn active(&self, cfg: &AdaptationConfig) -> Vec<(PlayCategory, f64)> {
        self.suppressed
            .keys()
            .map(|c| (*c, self.multiplier(*c, cfg)))
            .collect()
    }
}
