//! Play category selection: identity base weights shaped by field zone,
//! down and distance, coaching and defensive adaptation, then bounded by the
//! risk ceiling and drawn on the selection stream.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::adaptation::AdaptationTracker;
use crate::coaching::CoachingSnapshot;
use crate::config::{AdaptationConfig, SelectorConfig};
use crate::constants::{KICK_MODE_DOWN, KICK_SETBACK_YARDS, VICTORY_FORMATION_SECONDS};
use crate::identity::{offense_keys, DefensiveIdentity, OffensiveIdentity};
use crate::numbers::count_to_f64;
use crate::play::{DefensiveCall, Formation, Personnel, PlayCategory};
use crate::rng::{pick_weighted, roll_chance, unit};
use crate::state::{GameState, SeriesPhase};

/// Single multiplicative factor applied to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightFactor {
    pub label: String,
    pub value: f64,
}

/// Candidate weight telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub category: PlayCategory,
    pub base_weight: f64,
    /// Multipliers applied in order (only recorded when tracing).
    pub multipliers: Vec<WeightFactor>,
    /// Selection probability after renormalization and the risk ceiling.
    pub probability: f64,
}

/// Why a category was chosen on a snap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionTrace {
    pub roll: f64,
    pub candidates: Vec<WeightedCandidate>,
    pub selected: PlayCategory,
}

/// Longest scoring kicks available to the offense's kicker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KickRanges {
    pub drop_kick: f64,
    pub place_kick: f64,
}

/// Everything the selector reads for one snap.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub state: &'a GameState,
    pub offense: &'a OffensiveIdentity,
    pub defense: &'a DefensiveIdentity,
    pub coaching: &'a CoachingSnapshot,
    /// The defending team's tracker.
    pub adaptation: &'a AdaptationTracker,
    pub adaptation_config: &'a AdaptationConfig,
    pub config: &'a SelectorConfig,
    pub kick_ranges: KickRanges,
}

/// The call for one snap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub category: PlayCategory,
    pub formation: Formation,
    pub defense: DefensiveCall,
    pub trace: Option<SelectionTrace>,
}

#[derive(Debug, Clone)]
struct Candidate {
    category: PlayCategory,
    base: f64,
    weight: f64,
    factors: Vec<WeightFactor>,
}

impl Candidate {
    fn apply(&mut self, label: &str, value: f64, trace: bool) {
        if (value - 1.0).abs() < f64::EPSILON {
            return;
        }
        self.weight *= value;
        if trace {
            self.factors.push(WeightFactor {
                label: label.to_string(),
                value,
            });
        }
    }
}

/// Leading late in the fourth quarter with the ball.
#[must_use]
pub fn victory_formation(state: &GameState) -> bool {
    state.quarter == 4 && state.clock <= VICTORY_FORMATION_SECONDS && state.offense_lead() > 0
}

/// Yards a scoring kick from the current spot would travel.
#[must_use]
pub const fn scoring_kick_distance(state: &GameState) -> i32 {
    state.yards_to_goal() + KICK_SETBACK_YARDS
}

fn in_range(category: PlayCategory, distance: i32, ranges: KickRanges) -> bool {
    let range = match category {
        PlayCategory::DropKick => ranges.drop_kick,
        PlayCategory::PlaceKick => ranges.place_kick,
        _ => return true,
    };
    f64::from(distance) <= range
}

/// Whether either scoring kick is within the kicker's range.
#[must_use]
pub fn scoring_kick_in_range(state: &GameState, ranges: KickRanges) -> bool {
    let distance = scoring_kick_distance(state);
    in_range(PlayCategory::PlaceKick, distance, ranges)
        || in_range(PlayCategory::DropKick, distance, ranges)
}

fn candidates(ctx: &SelectionContext<'_>) -> Vec<Candidate> {
    let state = ctx.state;
    let cfg = ctx.config;
    let trace = cfg.trace;
    let offense = ctx.offense;
    let ytg = state.yards_to_goal();
    let kick_distance = scoring_kick_distance(state);
    let specialist = state.phase() == SeriesPhase::Specialist;

    let pool: Vec<PlayCategory> = if specialist {
        PlayCategory::KICKS.to_vec()
    } else {
        PlayCategory::CALLABLE
            .into_iter()
            .filter(|c| *c != PlayCategory::Punt || state.down >= KICK_MODE_DOWN)
            .collect()
    };

    let mut out: Vec<Candidate> = pool
        .into_iter()
        .map(|category| {
            let base = offense.weight(category);
            Candidate {
                category,
                base,
                weight: base,
                factors: Vec::new(),
            }
        })
        .collect();

    for c in &mut out {
        let category = c.category;
        if ytg <= cfg.red_zone_yards {
            if category.is_ground() {
                c.apply("red zone ground", offense.ext(offense_keys::RED_ZONE_GROUND_BOOST), trace);
            } else if category.is_scoring_kick() {
                c.apply("red zone kick", cfg.red_zone_kick_factor, trace);
            } else if category == PlayCategory::Punt {
                c.apply("red zone punt", 0.0, trace);
            }
        } else if ytg <= cfg.kick_zone_yards && category.is_scoring_kick() {
            c.apply("kick range", offense.ext(offense_keys::KICK_RANGE_BOOST), trace);
        }
        if category.is_scoring_kick() && !in_range(category, kick_distance, ctx.kick_ranges) {
            c.apply("out of range", cfg.out_of_range_factor, trace);
        }
        if !specialist {
            if state.distance <= cfg.short_yardage
                && matches!(category, PlayCategory::Dive | PlayCategory::Power)
            {
                c.apply(
                    "short yardage",
                    offense.ext(offense_keys::SHORT_YARDAGE_POWER_BOOST),
                    trace,
                );
            }
            if state.distance >= cfg.long_yardage && category.is_air() {
                c.apply(
                    "long yardage",
                    offense.ext(offense_keys::LONG_YARDAGE_AIR_BOOST),
                    trace,
                );
            }
            if state.down <= 2 && category.is_scoring_kick() {
                c.apply("early down kick", 0.5, trace);
            }
            if state.down == 6 && category == PlayCategory::Punt && ytg > cfg.kick_zone_yards {
                c.apply("last down punt", 2.0, trace);
            }
        }
        c.apply("coaching", ctx.coaching.category_mult(category), trace);
        c.apply(
            "adaptation",
            ctx.adaptation.multiplier(category, ctx.adaptation_config),
            trace,
        );
    }
    out
}

/// Renormalize and cap each risk category at `ceiling`, handing the excess
/// to non-risk categories in proportion to their share. With no non-risk
/// weight at all the excess is split evenly across them instead.
fn normalize_with_ceiling(weights: &[f64], risk: &[bool], ceiling: f64) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return vec![0.0; weights.len()];
    }
    let mut probs: Vec<f64> = weights.iter().map(|w| w / total).collect();
    let mut excess = 0.0;
    for (p, is_risk) in probs.iter_mut().zip(risk) {
        if *is_risk && *p > ceiling {
            excess += *p - ceiling;
            *p = ceiling;
        }
    }
    if excess <= 0.0 {
        return probs;
    }
    let safe_count = risk.iter().filter(|r| !**r).count();
    if safe_count == 0 {
        // Nothing can absorb the excess; the cap cannot hold.
        return weights.iter().map(|w| w / total).collect();
    }
    let safe: f64 = probs
        .iter()
        .zip(risk)
        .filter(|(_, r)| !**r)
        .map(|(p, _)| *p)
        .sum();
    let even = excess / count_to_f64(safe_count);
    for (p, is_risk) in probs.iter_mut().zip(risk) {
        if !*is_risk {
            *p += if safe > 0.0 { excess * (*p / safe) } else { even };
        }
    }
    probs
}

/// Candidates with their final weights, alongside the capped distribution.
fn weigh(ctx: &SelectionContext<'_>) -> (Vec<Candidate>, Vec<(PlayCategory, f64)>) {
    let cands = candidates(ctx);
    let weights: Vec<f64> = cands.iter().map(|c| c.weight.max(0.0)).collect();
    let risk: Vec<bool> = cands.iter().map(|c| c.category.is_risk()).collect();
    let probs = normalize_with_ceiling(&weights, &risk, ctx.offense.ext(offense_keys::RISK_CEILING));
    let dist = cands.iter().map(|c| c.category).zip(probs).collect();
    (cands, dist)
}

/// Selection probabilities for the current snap, before the draw.
#[must_use]
pub fn category_distribution(ctx: &SelectionContext<'_>) -> Vec<(PlayCategory, f64)> {
    weigh(ctx).1
}

/// Walk the cumulative distribution; the last live category absorbs rounding.
fn pick_from(dist: &[(PlayCategory, f64)], roll: f64) -> Option<PlayCategory> {
    let mut selected = None;
    let mut acc = 0.0;
    for &(category, p) in dist {
        if p <= 0.0 {
            continue;
        }
        acc += p;
        selected = Some(category);
        if roll < acc {
            break;
        }
    }
    selected
}

fn draw_category<R: Rng + ?Sized>(
    ctx: &SelectionContext<'_>,
    rng: &mut R,
) -> (PlayCategory, Option<SelectionTrace>) {
    let (cands, dist) = weigh(ctx);
    let roll = unit(rng);
    let fallback = if ctx.state.phase() == SeriesPhase::Specialist {
        PlayCategory::Punt
    } else {
        PlayCategory::Dive
    };
    let selected = pick_from(&dist, roll).unwrap_or(fallback);

    let trace = ctx.config.trace.then(|| SelectionTrace {
        roll,
        candidates: cands
            .into_iter()
            .zip(&dist)
            .map(|(c, &(_, probability))| WeightedCandidate {
                category: c.category,
                base_weight: c.base,
                multipliers: c.factors,
                probability,
            })
            .collect(),
        selected,
    });
    (selected, trace)
}

fn draw_formation<R: Rng + ?Sized>(
    ctx: &SelectionContext<'_>,
    category: PlayCategory,
    rng: &mut R,
) -> Formation {
    if category.is_kick() {
        return Formation::Kick;
    }
    let weights: Vec<(Formation, f64)> = Formation::SCRIMMAGE
        .into_iter()
        .map(|f| {
            let base = ctx.offense.formation_weights.get(&f).copied().unwrap_or(0.0);
            (f, base * ctx.coaching.formation_mult(f))
        })
        .collect();
    pick_weighted(rng, &weights)
        .copied()
        .unwrap_or(Formation::Balanced)
}

fn draw_defense<R: Rng + ?Sized>(ctx: &SelectionContext<'_>, rng: &mut R) -> DefensiveCall {
    let state = ctx.state;
    let weights: Vec<(Personnel, f64)> = Personnel::ALL
        .into_iter()
        .map(|p| {
            let base = ctx.defense.personnel_weights.get(&p).copied().unwrap_or(0.0);
            let situational = match p {
                Personnel::GoalLine if state.yards_to_goal() <= ctx.config.red_zone_yards => 2.0,
                Personnel::Dime if state.distance >= ctx.config.long_yardage => 1.5,
                _ => 1.0,
            };
            (p, base * situational)
        })
        .collect();
    let personnel = pick_weighted(rng, &weights)
        .copied()
        .unwrap_or(Personnel::Base);
    let blitz = roll_chance(rng, ctx.defense.blitz_rate);
    DefensiveCall { personnel, blitz }
}

/// Choose category, formation and defensive call for the snap.
pub fn select_play<R: Rng + ?Sized>(ctx: &SelectionContext<'_>, rng: &mut R) -> Selection {
    if victory_formation(ctx.state) && ctx.state.phase() != SeriesPhase::Specialist {
        return Selection {
            category: PlayCategory::Kneel,
            formation: Formation::Balanced,
            defense: DefensiveCall::default(),
            trace: None,
        };
    }
    let (category, trace) = draw_category(ctx, rng);
    let formation = draw_formation(ctx, category, rng);
    let defense = draw_defense(ctx, rng);
    Selection {
        category,
        formation,
        defense,
        trace,
    }
}
