//! Attribute contests: weighted rating sums for the two sides of an
//! opposed action, mapped to an outcome probability. Pure, no state.
use serde::{Deserialize, Serialize};

use crate::composure::Volatility;
use crate::constants::{
    DROP_KICK_DECAY_PER_YARD, DROP_KICK_MAKE_BASE, DROP_KICK_RANGE_SHORTFALL,
    EDGE_PROBABILITY_SCALE, KICK_DECAY_START, KICK_RANGE_PER_POWER, PLACE_KICK_DECAY_PER_YARD,
    PLACE_KICK_MAKE_BASE, PLACE_KICK_RANGE_BASE,
};
use crate::numbers::clamp_probability;
use crate::play::KickKind;
use crate::roster::UnitRatings;
use crate::weather::WeatherEffect;

/// Opposed actions resolved by rating contests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestKind {
    /// Blocking unit against the pass/run rush unit at the snap.
    LineBattle,
    /// Dive and power: carrier against the tackler between the tackles.
    InsideRun,
    /// Sweep: carrier speed against pursuit to the edge.
    OutsideRun,
    /// Counter: misdirection against the defender's read.
    CutbackRun,
    /// Lateral-chain completion against pursuit.
    LateralChain,
    /// Passer accuracy plus receiver hands against coverage awareness.
    ShortKickPass,
    /// Passer power plus receiver speed against coverage speed.
    DeepKickPass,
    /// Pass protection against the rush.
    PassRush,
    /// Kick protection against the block attempt.
    KickBlock,
    /// Returner against kick coverage.
    Return,
}

#[derive(Debug, Clone, Copy)]
struct Weights {
    speed: f64,
    power: f64,
    tackling: f64,
    kick_accuracy: f64,
    kick_power: f64,
    hands: f64,
    lateral_skill: f64,
    awareness: f64,
    agility: f64,
}

const ZERO: Weights = Weights {
    speed: 0.0,
    power: 0.0,
    tackling: 0.0,
    kick_accuracy: 0.0,
    kick_power: 0.0,
    hands: 0.0,
    lateral_skill: 0.0,
    awareness: 0.0,
    agility: 0.0,
};

impl ContestKind {
    /// Rating weights for the advancing side and the resisting side.
    const fn weights(self) -> (Weights, Weights) {
        match self {
            Self::LineBattle => (
                Weights { power: 0.45, awareness: 0.2, agility: 0.15, speed: 0.2, ..ZERO },
                Weights { power: 0.4, speed: 0.25, tackling: 0.15, awareness: 0.2, ..ZERO },
            ),
            Self::InsideRun => (
                Weights { power: 0.45, speed: 0.15, agility: 0.2, awareness: 0.2, ..ZERO },
                Weights { tackling: 0.5, power: 0.3, awareness: 0.2, ..ZERO },
            ),
            Self::OutsideRun => (
                Weights { speed: 0.45, agility: 0.3, awareness: 0.1, power: 0.15, ..ZERO },
                Weights { speed: 0.4, tackling: 0.35, awareness: 0.25, ..ZERO },
            ),
            Self::CutbackRun => (
                Weights { agility: 0.4, awareness: 0.3, speed: 0.2, power: 0.1, ..ZERO },
                Weights { awareness: 0.45, tackling: 0.35, speed: 0.2, ..ZERO },
            ),
            Self::LateralChain => (
                Weights { lateral_skill: 0.45, hands: 0.25, agility: 0.15, speed: 0.15, ..ZERO },
                Weights { speed: 0.45, awareness: 0.35, tackling: 0.2, ..ZERO },
            ),
            Self::ShortKickPass => (
                Weights { kick_accuracy: 0.4, hands: 0.3, awareness: 0.2, agility: 0.1, ..ZERO },
                Weights { awareness: 0.45, speed: 0.3, agility: 0.25, ..ZERO },
            ),
            Self::DeepKickPass => (
                Weights { kick_power: 0.4, speed: 0.35, hands: 0.25, ..ZERO },
                Weights { speed: 0.55, awareness: 0.3, agility: 0.15, ..ZERO },
            ),
            Self::PassRush => (
                Weights { power: 0.4, awareness: 0.35, agility: 0.25, ..ZERO },
                Weights { speed: 0.4, power: 0.35, awareness: 0.25, ..ZERO },
            ),
            Self::KickBlock => (
                Weights { power: 0.5, awareness: 0.5, ..ZERO },
                Weights { speed: 0.5, agility: 0.25, power: 0.25, ..ZERO },
            ),
            Self::Return => (
                Weights { speed: 0.45, agility: 0.35, awareness: 0.2, ..ZERO },
                Weights { speed: 0.5, tackling: 0.3, awareness: 0.2, ..ZERO },
            ),
        }
    }
}

/// One side of a contest: ratings plus situational modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contestant {
    pub ratings: UnitRatings,
    /// Composure modifiers.
    pub volatility: Volatility,
    /// Speed and agility scale after fatigue, at most 8 % below 1.
    pub freshness: f64,
    /// Formation or personnel scale on the whole score.
    pub scheme: f64,
}

impl Contestant {
    #[must_use]
    pub fn new(ratings: UnitRatings) -> Self {
        Self {
            ratings,
            volatility: Volatility::CALM,
            freshness: 1.0,
            scheme: 1.0,
        }
    }

    #[must_use]
    pub const fn with_volatility(mut self, volatility: Volatility) -> Self {
        self.volatility = volatility;
        self
    }

    #[must_use]
    pub const fn with_freshness(mut self, freshness: f64) -> Self {
        self.freshness = freshness;
        self
    }

    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        self.scheme *= factor;
        self
    }

    fn score(&self, w: &Weights) -> f64 {
        let r = &self.ratings;
        let athletic = (w.speed * r.speed + w.agility * r.agility) * self.freshness;
        let read = w.awareness * r.awareness * self.volatility.awareness;
        let rest = w.power * r.power
            + w.tackling * r.tackling
            + w.kick_accuracy * r.kick_accuracy
            + w.kick_power * r.kick_power
            + w.hands * r.hands
            + w.lateral_skill * r.lateral_skill;
        (athletic + read + rest) * self.scheme
    }
}

/// Scores of both sides and the derived success probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub kind: ContestKind,
    pub offense: f64,
    pub defense: f64,
    /// Offense score minus defense score.
    pub edge: f64,
    /// Probability that the advancing side wins the action.
    pub probability: f64,
}

/// Resolve a contest around `base` success probability.
#[must_use]
pub fn resolve(kind: ContestKind, offense: &Contestant, defense: &Contestant, base: f64) -> Contest {
    let (ow, dw) = kind.weights();
    let o = offense.score(&ow);
    let d = defense.score(&dw);
    let edge = o - d;
    Contest {
        kind,
        offense: o,
        defense: d,
        edge,
        probability: clamp_probability(edge.mul_add(EDGE_PROBABILITY_SCALE, base)),
    }
}

/// Longest scoring kick the kicker can attempt, in yards.
#[must_use]
pub fn kick_range(kind: KickKind, kicker: &UnitRatings, weather: &WeatherEffect) -> f64 {
    let place = KICK_RANGE_PER_POWER.mul_add(kicker.kick_power, PLACE_KICK_RANGE_BASE)
        * weather.kick_distance;
    match kind {
        KickKind::PlaceKick | KickKind::Punt => place,
        KickKind::DropKick => place - DROP_KICK_RANGE_SHORTFALL,
    }
}

/// Chance a scoring kick of `distance` yards is good.
#[must_use]
pub fn kick_make_probability(
    kind: KickKind,
    distance: i32,
    kicker: &UnitRatings,
    weather: &WeatherEffect,
    volatility: Volatility,
) -> f64 {
    let (base, decay) = match kind {
        KickKind::DropKick => (DROP_KICK_MAKE_BASE, DROP_KICK_DECAY_PER_YARD),
        KickKind::PlaceKick | KickKind::Punt => (PLACE_KICK_MAKE_BASE, PLACE_KICK_DECAY_PER_YARD),
    };
    let beyond = f64::from((distance - KICK_DECAY_START).max(0));
    let skill = (kicker.kick_accuracy - 60.0) * 0.004 * volatility.awareness;
    let p = (base - decay * beyond + skill) * weather.kick_accuracy;
    // Composure miscues shave the make rate.
    clamp_probability(p - (volatility.miscue - 1.0) * 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Ratings;
    use crate::weather::Weather;

    fn side(value: u8) -> Contestant {
        Contestant::new(UnitRatings::from(&Ratings::uniform(value)))
    }

    #[test]
    fn every_weight_table_sums_to_one() {
        for kind in [
            ContestKind::LineBattle,
            ContestKind::InsideRun,
            ContestKind::OutsideRun,
            ContestKind::CutbackRun,
            ContestKind::LateralChain,
            ContestKind::ShortKickPass,
            ContestKind::DeepKickPass,
            ContestKind::PassRush,
            ContestKind::KickBlock,
            ContestKind::Return,
        ] {
            let (o, d) = kind.weights();
            for w in [o, d] {
                let total = w.speed
                    + w.power
                    + w.tackling
                    + w.kick_accuracy
                    + w.kick_power
                    + w.hands
                    + w.lateral_skill
                    + w.awareness
                    + w.agility;
                assert!((total - 1.0).abs() < 1e-9, "{kind:?}");
            }
        }
    }

    #[test]
    fn even_matchup_returns_base_probability() {
        let contest = resolve(ContestKind::ShortKickPass, &side(60), &side(60), 0.66);
        assert!(contest.edge.abs() < 1e-9);
        assert!((contest.probability - 0.66).abs() < 1e-9);
    }

    #[test]
    fn better_offense_wins_more() {
        let strong = resolve(ContestKind::OutsideRun, &side(85), &side(55), 0.5);
        let weak = resolve(ContestKind::OutsideRun, &side(55), &side(85), 0.5);
        assert!(strong.edge > 0.0);
        assert!(strong.probability > 0.5 && weak.probability < 0.5);
    }

    #[test]
    fn tilt_lowers_awareness_terms_and_fatigue_lowers_speed() {
        let calm = side(70);
        let tilted = side(70).with_volatility(Volatility {
            miscue: 1.5,
            awareness: 0.9,
        });
        let tired = side(70).with_freshness(0.92);
        let d = side(70);
        assert!(
            resolve(ContestKind::CutbackRun, &tilted, &d, 0.5).offense
                < resolve(ContestKind::CutbackRun, &calm, &d, 0.5).offense
        );
        assert!(
            resolve(ContestKind::DeepKickPass, &tired, &d, 0.5).offense
                < resolve(ContestKind::DeepKickPass, &calm, &d, 0.5).offense
        );
    }

    #[test]
    fn kicks_get_harder_with_distance_and_weather() {
        let kicker = UnitRatings::from(&Ratings::uniform(60));
        let clear = Weather::Clear.effect();
        let wind = Weather::Wind.effect();
        let short = kick_make_probability(KickKind::PlaceKick, 20, &kicker, &clear, Volatility::CALM);
        let long = kick_make_probability(KickKind::PlaceKick, 45, &kicker, &clear, Volatility::CALM);
        let windy = kick_make_probability(KickKind::PlaceKick, 20, &kicker, &wind, Volatility::CALM);
        assert!((short - 0.9).abs() < 1e-9);
        assert!(long < short);
        assert!(windy < short);
        let drop = kick_make_probability(KickKind::DropKick, 20, &kicker, &clear, Volatility::CALM);
        assert!(drop < short);
        assert!(
            kick_range(KickKind::DropKick, &kicker, &clear)
                < kick_range(KickKind::PlaceKick, &kicker, &clear)
        );
    }
}
