//! Built-in demo matchup and identities, used by the tester when no matchup
//! file is given and by unit tests.
use std::collections::BTreeMap;

use crate::coaching::CoachRatings;
use crate::game::Matchup;
use crate::identity::{
    DefensiveIdentity, ExtensionMap, MatchupIdentities, OffensiveIdentity, TeamIdentity,
};
use crate::play::{Formation, Personnel, PlayCategory};
use crate::roster::{Participant, PlayerId, Ratings, Role, TeamSheet};

struct Template {
    role: Role,
    ratings: Ratings,
}

#[allow(clippy::too_many_arguments)]
const fn ratings(
    speed: u8,
    power: u8,
    tackling: u8,
    kick_accuracy: u8,
    kick_power: u8,
    hands: u8,
    lateral_skill: u8,
    awareness: u8,
    agility: u8,
) -> Ratings {
    Ratings {
        speed,
        power,
        tackling,
        kick_accuracy,
        kick_power,
        hands,
        lateral_skill,
        awareness,
        agility,
    }
}

fn templates() -> Vec<Template> {
    let t = |role, r| Template { role, ratings: r };
    vec![
        t(Role::LeadCarrier, ratings(82, 74, 30, 40, 45, 70, 72, 70, 80)),
        t(Role::Carrier, ratings(78, 70, 30, 35, 40, 66, 68, 64, 76)),
        t(Role::Carrier, ratings(70, 80, 35, 30, 40, 60, 55, 62, 64)),
        t(Role::Receiver { rank: 1 }, ratings(88, 55, 25, 45, 50, 84, 74, 76, 84)),
        t(Role::Receiver { rank: 2 }, ratings(84, 52, 25, 40, 45, 80, 70, 72, 80)),
        t(Role::Receiver { rank: 3 }, ratings(80, 60, 30, 40, 45, 76, 66, 68, 74)),
        t(Role::Receiver { rank: 4 }, ratings(76, 58, 28, 38, 42, 72, 64, 66, 72)),
        t(Role::Receiver { rank: 5 }, ratings(74, 62, 30, 36, 40, 70, 60, 62, 70)),
        t(Role::Kicker, ratings(60, 55, 30, 84, 82, 60, 45, 74, 62)),
        t(Role::Blocker, ratings(55, 84, 50, 20, 30, 40, 30, 70, 52)),
        t(Role::Blocker, ratings(52, 86, 48, 20, 30, 38, 30, 68, 50)),
        t(Role::Blocker, ratings(54, 82, 50, 20, 30, 40, 30, 72, 54)),
        t(Role::Blocker, ratings(50, 88, 46, 20, 30, 36, 28, 66, 48)),
        t(Role::Blocker, ratings(56, 80, 50, 20, 30, 42, 32, 70, 56)),
        t(Role::Blocker, ratings(53, 83, 49, 20, 30, 40, 30, 69, 51)),
        t(Role::Rusher, ratings(68, 82, 74, 20, 30, 40, 30, 66, 64)),
        t(Role::Rusher, ratings(72, 78, 72, 20, 30, 40, 30, 64, 68)),
        t(Role::Rusher, ratings(64, 86, 76, 20, 30, 38, 28, 62, 60)),
        t(Role::Rusher, ratings(70, 80, 70, 20, 30, 42, 30, 68, 66)),
        t(Role::Linebacker, ratings(74, 74, 82, 25, 35, 55, 45, 76, 70)),
        t(Role::Linebacker, ratings(72, 76, 80, 25, 35, 52, 42, 74, 68)),
        t(Role::Linebacker, ratings(76, 70, 78, 25, 35, 56, 46, 72, 72)),
        t(Role::Safety, ratings(86, 58, 70, 30, 40, 70, 55, 80, 82)),
        t(Role::Safety, ratings(84, 60, 72, 30, 40, 68, 52, 78, 80)),
        t(Role::Safety, ratings(82, 62, 74, 30, 40, 66, 50, 76, 78)),
    ]
}

/// Nudge a rating without leaving 1..=99.
fn nudge(value: u8, delta: i8) -> u8 {
    value.saturating_add_signed(delta).clamp(1, 99)
}

fn sheet(name: &str, surnames: &[&str], shift: i8, coach: Option<CoachRatings>) -> TeamSheet {
    let roster = templates()
        .into_iter()
        .zip(surnames.iter().cycle())
        .enumerate()
        .map(|(i, (template, surname))| {
            let id = u16::try_from(i + 1).unwrap_or(u16::MAX);
            // Alternate the shift so the two demo teams differ by position group.
            let delta = if i % 2 == 0 { shift } else { -shift };
            let r = template.ratings;
            Participant {
                id: PlayerId(id),
                name: format!("{surname} {id}"),
                role: template.role,
                ratings: Ratings {
                    speed: nudge(r.speed, delta),
                    power: nudge(r.power, -delta),
                    awareness: nudge(r.awareness, delta),
                    ..r
                },
            }
        })
        .collect();
    TeamSheet {
        name: name.to_string(),
        roster,
        coach,
    }
}

const HARBOR_NAMES: [&str; 25] = [
    "Okafor", "Lindqvist", "Moreau", "Tanaka", "Brennan", "Achebe", "Salas", "Kowalski", "Varga",
    "Holt", "Nakamura", "Ferreira", "Dunmore", "Quist", "Abara", "Ellison", "Petrov", "Ruiz",
    "Maddox", "Sorensen", "Ibeh", "Caldwell", "Yilmaz", "Whitcombe", "Lunde",
];

const RIDGE_NAMES: [&str; 25] = [
    "Castell", "Oyelaran", "Brandt", "Miyazaki", "Farrow", "Dumas", "Kerr", "Novak", "Asante",
    "Pryor", "Lachance", "Okonkwo", "Vance", "Halloran", "Soto", "Greaves", "Adeyemi", "Marek",
    "Thorne", "Bello", "Rask", "Iwata", "Delacroix", "Mbeki", "Strand",
];

/// Two full demo rosters with identities. The home coach carries ratings;
/// the away side plays without a coaching profile.
#[must_use]
pub fn demo_matchup() -> Matchup {
    let coach = CoachRatings {
        aggression: 55.0,
        patience: 60.0,
        adaptability: 65.0,
        risk_tolerance: 45.0,
        clock_discipline: 70.0,
    };
    Matchup {
        home: sheet("Harbor Gulls", &HARBOR_NAMES, 2, Some(coach)),
        away: sheet("Ridge Foxes", &RIDGE_NAMES, -2, None),
        identities: MatchupIdentities {
            home: balanced_identity(),
            away: ground_identity(),
        },
    }
}

fn category_weights(pairs: [(PlayCategory, f64); 10]) -> BTreeMap<PlayCategory, f64> {
    pairs.into_iter().collect()
}

fn base_defense(name: &str) -> DefensiveIdentity {
    DefensiveIdentity {
        name: name.to_string(),
        personnel_weights: BTreeMap::from([
            (Personnel::Base, 0.45),
            (Personnel::GoalLine, 0.1),
            (Personnel::Nickel, 0.3),
            (Personnel::Dime, 0.15),
        ]),
        blitz_rate: 0.2,
        blitz_intensity: 0.5,
        extensions: ExtensionMap::default(),
    }
}

/// Even run/kick-pass split, middle-of-the-road kicking.
#[must_use]
pub fn balanced_identity() -> TeamIdentity {
    TeamIdentity {
        offense: OffensiveIdentity {
            name: "balanced".into(),
            category_weights: category_weights([
                (PlayCategory::Dive, 1.0),
                (PlayCategory::Power, 0.9),
                (PlayCategory::Sweep, 0.8),
                (PlayCategory::Counter, 0.6),
                (PlayCategory::LateralChain, 0.4),
                (PlayCategory::ShortKickPass, 1.0),
                (PlayCategory::DeepKickPass, 0.5),
                (PlayCategory::DropKick, 0.4),
                (PlayCategory::PlaceKick, 0.6),
                (PlayCategory::Punt, 0.6),
            ]),
            formation_weights: BTreeMap::from([
                (Formation::Balanced, 0.5),
                (Formation::Heavy, 0.25),
                (Formation::Spread, 0.25),
            ]),
            tempo: 24.0,
            kick_aggression: 0.5,
            extensions: ExtensionMap::default(),
        },
        defense: base_defense("balanced"),
    }
}

/// Power running, slow tempo, few risky plays.
#[must_use]
pub fn ground_identity() -> TeamIdentity {
    let mut extensions = ExtensionMap::default();
    extensions.set("short_yardage_power_boost", 1.8);
    extensions.set("risk_ceiling", 0.2);
    let mut defense = base_defense("ground");
    defense.personnel_weights.insert(Personnel::GoalLine, 0.2);
    defense.extensions.set("instinct_bonus", 4.0);
    TeamIdentity {
        offense: OffensiveIdentity {
            name: "ground".into(),
            category_weights: category_weights([
                (PlayCategory::Dive, 1.3),
                (PlayCategory::Power, 1.4),
                (PlayCategory::Sweep, 0.7),
                (PlayCategory::Counter, 0.7),
                (PlayCategory::LateralChain, 0.2),
                (PlayCategory::ShortKickPass, 0.6),
                (PlayCategory::DeepKickPass, 0.2),
                (PlayCategory::DropKick, 0.3),
                (PlayCategory::PlaceKick, 0.7),
                (PlayCategory::Punt, 0.7),
            ]),
            formation_weights: BTreeMap::from([
                (Formation::Balanced, 0.35),
                (Formation::Heavy, 0.5),
                (Formation::Spread, 0.15),
            ]),
            tempo: 30.0,
            kick_aggression: 0.35,
            extensions,
        },
        defense,
    }
}

/// Fast tempo, heavy on kick passes and lateral chains.
#[must_use]
pub fn air_raid_identity() -> TeamIdentity {
    let mut extensions = ExtensionMap::default();
    extensions.set("deception", 64.0);
    extensions.set("breakaway_bonus", 0.02);
    let mut defense = base_defense("air raid");
    defense.blitz_rate = 0.3;
    defense.extensions.set("coverage_bias", 0.05);
    TeamIdentity {
        offense: OffensiveIdentity {
            name: "air raid".into(),
            category_weights: category_weights([
                (PlayCategory::Dive, 0.5),
                (PlayCategory::Power, 0.3),
                (PlayCategory::Sweep, 0.6),
                (PlayCategory::Counter, 0.4),
                (PlayCategory::LateralChain, 0.8),
                (PlayCategory::ShortKickPass, 1.6),
                (PlayCategory::DeepKickPass, 1.2),
                (PlayCategory::DropKick, 0.6),
                (PlayCategory::PlaceKick, 0.4),
                (PlayCategory::Punt, 0.5),
            ]),
            formation_weights: BTreeMap::from([
                (Formation::Balanced, 0.3),
                (Formation::Heavy, 0.1),
                (Formation::Spread, 0.6),
            ]),
            tempo: 18.0,
            kick_aggression: 0.65,
            extensions,
        },
        defense,
    }
}
