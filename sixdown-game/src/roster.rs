//! Team rosters, participant ratings and validated role lookups.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coaching::CoachRatings;
use crate::error::ConfigError;
use crate::numbers::{count_to_f64, rating};

/// Roster-unique participant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric ratings on a 1-99 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub speed: u8,
    pub power: u8,
    pub tackling: u8,
    pub kick_accuracy: u8,
    pub kick_power: u8,
    pub hands: u8,
    pub lateral_skill: u8,
    pub awareness: u8,
    pub agility: u8,
}

impl Ratings {
    /// Every rating set to `value`.
    #[must_use]
    pub const fn uniform(value: u8) -> Self {
        Self {
            speed: value,
            power: value,
            tackling: value,
            kick_accuracy: value,
            kick_power: value,
            hands: value,
            lateral_skill: value,
            awareness: value,
            agility: value,
        }
    }

    fn fields(&self) -> [(&'static str, u8); 9] {
        [
            ("speed", self.speed),
            ("power", self.power),
            ("tackling", self.tackling),
            ("kick_accuracy", self.kick_accuracy),
            ("kick_power", self.kick_power),
            ("hands", self.hands),
            ("lateral_skill", self.lateral_skill),
            ("awareness", self.awareness),
            ("agility", self.agility),
        ]
    }
}

/// Averaged ratings of a unit (offensive line, pass rush, secondary).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitRatings {
    pub speed: f64,
    pub power: f64,
    pub tackling: f64,
    pub kick_accuracy: f64,
    pub kick_power: f64,
    pub hands: f64,
    pub lateral_skill: f64,
    pub awareness: f64,
    pub agility: f64,
}

impl From<&Ratings> for UnitRatings {
    fn from(r: &Ratings) -> Self {
        Self {
            speed: rating(r.speed),
            power: rating(r.power),
            tackling: rating(r.tackling),
            kick_accuracy: rating(r.kick_accuracy),
            kick_power: rating(r.kick_power),
            hands: rating(r.hands),
            lateral_skill: rating(r.lateral_skill),
            awareness: rating(r.awareness),
            agility: rating(r.agility),
        }
    }
}

impl UnitRatings {
    fn average<'a>(members: impl Iterator<Item = &'a Ratings>) -> Self {
        let mut total = Self::default();
        let mut count = 0usize;
        for member in members {
            let r = Self::from(member);
            total.speed += r.speed;
            total.power += r.power;
            total.tackling += r.tackling;
            total.kick_accuracy += r.kick_accuracy;
            total.kick_power += r.kick_power;
            total.hands += r.hands;
            total.lateral_skill += r.lateral_skill;
            total.awareness += r.awareness;
            total.agility += r.agility;
            count += 1;
        }
        if count == 0 {
            return total;
        }
        let n = count_to_f64(count);
        Self {
            speed: total.speed / n,
            power: total.power / n,
            tackling: total.tackling / n,
            kick_accuracy: total.kick_accuracy / n,
            kick_power: total.kick_power / n,
            hands: total.hands / n,
            lateral_skill: total.lateral_skill / n,
            awareness: total.awareness / n,
            agility: total.agility / n,
        }
    }
}

/// Designated role on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    LeadCarrier,
    Carrier,
    Receiver { rank: u8 },
    Kicker,
    Blocker,
    Rusher,
    Linebacker,
    Safety,
}

impl Role {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeadCarrier => "lead carrier",
            Self::Carrier => "carrier",
            Self::Receiver { .. } => "receiver",
            Self::Kicker => "kicker",
            Self::Blocker => "blocker",
            Self::Rusher => "rusher",
            Self::Linebacker => "linebacker",
            Self::Safety => "safety",
        }
    }
}

/// Immutable per-game snapshot of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub ratings: Ratings,
}

/// A team as supplied by the roster collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSheet {
    pub name: String,
    pub roster: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach: Option<CoachRatings>,
}

impl TeamSheet {
    #[must_use]
    pub fn participant(&self, id: PlayerId) -> Option<&Participant> {
        self.roster.iter().find(|p| p.id == id)
    }

    /// Validate the roster and build role lookups.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for empty names, duplicate ids, ratings
    /// outside 1..=99, bad receiver ranks or a missing required role.
    pub fn squad(&self) -> Result<Squad<'_>, ConfigError> {
        Squad::build(self)
    }
}

/// Validated role view over a [`TeamSheet`].
#[derive(Debug, Clone)]
pub struct Squad<'a> {
    sheet: &'a TeamSheet,
    lead_carrier: &'a Participant,
    carriers: Vec<&'a Participant>,
    receivers: Vec<&'a Participant>,
    kicker: &'a Participant,
    blockers: Vec<&'a Participant>,
    rushers: Vec<&'a Participant>,
    linebackers: Vec<&'a Participant>,
    safeties: Vec<&'a Participant>,
}

fn missing(team: &str, role: &'static str) -> ConfigError {
    ConfigError::MissingRole {
        team: team.to_string(),
        role,
    }
}

impl<'a> Squad<'a> {
    fn build(sheet: &'a TeamSheet) -> Result<Self, ConfigError> {
        let team = sheet.name.trim();
        if team.is_empty() {
            return Err(ConfigError::EmptyTeamName {
                team: sheet.name.clone(),
            });
        }
        let mut seen = BTreeSet::new();
        let mut ranks = BTreeSet::new();
        for p in &sheet.roster {
            if !seen.insert(p.id) {
                return Err(ConfigError::DuplicateParticipant {
                    team: team.to_string(),
                    id: p.id.0,
                });
            }
            for (field, value) in p.ratings.fields() {
                if !(1..=99).contains(&value) {
                    return Err(ConfigError::RatingOutOfRange {
                        id: p.id.0,
                        field,
                        value,
                    });
                }
            }
            if let Role::Receiver { rank } = p.role
                && (!(1..=5).contains(&rank) || !ranks.insert(rank))
            {
                return Err(ConfigError::ReceiverRank {
                    team: team.to_string(),
                    rank,
                });
            }
        }

        let with_role = |pred: fn(&Role) -> bool| -> Vec<&'a Participant> {
            sheet.roster.iter().filter(|p| pred(&p.role)).collect()
        };
        let lead_carrier = sheet
            .roster
            .iter()
            .find(|p| p.role == Role::LeadCarrier)
            .ok_or_else(|| missing(team, "lead carrier"))?;
        let kicker = sheet
            .roster
            .iter()
            .find(|p| p.role == Role::Kicker)
            .ok_or_else(|| missing(team, "kicker"))?;
        let mut carriers = vec![lead_carrier];
        carriers.extend(with_role(|r| *r == Role::Carrier));

        let mut receivers = with_role(|r| matches!(r, Role::Receiver { .. }));
        receivers.sort_by_key(|p| match p.role {
            Role::Receiver { rank } => rank,
            _ => u8::MAX,
        });
        if !ranks.contains(&1) {
            return Err(missing(team, "receiver rank 1"));
        }

        let blockers = with_role(|r| *r == Role::Blocker);
        let rushers = with_role(|r| *r == Role::Rusher);
        let linebackers = with_role(|r| *r == Role::Linebacker);
        let safeties = with_role(|r| *r == Role::Safety);
        if blockers.is_empty() {
            return Err(missing(team, "blocker"));
        }
        if rushers.is_empty() {
            return Err(missing(team, "rusher"));
        }
        if linebackers.is_empty() {
            return Err(missing(team, "linebacker"));
        }
        if safeties.is_empty() {
            return Err(missing(team, "safety"));
        }

        Ok(Self {
            sheet,
            lead_carrier,
            carriers,
            receivers,
            kicker,
            blockers,
            rushers,
            linebackers,
            safeties,
        })
    }

    #[must_use]
    pub const fn sheet(&self) -> &'a TeamSheet {
        self.sheet
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.sheet.name
    }

    #[must_use]
    pub const fn lead_carrier(&self) -> &'a Participant {
        self.lead_carrier
    }

    /// Lead carrier first, then the rotation.
    #[must_use]
    pub fn carriers(&self) -> &[&'a Participant] {
        &self.carriers
    }

    /// Receivers ordered by rank.
    #[must_use]
    pub fn receivers(&self) -> &[&'a Participant] {
        &self.receivers
    }

    #[must_use]
    pub const fn kicker(&self) -> &'a Participant {
        self.kicker
    }

    #[must_use]
    pub fn blockers(&self) -> &[&'a Participant] {
        &self.blockers
    }

    #[must_use]
    pub fn rushers(&self) -> &[&'a Participant] {
        &self.rushers
    }

    #[must_use]
    pub fn linebackers(&self) -> &[&'a Participant] {
        &self.linebackers
    }

    #[must_use]
    pub fn safeties(&self) -> &[&'a Participant] {
        &self.safeties
    }

    /// Linebackers then safeties: the players who make open-field tackles.
    #[must_use]
    pub fn tacklers(&self) -> Vec<&'a Participant> {
        self.linebackers
            .iter()
            .chain(self.safeties.iter())
            .copied()
            .collect()
    }

    /// Fastest safety fields kicks.
    #[must_use]
    pub fn returner(&self) -> &'a Participant {
        self.safeties
            .iter()
            .copied()
            .max_by_key(|p| (p.ratings.speed, std::cmp::Reverse(p.id)))
            .unwrap_or(self.lead_carrier)
    }

    #[must_use]
    pub fn blocking_unit(&self) -> UnitRatings {
        UnitRatings::average(self.blockers.iter().map(|p| &p.ratings))
    }

    #[must_use]
    pub fn rush_unit(&self) -> UnitRatings {
        UnitRatings::average(self.rushers.iter().map(|p| &p.ratings))
    }

    #[must_use]
    pub fn coverage_unit(&self) -> UnitRatings {
        UnitRatings::average(
            self.linebackers
                .iter()
                .chain(self.safeties.iter())
                .map(|p| &p.ratings),
        )
    }

    /// Mean awareness of the back seven, the defense's read on tendencies.
    #[must_use]
    pub fn instinct(&self) -> f64 {
        self.coverage_unit().awareness
    }
}
