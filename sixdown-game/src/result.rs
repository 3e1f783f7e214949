//! Game result: play log, drive summaries, participant statistics and the
//! performance indices derived from them.
use std::hash::Hasher;
use std::io;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::adaptation::AdaptationEvent;
use crate::coaching::Countermeasure;
use crate::constants::EXPLOSIVE_GAIN_YARDS;
use crate::drive::{DriveResult, StartKind};
use crate::ledger::{StatKind, StatLine};
use crate::numbers::{count_to_f64, yards_to_f64};
use crate::play::{DefensiveCall, Formation, OutcomeKind, PlayCategory, PlayOutcome};
use crate::rng::StreamDraws;
use crate::roster::{PlayerId, Role};
use crate::selector::SelectionTrace;
use crate::state::{Score, TeamPair, TeamSide};
use crate::weather::Weather;

/// One entry of the play-by-play log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub index: usize,
    pub quarter: u8,
    /// Seconds left in the quarter at the snap.
    pub clock: u32,
    pub offense: TeamSide,
    pub down: u8,
    pub distance: i32,
    /// Line of scrimmage, yards from the offense's own goal line.
    pub spot: i32,
    pub kick_mode: bool,
    pub category: PlayCategory,
    pub formation: Formation,
    pub defense: DefensiveCall,
    pub outcome: PlayOutcome,
    pub description: String,
    pub score_after: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<SelectionTrace>,
}

impl PlayRecord {
    /// A play gained enough to stay on schedule: half the distance on early
    /// downs, all of it later, or it scored.
    #[must_use]
    pub fn successful(&self) -> bool {
        if matches!(self.outcome.kind, OutcomeKind::Touchdown) {
            return true;
        }
        if !self.outcome.kind.keeps_possession(self.offense) {
            return false;
        }
        let net = self.outcome.net_yards();
        if self.down <= 3 {
            net * 2 >= self.distance
        } else {
            net >= self.distance
        }
    }

    /// Snaps that count toward yards per play: runs, laterals and kick passes.
    #[must_use]
    pub fn from_scrimmage(&self) -> bool {
        !self.category.is_kick() && self.category != PlayCategory::Kneel
    }
}

/// One possession, start to finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSummary {
    pub index: usize,
    pub team: TeamSide,
    pub start_spot: i32,
    pub start: StartKind,
    pub quarter: u8,
    pub score_before: Score,
    pub plays: u32,
    /// Net scrimmage yards, penalties included.
    pub yards: i32,
    pub result: DriveResult,
    /// Points the driving team scored on the drive.
    pub points: u32,
}

/// Accumulated statistics for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantLine {
    pub team: TeamSide,
    pub player: PlayerId,
    pub name: String,
    pub role: Role,
    pub stats: StatLine,
}

/// Derived per-team indices. Everything here is recomputable from the play
/// log and drive summaries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceIndex {
    pub plays: u32,
    pub yards_per_play: f64,
    pub success_rate: f64,
    pub explosive_rate: f64,
    /// Takeaways minus giveaways.
    pub turnover_margin: i32,
    /// Made scoring kicks over attempts; zero without attempts.
    pub kick_conversion: f64,
    pub points_per_drive: f64,
    /// Mean starting spot of Delta Yards restarts.
    pub delta_burden: f64,
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        numerator / count_to_f64(count)
    }
}

impl PerformanceIndex {
    #[must_use]
    pub fn compute(team: TeamSide, plays: &[PlayRecord], drives: &[DriveSummary]) -> Self {
        let scrimmage: Vec<&PlayRecord> = plays
            .iter()
            .filter(|p| p.offense == team && p.from_scrimmage())
            .collect();
        let yards: i64 = scrimmage.iter().map(|p| i64::from(p.outcome.net_yards())).sum();
        let successes = scrimmage.iter().filter(|p| p.successful()).count();
        let explosive = scrimmage
            .iter()
            .filter(|p| p.outcome.yards >= EXPLOSIVE_GAIN_YARDS)
            .count();

        let mut margin = 0i32;
        for play in plays.iter().filter(|p| p.outcome.is_turnover()) {
            if play.offense == team {
                margin -= 1;
            } else {
                margin += 1;
            }
        }

        let kicks: Vec<&PlayRecord> = plays
            .iter()
            .filter(|p| p.offense == team && p.category.is_scoring_kick())
            .collect();
        let made = kicks
            .iter()
            .filter(|p| {
                matches!(
                    p.outcome.kind,
                    OutcomeKind::DropKickGood { .. } | OutcomeKind::PlaceKickGood { .. }
                )
            })
            .count();

        let own: Vec<&DriveSummary> = drives.iter().filter(|d| d.team == team).collect();
        let points: u32 = own.iter().map(|d| d.points).sum();
        let restarts: Vec<i32> = own
            .iter()
            .filter(|d| d.start == StartKind::Restart)
            .map(|d| d.start_spot)
            .collect();

        Self {
            plays: u32::try_from(scrimmage.len()).unwrap_or(u32::MAX),
            yards_per_play: ratio(yards_to_f64(yards), scrimmage.len()),
            success_rate: ratio(count_to_f64(successes), scrimmage.len()),
            explosive_rate: ratio(count_to_f64(explosive), scrimmage.len()),
            turnover_margin: margin,
            kick_conversion: ratio(count_to_f64(made), kicks.len()),
            points_per_drive: ratio(f64::from(points), own.len()),
            delta_burden: ratio(
                restarts.iter().map(|s| f64::from(*s)).sum(),
                restarts.len(),
            ),
        }
    }
}

/// Team-level section of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub name: String,
    /// Sum of the team's participant lines.
    pub totals: StatLine,
    pub index: PerformanceIndex,
    pub coaching: Option<Countermeasure>,
    pub final_composure: f64,
}

impl TeamSummary {
    #[must_use]
    pub fn stat(&self, kind: StatKind) -> i64 {
        self.totals.get(kind)
    }
}

/// An optional modifier that fell back to baseline behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub team: TeamSide,
    pub reason: String,
}

/// Adaptation event tagged with when and against whom it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptationRecord {
    /// Play after which the event fired; `None` for halftime re-rolls.
    pub play_index: Option<usize>,
    pub defense: TeamSide,
    pub event: AdaptationEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusSummary {
    pub queued: u32,
    pub granted: u32,
    pub cancelled: u32,
}

/// Everything a finished game produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub seed: u64,
    pub code: String,
    pub weather: Weather,
    pub score: Score,
    pub plays: Vec<PlayRecord>,
    pub drives: Vec<DriveSummary>,
    pub participants: Vec<ParticipantLine>,
    pub teams: TeamPair<TeamSummary>,
    pub adaptation_events: Vec<AdaptationRecord>,
    pub bonus: BonusSummary,
    pub degradations: Vec<Degradation>,
    pub rng_draws: StreamDraws,
}

struct DigestWriter(XxHash64);

impl io::Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl GameResult {
    /// xxHash64 of the serialized play log. Equal digests mean byte-identical logs.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the log cannot be encoded.
    pub fn log_digest(&self) -> Result<u64, serde_json::Error> {
        let mut writer = DigestWriter(XxHash64::with_seed(0));
        serde_json::to_writer(&mut writer, &self.plays)?;
        Ok(writer.0.finish())
    }

    /// Winning side, `None` for a tie.
    #[must_use]
    pub fn winner(&self) -> Option<TeamSide> {
        match self.score.home.cmp(&self.score.away) {
            std::cmp::Ordering::Greater => Some(TeamSide::Home),
            std::cmp::Ordering::Less => Some(TeamSide::Away),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub fn participant(&self, team: TeamSide, player: PlayerId) -> Option<&ParticipantLine> {
        self.participants
            .iter()
            .find(|p| p.team == team && p.player == player)
    }

    /// Plays in which `team` had the ball.
    pub fn plays_for(&self, team: TeamSide) -> impl Iterator<Item = &PlayRecord> + '_ {
        self.plays.iter().filter(move |p| p.offense == team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::{Actors, Personnel};
    use smallvec::smallvec;

    fn record(index: usize, offense: TeamSide, down: u8, distance: i32, yards: i32) -> PlayRecord {
        PlayRecord {
            index,
            quarter: 1,
            clock: 900,
            offense,
            down,
            distance,
            spot: 30,
            kick_mode: false,
            category: PlayCategory::Dive,
            formation: Formation::Balanced,
            defense: DefensiveCall {
                personnel: Personnel::Base,
                blitz: false,
            },
            outcome: PlayOutcome {
                offense,
                category: PlayCategory::Dive,
                yards,
                kind: OutcomeKind::Gain,
                actors: Actors::default(),
                penalty: None,
                credits: smallvec![],
            },
            description: String::new(),
            score_after: Score::default(),
            trace: None,
        }
    }

    fn drive(team: TeamSide, start_spot: i32, start: StartKind, points: u32) -> DriveSummary {
        DriveSummary {
            index: 0,
            team,
            start_spot,
            start,
            quarter: 1,
            score_before: Score::default(),
            plays: 3,
            yards: 12,
            result: DriveResult::Punt,
            points,
        }
    }

    #[test]
    fn success_depends_on_down() {
        assert!(record(0, TeamSide::Home, 1, 20, 10).successful());
        assert!(!record(0, TeamSide::Home, 1, 20, 9).successful());
        assert!(!record(0, TeamSide::Home, 5, 6, 5).successful());
        assert!(record(0, TeamSide::Home, 5, 6, 6).successful());
    }

    #[test]
    fn index_is_derived_from_log_and_drives() {
        let plays = vec![
            record(0, TeamSide::Home, 1, 20, 24),
            record(1, TeamSide::Home, 1, 20, 2),
            record(2, TeamSide::Away, 1, 20, 4),
        ];
        let drives = vec![
            drive(TeamSide::Home, 20, StartKind::Restart, 9),
            drive(TeamSide::Home, 6, StartKind::Restart, 0),
            drive(TeamSide::Home, 25, StartKind::Bonus, 3),
        ];
        let index = PerformanceIndex::compute(TeamSide::Home, &plays, &drives);
        assert_eq!(index.plays, 2);
        assert!((index.yards_per_play - 13.0).abs() < 1e-12);
        assert!((index.explosive_rate - 0.5).abs() < 1e-12);
        assert!((index.points_per_drive - 4.0).abs() < 1e-12);
        assert!((index.delta_burden - 13.0).abs() < 1e-12);
        assert!(index.kick_conversion.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_inputs_produce_zeroes() {
        let index = PerformanceIndex::compute(TeamSide::Away, &[], &[]);
        assert_eq!(index, PerformanceIndex::default());
    }
}
