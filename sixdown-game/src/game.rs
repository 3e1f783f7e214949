//! Game orchestration: runs snaps until the fourth quarter expires.
//!
//! Each snap goes selection, contest resolution, officiating, ledger write,
//! state transition, in that order, with nothing interleaved. All per-game
//! context (composure, adaptation, fatigue, rng) lives on [`Game`] so
//! concurrent games share nothing mutable.
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::adaptation::{AdaptationTracker, SolveInputs};
use crate::coaching::{CoachingProfile, CoachingSnapshot};
use crate::composure::ComposureTracker;
use crate::config::EngineConfig;
use crate::constants::{
    FATIGUE_CAP, FATIGUE_PER_SNAP, INCOMPLETE_SECONDS, KICK_PLAY_SECONDS, KNEEL_SECONDS,
    SCORING_PLAY_SECONDS, TEMPO_JITTER_SECONDS,
};
use crate::contest::kick_range;
use crate::drive::{self, DriveResult, Possession, StartKind, Transition};
use crate::error::{InvariantViolation, SimError};
use crate::identity::{MatchupIdentities, TeamIdentity, defense_keys, offense_keys};
use crate::ledger::{StatLedger, TeamDeltas, compare_deltas, sum_credits};
use crate::numbers::round_seconds;
use crate::play::{KickKind, OutcomeKind, PlayOutcome};
use crate::resolver::{PlayContext, SideContext, assess_penalty, describe, resolve_play};
use crate::result::{
    AdaptationRecord, BonusSummary, Degradation, DriveSummary, GameResult, ParticipantLine,
    PerformanceIndex, PlayRecord, TeamSummary,
};
use crate::rng::{RngBundle, roll_chance, unit};
use crate::roster::{Squad, TeamSheet, UnitRatings};
use crate::seed::encode_game_code;
use crate::selector::{KickRanges, SelectionContext, scoring_kick_in_range, select_play};
use crate::state::{GameState, Score, SeriesPhase, TeamPair, TeamSide};
use crate::weather::{Weather, WeatherEffect};

/// Two rosters and their identities, as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub home: TeamSheet,
    pub away: TeamSheet,
    pub identities: MatchupIdentities,
}

#[derive(Debug, Clone)]
struct OpenDrive {
    index: usize,
    team: TeamSide,
    start_spot: i32,
    start: StartKind,
    quarter: u8,
    score_before: Score,
    plays: u32,
    yards: i32,
    points: u32,
}

impl OpenDrive {
    fn close(self, result: DriveResult) -> DriveSummary {
        DriveSummary {
            index: self.index,
            team: self.team,
            start_spot: self.start_spot,
            start: self.start,
            quarter: self.quarter,
            score_before: self.score_before,
            plays: self.plays,
            yards: self.yards,
            result,
            points: self.points,
        }
    }
}

/// Whether the game continues after a snap.
enum Flow {
    Snap,
    Final,
}

fn invariant(play_index: usize) -> impl FnOnce(InvariantViolation) -> SimError {
    move |violation| SimError::Invariant {
        play_index,
        violation,
    }
}

fn kick_ranges(squad: &Squad<'_>, weather: &WeatherEffect) -> KickRanges {
    let kicker = UnitRatings::from(&squad.kicker().ratings);
    KickRanges {
        drop_kick: kick_range(KickKind::DropKick, &kicker, weather),
        place_kick: kick_range(KickKind::PlaceKick, &kicker, weather),
    }
}

struct Game<'a> {
    config: &'a EngineConfig,
    squads: TeamPair<Squad<'a>>,
    identities: TeamPair<&'a TeamIdentity>,
    seed: u64,
    weather: Weather,
    effect: WeatherEffect,
    rng: RngBundle,
    state: GameState,
    ledger: StatLedger,
    log_totals: TeamDeltas,
    composure: ComposureTracker,
    /// Keyed by the defending team.
    adaptation: TeamPair<AdaptationTracker>,
    coaching: TeamPair<CoachingProfile>,
    snapshot: CoachingSnapshot,
    ranges: TeamPair<KickRanges>,
    fatigue: TeamPair<f64>,
    opener: TeamSide,
    plays: Vec<PlayRecord>,
    drives: Vec<DriveSummary>,
    open: Option<OpenDrive>,
    adaptation_events: Vec<AdaptationRecord>,
    degradations: Vec<Degradation>,
}

impl<'a> Game<'a> {
    fn new(
        home: &'a TeamSheet,
        away: &'a TeamSheet,
        identities: &'a MatchupIdentities,
        seed: u64,
        weather: Weather,
        config: &'a EngineConfig,
    ) -> Result<Self, SimError> {
        config.validate()?;
        identities.home.validate()?;
        identities.away.validate()?;
        let squads = TeamPair::new(home.squad()?, away.squad()?);
        let identities = TeamPair::new(&identities.home, &identities.away);
        let effect = weather.effect();

        let mut degradations = Vec::new();
        let mut profile = |team: TeamSide| {
            let identity = *identities.get(team);
            let Some(ratings) = squads.get(team).sheet().coach.as_ref() else {
                return CoachingProfile::neutral(identity);
            };
            CoachingProfile::reconstruct(ratings, identity).unwrap_or_else(|err| {
                warn!(
                    "{} coaching profile unavailable, using baseline: {err}",
                    squads.get(team).name()
                );
                degradations.push(Degradation {
                    team,
                    reason: err.to_string(),
                });
                CoachingProfile::neutral(identity)
            })
        };
        let coaching = TeamPair::new(profile(TeamSide::Home), profile(TeamSide::Away));
        let ranges = squads.map(|_, squad| kick_ranges(squad, &effect));
        let snapshot = coaching.home.snapshot(0);

        Ok(Self {
            config,
            identities,
            seed,
            weather,
            effect,
            rng: RngBundle::from_user_seed(seed),
            state: GameState::kickoff(TeamSide::Home, config.clock.quarter_seconds),
            ledger: StatLedger::new(),
            log_totals: TeamDeltas::new(),
            composure: ComposureTracker::new(&config.composure),
            adaptation: TeamPair::default(),
            coaching,
            snapshot,
            ranges,
            fatigue: TeamPair::default(),
            opener: TeamSide::Home,
            plays: Vec::new(),
            drives: Vec::new(),
            open: None,
            adaptation_events: Vec::new(),
            degradations,
            squads,
        })
    }

    fn run(mut self) -> Result<GameResult, SimError> {
        self.opener = if roll_chance(&mut *self.rng.selection(), 0.5) {
            TeamSide::Home
        } else {
            TeamSide::Away
        };
        let first = drive::restart(&self.state, self.opener, &self.config.field);
        self.begin_drive(first).map_err(invariant(0))?;
        while let Flow::Snap = self.snap()? {}
        self.finish()
    }

    fn solve_inputs(&self, defense: TeamSide) -> SolveInputs {
        let bonus = self
            .identities
            .get(defense)
            .defense
            .ext(defense_keys::INSTINCT_BONUS);
        SolveInputs {
            instinct: self.squads.get(defense).instinct() + bonus,
            deception: self
                .identities
                .get(defense.opponent())
                .offense
                .ext(offense_keys::DECEPTION),
        }
    }

    fn begin_drive(&mut self, next: Possession) -> Result<(), InvariantViolation> {
        let team = next.team;
        self.state
            .start_possession(team, next.spot, self.config.field.series_distance)?;
        self.composure.decay();
        self.adaptation.get_mut(team.opponent()).start_drive();
        self.snapshot = self
            .coaching
            .get(team)
            .snapshot(self.state.score.differential(team));
        self.state.bonus.on_drive_start(team);
        debug!(
            "drive {} {} from own {} ({:?}), Q{} {}",
            self.drives.len(),
            self.squads.get(team).name(),
            next.spot,
            next.start,
            self.state.quarter,
            self.state.clock
        );
        self.open = Some(OpenDrive {
            index: self.drives.len(),
            team,
            start_spot: next.spot,
            start: next.start,
            quarter: self.state.quarter,
            score_before: self.state.score,
            plays: 0,
            yards: 0,
            points: 0,
        });
        Ok(())
    }

    fn close_drive(&mut self, result: DriveResult) {
        if let Some(open) = self.open.take() {
            debug!(
                "drive {} ends: {} after {} plays, {} yards",
                open.index,
                result.label(),
                open.plays,
                open.yards
            );
            self.drives.push(open.close(result));
        }
    }

    fn snap(&mut self) -> Result<Flow, SimError> {
        let index = self.plays.len();
        let offense = self.state.possession;
        let defense = offense.opponent();
        self.state.check().map_err(invariant(index))?;

        if self.state.phase() == SeriesPhase::Decision {
            let in_range = scoring_kick_in_range(&self.state, *self.ranges.get(offense));
            self.state.kick_mode = self.snapshot.commit_kick_mode(
                self.state.distance,
                in_range,
                &mut *self.rng.coaching(),
            );
        }
        let before = self.state.clone();

        let selection = {
            let ctx = SelectionContext {
                state: &self.state,
                offense: &self.identities.get(offense).offense,
                defense: &self.identities.get(defense).defense,
                coaching: &self.snapshot,
                adaptation: self.adaptation.get(defense),
                adaptation_config: &self.config.adaptation,
                config: &self.config.selector,
                kick_ranges: *self.ranges.get(offense),
            };
            select_play(&ctx, &mut *self.rng.selection())
        };

        let (outcome, description) = {
            let ctx = PlayContext {
                offense: SideContext {
                    team: offense,
                    squad: self.squads.get(offense),
                    volatility: self.composure.volatility(offense),
                    freshness: 1.0 - *self.fatigue.get(offense),
                },
                defense: SideContext {
                    team: defense,
                    squad: self.squads.get(defense),
                    volatility: self.composure.volatility(defense),
                    freshness: 1.0 - *self.fatigue.get(defense),
                },
                offense_identity: &self.identities.get(offense).offense,
                defense_identity: &self.identities.get(defense).defense,
                spot: self.state.spot,
                category: selection.category,
                formation: selection.formation,
                call: selection.defense,
                weather: self.effect,
                adaptation: self.adaptation.get(defense),
                adaptation_config: &self.config.adaptation,
            };
            let mut outcome = resolve_play(&ctx, &mut *self.rng.contest());
            assess_penalty(
                &mut outcome,
                &ctx,
                &self.config.officiating,
                &mut *self.rng.officiating(),
            );
            drive::enforce_last_down(&self.state, &mut outcome);
            let description = describe(&outcome, ctx.offense.squad, ctx.defense.squad);
            (outcome, description)
        };

        if outcome.offense != offense {
            return Err(SimError::Invariant {
                play_index: index,
                violation: InvariantViolation::Attribution {
                    recorded: outcome.offense,
                    actual: offense,
                },
            });
        }
        let structural = outcome.team_deltas();
        compare_deltas(&sum_credits(&outcome.credits), &structural).map_err(invariant(index))?;
        self.ledger
            .record(index, &outcome.credits)
            .map_err(invariant(index))?;
        for (key, value) in structural {
            *self.log_totals.entry(key).or_insert(0) += value;
        }

        let points = outcome.points(&self.config.scoring);
        if outcome.kind.interception() {
            self.state.bonus.on_interception(offense);
        }
        let transition = drive::apply_outcome(
            &mut self.state,
            &outcome,
            &self.config.scoring,
            &self.config.field,
        )
        .map_err(invariant(index))?;
        self.composure.apply(&outcome, points);

        let inputs = self.solve_inputs(defense);
        let events = self.adaptation.get_mut(defense).record_call(
            selection.category,
            inputs,
            &self.config.adaptation,
            &mut *self.rng.adaptation(),
        );
        for event in events {
            debug!("{} defense adaptation: {event:?}", self.squads.get(defense).name());
            self.adaptation_events.push(AdaptationRecord {
                play_index: Some(index),
                defense,
                event,
            });
        }
        self.accrue_fatigue();
        let seconds = self.play_seconds(&outcome, points.is_some());

        if let Some(open) = self.open.as_mut() {
            open.plays += 1;
            if !selection.category.is_kick() {
                open.yards += outcome.net_yards();
            }
            if let Some((scorer, pts)) = points
                && scorer == open.team
            {
                open.points += pts;
            }
        }

        trace!(
            "#{index} Q{} {} {}&{} at {}: {}",
            before.quarter,
            before.clock,
            before.down,
            before.distance,
            before.spot,
            description
        );
        self.plays.push(PlayRecord {
            index,
            quarter: before.quarter,
            clock: before.clock,
            offense,
            down: before.down,
            distance: before.distance,
            spot: before.spot,
            kick_mode: before.kick_mode,
            category: selection.category,
            formation: selection.formation,
            defense: selection.defense,
            outcome,
            description,
            score_after: self.state.score,
            trace: selection.trace,
        });

        let quarter_over = self.tick(seconds);
        match transition {
            Transition::Continue { .. } => {
                if quarter_over {
                    return self.end_quarter(index, None);
                }
                Ok(Flow::Snap)
            }
            Transition::DriveEnd { result, next } => {
                self.close_drive(result);
                if quarter_over {
                    return self.end_quarter(index, Some((offense, next)));
                }
                self.next_drive(index, offense, next)?;
                Ok(Flow::Snap)
            }
        }
    }

    /// Start the next possession. A team owed a bonus keeps the ball for
    /// one more drive from the bonus spot once its own drive ends.
    fn next_drive(
        &mut self,
        index: usize,
        finished: TeamSide,
        next: Possession,
    ) -> Result<(), SimError> {
        for beneficiary in self.state.bonus.settle(finished) {
            debug!("bonus possession owed to {}", self.squads.get(beneficiary).name());
        }
        // A team that keeps the ball anyway (a conceded safety) plays that
        // possession first and claims the bonus after it.
        let next = if next.team != finished && self.state.bonus.take_owed(finished) {
            debug!("bonus possession for {}", self.squads.get(finished).name());
            Possession {
                team: finished,
                spot: self.config.field.bonus_start,
                start: StartKind::Bonus,
            }
        } else {
            next
        };
        self.begin_drive(next).map_err(invariant(index))
    }

    fn end_quarter(
        &mut self,
        index: usize,
        next: Option<(TeamSide, Possession)>,
    ) -> Result<Flow, SimError> {
        match self.state.quarter {
            2 => {
                self.close_drive(DriveResult::EndOfHalf);
                self.halftime();
                let receiver = self.opener.opponent();
                let restart = drive::restart(&self.state, receiver, &self.config.field);
                self.begin_drive(restart).map_err(invariant(index))?;
                Ok(Flow::Snap)
            }
            4 => {
                self.close_drive(DriveResult::EndOfGame);
                self.state.bonus.cancel_all();
                Ok(Flow::Final)
            }
            _ => {
                self.state.quarter += 1;
                self.state.clock = self.config.clock.quarter_seconds;
                if let Some((finished, next)) = next {
                    self.next_drive(index, finished, next)?;
                }
                Ok(Flow::Snap)
            }
        }
    }

    fn halftime(&mut self) {
        self.state.bonus.cancel_all();
        for defense in TeamSide::ALL {
            let inputs = self.solve_inputs(defense);
            let event = self.adaptation.get_mut(defense).halftime(
                inputs,
                &self.config.adaptation,
                &mut *self.rng.adaptation(),
            );
            if let Some(event) = event {
                debug!("{} halftime adjustment: {event:?}", self.squads.get(defense).name());
                self.adaptation_events.push(AdaptationRecord {
                    play_index: None,
                    defense,
                    event,
                });
            }
        }
        self.fatigue = TeamPair::default();
        self.state.quarter = 3;
        self.state.clock = self.config.clock.quarter_seconds;
        debug!(
            "halftime: {} {} - {} {}",
            self.squads.home.name(),
            self.state.score.home,
            self.state.score.away,
            self.squads.away.name()
        );
    }

    fn accrue_fatigue(&mut self) {
        let step = FATIGUE_PER_SNAP * self.effect.fatigue;
        for team in TeamSide::ALL {
            let value = self.fatigue.get_mut(team);
            *value = (*value + step).min(FATIGUE_CAP);
        }
    }

    fn play_seconds(&self, outcome: &PlayOutcome, scored: bool) -> u32 {
        let seconds = match outcome.kind {
            OutcomeKind::Kneel => KNEEL_SECONDS,
            _ if scored => SCORING_PLAY_SECONDS,
            _ if outcome.category.is_kick() => KICK_PLAY_SECONDS,
            OutcomeKind::KickPassIncomplete => INCOMPLETE_SECONDS,
            _ => {
                let tempo = self.identities.get(outcome.offense).offense.tempo * self.snapshot.tempo;
                let jitter = unit(&mut *self.rng.selection()).mul_add(2.0, -1.0);
                jitter.mul_add(TEMPO_JITTER_SECONDS, tempo)
            }
        };
        round_seconds(seconds).max(1)
    }

    /// Run the clock; true when the quarter expired on this snap.
    fn tick(&mut self, seconds: u32) -> bool {
        if seconds >= self.state.clock {
            self.state.clock = 0;
            true
        } else {
            self.state.clock -= seconds;
            false
        }
    }

    fn finish(self) -> Result<GameResult, SimError> {
        let last = self.plays.len().saturating_sub(1);
        compare_deltas(&self.ledger.team_deltas(), &self.log_totals).map_err(invariant(last))?;

        let participants: Vec<ParticipantLine> = self
            .ledger
            .lines()
            .filter_map(|(team, player, stats)| {
                let p = self.squads.get(team).sheet().participant(player)?;
                Some(ParticipantLine {
                    team,
                    player,
                    name: p.name.clone(),
                    role: p.role,
                    stats: stats.clone(),
                })
            })
            .collect();
        let composure = self.composure.values();
        let teams = self.squads.map(|team, squad| TeamSummary {
            name: squad.name().to_string(),
            totals: self.ledger.team_totals(team),
            index: PerformanceIndex::compute(team, &self.plays, &self.drives),
            coaching: self.coaching.get(team).dominant(),
            final_composure: *composure.get(team),
        });
        let bonus = BonusSummary {
            queued: self.state.bonus.queued(),
            granted: self.state.bonus.granted(),
            cancelled: self.state.bonus.cancelled(),
        };
        info!(
            "final: {} {} - {} {} ({} plays, {} drives)",
            teams.home.name,
            self.state.score.home,
            self.state.score.away,
            teams.away.name,
            self.plays.len(),
            self.drives.len()
        );
        Ok(GameResult {
            seed: self.seed,
            code: encode_game_code(self.seed),
            weather: self.weather,
            score: self.state.score,
            plays: self.plays,
            drives: self.drives,
            participants,
            teams,
            adaptation_events: self.adaptation_events,
            bonus,
            degradations: self.degradations,
            rng_draws: self.rng.draw_counts(),
        })
    }
}

/// Simulate one game with the default engine configuration.
///
/// # Errors
///
/// Returns [`SimError::Config`] for roster or identity defects found before
/// the first snap and [`SimError::Invariant`] when the game aborts.
pub fn simulate_game(
    home: &TeamSheet,
    away: &TeamSheet,
    identities: &MatchupIdentities,
    seed: u64,
    weather: Weather,
) -> Result<GameResult, SimError> {
    simulate_game_with_config(home, away, identities, seed, weather, &EngineConfig::default())
}

/// Simulate one game under an explicit configuration.
///
/// # Errors
///
/// See [`simulate_game`]; an invalid configuration is also a
/// [`SimError::Config`].
pub fn simulate_game_with_config(
    home: &TeamSheet,
    away: &TeamSheet,
    identities: &MatchupIdentities,
    seed: u64,
    weather: Weather,
    config: &EngineConfig,
) -> Result<GameResult, SimError> {
    Game::new(home, away, identities, seed, weather, config)?.run()
}

/// [`simulate_game`] over a bundled [`Matchup`].
///
/// # Errors
///
/// See [`simulate_game`].
pub fn simulate_matchup(
    matchup: &Matchup,
    seed: u64,
    weather: Weather,
    config: &EngineConfig,
) -> Result<GameResult, SimError> {
    simulate_game_with_config(
        &matchup.home,
        &matchup.away,
        &matchup.identities,
        seed,
        weather,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coaching::CoachRatings;
    use crate::demo::demo_matchup;
    use crate::error::ConfigError;

    #[test]
    fn game_runs_four_quarters() {
        let matchup = demo_matchup();
        let result = simulate_matchup(&matchup, 42, Weather::Clear, &EngineConfig::default()).unwrap();
        assert!(result.plays.len() > 60, "{}", result.plays.len());
        assert_eq!(result.drives.last().map(|d| d.result), Some(DriveResult::EndOfGame));
        assert!(result.plays.iter().any(|p| p.quarter == 4));
        assert_eq!(result.code, encode_game_code(42));
    }

    #[test]
    fn score_matches_drive_points_and_ledger() {
        let matchup = demo_matchup();
        let result = simulate_matchup(&matchup, 7, Weather::Rain, &EngineConfig::default()).unwrap();
        let last = result.plays.last().unwrap();
        assert_eq!(last.score_after, result.score);
        for team in TeamSide::ALL {
            let mut from_lines = crate::ledger::StatLine::default();
            for line in result.participants.iter().filter(|l| l.team == team) {
                for (kind, value) in line.stats.iter() {
                    from_lines.add(kind, value);
                }
            }
            assert_eq!(&from_lines, &result.teams.get(team).totals);
        }
    }

    #[test]
    fn invalid_identity_fails_before_the_first_snap() {
        let mut matchup = demo_matchup();
        matchup.identities.away.offense.tempo = 3.0;
        let err = simulate_matchup(&matchup, 1, Weather::Clear, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::RangeViolation { .. })));
        assert_eq!(err.play_index(), None);
    }

    #[test]
    fn broken_coach_ratings_degrade_visibly() {
        let mut matchup = demo_matchup();
        matchup.home.coach = Some(CoachRatings {
            aggression: 250.0,
            patience: 50.0,
            adaptability: 50.0,
            risk_tolerance: 50.0,
            clock_discipline: 50.0,
        });
        let result = simulate_matchup(&matchup, 3, Weather::Clear, &EngineConfig::default()).unwrap();
        assert_eq!(result.degradations.len(), 1);
        assert_eq!(result.degradations[0].team, TeamSide::Home);
        assert_eq!(result.teams.home.coaching, None);
    }

    #[test]
    fn quarter_clock_only_runs_down() {
        let matchup = demo_matchup();
        let result = simulate_matchup(&matchup, 11, Weather::Heat, &EngineConfig::default()).unwrap();
        for pair in result.plays.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.quarter >= a.quarter);
            if a.quarter == b.quarter {
                assert!(b.clock < a.clock);
            }
        }
    }
}
