use rayon::prelude::*;
use serde::Serialize;
use sixdown_game::{EngineError, GameEngine, GameResult, TeamSide, Weather};
use std::convert::Infallible;

use super::loader::Prepared;
use super::seeds::SeedInfo;

/// One game to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub seed: SeedInfo,
    pub weather: Weather,
}

/// Cross every seed with every requested weather, seed-major.
#[must_use]
pub fn plan_jobs(seeds: &[SeedInfo], weathers: &[Weather]) -> Vec<Job> {
    seeds
        .iter()
        .flat_map(|seed| {
            weathers.iter().map(move |&weather| Job {
                seed: seed.clone(),
                weather,
            })
        })
        .collect()
}

/// Headline numbers for one finished game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub seed: u64,
    pub code: String,
    pub weather: Weather,
    pub home_points: u32,
    pub away_points: u32,
    pub winner: Option<TeamSide>,
    pub plays: usize,
    pub drives: usize,
    pub kicks: usize,
    pub turnovers: usize,
    pub bonus_granted: u32,
    pub digest: String,
}

impl GameRecord {
    fn from_result(job: &Job, result: &GameResult) -> Result<Self, serde_json::Error> {
        Ok(Self {
            seed: result.seed,
            code: job.seed.display_code(),
            weather: result.weather,
            home_points: result.score.home,
            away_points: result.score.away,
            winner: result.winner(),
            plays: result.plays.len(),
            drives: result.drives.len(),
            kicks: result.plays.iter().filter(|p| p.category.is_kick()).count(),
            turnovers: result
                .plays
                .iter()
                .filter(|p| p.outcome.is_turnover())
                .count(),
            bonus_granted: result.bonus.granted,
            digest: format!("{:016x}", result.log_digest()?),
        })
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.home_points + self.away_points
    }

    #[must_use]
    pub fn kick_share(&self) -> f64 {
        if self.plays == 0 {
            0.0
        } else {
            count_f64(self.kicks) / count_f64(self.plays)
        }
    }
}

/// A game that aborted or could not start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameFailure {
    pub seed: u64,
    pub code: String,
    pub weather: Weather,
    pub play_index: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub games: usize,
    pub failures: usize,
    pub home_wins: u32,
    pub away_wins: u32,
    pub ties: u32,
    pub points: Spread,
    pub plays: Spread,
    pub kick_share: Spread,
    pub turnovers: Spread,
    pub bonus_possessions: Spread,
}

/// Outcome of re-running a game and comparing play-log digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeterminismCheck {
    pub seed: u64,
    pub weather: Weather,
    pub first: String,
    pub second: String,
}

impl DeterminismCheck {
    #[must_use]
    pub fn matched(&self) -> bool {
        self.first == self.second
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub records: Vec<GameRecord>,
    pub failures: Vec<GameFailure>,
    pub determinism: Option<DeterminismCheck>,
}

impl BatchReport {
    /// The batch passes when every game finished and replays matched.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.determinism.as_ref().is_none_or(DeterminismCheck::matched)
    }
}

#[allow(clippy::cast_precision_loss)]
const fn count_f64(value: usize) -> f64 {
    value as f64
}

fn run_job(engine: &GameEngine<Prepared>, job: &Job) -> Result<GameRecord, GameFailure> {
    let failure = |play_index, message: String| GameFailure {
        seed: job.seed.seed,
        code: job.seed.display_code(),
        weather: job.weather,
        play_index,
        message,
    };
    match engine.simulate(job.seed.seed, job.weather) {
        Ok(result) => GameRecord::from_result(job, &result).map_err(|err| failure(None, err.to_string())),
        Err(EngineError::Sim(err)) => {
            log::warn!("seed {} aborted: {err}", job.seed.seed);
            Err(failure(err.play_index(), err.to_string()))
        }
        Err(other) => Err(failure(None, other.to_string())),
    }
}

/// Simulate a single job and return the full result.
///
/// # Errors
///
/// Propagates the engine error for a game that fails to start or aborts.
pub fn simulate_one(
    prepared: &Prepared,
    job: &Job,
) -> Result<GameResult, EngineError<Infallible>> {
    GameEngine::new(prepared.clone()).simulate(job.seed.seed, job.weather)
}

fn replay_check(engine: &GameEngine<Prepared>, job: &Job) -> Option<DeterminismCheck> {
    let digest = || {
        engine
            .simulate(job.seed.seed, job.weather)
            .ok()
            .and_then(|result| result.log_digest().ok())
            .map(|d| format!("{d:016x}"))
    };
    Some(DeterminismCheck {
        seed: job.seed.seed,
        weather: job.weather,
        first: digest()?,
        second: digest()?,
    })
}

/// Run every job across the rayon pool and aggregate the results.
#[must_use]
pub fn run_batch(prepared: &Prepared, jobs: &[Job]) -> BatchReport {
    let engine = GameEngine::new(prepared.clone());
    let outcomes: Vec<Result<GameRecord, GameFailure>> =
        jobs.par_iter().map(|job| run_job(&engine, job)).collect();

    let mut records = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(failure) => failures.push(failure),
        }
    }

    let determinism = jobs.first().and_then(|job| replay_check(&engine, job));
    if let Some(check) = &determinism
        && !check.matched()
    {
        log::error!(
            "seed {} replayed differently: {} vs {}",
            check.seed,
            check.first,
            check.second
        );
    }

    BatchReport {
        summary: summarize(&records, failures.len()),
        records,
        failures,
        determinism,
    }
}

#[must_use]
pub fn summarize(records: &[GameRecord], failures: usize) -> BatchSummary {
    let mut points = RunningStats::default();
    let mut plays = RunningStats::default();
    let mut kick_share = RunningStats::default();
    let mut turnovers = RunningStats::default();
    let mut bonus = RunningStats::default();
    let (mut home_wins, mut away_wins, mut ties) = (0, 0, 0);

    for record in records {
        points.add(f64::from(record.total_points()));
        plays.add(count_f64(record.plays));
        kick_share.add(record.kick_share());
        turnovers.add(count_f64(record.turnovers));
        bonus.add(f64::from(record.bonus_granted));
        match record.winner {
            Some(TeamSide::Home) => home_wins += 1,
            Some(TeamSide::Away) => away_wins += 1,
            None => ties += 1,
        }
    }

    BatchSummary {
        games: records.len(),
        failures,
        home_wins,
        away_wins,
        ties,
        points: points.spread(),
        plays: plays.spread(),
        kick_share: kick_share.spread(),
        turnovers: turnovers.spread(),
        bonus_possessions: bonus.spread(),
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn spread(&self) -> Spread {
        Spread {
            mean: if self.count == 0 { 0.0 } else { self.mean },
            std_dev: self.variance().sqrt(),
        }
    }
}
