use std::collections::BTreeSet;

use sixdown_game::demo::demo_matchup;
use sixdown_game::field::delta_start;
use sixdown_game::ledger::TeamDeltas;
use sixdown_game::roster::Ratings;
use sixdown_game::{
    DriveResult, EngineConfig, GameResult, Matchup, OutcomeKind, StartKind, TeamSide, Weather,
    simulate_matchup,
};

const SEEDS: u64 = 24;

fn run(matchup: &Matchup, seed: u64) -> GameResult {
    let weather = Weather::ALL[usize::try_from(seed).unwrap() % Weather::ALL.len()];
    simulate_matchup(matchup, seed, weather, &EngineConfig::default())
        .unwrap_or_else(|err| panic!("seed {seed} aborted: {err}"))
}

fn games() -> Vec<GameResult> {
    let matchup = demo_matchup();
    (0..SEEDS).map(|seed| run(&matchup, seed)).collect()
}

#[test]
fn every_play_belongs_to_the_team_that_had_the_ball() {
    for game in games() {
        let total: u32 = game.drives.iter().map(|d| d.plays).sum();
        assert_eq!(total as usize, game.plays.len(), "seed {}", game.seed);

        let mut cursor = 0usize;
        for drive in &game.drives {
            let plays = &game.plays[cursor..cursor + drive.plays as usize];
            cursor += drive.plays as usize;
            for play in plays {
                assert_eq!(play.offense, drive.team, "seed {} play {}", game.seed, play.index);
                assert_eq!(play.outcome.offense, play.offense);
            }
            // Only a clock expiry can end a drive on a play that kept the ball.
            if let Some(last) = plays.last() {
                let kept = last.outcome.kind.keeps_possession(last.offense);
                let expired = matches!(drive.result, DriveResult::EndOfHalf | DriveResult::EndOfGame);
                assert_eq!(kept, expired, "seed {} drive {}", game.seed, drive.index);
            }
        }
    }
}

#[test]
fn downs_and_spots_stay_live() {
    for game in games() {
        for play in &game.plays {
            assert!((1..=6).contains(&play.down), "seed {} play {}", game.seed, play.index);
            assert!((1..=99).contains(&play.spot), "seed {} play {}", game.seed, play.index);
            assert!(play.distance >= 1);
        }
        for drive in &game.drives {
            assert!((1..=99).contains(&drive.start_spot));
        }
    }
}

#[test]
fn failed_sixth_downs_turn_the_ball_over() {
    let mut wrapped = 0usize;
    for game in games() {
        for play in game.plays.iter().filter(|p| p.down == 6) {
            match &play.outcome.kind {
                OutcomeKind::TurnoverOnDowns { .. } => {
                    wrapped += 1;
                    assert!(play.outcome.net_yards() < play.distance);
                }
                kind if kind.keeps_possession(play.offense) => {
                    assert!(
                        play.outcome.net_yards() >= play.distance,
                        "seed {} play {} kept the ball short of the line",
                        game.seed,
                        play.index
                    );
                }
                _ => {}
            }
        }
        for play in &game.plays {
            if matches!(play.outcome.kind, OutcomeKind::TurnoverOnDowns { .. }) {
                assert_eq!(play.down, 6);
            }
        }
        let on_downs = game
            .drives
            .iter()
            .filter(|d| d.result == DriveResult::TurnoverOnDowns)
            .count();
        let plays_on_downs = game
            .plays
            .iter()
            .filter(|p| matches!(p.outcome.kind, OutcomeKind::TurnoverOnDowns { .. }))
            .count();
        assert_eq!(on_downs, plays_on_downs, "seed {}", game.seed);
    }
    assert!(wrapped > 0, "no sixth down failed across {SEEDS} games");
}

#[test]
fn restarts_follow_the_score_at_the_restart() {
    let field = EngineConfig::default().field;
    for game in games() {
        for drive in game.drives.iter().filter(|d| d.start == StartKind::Restart) {
            let expected = delta_start(drive.score_before.differential(drive.team), &field);
            assert_eq!(
                drive.start_spot, expected,
                "seed {} drive {} at {:?}",
                game.seed, drive.index, drive.score_before
            );
        }
    }
}

#[test]
fn big_leads_restart_deep_in_the_leaders_own_end() {
    let mut matchup = demo_matchup();
    for player in &mut matchup.away.roster {
        player.ratings = Ratings::uniform(25);
    }
    let mut checked = 0usize;
    for seed in 0..SEEDS {
        let game = run(&matchup, seed);
        for drive in game.drives.iter().filter(|d| d.start == StartKind::Restart) {
            let lead = drive.score_before.differential(drive.team);
            if lead < 15 {
                continue;
            }
            checked += 1;
            assert_eq!(
                drive.start_spot,
                (20 - lead).max(1),
                "seed {} drive {} leading by {lead}",
                game.seed,
                drive.index
            );
        }
    }
    assert!(checked > 0, "no restart with a 15-point lead across {SEEDS} games");
}

#[test]
fn bonus_possessions_follow_the_interceptors_next_drive() {
    let field = EngineConfig::default().field;
    let mut granted = 0u32;
    for game in games() {
        for (i, drive) in game.drives.iter().enumerate() {
            if drive.start != StartKind::Bonus {
                continue;
            }
            granted += 1;
            assert_eq!(drive.start_spot, field.bonus_start);
            // The bonus is an extra drive: the beneficiary already had the
            // ball on the drive before it.
            let previous = &game.drives[i - 1];
            assert_eq!(previous.team, drive.team, "seed {} drive {}", game.seed, drive.index);
            assert_eq!(previous.quarter <= 2, drive.quarter <= 2, "bonus crossed the half");
            assert_ne!(previous.start, StartKind::Bonus);
            let threw = game
                .plays
                .iter()
                .any(|p| p.offense == drive.team && p.outcome.kind.interception());
            assert!(threw, "seed {} bonus without an interception", game.seed);
        }
        let bonus_drives = game
            .drives
            .iter()
            .filter(|d| d.start == StartKind::Bonus)
            .count();
        assert_eq!(bonus_drives as u32, game.bonus.granted);
        assert!(game.bonus.granted + game.bonus.cancelled <= game.bonus.queued);
    }
    assert!(granted > 0, "no bonus possession across {SEEDS} games");
}

#[test]
fn ledger_totals_reconcile_with_the_play_log() {
    for game in games() {
        let mut log = TeamDeltas::new();
        for play in &game.plays {
            // Every yard the ball moves on the snap is owned by a participant.
            let attributed: i64 = play
                .outcome
                .credits
                .iter()
                .map(|c| c.kind.offense_movement(c.value))
                .sum();
            assert_eq!(
                attributed,
                i64::from(play.outcome.yards),
                "seed {} play {} ({:?})",
                game.seed,
                play.index,
                play.outcome.kind
            );
            for (key, value) in play.outcome.team_deltas() {
                *log.entry(key).or_insert(0) += value;
            }
        }
        for ((team, kind), value) in &log {
            assert_eq!(
                game.teams.get(*team).stat(*kind),
                *value,
                "seed {} {team:?} {kind:?}",
                game.seed
            );
        }
        for team in TeamSide::ALL {
            for (kind, value) in game.teams.get(team).totals.iter() {
                if kind.reconciles_with_log() {
                    assert_eq!(log.get(&(team, kind)).copied().unwrap_or(0), value);
                }
            }
            let from_lines: i64 = game
                .participants
                .iter()
                .filter(|l| l.team == team)
                .map(|l| l.stats.iter().map(|(_, v)| v).sum::<i64>())
                .sum();
            let from_totals: i64 = game.teams.get(team).totals.iter().map(|(_, v)| v).sum();
            assert_eq!(from_lines, from_totals);
        }
    }
}

#[test]
fn points_add_up_to_the_final_score() {
    let scoring = EngineConfig::default().scoring;
    for game in games() {
        let mut home = 0u32;
        let mut away = 0u32;
        for play in &game.plays {
            match play.outcome.points(&scoring) {
                Some((TeamSide::Home, pts)) => home += pts,
                Some((TeamSide::Away, pts)) => away += pts,
                None => {}
            }
            assert_eq!(play.score_after.home, home);
            assert_eq!(play.score_after.away, away);
        }
        assert_eq!((game.score.home, game.score.away), (home, away));
        for team in TeamSide::ALL {
            let driven: u32 = game.drives.iter().filter(|d| d.team == team).map(|d| d.points).sum();
            assert!(driven <= game.score.of(team));
        }
    }
}

#[test]
fn identical_inputs_replay_identically() {
    let matchup = demo_matchup();
    let mut digests = BTreeSet::new();
    for seed in 0..8 {
        let a = run(&matchup, seed);
        let b = run(&matchup, seed);
        assert_eq!(a, b, "seed {seed} diverged");
        let digest = a.log_digest().unwrap();
        assert_eq!(digest, b.log_digest().unwrap());
        assert_eq!(a.rng_draws, b.rng_draws);
        digests.insert(digest);
    }
    assert!(digests.len() > 1, "different seeds produced the same log");
}

#[test]
fn weather_changes_the_game_but_not_its_shape() {
    let matchup = demo_matchup();
    let cfg = EngineConfig::default();
    let clear = simulate_matchup(&matchup, 99, Weather::Clear, &cfg).unwrap();
    let snow = simulate_matchup(&matchup, 99, Weather::Snow, &cfg).unwrap();
    assert_ne!(clear.log_digest().unwrap(), snow.log_digest().unwrap());
    for game in [&clear, &snow] {
        assert_eq!(game.drives.last().map(|d| d.result), Some(DriveResult::EndOfGame));
        assert!(game.plays.iter().any(|p| p.quarter == 3));
    }
}
