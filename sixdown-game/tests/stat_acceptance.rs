use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sixdown_game::coaching::CoachingProfile;
use sixdown_game::composure::Volatility;
use sixdown_game::config::{AdaptationConfig, OfficiatingConfig, SelectorConfig};
use sixdown_game::demo::{air_raid_identity, balanced_identity, demo_matchup};
use sixdown_game::ledger::Credits;
use sixdown_game::play::{Actors, DefensiveCall, PenaltyKind};
use sixdown_game::resolver::{PlayContext, SideContext, assess_penalty};
use sixdown_game::rng::{pick_weighted, roll_chance};
use sixdown_game::roster::Squad;
use sixdown_game::selector::{KickRanges, SelectionContext, category_distribution, select_play};
use sixdown_game::state::GameState;
use sixdown_game::{
    AdaptationTracker, EngineConfig, Formation, OutcomeKind, PlayCategory, PlayOutcome, TeamSide,
    Weather, simulate_matchup,
};

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;
const GAMES: u64 = 40;

fn share(count: usize, total: usize) -> f64 {
    let count = u32::try_from(count).expect("count fits u32");
    let total = u32::try_from(total).expect("total fits u32");
    f64::from(count) / f64::from(total)
}

#[test]
fn roll_chance_tracks_its_probability() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for p in [0.05, 0.3, 0.72] {
        let hits = (0..SAMPLE_SIZE).filter(|_| roll_chance(&mut rng, p)).count();
        let observed = share(hits, SAMPLE_SIZE);
        assert!(
            (observed - p).abs() <= TOLERANCE,
            "roll_chance({p}) drifted: observed {observed:.4}"
        );
    }
}

#[test]
fn weighted_picks_follow_their_weights() {
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let items = [("dive", 1.0), ("sweep", 3.0), ("never", 0.0)];
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for _ in 0..SAMPLE_SIZE {
        let pick = pick_weighted(&mut rng, &items).expect("positive weights");
        *counts.entry(*pick).or_insert(0) += 1;
    }
    let observed = share(counts.get("sweep").copied().unwrap_or(0), SAMPLE_SIZE);
    assert!(
        (observed - 0.75).abs() <= TOLERANCE,
        "weighted pick drifted: observed {observed:.4}"
    );
    assert!(!counts.contains_key("never"));
}

#[test]
fn selector_draws_match_the_published_distribution() {
    let identity = air_raid_identity();
    let opponent = balanced_identity();
    let mut state = GameState::kickoff(TeamSide::Home, 900);
    state.start_possession(TeamSide::Home, 35, 20).unwrap();
    state.down = 2;
    state.distance = 14;
    let snapshot = CoachingProfile::neutral(&identity).snapshot(0);
    let tracker = AdaptationTracker::new();
    let adaptation = AdaptationConfig::default();
    let config = SelectorConfig::default();
    let ctx = SelectionContext {
        state: &state,
        offense: &identity.offense,
        defense: &opponent.defense,
        coaching: &snapshot,
        adaptation: &tracker,
        adaptation_config: &adaptation,
        config: &config,
        kick_ranges: KickRanges {
            drop_kick: 45.0,
            place_kick: 52.0,
        },
    };
    let expected = category_distribution(&ctx);

    let mut rng = ChaCha8Rng::seed_from_u64(5150);
    let mut counts: BTreeMap<PlayCategory, usize> = BTreeMap::new();
    for _ in 0..SAMPLE_SIZE {
        *counts.entry(select_play(&ctx, &mut rng).category).or_insert(0) += 1;
    }
    for (category, p) in expected {
        let observed = share(counts.get(&category).copied().unwrap_or(0), SAMPLE_SIZE);
        assert!(
            (observed - p).abs() <= TOLERANCE,
            "{category:?} drifted: expected {p:.4}, observed {observed:.4}"
        );
    }
}

fn side<'a>(team: TeamSide, squad: &'a Squad<'a>) -> SideContext<'a> {
    SideContext {
        team,
        squad,
        volatility: Volatility::CALM,
        freshness: 1.0,
    }
}

#[test]
fn flags_fly_at_the_configured_rate() {
    let matchup = demo_matchup();
    let home = matchup.home.squad().unwrap();
    let away = matchup.away.squad().unwrap();
    let tracker = AdaptationTracker::new();
    let adaptation = AdaptationConfig::default();
    let ctx = PlayContext {
        offense: side(TeamSide::Home, &home),
        defense: side(TeamSide::Away, &away),
        offense_identity: &matchup.identities.home.offense,
        defense_identity: &matchup.identities.away.defense,
        spot: 50,
        category: PlayCategory::Power,
        formation: Formation::Heavy,
        call: DefensiveCall::default(),
        weather: Weather::Clear.effect(),
        adaptation: &tracker,
        adaptation_config: &adaptation,
    };
    let cfg = OfficiatingConfig {
        penalty_rate: 0.1,
        offense_share: 0.55,
    };
    let play = PlayOutcome {
        offense: TeamSide::Home,
        category: PlayCategory::Power,
        yards: 4,
        kind: OutcomeKind::Gain,
        actors: Actors::default(),
        penalty: None,
        credits: Credits::new(),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(31337);
    let mut flags = 0usize;
    let mut holding = 0usize;
    for _ in 0..SAMPLE_SIZE {
        let mut outcome = play.clone();
        assess_penalty(&mut outcome, &ctx, &cfg, &mut rng);
        if let Some(penalty) = outcome.penalty {
            flags += 1;
            if penalty.kind == PenaltyKind::Holding {
                holding += 1;
                assert_eq!(penalty.team, TeamSide::Home);
            } else {
                assert_eq!(penalty.team, TeamSide::Away);
            }
            assert_eq!(outcome.credits.len(), 2);
        }
    }
    let observed = share(flags, SAMPLE_SIZE);
    assert!(
        (observed - cfg.penalty_rate).abs() <= TOLERANCE,
        "penalty rate drifted: observed {observed:.4}"
    );
    let offense_share = share(holding, flags);
    assert!(
        (offense_share - cfg.offense_share).abs() <= 0.08,
        "offense share drifted: observed {offense_share:.4}"
    );
}

#[test]
fn league_shape_stays_in_band() {
    let matchup = demo_matchup();
    let cfg = EngineConfig::default();
    let mut plays = 0usize;
    let mut kicks = 0usize;
    let mut points = 0u32;
    let mut turnovers = 0usize;
    let mut wins = [0u32; 3];
    for seed in 0..GAMES {
        let result = simulate_matchup(&matchup, seed, Weather::Clear, &cfg).unwrap();
        plays += result.plays.len();
        kicks += result.plays.iter().filter(|p| p.category.is_kick()).count();
        turnovers += result.plays.iter().filter(|p| p.outcome.is_turnover()).count();
        points += result.score.home + result.score.away;
        match result.winner() {
            Some(TeamSide::Home) => wins[0] += 1,
            Some(TeamSide::Away) => wins[1] += 1,
            None => wins[2] += 1,
        }
    }
    let games = usize::try_from(GAMES).expect("game count fits");
    let plays_per_game = share(plays, games);
    assert!(
        (80.0..=320.0).contains(&plays_per_game),
        "plays per game out of band: {plays_per_game:.1}"
    );
    let kick_share = share(kicks, plays);
    assert!(
        (0.02..=0.5).contains(&kick_share),
        "kick share out of band: {kick_share:.4}"
    );
    let points_per_game = f64::from(points) / f64::from(u32::try_from(GAMES).expect("fits"));
    assert!(
        (5.0..=160.0).contains(&points_per_game),
        "points per game out of band: {points_per_game:.1}"
    );
    assert!(turnovers > 0);
    assert!(wins[0] > 0 && wins[1] > 0, "one side never won: {wins:?}");
}
