use std::hash::Hasher;

use serde_json::Value;
use twox_hash::XxHash64;

use sixdown_game::demo::demo_matchup;
use sixdown_game::{
    ConfigError, EngineConfig, EngineConfigOverlay, Matchup, OffensiveIdentity, PlayCategory,
    Role, SimError, StartKind, TeamIdentity, Weather, simulate_matchup,
};

const IDENTITY_JSON: &str = r#"{
    "offense": {
        "name": "option",
        "category_weights": {
            "Dive": 1.2, "Power": 0.8, "Sweep": 1.0, "Counter": 0.9, "LateralChain": 0.7,
            "ShortKickPass": 0.8, "DeepKickPass": 0.3, "DropKick": 0.4, "PlaceKick": 0.5,
            "Punt": 0.6
        },
        "tempo": 26.0,
        "kick_aggression": 0.4,
        "extensions": { "risk_ceiling": 0.3, "lateral_flair": 2.0 }
    },
    "defense": {
        "name": "option",
        "personnel_weights": { "Base": 0.5, "Nickel": 0.5 },
        "blitz_rate": 0.15,
        "blitz_intensity": 0.4
    }
}"#;

#[test]
fn identity_files_parse_with_defaults_and_open_extensions() {
    let identity: TeamIdentity = serde_json::from_str(IDENTITY_JSON).unwrap();
    identity.validate().unwrap();
    let offense: &OffensiveIdentity = &identity.offense;
    assert_eq!(offense.weight(PlayCategory::Dive), 1.2);
    assert_eq!(offense.weight(PlayCategory::Kneel), 0.0);
    // Absent formation weights fall back to the documented split.
    assert_eq!(offense.formation_weights.len(), 3);
    // Unknown extension keys are carried, not rejected.
    assert!(offense.extensions.iter().any(|(k, _)| k == "lateral_flair"));
    assert_eq!(offense.extensions.get_or("deception", 50.0), 50.0);
}

#[test]
fn identity_missing_a_category_is_rejected() {
    let mut value: Value = serde_json::from_str(IDENTITY_JSON).unwrap();
    value["offense"]["category_weights"]
        .as_object_mut()
        .unwrap()
        .remove("Punt");
    let identity: TeamIdentity = serde_json::from_value(value).unwrap();
    let err = identity.validate().unwrap_err();
    assert!(
        matches!(err, ConfigError::MissingWeight { ref key, .. } if key == PlayCategory::Punt.label()),
        "{err}"
    );
}

#[test]
fn matchup_json_keeps_roster_shape() {
    let matchup = demo_matchup();
    let value = serde_json::to_value(&matchup).unwrap();
    let roster = value["home"]["roster"].as_array().unwrap();
    assert_eq!(roster.len(), 25);
    assert_eq!(roster[0]["id"], Value::from(1));
    assert_eq!(roster[0]["role"], Value::from("lead_carrier"));
    assert_eq!(roster[3]["role"]["receiver"]["rank"], Value::from(1));
    // A sheet without a coach omits the field entirely.
    assert!(value["away"].get("coach").is_none());
    assert!(value["home"].get("coach").is_some());

    let back: Matchup = serde_json::from_value(value).unwrap();
    assert_eq!(back.home.name, matchup.home.name);
    let roles: Vec<Role> = back.away.roster.iter().map(|p| p.role).collect();
    let expected: Vec<Role> = matchup.away.roster.iter().map(|p| p.role).collect();
    assert_eq!(roles, expected);
    back.home.squad().unwrap();
    back.away.squad().unwrap();
}

#[test]
fn duplicate_participant_ids_fail_before_the_first_snap() {
    let mut matchup = demo_matchup();
    matchup.home.roster[5].id = matchup.home.roster[4].id;
    let err = simulate_matchup(&matchup, 5, Weather::Clear, &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::DuplicateParticipant { .. })
    ));
}

#[test]
fn missing_kicker_is_a_roster_error() {
    let mut matchup = demo_matchup();
    matchup.away.roster.retain(|p| p.role != Role::Kicker);
    let err = simulate_matchup(&matchup, 5, Weather::Clear, &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::MissingRole { .. })), "{err}");
}

#[test]
fn out_of_range_config_is_rejected_up_front() {
    let cfg: EngineConfig =
        serde_json::from_str(r#"{"officiating": {"penalty_rate": 0.9}}"#).unwrap();
    let err = simulate_matchup(&demo_matchup(), 1, Weather::Clear, &cfg).unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::RangeViolation {
            field: "officiating.penalty_rate",
            ..
        })
    ));
    assert!(EngineConfig::from_json(r#"{"field": {"delta_base": 0}}"#).is_err());
}

#[test]
fn overlays_reshape_the_game() {
    let matchup = demo_matchup();
    let base = EngineConfig::default();
    let overlay: EngineConfigOverlay =
        serde_json::from_str(r#"{"quarter_seconds": 300, "field": {"delta_base": 30}}"#).unwrap();
    let tuned = base.merge_overlay(&overlay);
    tuned.validate().unwrap();

    let full = simulate_matchup(&matchup, 21, Weather::Clear, &base).unwrap();
    let short = simulate_matchup(&matchup, 21, Weather::Clear, &tuned).unwrap();
    assert!(short.plays.len() < full.plays.len());
    assert!(short.plays.iter().all(|p| p.clock <= 300));
    let opening = &short.drives[0];
    assert_eq!(opening.start, StartKind::Restart);
    assert_eq!(opening.start_spot, 30);
}

#[test]
fn custom_scoring_flows_into_the_result() {
    let matchup = demo_matchup();
    let cfg = EngineConfig::from_json(r#"{"scoring": {"touchdown": 6, "pindown": 2}}"#).unwrap();
    let result = simulate_matchup(&matchup, 8, Weather::Clear, &cfg).unwrap();
    let total: u32 = result
        .plays
        .iter()
        .filter_map(|p| p.outcome.points(&cfg.scoring))
        .map(|(_, pts)| pts)
        .sum();
    assert_eq!(total, result.score.home + result.score.away);
}

#[test]
fn result_serializes_with_a_stable_digest() {
    let matchup = demo_matchup();
    let result = simulate_matchup(&matchup, 1234, Weather::Wind, &EngineConfig::default()).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    for key in ["seed", "code", "score", "plays", "drives", "participants", "teams", "rng_draws"] {
        assert!(value.get(key).is_some(), "missing `{key}`");
    }
    assert_eq!(value["plays"].as_array().unwrap().len(), result.plays.len());
    assert_eq!(value["code"], Value::from(result.code.clone()));

    let bytes = serde_json::to_vec(&result.plays).unwrap();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    assert_eq!(hasher.finish(), result.log_digest().unwrap());

    let again = simulate_matchup(&matchup, 1234, Weather::Wind, &EngineConfig::default()).unwrap();
    assert_eq!(
        serde_json::to_vec(&again.plays).unwrap(),
        bytes,
        "play log bytes drifted between runs"
    );
}

#[test]
fn tracing_attaches_candidates_without_changing_the_game() {
    let matchup = demo_matchup();
    let plain = EngineConfig::default();
    let traced = plain.merge_overlay(&EngineConfigOverlay {
        trace: Some(true),
        ..EngineConfigOverlay::default()
    });
    let a = simulate_matchup(&matchup, 64, Weather::Clear, &plain).unwrap();
    let b = simulate_matchup(&matchup, 64, Weather::Clear, &traced).unwrap();
    assert!(a.plays.iter().all(|p| p.trace.is_none()));
    // Victory-formation kneels skip the draw and carry no trace.
    assert!(
        b.plays
            .iter()
            .all(|p| p.trace.is_some() || p.category == PlayCategory::Kneel)
    );
    assert_eq!(a.score, b.score);
    assert_eq!(a.plays.len(), b.plays.len());
    for (x, y) in a.plays.iter().zip(&b.plays) {
        assert_eq!(x.outcome, y.outcome);
    }
}
