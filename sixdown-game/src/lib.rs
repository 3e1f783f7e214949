//! Sixdown Game Engine
//!
//! Deterministic play-by-play simulation for six-down field sport games.
//! The crate owns no I/O: rosters, identities and configuration come in as
//! values and a [`GameResult`] comes out.

pub mod adaptation;
pub mod coaching;
pub mod composure;
pub mod config;
pub mod constants;
pub mod contest;
pub mod demo;
pub mod drive;
pub mod error;
pub mod field;
pub mod game;
pub mod identity;
pub mod ledger;
pub mod numbers;
pub mod play;
pub mod resolver;
pub mod result;
pub mod rng;
pub mod roster;
pub mod seed;
pub mod selector;
pub mod state;
pub mod weather;

// Re-export commonly used types
pub use adaptation::{AdaptationEvent, AdaptationTracker};
pub use coaching::{CoachRatings, CoachingProfile, CoachingSnapshot, Countermeasure};
pub use composure::{ComposureState, ComposureTracker};
pub use config::{
    AdaptationConfig, ClockConfig, ComposureConfig, EngineConfig, EngineConfigOverlay,
    FieldConfig, OfficiatingConfig, ScoringConfig, SelectorConfig,
};
pub use drive::{DriveResult, StartKind};
pub use error::{CoachingError, ConfigError, InvariantViolation, SimError};
pub use game::{Matchup, simulate_game, simulate_game_with_config, simulate_matchup};
pub use identity::{
    DefensiveIdentity, ExtensionMap, MatchupIdentities, OffensiveIdentity, TeamIdentity,
};
pub use ledger::{StatKind, StatLine};
pub use play::{Formation, OutcomeKind, Personnel, PlayCategory, PlayOutcome};
pub use result::{
    DriveSummary, GameResult, ParticipantLine, PerformanceIndex, PlayRecord, TeamSummary,
};
pub use roster::{Participant, PlayerId, Ratings, Role, TeamSheet};
pub use seed::{decode_game_code, encode_game_code};
pub use state::{Score, TeamPair, TeamSide};
pub use weather::Weather;

/// Supplies matchups to the engine.
/// Roster and identity storage live behind this seam.
pub trait MatchupLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the rosters and identities to simulate.
    ///
    /// # Errors
    ///
    /// Returns an error if the matchup cannot be loaded.
    fn load_matchup(&self) -> Result<Matchup, Self::Error>;

    /// Load engine configuration; the default keeps the documented defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source exists but cannot be read.
    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(EngineConfig::default())
    }
}

/// Failure of a [`GameEngine`] call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("failed to load matchup: {0}")]
    Load(#[source] E),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("unknown game code `{0}`")]
    UnknownCode(String),
}

/// Engine bound to a matchup source.
pub struct GameEngine<L>
where
    L: MatchupLoader,
{
    loader: L,
}

impl<L> GameEngine<L>
where
    L: MatchupLoader,
{
    /// Create a new game engine with the provided loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Simulate the loader's matchup.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Load`] when the loader fails and
    /// [`EngineError::Sim`] when the simulation rejects its inputs or aborts.
    pub fn simulate(&self, seed: u64, weather: Weather) -> Result<GameResult, EngineError<L::Error>> {
        let matchup = self.loader.load_matchup().map_err(EngineError::Load)?;
        let config = self.loader.load_config().map_err(EngineError::Load)?;
        Ok(simulate_matchup(&matchup, seed, weather, &config)?)
    }

    /// Simulate from a shareable game code such as `SD-BLITZ07`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownCode`] for a code that does not decode,
    /// otherwise as [`GameEngine::simulate`].
    pub fn simulate_code(
        &self,
        code: &str,
        weather: Weather,
    ) -> Result<GameResult, EngineError<L::Error>> {
        let seed = decode_game_code(code).ok_or_else(|| EngineError::UnknownCode(code.to_string()))?;
        self.simulate(seed, weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct DemoLoader;

    impl MatchupLoader for DemoLoader {
        type Error = Infallible;

        fn load_matchup(&self) -> Result<Matchup, Self::Error> {
            Ok(demo::demo_matchup())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("matchup store offline")]
    struct Offline;

    struct BrokenLoader;

    impl MatchupLoader for BrokenLoader {
        type Error = Offline;

        fn load_matchup(&self) -> Result<Matchup, Self::Error> {
            Err(Offline)
        }
    }

    #[test]
    fn engine_simulates_loaded_matchup() {
        let engine = GameEngine::new(DemoLoader);
        let a = engine.simulate(0xABCD, Weather::Clear).unwrap();
        let b = engine.simulate(0xABCD, Weather::Clear).unwrap();
        assert_eq!(a.log_digest().unwrap(), b.log_digest().unwrap());
        assert_eq!(a.teams.home.name, "Harbor Gulls");
    }

    #[test]
    fn game_codes_resolve_to_seeds() {
        let engine = GameEngine::new(DemoLoader);
        let code = encode_game_code(77);
        let result = engine.simulate_code(&code, Weather::Snow).unwrap();
        assert_eq!(Some(result.seed), decode_game_code(&code));
        assert!(matches!(
            engine.simulate_code("nonsense", Weather::Clear),
            Err(EngineError::UnknownCode(_))
        ));
    }

    #[test]
    fn loader_failures_surface() {
        let engine = GameEngine::new(BrokenLoader);
        assert!(matches!(
            engine.simulate(1, Weather::Clear),
            Err(EngineError::Load(Offline))
        ));
    }
}
