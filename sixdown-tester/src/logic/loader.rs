use serde::de::DeserializeOwned;
use sixdown_game::demo::demo_matchup;
use sixdown_game::{EngineConfig, EngineConfigOverlay, Matchup, MatchupLoader};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn invalid_data(path: &Path, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}: {err}", path.display()),
    )
}

fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<T> {
    let text = fs::read_to_string(path)
        .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", path.display())))?;
    serde_json::from_str(&text).map_err(|err| invalid_data(path, err))
}

/// Loads a matchup and engine configuration from JSON files on disk.
///
/// Without a matchup file the bundled demo matchup is used; without a
/// config file the engine defaults apply. An overlay, when given, is merged
/// over whichever base config was loaded.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    pub matchup: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
}

impl MatchupLoader for FileLoader {
    type Error = io::Error;

    fn load_matchup(&self) -> Result<Matchup, Self::Error> {
        match &self.matchup {
            Some(path) => {
                log::debug!("loading matchup from {}", path.display());
                read_json(path)
            }
            None => Ok(demo_matchup()),
        }
    }

    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                EngineConfig::from_json(&text).map_err(|err| invalid_data(path, err))?
            }
            None => EngineConfig::default(),
        };
        if let Some(path) = &self.overlay {
            let overlay: EngineConfigOverlay = read_json(path)?;
            config = config.merge_overlay(&overlay);
            config.validate().map_err(|err| invalid_data(path, err))?;
        }
        Ok(config)
    }
}

/// A matchup and config already read into memory, shared across workers.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub matchup: Matchup,
    pub config: EngineConfig,
}

impl Prepared {
    /// Read everything `loader` points at once, up front.
    pub fn load<L: MatchupLoader>(loader: &L) -> Result<Self, L::Error> {
        Ok(Self {
            matchup: loader.load_matchup()?,
            config: loader.load_config()?,
        })
    }
}

impl MatchupLoader for Prepared {
    type Error = std::convert::Infallible;

    fn load_matchup(&self) -> Result<Matchup, Self::Error> {
        Ok(self.matchup.clone())
    }

    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sixdown-loader-{label}-{}.json",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_files() {
        let prepared = Prepared::load(&FileLoader::default()).unwrap();
        assert_eq!(prepared.matchup, demo_matchup());
        assert_eq!(prepared.config, EngineConfig::default());
    }

    #[test]
    fn overlay_merges_over_the_base_config() {
        let overlay = temp_file("overlay", r#"{"quarter_seconds": 420}"#);
        let loader = FileLoader {
            overlay: Some(overlay.clone()),
            ..FileLoader::default()
        };
        let config = loader.load_config().unwrap();
        assert_eq!(config.clock.quarter_seconds, 420);
        fs::remove_file(overlay).ok();
    }

    #[test]
    fn matchup_files_round_trip_and_bad_json_is_invalid_data() {
        let good = temp_file("matchup", &serde_json::to_string(&demo_matchup()).unwrap());
        let bad = temp_file("broken", "{ not json");
        let loaded = FileLoader {
            matchup: Some(good.clone()),
            ..FileLoader::default()
        }
        .load_matchup()
        .unwrap();
        assert_eq!(loaded, demo_matchup());

        let err = FileLoader {
            matchup: Some(bad.clone()),
            ..FileLoader::default()
        }
        .load_matchup()
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        fs::remove_file(good).ok();
        fs::remove_file(bad).ok();
    }

    #[test]
    fn missing_files_surface_not_found() {
        let loader = FileLoader {
            config: Some(PathBuf::from("/definitely/not/here.json")),
            ..FileLoader::default()
        };
        assert_eq!(loader.load_config().unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
