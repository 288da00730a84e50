//! Application-level configuration loading: game timings and the store backend.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RPS_ROOM_BACK_CONFIG_PATH";

const START_TIME_ENV: &str = "GAME_START_TIME_SECOND";
const PREPARATION_TIME_ENV: &str = "GAME_PREPARATION_TIME_SECOND";
const CONSIDER_TIME_ENV: &str = "GAME_CONSIDER_TIME_SECOND";
const ROOM_STORE_ENV: &str = "ROOM_STORE";

/// Longest accepted value for any game window.
pub const MAX_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Time windows driving every game.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameTimings {
    /// Delay after creation before the game may start.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub start_delay: Duration,
    /// Window after creation during which the game accepts applicants.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub preparation_window: Duration,
    /// Time each round gives participants to choose.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub consider_window: Duration,
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(60),
            preparation_window: Duration::from_secs(120),
            consider_window: Duration::from_secs(10),
        }
    }
}

impl GameTimings {
    /// Override individual windows from `GAME_*_SECOND` variables found by `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (var, slot) in [
            (START_TIME_ENV, &mut self.start_delay),
            (PREPARATION_TIME_ENV, &mut self.preparation_window),
            (CONSIDER_TIME_ENV, &mut self.consider_window),
        ] {
            let Some(raw) = lookup(var) else {
                continue;
            };
            match raw.trim().parse::<u64>() {
                Ok(seconds) => *slot = Duration::from_secs(seconds),
                Err(err) => warn!(var, value = %raw, error = %err, "ignoring invalid duration override"),
            }
        }
        *self = self.clamped();
    }

    /// Cap every window at [`MAX_WINDOW`].
    pub fn clamped(self) -> Self {
        let cap = |name: &str, window: Duration| {
            if window > MAX_WINDOW {
                warn!(
                    window = name,
                    requested_s = window.as_secs(),
                    max_s = MAX_WINDOW.as_secs(),
                    "game window too long; clamping"
                );
                MAX_WINDOW
            } else {
                window
            }
        };
        Self {
            start_delay: cap("startDelay", self.start_delay),
            preparation_window: cap("preparationWindow", self.preparation_window),
            consider_window: cap("considerWindow", self.consider_window),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    game: GameTimings,
}

impl AppConfig {
    /// Build a configuration from explicit timings.
    pub fn new(game: GameTimings) -> Self {
        Self {
            game: game.clamped(),
        }
    }

    /// Load the application configuration from disk and the environment,
    /// falling back to built-in defaults.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.game.apply_overrides(|var| env::var(var).ok());
        info!(
            start_delay_s = config.game.start_delay.as_secs(),
            preparation_window_s = config.game.preparation_window.as_secs(),
            consider_window_s = config.game.consider_window.as_secs(),
            "game timings configured"
        );
        config
    }

    fn load_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Timings every game is driven by.
    pub fn game(&self) -> &GameTimings {
        &self.game
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    game: GameTimings,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self::new(value.game)
    }
}

/// Which room store the server connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local store; rooms vanish on restart.
    #[default]
    Memory,
    /// CouchDB, one document per room.
    Couch,
    /// MongoDB, one document per room.
    Mongo,
}

impl StoreBackend {
    /// Read `ROOM_STORE`, defaulting to the in-memory store.
    pub fn from_env() -> Self {
        match env::var(ROOM_STORE_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown ROOM_STORE; using in-memory store");
                Self::Memory
            }),
            Err(_) => Self::Memory,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "" => Some(Self::Memory),
            "couch" | "couchdb" => Some(Self::Couch),
            "mongo" | "mongodb" => Some(Self::Mongo),
            _ => None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn file_values_are_read_in_seconds() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "game": { "startDelay": 5, "considerWindow": 20 } }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.game().start_delay, Duration::from_secs(5));
        assert_eq!(config.game().preparation_window, Duration::from_secs(120));
        assert_eq!(config.game().consider_window, Duration::from_secs(20));
    }

    #[test]
    fn environment_overrides_win_and_bad_values_are_ignored() {
        let vars = HashMap::from([
            (START_TIME_ENV, "3".to_owned()),
            (CONSIDER_TIME_ENV, "soon".to_owned()),
        ]);
        let mut timings = GameTimings::default();
        timings.apply_overrides(|var| vars.get(var).cloned());

        assert_eq!(timings.start_delay, Duration::from_secs(3));
        assert_eq!(timings.consider_window, Duration::from_secs(10));
    }

    #[test]
    fn oversized_windows_are_clamped() {
        let vars = HashMap::from([(PREPARATION_TIME_ENV, u64::MAX.to_string())]);
        let mut timings = GameTimings::default();
        timings.apply_overrides(|var| vars.get(var).cloned());
        assert_eq!(timings.preparation_window, MAX_WINDOW);
        assert_eq!(timings.start_delay, Duration::from_secs(60));

        let raw: RawConfig = serde_json::from_str(
            r#"{ "game": { "considerWindow": 18446744073709551615 } }"#,
        )
        .unwrap();
        assert_eq!(AppConfig::from(raw).game().consider_window, MAX_WINDOW);
    }

    #[test]
    fn store_backend_names() {
        assert_eq!(StoreBackend::parse("Mongo"), Some(StoreBackend::Mongo));
        assert_eq!(StoreBackend::parse("couchdb"), Some(StoreBackend::Couch));
        assert_eq!(StoreBackend::parse(""), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("redis"), None);
    }
}
