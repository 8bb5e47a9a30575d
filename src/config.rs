//! Session configuration loading: ammunition, time limit, and default character.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::{error::ConfigError, state::CharacterId};

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/session.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_SESSION_CONFIG_PATH";
const DEFAULT_AMMUNITION: u32 = 10;
const DEFAULT_TIME_LIMIT_SECS: u32 = 60;
const DEFAULT_CHARACTER: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable configuration read once when a session is constructed.
pub struct SessionConfig {
    initial_ammunition: u32,
    time_limit_secs: u32,
    default_character: CharacterId,
}

impl SessionConfig {
    /// Validate raw values, rejecting a non-positive time limit, negative
    /// ammunition, or a blank character.
    pub fn new(
        initial_ammunition: i64,
        time_limit_secs: i64,
        default_character: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let initial_ammunition = u32::try_from(initial_ammunition)
            .map_err(|_| ConfigError::InvalidAmmunition(initial_ammunition))?;
        let time_limit_secs = u32::try_from(time_limit_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeLimit(time_limit_secs))?;
        let default_character = default_character.into();
        if default_character.trim().is_empty() {
            return Err(ConfigError::EmptyCharacter);
        }

        Ok(Self {
            initial_ammunition,
            time_limit_secs,
            default_character: CharacterId::new(default_character),
        })
    }

    /// Load the configuration from disk, falling back to built-in defaults when
    /// the file does not exist. Any other failure is fatal.
    pub fn load() -> Result<Self, ConfigError> {
        let path = resolve_config_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let raw: RawConfig = serde_json::from_str(&contents)
            .map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        let config = Self::try_from(raw)?;
        info!(
            path = %path.display(),
            ammunition = config.initial_ammunition,
            time_limit_secs = config.time_limit_secs,
            "loaded session config"
        );
        Ok(config)
    }

    /// Rounds available at the start of every match.
    pub fn initial_ammunition(&self) -> u32 {
        self.initial_ammunition
    }

    /// Countdown length of every match.
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    /// Character selected when the session is constructed.
    pub fn default_character(&self) -> &CharacterId {
        &self.default_character
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_ammunition: DEFAULT_AMMUNITION,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            default_character: CharacterId::new(DEFAULT_CHARACTER),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_ammunition")]
    initial_ammunition: i64,
    #[serde(default = "default_time_limit")]
    time_limit_secs: i64,
    #[serde(default = "default_character")]
    default_character: String,
}

impl TryFrom<RawConfig> for SessionConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        Self::new(
            value.initial_ammunition,
            value.time_limit_secs,
            value.default_character,
        )
    }
}

fn default_ammunition() -> i64 {
    DEFAULT_AMMUNITION.into()
}

fn default_time_limit() -> i64 {
    DEFAULT_TIME_LIMIT_SECS.into()
}

fn default_character() -> String {
    DEFAULT_CHARACTER.into()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
