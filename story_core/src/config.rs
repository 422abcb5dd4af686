//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;

/// Tunables for presentation pacing, scoring and parental controls.
///
/// Every field has a default, so a partial TOML file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay before a page's choices are shown.
    pub choice_delay_ms: u64,

    /// Delay before a page's mini-game launches.
    pub mini_game_delay_ms: u64,

    /// How long a finished mini-game stays on screen before teardown.
    pub result_display_ms: u64,

    /// A first-attempt success at or under this many seconds is perfect.
    pub perfect_time_threshold_secs: f32,

    /// Minutes the parental gate stays open after a correct PIN.
    pub parental_session_minutes: u32,

    /// Daily play budget in minutes. 0 disables the limit.
    pub daily_limit_minutes: u32,

    /// Reaching a page with no choices and no mini-game ends the story.
    pub complete_on_terminal_page: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            choice_delay_ms: 1000,
            mini_game_delay_ms: 1500,
            result_display_ms: 2000,
            perfect_time_threshold_secs: 30.0,
            parental_session_minutes: 5,
            daily_limit_minutes: 60,
            complete_on_terminal_page: true,
        }
    }
}

impl EngineConfig {
    /// Zero delays everywhere; useful for headless playback.
    pub fn immediate() -> Self {
        Self {
            choice_delay_ms: 0,
            mini_game_delay_ms: 0,
            result_display_ms: 0,
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Like [`EngineConfig::load`], but any failure falls back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Using default engine configuration");
            Self::default()
        })
    }

    pub fn choice_delay(&self) -> Duration {
        Duration::from_millis(self.choice_delay_ms)
    }

    pub fn mini_game_delay(&self) -> Duration {
        Duration::from_millis(self.mini_game_delay_ms)
    }

    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("choice_delay_ms = 250\ndaily_limit_minutes = 30").unwrap();

        assert_eq!(config.choice_delay(), Duration::from_millis(250));
        assert_eq!(config.daily_limit_minutes, 30);
        assert_eq!(config.mini_game_delay_ms, 1500);
        assert!(config.complete_on_terminal_page);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("choice_delay_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(
            EngineConfig::load_or_default("/definitely/not/here.toml"),
            EngineConfig::default()
        );
    }
}
