//! Counting: say how many objects are shown.

use serde::Deserialize;
use story_content::MiniGameType;

use super::{parse_config, MiniGame, MiniGameInput, MiniGameOutcome};
use crate::error::MiniGameError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    pub target: u32,
    pub max_attempts: u32,
    /// What is being counted, for display.
    pub item: String,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            target: 3,
            max_attempts: 3,
            item: "stars".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CountingGame {
    config: CountingConfig,
    attempts: u32,
    finished: bool,
}

impl CountingGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &CountingConfig {
        &self.config
    }

    /// 100 for a first-try answer, 25 less for every retry, never below 25.
    fn score(&self) -> u32 {
        100u32.saturating_sub(25 * self.attempts.saturating_sub(1)).max(25)
    }
}

impl MiniGame for CountingGame {
    fn kind(&self) -> MiniGameType {
        MiniGameType::Counting
    }

    fn configure(&mut self, config: &str) -> Result<(), MiniGameError> {
        *self = Self::default();
        let parsed: CountingConfig = parse_config(config)?;
        if parsed.max_attempts == 0 {
            return Err(MiniGameError::Unsupported("max_attempts must be at least 1".to_string()));
        }
        self.config = parsed;
        Ok(())
    }

    fn handle_input(&mut self, input: &MiniGameInput) -> Option<MiniGameOutcome> {
        let MiniGameInput::Answer(answer) = input else {
            return None;
        };
        if self.finished {
            return None;
        }

        self.attempts += 1;
        if *answer == i64::from(self.config.target) {
            self.finished = true;
            Some(MiniGameOutcome::won(self.score()))
        } else if self.attempts >= self.config.max_attempts {
            self.finished = true;
            Some(MiniGameOutcome::lost(0))
        } else {
            None
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }
}
