//! Headless mini-game logic.
//!
//! Each game parses its own configuration; the dispatcher hands the
//! authored string over untouched.

mod coloring;
mod counting;
mod sudoku;
mod tic_tac_toe;

pub use coloring::*;
pub use counting::*;
pub use sudoku::*;
pub use tic_tac_toe::*;

use serde::de::DeserializeOwned;
use story_content::MiniGameType;

use crate::error::MiniGameError;

/// Player input routed to the active mini-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiniGameInput {
    /// A numeric answer.
    Answer(i64),
    /// Select a board cell.
    Cell { row: usize, col: usize },
    /// Write a value into a board cell.
    Place { row: usize, col: usize, value: u8 },
    /// Flood-fill from a point with a palette color.
    Fill { x: usize, y: usize, color: u8 },
}

/// How a game ended, before timing is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiniGameOutcome {
    pub success: bool,
    pub score: u32,
}

impl MiniGameOutcome {
    pub fn won(score: u32) -> Self {
        Self { success: true, score }
    }

    pub fn lost(score: u32) -> Self {
        Self { success: false, score }
    }
}

/// A playable mini-game.
pub trait MiniGame {
    fn kind(&self) -> MiniGameType;

    /// Reset the game from an authored configuration string.
    ///
    /// On error the game keeps playing with its default configuration.
    fn configure(&mut self, config: &str) -> Result<(), MiniGameError>;

    /// Apply one input. Returns the outcome once the game is over.
    fn handle_input(&mut self, input: &MiniGameInput) -> Option<MiniGameOutcome>;

    /// Attempts used so far.
    fn attempts(&self) -> u32;
}

/// Placeholder for games whose interaction happens entirely in the host UI.
///
/// The host reports the outcome through the dispatcher.
#[derive(Debug)]
pub struct ExternalGame {
    kind: MiniGameType,
    config: String,
}

impl ExternalGame {
    pub fn new(kind: MiniGameType) -> Self {
        Self {
            kind,
            config: String::new(),
        }
    }

    /// The raw configuration, for the host UI to interpret.
    pub fn config(&self) -> &str {
        &self.config
    }
}

impl MiniGame for ExternalGame {
    fn kind(&self) -> MiniGameType {
        self.kind
    }

    fn configure(&mut self, config: &str) -> Result<(), MiniGameError> {
        self.config = config.to_string();
        Ok(())
    }

    fn handle_input(&mut self, _input: &MiniGameInput) -> Option<MiniGameOutcome> {
        None
    }

    fn attempts(&self) -> u32 {
        1
    }
}

/// Parse a JSON configuration, treating a blank string as `{}`.
pub(crate) fn parse_config<T: DeserializeOwned + Default>(config: &str) -> Result<T, MiniGameError> {
    if config.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(config)?)
}
