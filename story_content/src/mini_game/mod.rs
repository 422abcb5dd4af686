//! Mini-game types and the results they produce.

use serde::{Deserialize, Serialize};

/// All mini-game kinds a page can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MiniGameType {
    /// Sentinel for "no mini-game".
    #[default]
    None,
    Counting,
    Matching,
    Memory,
    Drawing,
    Coloring,
    Maze,
    Puzzle,
    Sudoku,
    TicTacToe,
}

impl MiniGameType {
    /// Stable lowercase name, as used in content files and story flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            MiniGameType::None => "none",
            MiniGameType::Counting => "counting",
            MiniGameType::Matching => "matching",
            MiniGameType::Memory => "memory",
            MiniGameType::Drawing => "drawing",
            MiniGameType::Coloring => "coloring",
            MiniGameType::Maze => "maze",
            MiniGameType::Puzzle => "puzzle",
            MiniGameType::Sudoku => "sudoku",
            MiniGameType::TicTacToe => "tic_tac_toe",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, MiniGameType::None)
    }

    /// Name of the story flag set when a game of this kind is won.
    pub fn completed_flag(&self) -> String {
        format!("mini_game_{}_completed", self.as_str())
    }
}

impl std::fmt::Display for MiniGameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of a single mini-game run. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniGameResult {
    kind: MiniGameType,
    completed: bool,
    success: bool,
    score: u32,
    /// Seconds between launch and finish.
    elapsed_secs: f32,
    attempts: u32,
}

impl MiniGameResult {
    /// A run the player played through to the end.
    pub fn finished(kind: MiniGameType, success: bool, score: u32, elapsed_secs: f32, attempts: u32) -> Self {
        Self {
            kind,
            completed: true,
            success,
            score,
            elapsed_secs: elapsed_secs.max(0.0),
            attempts,
        }
    }

    /// A run that was cut short before finishing.
    pub fn abandoned(kind: MiniGameType, elapsed_secs: f32, attempts: u32) -> Self {
        Self {
            kind,
            completed: false,
            success: false,
            score: 0,
            elapsed_secs: elapsed_secs.max(0.0),
            attempts,
        }
    }

    pub fn kind(&self) -> MiniGameType {
        self.kind
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// First-attempt success within the time threshold.
    pub fn is_perfect(&self, threshold_secs: f32) -> bool {
        self.completed && self.success && self.attempts == 1 && self.elapsed_secs <= threshold_secs
    }
}
