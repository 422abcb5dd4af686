//! Tic-tac-toe against a depth-limited heuristic opponent.
//!
//! The player is X and always moves first; the computer is O.

use serde::Deserialize;
use story_content::MiniGameType;

use super::{parse_config, MiniGame, MiniGameInput, MiniGameOutcome};
use crate::error::MiniGameError;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

const WIN_SCORE: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mark {
    #[default]
    Empty,
    X,
    O,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Plies the opponent looks ahead.
    pub fn search_depth(&self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 3,
            Difficulty::Hard => 9,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicTacToeConfig {
    pub difficulty: Difficulty,
}

#[derive(Debug, Default)]
pub struct TicTacToeGame {
    config: TicTacToeConfig,
    board: [Mark; 9],
    finished: bool,
}

impl TicTacToeGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &[Mark; 9] {
        &self.board
    }

    pub fn cell(&self, row: usize, col: usize) -> Mark {
        self.board[row * 3 + col]
    }

    /// The opponent's preferred move on `board`, if any cell is free.
    pub fn best_move(board: &[Mark; 9], depth: u32) -> Option<usize> {
        let mut scratch = *board;
        let mut best: Option<(usize, i32)> = None;

        for i in 0..9 {
            if scratch[i] != Mark::Empty {
                continue;
            }
            scratch[i] = Mark::O;
            let score = minimax(&mut scratch, depth.saturating_sub(1), false);
            scratch[i] = Mark::Empty;

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        best.map(|(i, _)| i)
    }

    fn outcome(&self) -> Option<MiniGameOutcome> {
        match winner(&self.board) {
            Some(Mark::X) => Some(MiniGameOutcome::won(100)),
            Some(_) => Some(MiniGameOutcome::lost(0)),
            None if is_full(&self.board) => Some(MiniGameOutcome::lost(50)),
            None => None,
        }
    }

    #[cfg(test)]
    fn from_board(board: [Mark; 9], difficulty: Difficulty) -> Self {
        Self {
            config: TicTacToeConfig { difficulty },
            board,
            finished: false,
        }
    }
}

impl MiniGame for TicTacToeGame {
    fn kind(&self) -> MiniGameType {
        MiniGameType::TicTacToe
    }

    fn configure(&mut self, config: &str) -> Result<(), MiniGameError> {
        *self = Self::default();
        self.config = parse_config(config)?;
        Ok(())
    }

    fn handle_input(&mut self, input: &MiniGameInput) -> Option<MiniGameOutcome> {
        let MiniGameInput::Cell { row, col } = *input else {
            return None;
        };
        if self.finished || row >= 3 || col >= 3 || self.board[row * 3 + col] != Mark::Empty {
            return None;
        }

        self.board[row * 3 + col] = Mark::X;
        if let Some(outcome) = self.outcome() {
            self.finished = true;
            return Some(outcome);
        }

        if let Some(reply) = Self::best_move(&self.board, self.config.difficulty.search_depth()) {
            self.board[reply] = Mark::O;
        }
        let outcome = self.outcome();
        self.finished = outcome.is_some();
        outcome
    }

    fn attempts(&self) -> u32 {
        1
    }
}

fn winner(board: &[Mark; 9]) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| {
        let mark = board[*a];
        (mark != Mark::Empty && mark == board[*b] && mark == board[*c]).then_some(mark)
    })
}

fn is_full(board: &[Mark; 9]) -> bool {
    board.iter().all(|m| *m != Mark::Empty)
}

/// Score lines that are still open for one side only.
fn heuristic(board: &[Mark; 9]) -> i32 {
    const WEIGHTS: [i32; 3] = [0, 1, 10];

    LINES
        .iter()
        .map(|line| {
            let o = line.iter().filter(|i| board[**i] == Mark::O).count();
            let x = line.iter().filter(|i| board[**i] == Mark::X).count();
            match (o, x) {
                (o, 0) if o < 3 => WEIGHTS[o],
                (0, x) if x < 3 => -WEIGHTS[x],
                _ => 0,
            }
        })
        .sum()
}

fn minimax(board: &mut [Mark; 9], depth: u32, o_to_move: bool) -> i32 {
    match winner(board) {
        // Quicker wins (more depth left) score higher.
        Some(Mark::O) => return WIN_SCORE + depth as i32,
        Some(_) => return -WIN_SCORE - depth as i32,
        None => {}
    }
    if is_full(board) {
        return 0;
    }
    if depth == 0 {
        return heuristic(board);
    }

    let (mark, mut best) = if o_to_move {
        (Mark::O, i32::MIN)
    } else {
        (Mark::X, i32::MAX)
    };

    for i in 0..9 {
        if board[i] != Mark::Empty {
            continue;
        }
        board[i] = mark;
        let score = minimax(board, depth - 1, !o_to_move);
        board[i] = Mark::Empty;

        best = if o_to_move {
            best.max(score)
        } else {
            best.min(score)
        };
    }

    best
}
