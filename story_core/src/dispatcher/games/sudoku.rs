//! Sudoku puzzles for small hands: 4x4 or 9x9.
//!
//! The solution grid comes from the base pattern
//! `(box * (r % box) + r / box + c) % n`, with digits relabelled by a
//! seeded permutation. Cells are then blanked according to difficulty.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use story_content::MiniGameType;

use super::{parse_config, MiniGame, MiniGameInput, MiniGameOutcome};
use crate::error::MiniGameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SudokuDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl SudokuDifficulty {
    /// Share of cells left blank, in percent.
    fn blank_percent(&self) -> usize {
        match self {
            SudokuDifficulty::Easy => 35,
            SudokuDifficulty::Medium => 50,
            SudokuDifficulty::Hard => 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SudokuConfig {
    /// Side length: 4 or 9.
    pub size: usize,
    pub difficulty: SudokuDifficulty,
    /// Exact number of blanks; overrides `difficulty`.
    pub holes: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for SudokuConfig {
    fn default() -> Self {
        Self {
            size: 4,
            difficulty: SudokuDifficulty::Easy,
            holes: None,
            seed: None,
        }
    }
}

#[derive(Debug)]
pub struct SudokuGame {
    size: usize,
    solution: Vec<u8>,
    grid: Vec<u8>,
    givens: Vec<bool>,
    mistakes: u32,
    finished: bool,
}

impl Default for SudokuGame {
    fn default() -> Self {
        Self::generate(&SudokuConfig::default())
    }
}

impl SudokuGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a puzzle. Sizes other than 4 and 9 fall back to 4.
    pub fn generate(config: &SudokuConfig) -> Self {
        let size = if config.size == 9 { 9 } else { 4 };
        let box_size = if size == 9 { 3 } else { 2 };
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut digits: Vec<u8> = (1..=size as u8).collect();
        digits.shuffle(&mut rng);

        let mut solution = Vec::with_capacity(size * size);
        for r in 0..size {
            for c in 0..size {
                let pattern = (box_size * (r % box_size) + r / box_size + c) % size;
                solution.push(digits[pattern]);
            }
        }

        let cells = size * size;
        let holes = config
            .holes
            .unwrap_or(cells * config.difficulty.blank_percent() / 100)
            .min(cells);
        let mut order: Vec<usize> = (0..cells).collect();
        order.shuffle(&mut rng);

        let mut grid = solution.clone();
        let mut givens = vec![true; cells];
        for &cell in order.iter().take(holes) {
            grid[cell] = 0;
            givens[cell] = false;
        }

        Self {
            size,
            solution,
            grid,
            givens,
            mistakes: 0,
            finished: false,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The value shown in a cell, `None` while blank or off the board.
    pub fn value(&self, row: usize, col: usize) -> Option<u8> {
        self.cell(row, col)
            .map(|i| self.grid[i])
            .filter(|v| *v != 0)
    }

    pub fn is_given(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_some_and(|i| self.givens[i])
    }

    /// The correct value for a cell.
    pub fn hint(&self, row: usize, col: usize) -> Option<u8> {
        self.cell(row, col).map(|i| self.solution[i])
    }

    pub fn blanks(&self) -> usize {
        self.grid.iter().filter(|v| **v == 0).count()
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    fn score(&self) -> u32 {
        100u32.saturating_sub(10 * self.mistakes).max(10)
    }

    fn cell(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.size && col < self.size).then(|| row * self.size + col)
    }
}

impl MiniGame for SudokuGame {
    fn kind(&self) -> MiniGameType {
        MiniGameType::Sudoku
    }

    fn configure(&mut self, config: &str) -> Result<(), MiniGameError> {
        let parsed: SudokuConfig = match parse_config(config) {
            Ok(parsed) => parsed,
            Err(e) => {
                *self = Self::default();
                return Err(e);
            }
        };
        *self = Self::generate(&parsed);
        if parsed.size != 4 && parsed.size != 9 {
            return Err(MiniGameError::Unsupported(format!("sudoku size {}", parsed.size)));
        }
        Ok(())
    }

    fn handle_input(&mut self, input: &MiniGameInput) -> Option<MiniGameOutcome> {
        let MiniGameInput::Place { row, col, value } = *input else {
            return None;
        };
        let index = self.cell(row, col)?;
        if self.finished || self.givens[index] {
            return None;
        }
        if value == 0 || usize::from(value) > self.size {
            return None;
        }

        if self.solution[index] != value {
            self.mistakes += 1;
            return None;
        }

        self.grid[index] = value;
        if self.blanks() == 0 {
            self.finished = true;
            return Some(MiniGameOutcome::won(self.score()));
        }
        None
    }

    fn attempts(&self) -> u32 {
        1 + self.mistakes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seeded(size: usize, seed: u64) -> SudokuGame {
        SudokuGame::generate(&SudokuConfig {
            size,
            seed: Some(seed),
            ..SudokuConfig::default()
        })
    }

    fn assert_valid_solution(game: &SudokuGame) {
        let n = game.size();
        let b = if n == 9 { 3 } else { 2 };
        let full: HashSet<u8> = (1..=n as u8).collect();

        for i in 0..n {
            let row: HashSet<u8> = (0..n).filter_map(|c| game.hint(i, c)).collect();
            let col: HashSet<u8> = (0..n).filter_map(|r| game.hint(r, i)).collect();
            let (br, bc) = ((i / b) * b, (i % b) * b);
            let boxed: HashSet<u8> = (0..n)
                .filter_map(|k| game.hint(br + k / b, bc + k % b))
                .collect();
            assert_eq!(row, full);
            assert_eq!(col, full);
            assert_eq!(boxed, full);
        }
    }

    #[test]
    fn test_generated_solutions_are_valid() {
        for seed in 0..5 {
            assert_valid_solution(&seeded(4, seed));
            assert_valid_solution(&seeded(9, seed));
        }
    }

    #[test]
    fn test_blank_count_follows_difficulty() {
        assert_eq!(seeded(4, 1).blanks(), 16 * 35 / 100);

        let hard = SudokuGame::generate(&SudokuConfig {
            size: 9,
            difficulty: SudokuDifficulty::Hard,
            seed: Some(3),
            ..SudokuConfig::default()
        });
        assert_eq!(hard.blanks(), 81 * 60 / 100);

        let custom = SudokuGame::generate(&SudokuConfig {
            holes: Some(100),
            seed: Some(3),
            ..SudokuConfig::default()
        });
        assert_eq!(custom.blanks(), 16);
    }

    #[test]
    fn test_same_seed_same_puzzle() {
        let a = seeded(9, 42);
        let b = seeded(9, 42);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.solution, b.solution);
    }

    #[test]
    fn test_solving_counts_mistakes() {
        let mut game = SudokuGame::new();
        game.configure(r#"{"size": 4, "seed": 9, "holes": 3}"#).unwrap();

        let blanks: Vec<(usize, usize)> = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .filter(|(r, c)| !game.is_given(*r, *c))
            .collect();
        assert_eq!(blanks.len(), 3);

        let (r0, c0) = blanks[0];
        let right = game.hint(r0, c0).unwrap();
        let wrong = if right == 1 { 2 } else { 1 };
        assert_eq!(
            game.handle_input(&MiniGameInput::Place { row: r0, col: c0, value: wrong }),
            None
        );
        assert_eq!(game.value(r0, c0), None);

        let mut outcome = None;
        for (r, c) in blanks {
            let value = game.hint(r, c).unwrap();
            outcome = game.handle_input(&MiniGameInput::Place { row: r, col: c, value });
        }

        assert_eq!(outcome, Some(MiniGameOutcome::won(90)));
        assert_eq!(game.attempts(), 2);
    }

    #[test]
    fn test_given_cells_are_fixed() {
        let mut game = seeded(4, 5);
        let (r, c) = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .find(|(r, c)| game.is_given(*r, *c))
            .unwrap();

        let before = game.value(r, c);
        assert_eq!(
            game.handle_input(&MiniGameInput::Place { row: r, col: c, value: 1 }),
            None
        );
        assert_eq!(game.value(r, c), before);
        assert_eq!(game.mistakes(), 0);
    }

    #[test]
    fn test_unsupported_size_still_playable() {
        let mut game = SudokuGame::new();
        assert!(game.configure(r#"{"size": 6}"#).is_err());
        assert_eq!(game.size(), 4);
    }

    #[test]
    fn test_cells_off_the_board() {
        let game = seeded(4, 3);
        assert_eq!(game.hint(0, 4), None);
        assert_eq!(game.value(0, 4), None);
        assert!(!game.is_given(0, 4));
        assert_eq!(game.hint(4, 0), None);
        assert!(game.hint(3, 3).is_some());
    }
}
