//! Coloring book: flood-fill the regions of an outlined picture.

use serde::Deserialize;
use std::collections::VecDeque;
use story_content::MiniGameType;

use super::{parse_config, MiniGame, MiniGameInput, MiniGameOutcome};
use crate::error::MiniGameError;

/// Outline cells in the picture rows.
const OUTLINE_CHAR: char = '#';

/// Palette index of an unpainted cell.
pub const BLANK: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pixel {
    Outline,
    Paint(u8),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColoringConfig {
    /// Picture rows; `#` is outline, anything else starts blank.
    pub picture: Vec<String>,
}

impl Default for ColoringConfig {
    fn default() -> Self {
        // A little house: roof, two walls and a door.
        let picture = [
            "....#....",
            "...#.#...",
            "..#...#..",
            ".#######.",
            ".#..#..#.",
            ".#..#..#.",
            ".#######.",
        ];
        Self {
            picture: picture.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug)]
pub struct ColoringGame {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
    fills: u32,
    finished: bool,
}

impl Default for ColoringGame {
    fn default() -> Self {
        Self::from_config(&ColoringConfig::default())
    }
}

impl ColoringGame {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_config(config: &ColoringConfig) -> Self {
        let height = config.picture.len();
        let width = config
            .picture
            .iter()
            .map(|r| r.chars().count())
            .max()
            .unwrap_or(0);

        let mut pixels = vec![Pixel::Paint(BLANK); width * height];
        for (y, row) in config.picture.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == OUTLINE_CHAR {
                    pixels[y * width + x] = Pixel::Outline;
                }
            }
        }

        Self {
            width,
            height,
            pixels,
            fills: 0,
            finished: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x)
    }

    pub fn fills(&self) -> u32 {
        self.fills
    }

    /// Cells still unpainted.
    pub fn blank_cells(&self) -> usize {
        self.pixels
            .iter()
            .filter(|p| **p == Pixel::Paint(BLANK))
            .count()
    }

    /// Repaint the 4-connected area sharing the color at `(x, y)`.
    ///
    /// Returns the number of cells changed.
    pub fn flood_fill(&mut self, x: usize, y: usize, color: u8) -> usize {
        let Some(Pixel::Paint(original)) = self.pixel(x, y).cloned() else {
            return 0;
        };
        if original == color {
            return 0;
        }

        let mut changed = 0;
        let mut queue = VecDeque::from([(x, y)]);
        while let Some((cx, cy)) = queue.pop_front() {
            let index = cy * self.width + cx;
            if self.pixels[index] != Pixel::Paint(original) {
                continue;
            }
            self.pixels[index] = Pixel::Paint(color);
            changed += 1;

            if cx > 0 {
                queue.push_back((cx - 1, cy));
            }
            if cx + 1 < self.width {
                queue.push_back((cx + 1, cy));
            }
            if cy > 0 {
                queue.push_back((cx, cy - 1));
            }
            if cy + 1 < self.height {
                queue.push_back((cx, cy + 1));
            }
        }
        changed
    }
}

impl MiniGame for ColoringGame {
    fn kind(&self) -> MiniGameType {
        MiniGameType::Coloring
    }

    fn configure(&mut self, config: &str) -> Result<(), MiniGameError> {
        *self = Self::default();
        let parsed: ColoringConfig = parse_config(config)?;
        if parsed.picture.is_empty() {
            return Err(MiniGameError::Unsupported("empty picture".to_string()));
        }
        *self = Self::from_config(&parsed);
        Ok(())
    }

    fn handle_input(&mut self, input: &MiniGameInput) -> Option<MiniGameOutcome> {
        let MiniGameInput::Fill { x, y, color } = *input else {
            return None;
        };
        if self.finished || color == BLANK {
            return None;
        }

        if self.flood_fill(x, y, color) > 0 {
            self.fills += 1;
        }
        if self.blank_cells() == 0 {
            self.finished = true;
            return Some(MiniGameOutcome::won(100));
        }
        None
    }

    fn attempts(&self) -> u32 {
        1
    }
}
