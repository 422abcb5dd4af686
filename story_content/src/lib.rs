//! # Story Content
//!
//! The "Story Book" crate - authored stories, pages, choices, mini-game
//! references and the records produced when a mini-game is played.
//! This crate holds plain data only; runtime behavior lives in `story_core`.

pub mod catalog;
pub mod error;
pub mod flags;
pub mod mini_game;
pub mod story;

pub use catalog::*;
pub use error::*;
pub use flags::*;
pub use mini_game::*;
pub use story::*;
