//! Error types for the runtime engine.
//!
//! None of these reach the player: `StorySession` logs them and carries on.

use std::path::PathBuf;
use story_content::StoryId;
use thiserror::Error;

/// Failure to start or move through a story.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavigationError {
    #[error("story '{0}' has no pages")]
    EmptyStory(StoryId),
}

/// Local key-value persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Remote profile sync failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("profile service unavailable: {0}")]
    Unavailable(String),

    #[error("profile service rejected request: {status} {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid profile payload: {0}")]
    InvalidPayload(String),
}

/// A mini-game could not understand its configuration.
#[derive(Debug, Error)]
pub enum MiniGameError {
    #[error("invalid mini-game configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("unsupported configuration value: {0}")]
    Unsupported(String),
}

/// Engine configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
