//! Errors raised while loading or validating authored content.

use std::path::PathBuf;
use thiserror::Error;

use crate::story::{PageId, StoryId};

/// Errors produced by the story catalog.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    #[error("story '{0}' has no pages")]
    EmptyStory(StoryId),

    #[error("story '{0}' is defined more than once")]
    DuplicateStory(StoryId),

    #[error("story '{story}' defines page '{page}' more than once")]
    DuplicatePage { story: StoryId, page: PageId },

    #[error("story '{story}' starts on unknown page '{page}'")]
    UnknownStartPage { story: StoryId, page: PageId },
}
