//! Story catalog - the set of authored stories available to the player.
//!
//! Catalogs are written in TOML (or JSON) with one `[[stories]]` table per story:
//!
//! ```toml
//! [[stories]]
//! id = "forest"
//! title = "The Whispering Forest"
//!
//! [[stories.pages]]
//! id = "a"
//! title = "Edge of the Forest"
//! mini_game = { kind = "counting", config = '{"target": 3}' }
//!
//! [[stories.pages.choices]]
//! text = "Follow the path"
//! target = "b"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::ContentError;
use crate::story::{Story, StoryId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    stories: Vec<Story>,
}

/// A validated collection of stories, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct StoryCatalog {
    stories: Vec<Story>,
    index: HashMap<StoryId, usize>,
}

impl StoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already constructed stories.
    pub fn from_stories(stories: impl IntoIterator<Item = Story>) -> Result<Self, ContentError> {
        let mut catalog = Self::new();
        for story in stories {
            catalog.add_story(story)?;
        }
        Ok(catalog)
    }

    /// Parse a TOML catalog.
    pub fn from_toml_str(source: &str) -> Result<Self, ContentError> {
        let file: CatalogFile = toml::from_str(source)?;
        Self::from_stories(file.stories)
    }

    /// Parse a JSON catalog.
    pub fn from_json_str(source: &str) -> Result<Self, ContentError> {
        let file: CatalogFile = serde_json::from_str(source)?;
        Self::from_stories(file.stories)
    }

    /// Load a catalog from disk. The format is chosen by file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("json") => Self::from_json_str(&source),
            other => Err(ContentError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Validate and add a story.
    pub fn add_story(&mut self, story: Story) -> Result<(), ContentError> {
        story.validate()?;
        if self.index.contains_key(&story.id) {
            return Err(ContentError::DuplicateStory(story.id));
        }

        for (page, choice) in story.dangling_choices() {
            debug!(
                story = %story.id,
                page = %page.id,
                target = %choice.target,
                "Choice target does not resolve; selecting it ends the story"
            );
        }

        self.index.insert(story.id.clone(), self.stories.len());
        self.stories.push(story);
        Ok(())
    }

    /// Get a story by id.
    pub fn get(&self, id: &StoryId) -> Option<&Story> {
        self.index.get(id).and_then(|i| self.stories.get(*i))
    }

    /// All stories in authored order.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}
