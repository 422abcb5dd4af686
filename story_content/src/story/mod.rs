//! Story definitions: the authored graph of pages connected by choices.

mod choice;
mod page;

pub use choice::*;
pub use page::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ContentError;

/// Identifier of a story within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub String);

impl StoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a page, unique within its story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id never resolves to a page.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete story: an ordered list of pages.
///
/// Stories are authored once and read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,

    /// Audio resource played while the story is open. Playback belongs to the host.
    #[serde(default)]
    pub theme_audio: Option<String>,

    /// Designated first page. Falls back to the first listed page.
    #[serde(default)]
    pub start_page: Option<PageId>,

    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Story {
    /// Create a new story without pages.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: StoryId::new(id),
            title: title.into(),
            theme_audio: None,
            start_page: None,
            pages: Vec::new(),
        }
    }

    /// Append a page.
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Set the designated start page.
    pub fn with_start_page(mut self, page: impl Into<String>) -> Self {
        self.start_page = Some(PageId::new(page));
        self
    }

    /// Set the theme audio resource.
    pub fn with_theme_audio(mut self, audio: impl Into<String>) -> Self {
        self.theme_audio = Some(audio.into());
        self
    }

    /// Look up a page by id.
    pub fn page(&self, id: &PageId) -> Option<&Page> {
        if id.is_empty() {
            return None;
        }
        self.pages.iter().find(|p| &p.id == id)
    }

    /// Check whether a page id resolves within this story.
    pub fn contains_page(&self, id: &PageId) -> bool {
        self.page(id).is_some()
    }

    /// The page a playthrough begins on.
    pub fn first_page(&self) -> Option<&Page> {
        self.start_page
            .as_ref()
            .and_then(|id| self.page(id))
            .or_else(|| self.pages.first())
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Choices whose target does not resolve to a page of this story.
    ///
    /// Selecting such a choice ends the story, so authored content only
    /// places them on final pages.
    pub fn dangling_choices(&self) -> Vec<(&Page, &Choice)> {
        self.pages
            .iter()
            .flat_map(|page| page.choices.iter().map(move |choice| (page, choice)))
            .filter(|(_, choice)| !self.contains_page(&choice.target))
            .collect()
    }

    /// Check structural invariants: at least one page, unique page ids and
    /// a resolvable start page.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.pages.is_empty() {
            return Err(ContentError::EmptyStory(self.id.clone()));
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(&page.id) {
                return Err(ContentError::DuplicatePage {
                    story: self.id.clone(),
                    page: page.id.clone(),
                });
            }
        }

        if let Some(start) = &self.start_page {
            if !self.contains_page(start) {
                return Err(ContentError::UnknownStartPage {
                    story: self.id.clone(),
                    page: start.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> Story {
        Story::new("forest", "The Whispering Forest")
            .with_page(
                Page::new("a", "Edge of the Forest")
                    .with_choice(Choice::new("Follow the path", "b"))
                    .with_choice(Choice::new("Climb the tree", "c")),
            )
            .with_page(Page::new("b", "The Path").with_choice(Choice::new("Go home", "d")))
            .with_page(Page::new("c", "Tree Top"))
    }

    #[test]
    fn test_page_lookup() {
        let story = forest();
        assert_eq!(story.page(&PageId::from("b")).unwrap().title, "The Path");
        assert!(story.page(&PageId::from("zzz")).is_none());
        assert!(story.page(&PageId::from("")).is_none());
    }

    #[test]
    fn test_first_page_defaults_to_index_zero() {
        let story = forest();
        assert_eq!(story.first_page().unwrap().id, PageId::from("a"));

        let story = forest().with_start_page("c");
        assert_eq!(story.first_page().unwrap().id, PageId::from("c"));
    }

    #[test]
    fn test_dangling_choices_only_on_final_pages() {
        let story = forest();
        let dangling = story.dangling_choices();

        assert_eq!(dangling.len(), 1);
        let (page, choice) = dangling[0];
        assert_eq!(page.id, PageId::from("b"));
        assert_eq!(choice.target, PageId::from("d"));
    }

    #[test]
    fn test_validate_rejects_bad_stories() {
        assert!(forest().validate().is_ok());

        let empty = Story::new("empty", "Nothing Here");
        assert!(matches!(empty.validate(), Err(ContentError::EmptyStory(_))));

        let duplicated = forest().with_page(Page::new("a", "Again"));
        assert!(matches!(
            duplicated.validate(),
            Err(ContentError::DuplicatePage { .. })
        ));

        let bad_start = forest().with_start_page("nowhere");
        assert!(matches!(
            bad_start.validate(),
            Err(ContentError::UnknownStartPage { .. })
        ));
    }
}
