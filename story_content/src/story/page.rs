//! Page definitions.

use serde::{Deserialize, Serialize};

use super::{Choice, PageId};
use crate::flags::StoryFlags;
use crate::mini_game::MiniGameType;

/// A mini-game embedded in a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniGameRef {
    #[serde(alias = "type")]
    pub kind: MiniGameType,

    /// Opaque configuration handed to the mini-game's own parser.
    #[serde(default)]
    pub config: String,
}

impl MiniGameRef {
    pub fn new(kind: MiniGameType, config: impl Into<String>) -> Self {
        Self {
            kind,
            config: config.into(),
        }
    }
}

/// One screen of narrative content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,

    #[serde(default, alias = "text")]
    pub body: String,

    #[serde(default)]
    pub background: Option<String>,

    #[serde(default)]
    pub narration: Option<String>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default)]
    pub mini_game: Option<MiniGameRef>,
}

impl Page {
    /// Create an empty page.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: PageId::new(id),
            title: title.into(),
            body: String::new(),
            background: None,
            narration: None,
            choices: Vec::new(),
            mini_game: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_mini_game(mut self, kind: MiniGameType, config: impl Into<String>) -> Self {
        self.mini_game = Some(MiniGameRef::new(kind, config));
        self
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    /// The mini-game hosted by this page, ignoring the `none` sentinel.
    pub fn active_mini_game(&self) -> Option<&MiniGameRef> {
        self.mini_game.as_ref().filter(|m| !m.kind.is_none())
    }

    /// A page with neither choices nor a mini-game ends the story.
    pub fn is_terminal(&self) -> bool {
        !self.has_choices() && self.active_mini_game().is_none()
    }

    /// Choices that pass the unlock predicate, in authored order.
    pub fn available_choices(&self, flags: &StoryFlags) -> Vec<Choice> {
        self.choices
            .iter()
            .filter(|c| c.is_available(flags))
            .cloned()
            .collect()
    }
}
