//! Choice definitions.

use serde::{Deserialize, Serialize};

use super::PageId;
use crate::flags::StoryFlags;

fn unlocked_by_default() -> bool {
    true
}

/// A selectable option on a page, leading to another page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,

    #[serde(alias = "target_page_id")]
    pub target: PageId,

    #[serde(default = "unlocked_by_default")]
    pub unlocked: bool,

    /// Story flags that must all be set before the choice is offered.
    #[serde(default)]
    pub required_flags: Vec<String>,
}

impl Choice {
    /// Create an unlocked choice with no requirements.
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: PageId::new(target),
            unlocked: true,
            required_flags: Vec::new(),
        }
    }

    /// Mark the choice as locked.
    pub fn locked(mut self) -> Self {
        self.unlocked = false;
        self
    }

    /// Require a story flag.
    pub fn requiring(mut self, flag: impl Into<String>) -> Self {
        self.required_flags.push(flag.into());
        self
    }

    /// A choice is presentable only when it is unlocked and every
    /// required flag is currently set.
    pub fn is_available(&self, flags: &StoryFlags) -> bool {
        self.unlocked && self.required_flags.iter().all(|f| flags.get(f))
    }
}
