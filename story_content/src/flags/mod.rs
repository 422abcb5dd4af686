//! Per-playthrough state: story flags and visited pages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::story::PageId;

/// Named booleans used to gate later choices on earlier player actions.
///
/// Unknown flags read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryFlags {
    flags: HashMap<String, bool>,
}

impl StoryFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag. Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: bool) -> bool {
        self.flags.insert(name.into(), value).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.flags.iter()
    }
}

/// Pages seen during the current playthrough, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitedPages {
    pages: Vec<PageId>,
}

impl VisitedPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit. Returns `true` the first time a page is seen.
    pub fn insert(&mut self, page: PageId) -> bool {
        if self.contains(&page) {
            return false;
        }
        self.pages.push(page);
        true
    }

    pub fn contains(&self, page: &PageId) -> bool {
        self.pages.contains(page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageId> {
        self.pages.iter()
    }

    /// Fraction of `total_pages` visited, clamped to `[0, 1]`.
    pub fn coverage(&self, total_pages: usize) -> f32 {
        if total_pages == 0 {
            return 0.0;
        }
        (self.pages.len() as f32 / total_pages as f32).clamp(0.0, 1.0)
    }
}
