//! Achievements derived from cumulative progress counts.

use serde::{Deserialize, Serialize};
use story_content::MiniGameType;

use super::ProgressRecord;

/// Completions of a single type needed for [`Achievement::Dedicated`].
pub const DEDICATED_COMPLETIONS: u32 = 3;
/// Perfect games needed for [`Achievement::Perfectionist`].
pub const PERFECTIONIST_GAMES: u32 = 5;
/// Total completions needed for [`Achievement::Marathon`].
pub const MARATHON_COMPLETIONS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Won a mini-game for the first time.
    FirstSuccess,
    /// Completed the same kind of mini-game three times.
    Dedicated(MiniGameType),
    /// Five perfect games.
    Perfectionist,
    /// Twenty completed mini-games.
    Marathon,
}

impl Achievement {
    pub fn title(&self) -> String {
        match self {
            Achievement::FirstSuccess => "First Win!".to_string(),
            Achievement::Dedicated(kind) => format!("{} Fan", kind),
            Achievement::Perfectionist => "Perfectionist".to_string(),
            Achievement::Marathon => "Marathon Player".to_string(),
        }
    }
}

/// Every achievement the counts in `record` qualify for.
pub fn earned(record: &ProgressRecord) -> Vec<Achievement> {
    let mut earned = Vec::new();

    if record.games_succeeded >= 1 {
        earned.push(Achievement::FirstSuccess);
    }
    earned.extend(
        record
            .completions
            .iter()
            .filter(|(_, count)| **count >= DEDICATED_COMPLETIONS)
            .map(|(kind, _)| Achievement::Dedicated(*kind)),
    );
    if record.perfect_games >= PERFECTIONIST_GAMES {
        earned.push(Achievement::Perfectionist);
    }
    if record.games_completed >= MARATHON_COMPLETIONS {
        earned.push(Achievement::Marathon);
    }

    earned
}
