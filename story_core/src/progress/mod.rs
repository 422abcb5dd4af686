//! Progress Store - cumulative mini-game statistics across sessions.
//!
//! The record is saved right after every change.

mod achievements;

pub use achievements::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::{debug, info, warn};

use story_content::{MiniGameResult, MiniGameType};

use crate::persistence::{keys, load_json, save_json_logged, KeyValueStore};

/// Cumulative statistics over every mini-game played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub games_played: u32,
    pub games_completed: u32,
    pub games_succeeded: u32,
    pub perfect_games: u32,
    pub total_score: u64,
    pub best_scores: BTreeMap<MiniGameType, u32>,
    /// Completed runs per type.
    pub completions: BTreeMap<MiniGameType, u32>,
    /// Achievements already awarded; each is awarded once.
    pub achievements: BTreeSet<Achievement>,
}

/// Derived view over a [`ProgressRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    pub games_played: u32,
    pub games_completed: u32,
    pub total_score: u64,
    /// Completed / played, 0 when nothing was played.
    pub completion_rate: f32,
    /// Perfect / completed, 0 when nothing was completed.
    pub perfect_rate: f32,
    /// Most completed type; ties go to the alphabetically first name.
    pub favorite: Option<MiniGameType>,
}

pub struct ProgressStore {
    store: Rc<dyn KeyValueStore>,
    record: ProgressRecord,
    perfect_threshold_secs: f32,
}

impl ProgressStore {
    /// Open the store, restoring any saved record.
    ///
    /// A missing or unreadable record starts fresh.
    pub fn load(store: Rc<dyn KeyValueStore>, perfect_threshold_secs: f32) -> Self {
        let record = match load_json::<ProgressRecord>(store.as_ref(), keys::PROGRESS) {
            Ok(Some(record)) => record,
            Ok(None) => ProgressRecord::default(),
            Err(e) => {
                warn!(error = %e, "Stored progress unreadable; starting fresh");
                ProgressRecord::default()
            }
        };

        Self {
            store,
            record,
            perfect_threshold_secs,
        }
    }

    /// Fold one result into the record and persist it.
    ///
    /// Returns achievements awarded for the first time.
    pub fn record_result(&mut self, result: &MiniGameResult) -> Vec<Achievement> {
        let record = &mut self.record;
        let kind = result.kind();

        record.games_played += 1;
        if result.completed() {
            record.games_completed += 1;
            *record.completions.entry(kind).or_default() += 1;
        }
        if result.success() {
            record.games_succeeded += 1;
        }
        if result.is_perfect(self.perfect_threshold_secs) {
            record.perfect_games += 1;
        }
        record.total_score += u64::from(result.score());

        let best = record.best_scores.entry(kind).or_default();
        *best = (*best).max(result.score());

        let unlocked: Vec<Achievement> = earned(record)
            .into_iter()
            .filter(|a| !record.achievements.contains(a))
            .collect();
        record.achievements.extend(unlocked.iter().copied());

        debug!(
            kind = %kind,
            played = record.games_played,
            completed = record.games_completed,
            "Recorded mini-game result"
        );
        for achievement in &unlocked {
            info!(achievement = %achievement.title(), "Achievement unlocked");
        }

        self.save();
        unlocked
    }

    /// Best score seen for a type, 0 if never played.
    pub fn best_score(&self, kind: MiniGameType) -> u32 {
        self.record.best_scores.get(&kind).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> ProgressStats {
        let r = &self.record;
        let ratio = |num: u32, den: u32| if den == 0 { 0.0 } else { num as f32 / den as f32 };

        let mut favorite: Option<(MiniGameType, u32)> = None;
        for (kind, count) in &r.completions {
            let better = match favorite {
                None => true,
                Some((current, best)) => {
                    *count > best || (*count == best && kind.as_str() < current.as_str())
                }
            };
            if better && *count > 0 {
                favorite = Some((*kind, *count));
            }
        }

        ProgressStats {
            games_played: r.games_played,
            games_completed: r.games_completed,
            total_score: r.total_score,
            completion_rate: ratio(r.games_completed, r.games_played),
            perfect_rate: ratio(r.perfect_games, r.games_completed),
            favorite: favorite.map(|(kind, _)| kind),
        }
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    pub fn has_achievement(&self, achievement: Achievement) -> bool {
        self.record.achievements.contains(&achievement)
    }

    fn save(&self) {
        save_json_logged(self.store.as_ref(), keys::PROGRESS, &self.record);
    }
}
