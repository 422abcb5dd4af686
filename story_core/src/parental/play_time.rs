//! Daily play-time budget.

use chrono::{DateTime, NaiveDate, Utc};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

use crate::events::StoryEvent;
use crate::persistence::{keys, load_json_logged, save_json_logged, KeyValueStore};

/// Share of the daily limit at which the warning fires, in percent.
pub const WARNING_PERCENT: u64 = 80;

/// Accumulates play time per calendar day.
///
/// The warning and the hard stop each fire once per day; the counters
/// reset when the date rolls over.
pub struct PlayTimeTracker {
    store: Rc<dyn KeyValueStore>,
    date: NaiveDate,
    played: Duration,
    warned: bool,
    exceeded: bool,
}

impl PlayTimeTracker {
    /// Restore the time already played on `now`'s date.
    ///
    /// Alerts already earned by the restored total do not fire again.
    pub fn load(store: Rc<dyn KeyValueStore>, now: DateTime<Utc>, limit_minutes: u32) -> Self {
        let date = now.date_naive();
        let played = Self::stored(store.as_ref(), date);
        let mut tracker = Self {
            store,
            date,
            played,
            warned: false,
            exceeded: false,
        };
        tracker.apply_limit(limit_minutes);
        tracker
    }

    /// Re-evaluate both alerts against a new daily limit.
    pub fn apply_limit(&mut self, limit_minutes: u32) {
        if limit_minutes == 0 {
            self.warned = false;
            self.exceeded = false;
            return;
        }
        let played_secs = self.played.as_secs();
        let limit_secs = u64::from(limit_minutes) * 60;
        self.exceeded = played_secs >= limit_secs;
        self.warned = played_secs * 100 >= limit_secs * WARNING_PERCENT;
    }

    /// Add `elapsed` play time and return any alerts it triggers.
    ///
    /// A `limit_minutes` of 0 means unlimited.
    pub fn record(
        &mut self,
        now: DateTime<Utc>,
        elapsed: Duration,
        limit_minutes: u32,
    ) -> Vec<StoryEvent> {
        let today = now.date_naive();
        if today != self.date {
            debug!(from = %self.date, to = %today, "New day; resetting play time");
            self.save();
            self.date = today;
            self.played = Self::stored(self.store.as_ref(), today);
            self.apply_limit(limit_minutes);
        }

        let minutes_before = self.minutes_played();
        self.played += elapsed;
        if self.minutes_played() != minutes_before {
            self.save();
        }

        if limit_minutes == 0 {
            return Vec::new();
        }

        let played_secs = self.played.as_secs();
        let limit_secs = u64::from(limit_minutes) * 60;
        let minutes_played = self.minutes_played();

        if !self.exceeded && played_secs >= limit_secs {
            self.exceeded = true;
            self.warned = true;
            info!(minutes_played, limit_minutes, "Daily play time used up");
            return vec![StoryEvent::PlayTimeExceeded {
                minutes_played,
                limit_minutes,
            }];
        }

        if !self.warned && played_secs * 100 >= limit_secs * WARNING_PERCENT {
            self.warned = true;
            info!(minutes_played, limit_minutes, "Daily play time nearly used up");
            return vec![StoryEvent::PlayTimeWarning {
                minutes_played,
                limit_minutes,
            }];
        }

        Vec::new()
    }

    pub fn minutes_played(&self) -> u32 {
        (self.played.as_secs() / 60) as u32
    }

    pub fn played(&self) -> Duration {
        self.played
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The hard-stop alert has fired for the current limit.
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    /// Today's total has reached `limit_minutes`. A limit of 0 never does.
    pub fn is_over(&self, limit_minutes: u32) -> bool {
        limit_minutes > 0 && self.played.as_secs() >= u64::from(limit_minutes) * 60
    }

    pub fn remaining_minutes(&self, limit_minutes: u32) -> Option<u32> {
        (limit_minutes > 0).then(|| limit_minutes.saturating_sub(self.minutes_played()))
    }

    /// Persist today's total.
    pub fn save(&self) {
        save_json_logged(
            self.store.as_ref(),
            &keys::play_time(self.date),
            &self.played.as_secs(),
        );
    }

    fn stored(store: &dyn KeyValueStore, date: NaiveDate) -> Duration {
        let secs: u64 = load_json_logged(store, &keys::play_time(date)).unwrap_or(0);
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use chrono::TimeZone;

    const MINUTE: Duration = Duration::from_secs(60);

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn warnings(events: &[StoryEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, StoryEvent::PlayTimeWarning { .. }))
            .count()
    }

    #[test]
    fn test_warning_fires_once_then_hard_stop() {
        let store = Rc::new(MemoryStore::new());
        let mut tracker = PlayTimeTracker::load(store, noon(), 60);

        let mut events = Vec::new();
        for _ in 0..47 {
            events.extend(tracker.record(noon(), MINUTE, 60));
        }
        assert!(events.is_empty());

        events.extend(tracker.record(noon(), MINUTE, 60));
        assert_eq!(warnings(&events), 1);
        assert_eq!(
            events.last(),
            Some(&StoryEvent::PlayTimeWarning {
                minutes_played: 48,
                limit_minutes: 60
            })
        );

        for _ in 48..59 {
            events.extend(tracker.record(noon(), MINUTE, 60));
        }
        assert_eq!(warnings(&events), 1);
        assert!(!tracker.is_exceeded());

        let stop = tracker.record(noon(), MINUTE, 60);
        assert_eq!(
            stop,
            vec![StoryEvent::PlayTimeExceeded {
                minutes_played: 60,
                limit_minutes: 60
            }]
        );
        assert!(tracker.record(noon(), MINUTE, 60).is_empty());
        assert!(tracker.is_exceeded());
    }

    #[test]
    fn test_resumes_todays_total() {
        let store = Rc::new(MemoryStore::new());
        let mut tracker = PlayTimeTracker::load(store.clone(), noon(), 0);
        tracker.record(noon(), 47 * MINUTE, 0);

        let mut resumed = PlayTimeTracker::load(store, noon(), 60);
        assert_eq!(resumed.minutes_played(), 47);

        let events = resumed.record(noon(), MINUTE, 60);
        assert_eq!(warnings(&events), 1);
        assert_eq!(warnings(&resumed.record(noon(), MINUTE, 60)), 0);
    }

    #[test]
    fn test_reload_keeps_alerts_already_earned() {
        let store = Rc::new(MemoryStore::new());
        let mut tracker = PlayTimeTracker::load(store.clone(), noon(), 60);
        tracker.record(noon(), 50 * MINUTE, 60);

        let mut warned = PlayTimeTracker::load(store.clone(), noon(), 60);
        assert!(!warned.is_exceeded());
        assert_eq!(warnings(&warned.record(noon(), MINUTE, 60)), 0);

        warned.record(noon(), 9 * MINUTE, 60);
        assert!(warned.is_exceeded());

        let mut exhausted = PlayTimeTracker::load(store, noon(), 60);
        assert!(exhausted.is_exceeded());
        assert!(exhausted.is_over(60));
        assert!(exhausted.record(noon(), MINUTE, 60).is_empty());
    }

    #[test]
    fn test_raising_limit_clears_hard_stop() {
        let store = Rc::new(MemoryStore::new());
        let mut tracker = PlayTimeTracker::load(store, noon(), 10);
        tracker.record(noon(), 10 * MINUTE, 10);
        assert!(tracker.is_exceeded());

        tracker.apply_limit(120);
        assert!(!tracker.is_exceeded());
        assert!(!tracker.is_over(120));

        let events = tracker.record(noon(), 86 * MINUTE, 120);
        assert_eq!(warnings(&events), 1);
    }

    #[test]
    fn test_resets_on_new_day() {
        let store = Rc::new(MemoryStore::new());
        let mut tracker = PlayTimeTracker::load(store, noon(), 60);
        tracker.record(noon(), 60 * MINUTE, 60);
        assert!(tracker.is_exceeded());

        let tomorrow = noon() + chrono::Duration::days(1);
        let events = tracker.record(tomorrow, MINUTE, 60);
        assert!(events.is_empty());
        assert!(!tracker.is_exceeded());
        assert_eq!(tracker.minutes_played(), 1);
        assert_eq!(tracker.date(), tomorrow.date_naive());
    }

    #[test]
    fn test_unlimited() {
        let store = Rc::new(MemoryStore::new());
        let mut tracker = PlayTimeTracker::load(store, noon(), 60);
        assert!(tracker.record(noon(), 600 * MINUTE, 0).is_empty());
        assert_eq!(tracker.remaining_minutes(0), None);
        assert_eq!(tracker.remaining_minutes(700), Some(100));
    }
}
