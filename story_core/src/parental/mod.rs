//! Parental Gate - PIN-protected settings and the daily play budget.
//!
//! The PIN is a placeholder lock for small children, not access control:
//! the first PIN ever entered becomes the PIN. After a correct entry the
//! gate stays open for a configurable number of minutes.

mod play_time;

pub use play_time::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::events::StoryEvent;
use crate::persistence::{keys, load_json, save_json_logged, KeyValueStore};

/// Settings controlled by a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentalSettings {
    pub music_enabled: bool,
    pub sound_effects_enabled: bool,
    pub narration_enabled: bool,
    pub data_collection_consent: bool,
    /// 0 disables the daily limit.
    pub daily_limit_minutes: u32,
    pub session_timeout_minutes: u32,
    /// SHA-256 of the PIN, hex encoded. `None` until the first entry.
    pub pin_hash: Option<String>,
}

impl Default for ParentalSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ParentalSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            music_enabled: true,
            sound_effects_enabled: true,
            narration_enabled: true,
            data_collection_consent: false,
            daily_limit_minutes: config.daily_limit_minutes,
            session_timeout_minutes: config.parental_session_minutes,
            pin_hash: None,
        }
    }
}

fn hash_pin(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

pub struct ParentalGate {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    settings: ParentalSettings,
    unlocked_at: Option<DateTime<Utc>>,
    play_time: PlayTimeTracker,
    outbox: Vec<StoryEvent>,
}

impl ParentalGate {
    /// Restore saved settings, or start from `config` defaults.
    pub fn load(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, config: &EngineConfig) -> Self {
        let settings = match load_json::<ParentalSettings>(store.as_ref(), keys::SETTINGS) {
            Ok(Some(settings)) => settings,
            Ok(None) => ParentalSettings::from_config(config),
            Err(e) => {
                warn!(error = %e, "Stored settings unreadable; using defaults");
                ParentalSettings::from_config(config)
            }
        };
        let play_time =
            PlayTimeTracker::load(store.clone(), clock.now(), settings.daily_limit_minutes);

        Self {
            store,
            clock,
            settings,
            unlocked_at: None,
            play_time,
            outbox: Vec::new(),
        }
    }

    pub fn has_pin(&self) -> bool {
        self.settings.pin_hash.is_some()
    }

    /// Try to open the gate with `pin`.
    ///
    /// With no PIN set yet, any non-empty entry succeeds and becomes the PIN.
    pub fn request_access(&mut self, pin: &str) -> bool {
        if pin.is_empty() {
            warn!("Empty PIN entered");
            self.deny();
            return false;
        }

        let entered = hash_pin(pin);
        match self.settings.pin_hash.clone() {
            None => {
                info!("No PIN set; first entry becomes the PIN");
                self.settings.pin_hash = Some(entered);
                self.save();
            }
            Some(expected) if expected == entered => {}
            Some(_) => {
                warn!("Incorrect PIN");
                self.deny();
                return false;
            }
        }

        self.unlocked_at = Some(self.clock.now());
        debug!("Parental gate opened");
        self.outbox.push(StoryEvent::AccessGranted);
        true
    }

    /// Whether the last correct PIN entry is recent enough.
    pub fn is_session_valid(&self) -> bool {
        let timeout = chrono::Duration::minutes(i64::from(self.settings.session_timeout_minutes));
        self.unlocked_at
            .is_some_and(|at| self.clock.now() - at < timeout)
    }

    /// Close the gate immediately.
    pub fn lock(&mut self) {
        self.unlocked_at = None;
    }

    /// Apply a settings change if the gate is open; otherwise ask for the PIN.
    ///
    /// The PIN itself cannot be changed here; see [`Self::change_pin`].
    pub fn update_settings(&mut self, update: impl FnOnce(&mut ParentalSettings)) -> bool {
        if !self.check_session() {
            return false;
        }

        let pin_hash = self.settings.pin_hash.clone();
        let limit = self.settings.daily_limit_minutes;
        update(&mut self.settings);
        self.settings.pin_hash = pin_hash;
        if self.settings.daily_limit_minutes != limit {
            self.play_time.apply_limit(self.settings.daily_limit_minutes);
        }

        self.save();
        debug!(settings = ?self.settings, "Parental settings changed");
        self.outbox.push(StoryEvent::SettingsChanged);
        true
    }

    /// Replace the PIN if the gate is open.
    pub fn change_pin(&mut self, new_pin: &str) -> bool {
        if new_pin.is_empty() || !self.check_session() {
            return false;
        }
        self.settings.pin_hash = Some(hash_pin(new_pin));
        self.save();
        info!("PIN changed");
        true
    }

    /// Add play time; alerts are buffered as events.
    pub fn record_play_time(&mut self, elapsed: Duration) {
        let now = self.clock.now();
        let alerts = self
            .play_time
            .record(now, elapsed, self.settings.daily_limit_minutes);
        self.outbox.extend(alerts);
    }

    /// False once today's play time reaches the current limit.
    pub fn is_play_allowed(&self) -> bool {
        !self.play_time.is_over(self.settings.daily_limit_minutes)
    }

    /// Re-read settings written to the store behind the gate's back, e.g. by
    /// a profile restore. The local PIN is kept.
    pub fn reload_settings(&mut self) {
        let mut settings = match load_json::<ParentalSettings>(self.store.as_ref(), keys::SETTINGS) {
            Ok(Some(settings)) => settings,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Stored settings unreadable; keeping current settings");
                return;
            }
        };
        settings.pin_hash = self.settings.pin_hash.clone();
        self.settings = settings;
        self.play_time.apply_limit(self.settings.daily_limit_minutes);
        self.save();
        debug!(settings = ?self.settings, "Parental settings reloaded");
        self.outbox.push(StoryEvent::SettingsChanged);
    }

    pub fn play_time(&self) -> &PlayTimeTracker {
        &self.play_time
    }

    pub fn settings(&self) -> &ParentalSettings {
        &self.settings
    }

    /// Persist settings and today's play time.
    pub fn save(&self) {
        save_json_logged(self.store.as_ref(), keys::SETTINGS, &self.settings);
        self.play_time.save();
    }

    pub fn drain_events(&mut self) -> Vec<StoryEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn check_session(&mut self) -> bool {
        if self.is_session_valid() {
            return true;
        }
        debug!("Parental session expired; requesting PIN");
        self.unlocked_at = None;
        self.outbox.push(StoryEvent::PinRequested);
        false
    }

    fn deny(&mut self) {
        self.outbox.push(StoryEvent::AccessDenied);
        self.outbox.push(StoryEvent::PinRequested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::MemoryStore;
    use chrono::TimeZone;

    fn setup() -> (Rc<ManualClock>, Rc<MemoryStore>, ParentalGate) {
        let clock = Rc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 9, 2, 17, 0, 0).unwrap(),
        ));
        let store = Rc::new(MemoryStore::new());
        let gate = ParentalGate::load(store.clone(), clock.clone(), &EngineConfig::default());
        (clock, store, gate)
    }

    #[test]
    fn test_first_pin_becomes_the_pin() {
        let (_clock, _store, mut gate) = setup();
        assert!(!gate.has_pin());

        assert!(gate.request_access("1234"));
        assert!(gate.has_pin());
        assert_eq!(gate.drain_events(), vec![StoryEvent::AccessGranted]);

        assert!(!gate.request_access("0000"));
        assert_eq!(
            gate.drain_events(),
            vec![StoryEvent::AccessDenied, StoryEvent::PinRequested]
        );
        assert!(gate.request_access("1234"));
    }

    #[test]
    fn test_pin_is_not_stored_in_plain_text() {
        let (_clock, store, mut gate) = setup();
        gate.request_access("1234");

        let raw = store.get(keys::SETTINGS).unwrap().unwrap();
        assert!(!raw.contains("\"1234\""));
        assert_eq!(gate.settings().pin_hash.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_settings_require_open_session() {
        let (clock, _store, mut gate) = setup();
        assert!(!gate.update_settings(|s| s.music_enabled = false));
        assert_eq!(gate.drain_events(), vec![StoryEvent::PinRequested]);
        assert!(gate.settings().music_enabled);

        gate.request_access("4321");
        assert!(gate.update_settings(|s| s.music_enabled = false));
        assert!(!gate.settings().music_enabled);

        clock.advance(chrono::Duration::minutes(4));
        assert!(gate.update_settings(|s| s.daily_limit_minutes = 30));

        clock.advance(chrono::Duration::minutes(1));
        assert!(!gate.is_session_valid());
        assert!(!gate.update_settings(|s| s.daily_limit_minutes = 90));
        assert_eq!(gate.settings().daily_limit_minutes, 30);
        assert_eq!(gate.drain_events().last(), Some(&StoryEvent::PinRequested));
    }

    #[test]
    fn test_update_cannot_touch_pin() {
        let (_clock, _store, mut gate) = setup();
        gate.request_access("1111");
        gate.update_settings(|s| s.pin_hash = None);
        assert!(gate.has_pin());
    }

    #[test]
    fn test_change_pin() {
        let (_clock, _store, mut gate) = setup();
        gate.request_access("1111");
        assert!(gate.change_pin("2222"));

        gate.lock();
        assert!(!gate.change_pin("3333"));
        assert!(!gate.request_access("1111"));
        assert!(gate.request_access("2222"));
    }

    #[test]
    fn test_settings_survive_reload() {
        let (clock, store, mut gate) = setup();
        gate.request_access("1234");
        gate.update_settings(|s| s.data_collection_consent = true);

        let mut reloaded = ParentalGate::load(store, clock, &EngineConfig::default());
        assert!(reloaded.settings().data_collection_consent);
        assert!(!reloaded.is_session_valid());
        assert!(!reloaded.request_access("9999"));
        assert!(reloaded.request_access("1234"));
    }

    #[test]
    fn test_play_time_limit_stops_play() {
        let (_clock, _store, mut gate) = setup();
        gate.record_play_time(Duration::from_secs(48 * 60));
        assert!(gate.is_play_allowed());
        assert!(matches!(
            gate.drain_events().as_slice(),
            [StoryEvent::PlayTimeWarning { .. }]
        ));

        gate.record_play_time(Duration::from_secs(12 * 60));
        assert!(!gate.is_play_allowed());
        assert!(matches!(
            gate.drain_events().as_slice(),
            [StoryEvent::PlayTimeExceeded { .. }]
        ));
    }

    #[test]
    fn test_exhausted_budget_survives_restart() {
        let (clock, store, mut gate) = setup();
        gate.record_play_time(Duration::from_secs(60 * 60));
        gate.save();

        let mut reloaded = ParentalGate::load(store, clock, &EngineConfig::default());
        assert!(!reloaded.is_play_allowed());
        reloaded.record_play_time(Duration::from_secs(60));
        assert!(reloaded.drain_events().is_empty());
    }

    #[test]
    fn test_raising_limit_resumes_play() {
        let (_clock, _store, mut gate) = setup();
        gate.record_play_time(Duration::from_secs(60 * 60));
        assert!(!gate.is_play_allowed());

        gate.request_access("1234");
        assert!(gate.update_settings(|s| s.daily_limit_minutes = 120));
        assert!(gate.is_play_allowed());

        gate.update_settings(|s| s.daily_limit_minutes = 30);
        assert!(!gate.is_play_allowed());
        gate.update_settings(|s| s.daily_limit_minutes = 0);
        assert!(gate.is_play_allowed());
    }

    #[test]
    fn test_reload_settings_keeps_local_pin() {
        let (_clock, store, mut gate) = setup();
        gate.request_access("1234");
        gate.drain_events();

        save_json_logged(
            store.as_ref(),
            keys::SETTINGS,
            &serde_json::json!({"music_enabled": false, "daily_limit_minutes": 30}),
        );
        gate.reload_settings();

        assert!(!gate.settings().music_enabled);
        assert_eq!(gate.settings().daily_limit_minutes, 30);
        assert!(gate.has_pin());
        assert!(gate.request_access("1234"));
        assert_eq!(gate.drain_events().first(), Some(&StoryEvent::SettingsChanged));
    }

    #[test]
    fn test_empty_pin_rejected() {
        let (_clock, _store, mut gate) = setup();
        assert!(!gate.request_access(""));
        assert!(!gate.has_pin());
    }
}
