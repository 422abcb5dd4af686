//! Typed access to the player's locally stored profile entries.

use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{keys, load_json_logged, save_json_logged, KeyValueStore, ProfilePayload};

/// The anonymous local profile: character, score and display preferences.
#[derive(Clone)]
pub struct LocalProfile {
    store: Rc<dyn KeyValueStore>,
}

impl LocalProfile {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The anonymous profile id, generated on first use and then kept.
    pub fn uid(&self) -> String {
        match self.store.get(keys::UID) {
            Ok(Some(uid)) if !uid.is_empty() => return uid,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to read profile id"),
        }

        let uid = Uuid::new_v4().to_string();
        debug!(uid = %uid, "Generated anonymous profile id");
        if let Err(e) = self.store.set(keys::UID, &uid) {
            warn!(error = %e, "Failed to persist profile id");
        }
        uid
    }

    pub fn character_data(&self) -> Option<Value> {
        load_json_logged(self.store.as_ref(), keys::CHARACTER_DATA)
    }

    pub fn set_character_data(&self, data: &Value) {
        save_json_logged(self.store.as_ref(), keys::CHARACTER_DATA, data);
    }

    pub fn score(&self) -> u64 {
        load_json_logged(self.store.as_ref(), keys::SCORE).unwrap_or(0)
    }

    pub fn set_score(&self, score: u64) {
        save_json_logged(self.store.as_ref(), keys::SCORE, &score);
    }

    pub fn is_muted(&self) -> bool {
        load_json_logged(self.store.as_ref(), keys::MUTED).unwrap_or(false)
    }

    pub fn set_muted(&self, muted: bool) {
        save_json_logged(self.store.as_ref(), keys::MUTED, &muted);
    }

    pub fn dark_mode(&self) -> bool {
        load_json_logged(self.store.as_ref(), keys::DARK_MODE).unwrap_or(false)
    }

    pub fn set_dark_mode(&self, enabled: bool) {
        save_json_logged(self.store.as_ref(), keys::DARK_MODE, &enabled);
    }

    /// Build the payload mirrored to the remote profile service.
    pub fn snapshot(&self, name: impl Into<String>, gamestate: Value) -> ProfilePayload {
        ProfilePayload {
            uid: self.uid(),
            name: name.into(),
            score: self.score(),
            character_data: self.character_data().unwrap_or(Value::Null),
            settings: self.shareable_settings(),
            gamestate,
        }
    }

    /// Stored settings minus the PIN digest, which never leaves the device.
    fn shareable_settings(&self) -> Value {
        let mut settings: Value =
            load_json_logged(self.store.as_ref(), keys::SETTINGS).unwrap_or(Value::Null);
        if let Some(map) = settings.as_object_mut() {
            map.remove("pin_hash");
        }
        settings
    }

    /// Overwrite local entries from a payload fetched remotely.
    pub fn restore(&self, payload: &ProfilePayload) {
        if let Err(e) = self.store.set(keys::UID, &payload.uid) {
            warn!(error = %e, "Failed to persist restored profile id");
        }
        self.set_score(payload.score);
        if !payload.character_data.is_null() {
            self.set_character_data(&payload.character_data);
        }
        if !payload.settings.is_null() {
            let mut settings = payload.settings.clone();
            let local_pin = load_json_logged::<Value>(self.store.as_ref(), keys::SETTINGS)
                .and_then(|local| local.get("pin_hash").cloned());
            if let (Some(map), Some(pin)) = (settings.as_object_mut(), local_pin) {
                map.insert("pin_hash".to_string(), pin);
            }
            save_json_logged(self.store.as_ref(), keys::SETTINGS, &settings);
        }
    }
}
