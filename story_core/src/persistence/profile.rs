//! Remote profile mirroring.
//!
//! The remote side is a plain upsert/select keyed by the anonymous uid.
//! Sync is best effort: failures are logged and never reach the player.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::SyncError;

/// Body of `POST /save-profile`, and the row returned by `GET /load-profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub uid: String,
    pub name: String,
    pub score: u64,
    #[serde(default)]
    pub character_data: Value,
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub gamestate: Value,
}

/// Remote profile service.
pub trait ProfileSync {
    /// Idempotent upsert keyed by `payload.uid`.
    fn save_profile(&self, payload: &ProfilePayload) -> Result<(), SyncError>;

    /// `Ok(None)` when no profile exists for `uid`.
    fn load_profile(&self, uid: &str) -> Result<Option<ProfilePayload>, SyncError>;
}

/// In-process profile service.
#[derive(Debug, Default)]
pub struct MemoryProfileSync {
    rows: RefCell<HashMap<String, ProfilePayload>>,
}

impl MemoryProfileSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl ProfileSync for MemoryProfileSync {
    fn save_profile(&self, payload: &ProfilePayload) -> Result<(), SyncError> {
        if payload.uid.is_empty() {
            return Err(SyncError::InvalidPayload("missing uid".to_string()));
        }
        self.rows
            .borrow_mut()
            .insert(payload.uid.clone(), payload.clone());
        Ok(())
    }

    fn load_profile(&self, uid: &str) -> Result<Option<ProfilePayload>, SyncError> {
        Ok(self.rows.borrow().get(uid).cloned())
    }
}

/// Best-effort wrapper around a [`ProfileSync`] port.
pub struct ProfileMirror<S> {
    remote: S,
}

impl<S: ProfileSync> ProfileMirror<S> {
    pub fn new(remote: S) -> Self {
        Self { remote }
    }

    /// Push a profile. Returns whether the push succeeded.
    pub fn push(&self, payload: &ProfilePayload) -> bool {
        match self.remote.save_profile(payload) {
            Ok(()) => {
                debug!(uid = %payload.uid, "Profile mirrored");
                true
            }
            Err(e) => {
                warn!(uid = %payload.uid, error = %e, "Profile sync failed");
                false
            }
        }
    }

    /// Fetch a profile; failures and missing rows both yield `None`.
    pub fn pull(&self, uid: &str) -> Option<ProfilePayload> {
        match self.remote.load_profile(uid) {
            Ok(found) => found,
            Err(e) => {
                warn!(uid, error = %e, "Profile load failed");
                None
            }
        }
    }

    pub fn remote(&self) -> &S {
        &self.remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct OfflineSync;

    impl ProfileSync for OfflineSync {
        fn save_profile(&self, _payload: &ProfilePayload) -> Result<(), SyncError> {
            Err(SyncError::Unavailable("offline".to_string()))
        }

        fn load_profile(&self, _uid: &str) -> Result<Option<ProfilePayload>, SyncError> {
            Err(SyncError::Rejected {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    fn payload(uid: &str, score: u64) -> ProfilePayload {
        ProfilePayload {
            uid: uid.to_string(),
            name: "Leo".to_string(),
            score,
            character_data: json!({"hair": "red"}),
            settings: json!({"music_enabled": true}),
            gamestate: Value::Null,
        }
    }

    #[test]
    fn test_payload_wire_names() {
        let value = serde_json::to_value(payload("abc", 5)).unwrap();
        for field in ["uid", "name", "score", "character_data", "settings", "gamestate"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mirror = ProfileMirror::new(MemoryProfileSync::new());
        assert!(mirror.push(&payload("abc", 5)));
        assert!(mirror.push(&payload("abc", 9)));

        assert_eq!(mirror.remote().len(), 1);
        assert_eq!(mirror.pull("abc").unwrap().score, 9);
        assert!(mirror.pull("missing").is_none());
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mirror = ProfileMirror::new(OfflineSync);
        assert!(!mirror.push(&payload("abc", 1)));
        assert!(mirror.pull("abc").is_none());
    }
}
