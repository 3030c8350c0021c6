//! Durable local session storage.
//!
//! A [`Session`] records who the player is (id, host flag) and the last known
//! [`RoomSnapshot`], so a restart mid-game resumes where it left off. It is
//! persisted as a single JSON record `{playerId, room, isHost}` at one file
//! path, written after every change and read once at startup.
//!
//! Loading fails soft: a missing, unreadable, or corrupt file yields an empty
//! session. A broken session must never block startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::protocol::RoomSnapshot;

/// Persisted client identity and last known room.
///
/// Invariant: `player_id` is `Some` iff the client currently belongs to a
/// room. `room` may lag the authority by up to one poll interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub player_id: Option<String>,
    #[serde(default)]
    pub is_host: bool,
    pub room: Option<RoomSnapshot>,
}

impl Session {
    /// Returns `true` if this session belongs to a room.
    pub fn is_active(&self) -> bool {
        self.player_id.is_some() && self.room.is_some()
    }
}

/// File-backed store for a [`Session`].
///
/// Single-writer, last-write-wins. All writes are best effort: failures are
/// logged and swallowed, since losing a session write only costs the user a
/// rejoin after the next restart.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store persisting to the given file path.
    ///
    /// The file and its parent directory are created lazily on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Restore the session from disk.
    ///
    /// Fails soft: any read or parse failure yields `Session::default()`.
    pub fn load(&self) -> Session {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %self.path.display(), "no session to restore: {e}");
                return Session::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %self.path.display(), "discarding corrupt session: {e}");
                Session::default()
            }
        }
    }

    /// Persist the full session, replacing any previous record.
    pub fn save(&self, session: &Session) {
        let json = match serde_json::to_vec(session) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize session: {e}");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), "failed to create session directory: {e}");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!(path = %self.path.display(), "failed to persist session: {e}");
        }
    }

    /// Remove the persisted record, resetting to the empty session.
    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "failed to clear session: {e}"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::protocol::{PlayerPublic, RoomStatus};

    fn sample_session() -> Session {
        Session {
            player_id: Some("p1".into()),
            is_host: true,
            room: Some(RoomSnapshot {
                code: "ABC123".into(),
                status: RoomStatus::Waiting,
                players: vec![PlayerPublic {
                    id: "p1".into(),
                    name: "Ann".into(),
                    is_host: true,
                }],
                reveal: None,
                spy_count: None,
            }),
        }
    }

    #[test]
    fn load_missing_file_yields_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load(), Session::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let session = sample_session();
        store.save(&session);
        assert_eq!(store.load(), session);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/deeper/session.json"));
        store.save(&sample_session());
        assert!(store.load().is_active());
    }

    #[test]
    fn corrupt_file_yields_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json!").unwrap();
        let store = SessionStore::new(path);
        assert_eq!(store.load(), Session::default());
    }

    #[test]
    fn clear_resets_to_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample_session());
        store.clear();
        assert_eq!(store.load(), Session::default());
    }

    #[test]
    fn clear_on_missing_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.clear();
        store.clear();
    }

    #[test]
    fn persisted_layout_matches_the_storage_record() {
        let json = serde_json::to_value(sample_session()).unwrap();
        assert_eq!(json["playerId"], "p1");
        assert_eq!(json["isHost"], true);
        assert_eq!(json["room"]["code"], "ABC123");
    }

    #[test]
    fn empty_session_is_not_active() {
        assert!(!Session::default().is_active());
        // A player id without a room is not an active session either.
        let half = Session {
            player_id: Some("p1".into()),
            is_host: false,
            room: None,
        };
        assert!(!half.is_active());
    }
}
