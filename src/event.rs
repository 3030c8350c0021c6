//! Events emitted by the Card Spy client.

use crate::protocol::{RoleInfo, RoomSnapshot};

/// Events delivered on the channel returned by `CardSpyClient::new`.
///
/// A consumer renders purely from the payloads carried here; there is no
/// other push-style signal from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A poll completed and the visible state was replaced.
    ///
    /// `room` and `you` always come from the same response, so a consumer
    /// never observes a role inconsistent with the round status.
    StateUpdated {
        room: RoomSnapshot,
        you: Option<RoleInfo>,
    },

    /// The sync loop stopped and will not poll again until a new
    /// create/join/restore.
    ///
    /// `reason` is `Some` when a poll failed (the visible state stays frozen
    /// at its last value) and `None` when the player left the room.
    SyncStopped { reason: Option<String> },
}
