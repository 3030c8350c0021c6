//! Wire-compatible protocol types for the Card Spy room authority.
//!
//! Every type in this module produces identical JSON to the authority's REST
//! responses: field names are camelCase (`playerId`, `isHost`, `spyCount`),
//! the room status is kebab-case (`"in-round"`), and the role is lowercase
//! (`"spy"` / `"agent"`).
//!
//! Player and room identifiers are opaque strings assigned by the authority;
//! the client never inspects or constructs them.

use serde::{Deserialize, Serialize};

// ── Enums ───────────────────────────────────────────────────────────

/// Lifecycle status of a room. UI transitions are driven purely from this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    /// Players are gathering; the host can start a round.
    #[default]
    Waiting,
    /// A round is running; everyone but the spies sees the card.
    InRound,
    /// The round is over and the card has been revealed.
    Ended,
}

/// Role assigned to the viewing player for the current round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Does not know the card and must avoid being found out.
    Spy,
    /// Knows the card.
    Agent,
}

// ── Structs ─────────────────────────────────────────────────────────

/// Publicly visible information about a player in a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPublic {
    pub id: String,
    pub name: String,
    pub is_host: bool,
}

/// Authoritative snapshot of a room as returned by the authority.
///
/// `players` reflects join order. `reveal` is populated only when
/// `status` is [`RoomStatus::Ended`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Short join code, always uppercase.
    pub code: String,
    pub status: RoomStatus,
    pub players: Vec<PlayerPublic>,
    /// The revealed card once the round has ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal: Option<String>,
    /// Number of spies configured for the current round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spy_count: Option<u32>,
}

impl RoomSnapshot {
    /// Upper bound for the host's spy-count input: `players - 1`, at least 1.
    ///
    /// This is a display clamp only. The authority validates the actual
    /// `spyCount` on round start and its rejection is surfaced unchanged.
    pub fn max_spy_count(&self) -> u32 {
        (self.players.len().saturating_sub(1)).max(1) as u32
    }
}

/// Role-specific information for the viewing player.
///
/// Present only while a round is running. `card` is populated only for
/// [`Role::Agent`] — a spy never receives the card value from the authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
}

/// Response to a create-room or join-room call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRoom {
    /// Identifier the authority assigned to the viewing player.
    pub player_id: String,
    #[serde(default)]
    pub is_host: bool,
    pub room: RoomSnapshot,
}

/// Response to a state-fetch call: the room plus the viewer's role, if any.
///
/// `you` is absent for unauthenticated viewers and outside of rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub room: RoomSnapshot,
    #[serde(default)]
    pub you: Option<RoleInfo>,
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

    fn two_player_room() -> RoomSnapshot {
        RoomSnapshot {
            code: "ABC123".into(),
            status: RoomStatus::Waiting,
            players: vec![
                PlayerPublic {
                    id: "p1".into(),
                    name: "Ann".into(),
                    is_host: true,
                },
                PlayerPublic {
                    id: "p2".into(),
                    name: "Bob".into(),
                    is_host: false,
                },
            ],
            reveal: None,
            spy_count: None,
        }
    }

    #[test]
    fn room_status_uses_kebab_case() {
        assert_eq!(
            serde_json::to_string(&RoomStatus::InRound).unwrap(),
            "\"in-round\""
        );
        assert_eq!(
            serde_json::from_str::<RoomStatus>("\"waiting\"").unwrap(),
            RoomStatus::Waiting
        );
        assert_eq!(
            serde_json::from_str::<RoomStatus>("\"ended\"").unwrap(),
            RoomStatus::Ended
        );
    }

    #[test]
    fn role_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Spy).unwrap(), "\"spy\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"agent\"").unwrap(),
            Role::Agent
        );
    }

    #[test]
    fn max_spy_count_is_players_minus_one() {
        let room = two_player_room();
        assert_eq!(room.max_spy_count(), 1);
    }

    #[test]
    fn max_spy_count_never_below_one() {
        let mut room = two_player_room();
        room.players.truncate(1);
        assert_eq!(room.max_spy_count(), 1);
        room.players.clear();
        assert_eq!(room.max_spy_count(), 1);
    }

    #[test]
    fn snapshot_fields_are_camel_case() {
        let mut room = two_player_room();
        room.spy_count = Some(1);
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["spyCount"], 1);
        assert_eq!(json["players"][0]["isHost"], true);
        // Absent options are omitted entirely, matching the authority.
        assert!(json.get("reveal").is_none());
    }

    #[test]
    fn snapshot_tolerates_missing_optional_fields() {
        let room: RoomSnapshot = serde_json::from_str(
            r#"{"code":"XY12","status":"waiting","players":[]}"#,
        )
        .unwrap();
        assert_eq!(room.reveal, None);
        assert_eq!(room.spy_count, None);
    }
}
