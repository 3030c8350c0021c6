#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for Card Spy client integration tests.
//!
//! Provides [`ScriptedRoomApi`], a mock room authority whose poll responses
//! are consumed in order while every call is recorded, plus fixture builders
//! for common room states.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use card_spy_client::protocol::{
    JoinedRoom, PlayerPublic, Role, RoleInfo, RoomSnapshot, RoomState, RoomStatus,
};
use card_spy_client::{CardSpyError, RoomApi};

type Result<T> = std::result::Result<T, CardSpyError>;

// ── Call log ────────────────────────────────────────────────────────

/// One recorded call against the mock authority.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)] // not every test inspects every variant
pub enum ApiCall {
    Create { name: String },
    Join { code: String, name: String },
    Start { code: String, player_id: String, spy_count: u32 },
    End { code: String, player_id: String },
    Reset { code: String, player_id: String },
    Leave { code: String, player_id: String },
    Fetch { code: String, player_id: Option<String> },
}

// ── ScriptedRoomApi ─────────────────────────────────────────────────

/// A mock room authority for integration testing.
///
/// Scripted `fetch_state` results are consumed in order; once the script is
/// exhausted, fetches hang forever so the sync loop stays alive until it is
/// cancelled. All calls are recorded in a shared log.
pub struct ScriptedRoomApi {
    /// Response for create/join calls.
    joined: JoinedRoom,
    /// Scripted poll results (consumed in order by `fetch_state`).
    states: StdMutex<VecDeque<Result<RoomState>>>,
    /// When set, round actions fail with this status.
    pub action_failure: Option<u16>,
    /// When `true`, `leave_room` fails with a request error.
    pub fail_leave: bool,
    /// Recorded calls, in order.
    pub calls: Arc<StdMutex<Vec<ApiCall>>>,
}

impl ScriptedRoomApi {
    /// Create a mock with the given scripted poll results. Returns the mock
    /// plus a shared handle to its call log.
    pub fn new(states: Vec<Result<RoomState>>) -> (Self, Arc<StdMutex<Vec<ApiCall>>>) {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let api = Self {
            joined: JoinedRoom {
                player_id: "p1".into(),
                is_host: true,
                room: waiting_room("ABC123", &["Ann"]),
            },
            states: StdMutex::new(VecDeque::from(states)),
            action_failure: None,
            fail_leave: false,
            calls: Arc::clone(&calls),
        };
        (api, calls)
    }

    /// Override the create/join response.
    #[allow(dead_code)]
    pub fn with_joined(mut self, joined: JoinedRoom) -> Self {
        self.joined = joined;
        self
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn action_result(&self) -> Result<RoomSnapshot> {
        match self.action_failure {
            Some(status) => Err(CardSpyError::Api {
                status,
                message: "action rejected".into(),
            }),
            None => Ok(self.joined.room.clone()),
        }
    }
}

#[async_trait]
impl RoomApi for ScriptedRoomApi {
    async fn create_room(&self, name: &str) -> Result<JoinedRoom> {
        self.record(ApiCall::Create { name: name.into() });
        Ok(self.joined.clone())
    }

    async fn join_room(&self, code: &str, name: &str) -> Result<JoinedRoom> {
        self.record(ApiCall::Join {
            code: code.into(),
            name: name.into(),
        });
        let mut joined = self.joined.clone();
        joined.room.code = code.to_string();
        Ok(joined)
    }

    async fn start_round(&self, code: &str, player_id: &str, spy_count: u32) -> Result<RoomSnapshot> {
        self.record(ApiCall::Start {
            code: code.into(),
            player_id: player_id.into(),
            spy_count,
        });
        self.action_result()
    }

    async fn end_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot> {
        self.record(ApiCall::End {
            code: code.into(),
            player_id: player_id.into(),
        });
        self.action_result()
    }

    async fn reset_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot> {
        self.record(ApiCall::Reset {
            code: code.into(),
            player_id: player_id.into(),
        });
        self.action_result()
    }

    async fn leave_room(&self, code: &str, player_id: &str) -> Result<()> {
        self.record(ApiCall::Leave {
            code: code.into(),
            player_id: player_id.into(),
        });
        if self.fail_leave {
            return Err(CardSpyError::Request("connection refused".into()));
        }
        Ok(())
    }

    async fn fetch_state(&self, code: &str, player_id: Option<&str>) -> Result<RoomState> {
        self.record(ApiCall::Fetch {
            code: code.into(),
            player_id: player_id.map(str::to_string),
        });
        let next = self.states.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            // Script exhausted — hang until the loop is cancelled.
            None => std::future::pending().await,
        }
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// A waiting room with the given code and player names. The first player is
/// the host with id `p1`, the rest are `p2`, `p3`, …
pub fn waiting_room(code: &str, names: &[&str]) -> RoomSnapshot {
    RoomSnapshot {
        code: code.into(),
        status: RoomStatus::Waiting,
        players: names
            .iter()
            .enumerate()
            .map(|(i, name)| PlayerPublic {
                id: format!("p{}", i + 1),
                name: (*name).into(),
                is_host: i == 0,
            })
            .collect(),
        reveal: None,
        spy_count: None,
    }
}

/// An in-round state where the viewer is an agent holding `card`.
#[allow(dead_code)]
pub fn in_round_as_agent(code: &str, names: &[&str], card: &str) -> RoomState {
    let mut room = waiting_room(code, names);
    room.status = RoomStatus::InRound;
    room.spy_count = Some(1);
    RoomState {
        room,
        you: Some(RoleInfo {
            role: Role::Agent,
            card: Some(card.into()),
        }),
    }
}

/// An in-round state where the viewer is a spy (no card).
#[allow(dead_code)]
pub fn in_round_as_spy(code: &str, names: &[&str]) -> RoomState {
    let mut room = waiting_room(code, names);
    room.status = RoomStatus::InRound;
    room.spy_count = Some(1);
    RoomState {
        room,
        you: Some(RoleInfo {
            role: Role::Spy,
            card: None,
        }),
    }
}

/// An ended state revealing `card`; role information is gone.
#[allow(dead_code)]
pub fn ended_with_reveal(code: &str, names: &[&str], card: &str) -> RoomState {
    let mut room = waiting_room(code, names);
    room.status = RoomStatus::Ended;
    room.reveal = Some(card.into());
    RoomState { room, you: None }
}

/// A waiting state with no role information.
#[allow(dead_code)]
pub fn waiting_state(code: &str, names: &[&str]) -> RoomState {
    RoomState {
        room: waiting_room(code, names),
        you: None,
    }
}
