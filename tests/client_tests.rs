#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration-style client tests for the Card Spy client.
//!
//! Uses the shared `ScriptedRoomApi` from `tests/common` to script authority
//! responses and verify session continuity, poll application order, role
//! exposure, and sync-loop lifecycle against the public API.

mod common;

use std::time::Duration;

use card_spy_client::protocol::{Role, RoomStatus};
use card_spy_client::{
    CardSpyClient, CardSpyConfig, CardSpyError, RoomEvent, Session, SessionStore,
};

use common::{
    ended_with_reveal, in_round_as_agent, in_round_as_spy, waiting_room, waiting_state,
    ApiCall, ScriptedRoomApi,
};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

fn fast_config() -> CardSpyConfig {
    CardSpyConfig::new().with_poll_interval(Duration::from_millis(10))
}

fn temp_store() -> (tempfile::TempDir, SessionStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SessionStore::new(dir.path().join("session.json"));
    (dir, store)
}

/// Wait long enough for several poll ticks to fire.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

// ════════════════════════════════════════════════════════════════════
// Session continuity
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn join_persist_restart_restores_identical_session() {
    let (_dir, store) = temp_store();

    // First app run: join a room, then "crash" (drop the client).
    {
        let (api, _calls) = ScriptedRoomApi::new(vec![]);
        let (mut client, _events) = CardSpyClient::new(api, store.clone(), fast_config());
        client.join_room("abc123", "Ann").await.expect("join");
        client.stop_sync().await;
    }
    let persisted = store.load();
    assert_eq!(persisted.player_id.as_deref(), Some("p1"));
    assert_eq!(persisted.room.as_ref().map(|r| r.code.as_str()), Some("ABC123"));

    // Second app run: restore without touching the network.
    let (api, calls) = ScriptedRoomApi::new(vec![]);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());
    assert!(client.restore().await);

    // The restored session is identical, and restoring issued no call.
    assert_eq!(client.session().await, persisted);
    assert!(calls.lock().expect("lock").is_empty());

    // Polling resumed for the restored room.
    assert!(client.is_syncing());
    settle().await;
    let log = calls.lock().expect("lock");
    assert!(matches!(
        log.first(),
        Some(ApiCall::Fetch { code, player_id })
            if code == "ABC123" && player_id.as_deref() == Some("p1")
    ));
    assert!(!log.iter().any(|c| matches!(c, ApiCall::Create { .. } | ApiCall::Join { .. })));
    drop(log);

    client.stop_sync().await;
}

#[tokio::test]
async fn restore_with_anonymous_session_polls_without_player_id() {
    let (_dir, store) = temp_store();
    // A viewer session: a last known room but no player identity.
    store.save(&Session {
        player_id: None,
        is_host: false,
        room: Some(waiting_room("XY99", &["Ann", "Bob"])),
    });

    let (api, calls) = ScriptedRoomApi::new(vec![]);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());
    assert!(client.restore().await);
    settle().await;

    let log = calls.lock().expect("lock");
    assert!(matches!(
        log.first(),
        Some(ApiCall::Fetch { code, player_id }) if code == "XY99" && player_id.is_none()
    ));
    drop(log);

    client.stop_sync().await;
}

#[tokio::test]
async fn every_applied_poll_is_persisted() {
    let (_dir, store) = temp_store();
    let (api, _calls) = ScriptedRoomApi::new(vec![
        Ok(waiting_state("ABC123", &["Ann", "Bob"])),
        Ok(in_round_as_agent("ABC123", &["Ann", "Bob"], "Knight")),
    ]);
    let (mut client, _events) = CardSpyClient::new(api, store.clone(), fast_config());

    client.create_room("Ann").await.expect("create");
    settle().await;

    // The store holds the latest snapshot, so a reload mid-round resumes
    // in-round.
    let persisted = store.load();
    assert_eq!(
        persisted.room.as_ref().map(|r| r.status),
        Some(RoomStatus::InRound)
    );

    client.stop_sync().await;
}

// ════════════════════════════════════════════════════════════════════
// Poll application order and role exposure
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn visible_state_reflects_the_most_recent_response() {
    let (_dir, store) = temp_store();
    let (api, _calls) = ScriptedRoomApi::new(vec![
        Ok(waiting_state("ABC123", &["Ann", "Bob"])),
        Ok(in_round_as_agent("ABC123", &["Ann", "Bob"], "Knight")),
        Ok(ended_with_reveal("ABC123", &["Ann", "Bob"], "Knight")),
    ]);
    let (mut client, mut events) = CardSpyClient::new(api, store, fast_config());

    client.create_room("Ann").await.expect("create");
    settle().await;

    // The visible pair is the last applied response.
    let room = client.room().await.expect("room");
    assert_eq!(room.status, RoomStatus::Ended);
    assert_eq!(room.reveal.as_deref(), Some("Knight"));
    assert_eq!(client.you().await, None);

    // Events arrived in poll order, each pair internally consistent.
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let RoomEvent::StateUpdated { room, you } = event {
            if room.status == RoomStatus::InRound {
                assert!(you.is_some(), "in-round update must carry a role");
            } else {
                assert!(you.is_none(), "role outside a round: {you:?}");
            }
            seen.push(room.status);
        }
    }
    assert_eq!(
        seen,
        [RoomStatus::Waiting, RoomStatus::InRound, RoomStatus::Ended]
    );

    client.stop_sync().await;
}

#[tokio::test]
async fn agent_sees_the_card() {
    let (_dir, store) = temp_store();
    let (api, _calls) =
        ScriptedRoomApi::new(vec![Ok(in_round_as_agent("ABC123", &["Ann", "Bob"], "Giant"))]);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

    client.create_room("Ann").await.expect("create");
    settle().await;

    let you = client.you().await.expect("role info");
    assert_eq!(you.role, Role::Agent);
    assert_eq!(you.card.as_deref(), Some("Giant"));

    client.stop_sync().await;
}

#[tokio::test]
async fn spy_never_receives_the_card() {
    let (_dir, store) = temp_store();
    let (api, _calls) = ScriptedRoomApi::new(vec![Ok(in_round_as_spy("ABC123", &["Ann", "Bob"]))]);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

    client.create_room("Ann").await.expect("create");
    settle().await;

    let you = client.you().await.expect("role info");
    assert_eq!(you.role, Role::Spy);
    assert_eq!(you.card, None);
    // The room snapshot hides the secret too while in-round.
    assert_eq!(client.room().await.expect("room").reveal, None);

    client.stop_sync().await;
}

// ════════════════════════════════════════════════════════════════════
// Sync-loop lifecycle
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn failed_poll_freezes_state_until_rejoin() {
    let (_dir, store) = temp_store();
    let (api, calls) = ScriptedRoomApi::new(vec![
        Ok(waiting_state("ABC123", &["Ann"])),
        Err(CardSpyError::Request("socket hang up".into())),
    ]);
    let (mut client, mut events) = CardSpyClient::new(api, store, fast_config());

    client.create_room("Ann").await.expect("create");
    settle().await;

    assert!(!client.is_syncing());
    let fetches_after_failure = calls
        .lock()
        .expect("lock")
        .iter()
        .filter(|c| matches!(c, ApiCall::Fetch { .. }))
        .count();
    settle().await;
    let fetches_later = calls
        .lock()
        .expect("lock")
        .iter()
        .filter(|c| matches!(c, ApiCall::Fetch { .. }))
        .count();
    assert_eq!(
        fetches_later, fetches_after_failure,
        "no fetch may be issued after a failed poll"
    );

    // The frozen state is still the last successful snapshot.
    assert_eq!(client.room().await.expect("room").code, "ABC123");

    // The stop notice carries the failure.
    let mut stopped_reason = None;
    while let Some(event) = events.recv().await {
        if let RoomEvent::SyncStopped { reason } = event {
            stopped_reason = reason;
            break;
        }
    }
    assert!(stopped_reason.expect("reason").contains("socket hang up"));

    // An explicit rejoin starts a fresh loop.
    client.join_room("ABC123", "Ann").await.expect("rejoin");
    assert!(client.is_syncing());
    client.stop_sync().await;
}

#[tokio::test]
async fn rejoining_leaves_exactly_one_active_loop() {
    let (_dir, store) = temp_store();
    let (api, calls) = ScriptedRoomApi::new(vec![]);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

    client.join_room("AAA111", "Ann").await.expect("join");
    settle().await;
    client.join_room("BBB222", "Ann").await.expect("rejoin");

    let marker = calls.lock().expect("lock").len();
    settle().await;

    // After the rejoin, every new fetch targets the new room only.
    let log = calls.lock().expect("lock");
    let stale: Vec<_> = log
        .iter()
        .skip(marker)
        .filter(|c| matches!(c, ApiCall::Fetch { code, .. } if code == "AAA111"))
        .collect();
    assert!(stale.is_empty(), "old loop still fetching: {stale:?}");
    assert!(log
        .iter()
        .skip(marker)
        .any(|c| matches!(c, ApiCall::Fetch { code, .. } if code == "BBB222")));
    drop(log);

    client.stop_sync().await;
}

#[tokio::test]
async fn leave_notifies_clears_and_halts() {
    let (_dir, store) = temp_store();
    let (api, calls) = ScriptedRoomApi::new(vec![]);
    let (mut client, mut events) = CardSpyClient::new(api, store.clone(), fast_config());

    client.join_room("ABC123", "Ann").await.expect("join");
    client.leave().await;

    assert!(!client.is_syncing());
    assert_eq!(client.session().await, Session::default());
    assert_eq!(store.load(), Session::default());
    assert!(calls
        .lock()
        .expect("lock")
        .iter()
        .any(|c| matches!(c, ApiCall::Leave { code, player_id }
            if code == "ABC123" && player_id == "p1")));

    // The final event is the local stop notice.
    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert_eq!(last, Some(RoomEvent::SyncStopped { reason: None }));
}

#[tokio::test]
async fn leave_with_unreachable_authority_succeeds_locally() {
    let (_dir, store) = temp_store();
    let (mut api, _calls) = ScriptedRoomApi::new(vec![]);
    api.fail_leave = true;
    let (mut client, _events) = CardSpyClient::new(api, store.clone(), fast_config());

    client.join_room("ABC123", "Ann").await.expect("join");
    client.leave().await;

    assert!(!client.is_syncing());
    assert_eq!(store.load(), Session::default());
    assert_eq!(client.session().await, Session::default());
}

// ════════════════════════════════════════════════════════════════════
// Round actions
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn oversized_spy_count_is_rejected_by_the_authority() {
    // Scenario: 2 players, spyCount = 2. The client submits it untouched and
    // surfaces the rejection; the room stays waiting.
    let (_dir, store) = temp_store();
    let (mut api, calls) = ScriptedRoomApi::new(vec![]);
    api.action_failure = Some(400);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

    client.create_room("Ann").await.expect("create");

    // The UI clamp bound for a 2-player room is 1.
    assert_eq!(waiting_room("ABC123", &["Ann", "Bob"]).max_spy_count(), 1);

    let err = client.start_round(2).await.expect_err("rejection");
    assert!(matches!(err, CardSpyError::Api { status: 400, .. }));
    assert!(calls
        .lock()
        .expect("lock")
        .iter()
        .any(|c| matches!(c, ApiCall::Start { spy_count: 2, .. })));

    assert_eq!(
        client.room().await.expect("room").status,
        RoomStatus::Waiting
    );

    client.stop_sync().await;
}

#[tokio::test]
async fn round_actions_do_not_mutate_visible_state() {
    let (_dir, store) = temp_store();
    let (api, calls) = ScriptedRoomApi::new(vec![]);
    let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

    client.create_room("Ann").await.expect("create");
    let before = client.session().await;

    // All three dispatchers succeed yet leave local state alone; only the
    // next poll may change it.
    client.start_round(1).await.expect("start");
    client.end_round().await.expect("end");
    client.reset_round().await.expect("reset");
    assert_eq!(client.session().await, before);

    let log = calls.lock().expect("lock");
    assert!(log.iter().any(|c| matches!(c, ApiCall::Start { .. })));
    assert!(log.iter().any(|c| matches!(c, ApiCall::End { .. })));
    assert!(log.iter().any(|c| matches!(c, ApiCall::Reset { .. })));
    drop(log);

    client.stop_sync().await;
}
