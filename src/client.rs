//! Async client for Card Spy rooms.
//!
//! [`CardSpyClient`] is a handle that drives room membership through a
//! [`RoomApi`] backend and keeps the visible room state eventually consistent
//! with the authority via a background poll loop. State changes are emitted
//! on a bounded channel ([`tokio::sync::mpsc::Receiver<RoomEvent>`]) returned
//! from [`CardSpyClient::new`].
//!
//! # Example
//!
//! ```rust,ignore
//! let api = HttpRoomApi::new("https://rooms.example.com");
//! let store = SessionStore::new("~/.card-spy/session.json");
//! let (mut client, mut events) = CardSpyClient::new(api, store, CardSpyConfig::new());
//!
//! if !client.restore().await {
//!     client.join_room("abc123", "Ann").await?;
//! }
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         RoomEvent::StateUpdated { room, you } => { /* render */ }
//!         RoomEvent::SyncStopped { .. } => break,
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

use crate::api::RoomApi;
use crate::error::{CardSpyError, Result};
use crate::event::RoomEvent;
use crate::protocol::{JoinedRoom, RoleInfo, RoomSnapshot};
use crate::session::{Session, SessionStore};

/// Default interval between state polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Default timeout for stopping the sync loop gracefully.
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`CardSpyClient`].
///
/// All fields have sensible defaults.
///
/// # Tuning
///
/// ```
/// use card_spy_client::CardSpyConfig;
/// use std::time::Duration;
///
/// let config = CardSpyConfig::new()
///     .with_poll_interval(Duration::from_millis(500))
///     .with_event_channel_capacity(128);
/// ```
#[derive(Debug, Clone)]
pub struct CardSpyConfig {
    /// Interval between state polls while in a room.
    ///
    /// Defaults to **1.5 seconds**. Correctness does not depend on the
    /// value; shorter intervals just trade request volume for freshness.
    pub poll_interval: Duration,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up, `StateUpdated` events are dropped
    /// (with a warning logged) to avoid blocking the sync loop; the final
    /// `SyncStopped` event is always delivered regardless of capacity.
    ///
    /// Defaults to **64**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for stopping the sync loop gracefully.
    ///
    /// If the loop does not exit within this window (an in-flight fetch
    /// against a dead server, for instance), its task is aborted and any
    /// in-flight result is discarded.
    ///
    /// Defaults to **1 second**.
    pub stop_timeout: Duration,
}

impl Default for CardSpyConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

impl CardSpyConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval between state polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **64**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for stopping the sync loop gracefully.
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// The visible pair: persisted session plus the viewer's role.
///
/// Held under one lock so `room` and `you` are always replaced together —
/// a consumer never observes a role from one poll next to a room from
/// another.
#[derive(Debug, Default)]
struct Visible {
    session: Session,
    you: Option<RoleInfo>,
}

/// State shared between the client handle and the sync loop.
struct ClientShared {
    visible: Mutex<Visible>,
    syncing: AtomicBool,
}

impl ClientShared {
    fn new() -> Self {
        Self {
            visible: Mutex::new(Visible::default()),
            syncing: AtomicBool::new(false),
        }
    }
}

/// Handle to a running sync loop.
struct Poller {
    task: tokio::task::JoinHandle<()>,
    cancel: oneshot::Sender<()>,
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for a Card Spy room.
///
/// Owns the local [`Session`], its persistence via [`SessionStore`], and the
/// background sync loop. All methods are driven from a single caller task;
/// the loop only ever touches state through the shared lock.
pub struct CardSpyClient {
    api: Arc<dyn RoomApi>,
    store: SessionStore,
    shared: Arc<ClientShared>,
    event_tx: mpsc::Sender<RoomEvent>,
    poller: Option<Poller>,
    poll_interval: Duration,
    stop_timeout: Duration,
}

impl CardSpyClient {
    /// Create a client and its event receiver.
    ///
    /// No network traffic happens here; polling starts on the first
    /// successful [`create_room`](Self::create_room),
    /// [`join_room`](Self::join_room), or [`restore`](Self::restore).
    #[must_use = "the event receiver must be used to observe state updates"]
    pub fn new(
        api: impl RoomApi,
        store: SessionStore,
        config: CardSpyConfig,
    ) -> (Self, mpsc::Receiver<RoomEvent>) {
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<RoomEvent>(capacity);

        let client = Self {
            api: Arc::new(api),
            store,
            shared: Arc::new(ClientShared::new()),
            event_tx,
            poller: None,
            poll_interval: config.poll_interval,
            stop_timeout: config.stop_timeout,
        };

        (client, event_rx)
    }

    // ── Room membership ─────────────────────────────────────────────

    /// Create a new room, joining it as the host, and start syncing.
    ///
    /// # Errors
    ///
    /// Propagates the authority's failure unchanged; no local state is
    /// touched on error.
    pub async fn create_room(&mut self, name: &str) -> Result<RoomSnapshot> {
        let joined = self.api.create_room(name).await?;
        debug!(room = %joined.room.code, "created room");
        self.adopt_membership(joined).await
    }

    /// Join an existing room by code and start syncing.
    ///
    /// The code is trimmed and uppercased before the call, matching how the
    /// authority issues codes.
    ///
    /// # Errors
    ///
    /// Propagates the authority's failure unchanged; no local state is
    /// touched on error.
    pub async fn join_room(&mut self, code: &str, name: &str) -> Result<RoomSnapshot> {
        let code = code.trim().to_uppercase();
        let joined = self.api.join_room(&code, name).await?;
        debug!(room = %joined.room.code, "joined room");
        self.adopt_membership(joined).await
    }

    /// Restore the persisted session and, if it belongs to a room, resume
    /// syncing. Returns `true` if a room session was restored.
    ///
    /// Restoration itself makes no network call; the first poll fires one
    /// interval later.
    pub async fn restore(&mut self) -> bool {
        let session = self.store.load();
        let Some(room) = session.room.as_ref() else {
            return false;
        };
        let code = room.code.clone();
        let player_id = session.player_id.clone();
        debug!(room = %code, "restored session");
        {
            let mut visible = self.shared.visible.lock().await;
            visible.session = session;
            // Role information is never trusted across a restart; the next
            // poll re-fetches it.
            visible.you = None;
        }
        self.start_sync(code, player_id).await;
        true
    }

    /// Leave the current room.
    ///
    /// The authority is notified best effort — a failed notification never
    /// blocks the local transition. Locally, leave always succeeds: the sync
    /// loop stops, the session is cleared and its persisted record removed,
    /// and a final [`RoomEvent::SyncStopped`] is emitted.
    pub async fn leave(&mut self) {
        self.stop_sync().await;

        let (code, player_id) = {
            let visible = self.shared.visible.lock().await;
            (
                visible.session.room.as_ref().map(|r| r.code.clone()),
                visible.session.player_id.clone(),
            )
        };
        if let (Some(code), Some(player_id)) = (code, player_id) {
            if let Err(e) = self.api.leave_room(&code, &player_id).await {
                debug!(room = %code, "leave notification failed (ignored): {e}");
            }
        }

        {
            let mut visible = self.shared.visible.lock().await;
            visible.session = Session::default();
            visible.you = None;
        }
        self.store.clear();

        emit_stopped(&self.event_tx, None).await;
    }

    // ── Round actions ───────────────────────────────────────────────

    /// Ask the authority to start a round with `spy_count` spies.
    ///
    /// Visible state is not touched: the effect is observed by the next
    /// poll, keeping the poll response the single source of truth. The
    /// authority validates `spy_count` against the player count; its
    /// rejection surfaces here unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CardSpyError::NotInRoom`] if the client has no room, or the
    /// authority's failure.
    pub async fn start_round(&self, spy_count: u32) -> Result<()> {
        let (code, player_id) = self.membership().await?;
        self.api.start_round(&code, &player_id, spy_count).await?;
        Ok(())
    }

    /// Ask the authority to end the round and reveal the card.
    ///
    /// # Errors
    ///
    /// Returns [`CardSpyError::NotInRoom`] if the client has no room, or the
    /// authority's failure.
    pub async fn end_round(&self) -> Result<()> {
        let (code, player_id) = self.membership().await?;
        self.api.end_round(&code, &player_id).await?;
        Ok(())
    }

    /// Ask the authority to reset an ended round back to waiting.
    ///
    /// # Errors
    ///
    /// Returns [`CardSpyError::NotInRoom`] if the client has no room, or the
    /// authority's failure.
    pub async fn reset_round(&self) -> Result<()> {
        let (code, player_id) = self.membership().await?;
        self.api.reset_round(&code, &player_id).await?;
        Ok(())
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Current session (identity plus last known room), cloned.
    pub async fn session(&self) -> Session {
        self.shared.visible.lock().await.session.clone()
    }

    /// Last known room snapshot, if any.
    pub async fn room(&self) -> Option<RoomSnapshot> {
        self.shared.visible.lock().await.session.room.clone()
    }

    /// Role information from the latest poll, if a round is running.
    pub async fn you(&self) -> Option<RoleInfo> {
        self.shared.visible.lock().await.you.clone()
    }

    /// Returns `true` if this client is the room's host.
    pub async fn is_host(&self) -> bool {
        self.shared.visible.lock().await.session.is_host
    }

    /// Identifier the authority assigned to this player, if in a room.
    pub async fn player_id(&self) -> Option<String> {
        self.shared.visible.lock().await.session.player_id.clone()
    }

    /// Returns `true` while the sync loop is running.
    pub fn is_syncing(&self) -> bool {
        self.shared.syncing.load(Ordering::Acquire)
    }

    // ── Sync loop control ───────────────────────────────────────────

    /// Stop the sync loop without leaving the room.
    ///
    /// The persisted session stays intact, so a later [`restore`](Self::restore)
    /// resumes where this left off. Safe to call when no loop is running.
    pub async fn stop_sync(&mut self) {
        let Some(poller) = self.poller.take() else {
            return;
        };
        debug!("stopping sync loop");
        let _ = poller.cancel.send(());

        // Give the loop a bounded window to notice the cancellation; an
        // in-flight fetch against an unresponsive server would otherwise
        // hold it open indefinitely.
        let mut task = poller.task;
        match tokio::time::timeout(self.stop_timeout, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(join_err)) => {
                warn!("sync loop terminated with join error: {join_err}");
            }
            Err(_) => {
                warn!("sync loop did not exit within timeout; aborting task");
                task.abort();
                if let Err(join_err) = task.await {
                    debug!("sync loop aborted: {join_err}");
                }
            }
        }

        self.shared.syncing.store(false, Ordering::Release);
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Seed the session from a create/join response, persist it, and start
    /// syncing the new room.
    async fn adopt_membership(&mut self, joined: JoinedRoom) -> Result<RoomSnapshot> {
        let room = joined.room.clone();
        {
            let mut visible = self.shared.visible.lock().await;
            visible.session = Session {
                player_id: Some(joined.player_id.clone()),
                is_host: joined.is_host,
                room: Some(joined.room),
            };
            visible.you = None;
            self.store.save(&visible.session);
        }
        self.start_sync(room.code.clone(), Some(joined.player_id)).await;
        Ok(room)
    }

    /// Start a sync loop for `code`, cancelling any previous loop first so
    /// at most one loop is ever active.
    async fn start_sync(&mut self, code: String, player_id: Option<String>) {
        self.stop_sync().await;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.shared.syncing.store(true, Ordering::Release);
        let task = tokio::spawn(sync_loop(
            Arc::clone(&self.api),
            Arc::clone(&self.shared),
            self.store.clone(),
            self.event_tx.clone(),
            code,
            player_id,
            self.poll_interval,
            cancel_rx,
        ));
        self.poller = Some(Poller {
            task,
            cancel: cancel_tx,
        });
    }

    /// Room code and player id of the current membership.
    async fn membership(&self) -> Result<(String, String)> {
        let visible = self.shared.visible.lock().await;
        match (&visible.session.room, &visible.session.player_id) {
            (Some(room), Some(player_id)) => Ok((room.code.clone(), player_id.clone())),
            _ => Err(CardSpyError::NotInRoom),
        }
    }
}

impl std::fmt::Debug for CardSpyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardSpyClient")
            .field("syncing", &self.is_syncing())
            .field("has_poller", &self.poller.is_some())
            .finish()
    }
}

impl Drop for CardSpyClient {
    fn drop(&mut self) {
        // `Drop` is synchronous, so the graceful path (cancel + await) is
        // unavailable. Aborting the task drops the loop future immediately,
        // which also discards any in-flight fetch.
        if let Some(poller) = self.poller.take() {
            poller.task.abort();
        }
    }
}

// ── Sync loop ───────────────────────────────────────────────────────

/// Background loop keeping the visible `(room, you)` pair consistent with
/// the authority.
///
/// Single-flight by construction: one fetch is issued per tick, awaited, and
/// applied before the next tick is scheduled, so responses can never be
/// applied out of order. Exits when:
/// - Cancellation is requested (leave, rejoin, stop, or handle dropped) —
///   any in-flight fetch result is discarded
/// - A fetch fails — no retry; the visible state freezes at its last value
///   until the user rejoins or restores
#[allow(clippy::too_many_arguments)]
async fn sync_loop(
    api: Arc<dyn RoomApi>,
    shared: Arc<ClientShared>,
    store: SessionStore,
    event_tx: mpsc::Sender<RoomEvent>,
    code: String,
    player_id: Option<String>,
    interval: Duration,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    debug!(room = %code, "sync loop started");

    loop {
        tokio::select! {
            _ = &mut cancel_rx => {
                debug!(room = %code, "sync loop cancelled");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let fetch = api.fetch_state(&code, player_id.as_deref());
        tokio::select! {
            _ = &mut cancel_rx => {
                debug!(room = %code, "sync loop cancelled mid-fetch; result discarded");
                break;
            }
            result = fetch => match result {
                Ok(state) => {
                    {
                        let mut visible = shared.visible.lock().await;
                        visible.session.room = Some(state.room.clone());
                        visible.you = state.you.clone();
                        store.save(&visible.session);
                    }
                    emit_state(&event_tx, RoomEvent::StateUpdated {
                        room: state.room,
                        you: state.you,
                    });
                }
                Err(e) => {
                    warn!(room = %code, "state fetch failed, stopping sync: {e}");
                    shared.syncing.store(false, Ordering::Release);
                    emit_stopped(&event_tx, Some(e.to_string())).await;
                    break;
                }
            }
        }
    }

    shared.syncing.store(false, Ordering::Release);
    debug!(room = %code, "sync loop exited");
}

/// Emit a state update. If the channel is full, log a warning and drop the
/// event rather than blocking the sync loop; the next poll supersedes it
/// anyway.
fn emit_state(event_tx: &mpsc::Sender<RoomEvent>, event: RoomEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("event channel full, dropping state update");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit a [`RoomEvent::SyncStopped`].
///
/// Uses `send().await` instead of `try_send` because `SyncStopped` is the
/// last event for a loop and must never be silently dropped.
async fn emit_stopped(event_tx: &mpsc::Sender<RoomEvent>, reason: Option<String>) {
    if event_tx
        .send(RoomEvent::SyncStopped { reason })
        .await
        .is_err()
    {
        debug!("event channel closed, receiver dropped");
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
    use crate::protocol::{JoinedRoom, PlayerPublic, RoomState, RoomStatus};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock backend ────────────────────────────────────────────────

    /// A mock backend that records calls and replays scripted poll results.
    struct MockApi {
        /// Result template for create/join calls.
        joined: JoinedRoom,
        /// When `true`, round actions fail with a 400.
        fail_actions: bool,
        /// When `true`, leave fails with a request error.
        fail_leave: bool,
        /// Scripted `fetch_state` results, consumed in order. When empty,
        /// fetches hang forever so the loop stays alive until cancelled.
        states: StdMutex<VecDeque<Result<RoomState>>>,
        /// Recorded `(code, player_id)` pairs of every fetch.
        fetches: Arc<StdMutex<Vec<(String, Option<String>)>>>,
        /// Recorded codes of join calls.
        join_codes: Arc<StdMutex<Vec<String>>>,
        /// Recorded leave calls.
        leaves: Arc<StdMutex<Vec<(String, String)>>>,
    }

    impl MockApi {
        fn new(states: Vec<Result<RoomState>>) -> Self {
            Self {
                joined: JoinedRoom {
                    player_id: "p1".into(),
                    is_host: true,
                    room: waiting_room("ABC123"),
                },
                fail_actions: false,
                fail_leave: false,
                states: StdMutex::new(VecDeque::from(states)),
                fetches: Arc::new(StdMutex::new(Vec::new())),
                join_codes: Arc::new(StdMutex::new(Vec::new())),
                leaves: Arc::new(StdMutex::new(Vec::new())),
            }
        }

        fn fetches(&self) -> Arc<StdMutex<Vec<(String, Option<String>)>>> {
            Arc::clone(&self.fetches)
        }

        fn join_codes(&self) -> Arc<StdMutex<Vec<String>>> {
            Arc::clone(&self.join_codes)
        }

        fn leaves(&self) -> Arc<StdMutex<Vec<(String, String)>>> {
            Arc::clone(&self.leaves)
        }

        fn rejected() -> CardSpyError {
            CardSpyError::Api {
                status: 400,
                message: "rejected".into(),
            }
        }
    }

    #[async_trait]
    impl RoomApi for MockApi {
        async fn create_room(&self, _name: &str) -> Result<JoinedRoom> {
            Ok(self.joined.clone())
        }

        async fn join_room(&self, code: &str, _name: &str) -> Result<JoinedRoom> {
            self.join_codes.lock().unwrap().push(code.to_string());
            let mut joined = self.joined.clone();
            joined.room.code = code.to_string();
            Ok(joined)
        }

        async fn start_round(
            &self,
            _code: &str,
            _player_id: &str,
            _spy_count: u32,
        ) -> Result<RoomSnapshot> {
            if self.fail_actions {
                return Err(Self::rejected());
            }
            Ok(self.joined.room.clone())
        }

        async fn end_round(&self, _code: &str, _player_id: &str) -> Result<RoomSnapshot> {
            if self.fail_actions {
                return Err(Self::rejected());
            }
            Ok(self.joined.room.clone())
        }

        async fn reset_round(&self, _code: &str, _player_id: &str) -> Result<RoomSnapshot> {
            if self.fail_actions {
                return Err(Self::rejected());
            }
            Ok(self.joined.room.clone())
        }

        async fn leave_room(&self, code: &str, player_id: &str) -> Result<()> {
            self.leaves
                .lock()
                .unwrap()
                .push((code.to_string(), player_id.to_string()));
            if self.fail_leave {
                return Err(CardSpyError::Request("connection refused".into()));
            }
            Ok(())
        }

        async fn fetch_state(&self, code: &str, player_id: Option<&str>) -> Result<RoomState> {
            self.fetches
                .lock()
                .unwrap()
                .push((code.to_string(), player_id.map(str::to_string)));
            let next = self.states.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                // Script exhausted — hang so the loop stays alive until
                // it is cancelled.
                None => std::future::pending().await,
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn waiting_room(code: &str) -> RoomSnapshot {
        RoomSnapshot {
            code: code.into(),
            status: RoomStatus::Waiting,
            players: vec![PlayerPublic {
                id: "p1".into(),
                name: "Ann".into(),
                is_host: true,
            }],
            reveal: None,
            spy_count: None,
        }
    }

    fn state_of(room: RoomSnapshot) -> RoomState {
        RoomState { room, you: None }
    }

    fn fast_config() -> CardSpyConfig {
        CardSpyConfig::new().with_poll_interval(Duration::from_millis(10))
    }

    fn temp_store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        (dir, store)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_room_seeds_session_and_starts_polling() {
        let api = MockApi::new(vec![Ok(state_of(waiting_room("ABC123")))]);
        let fetches = api.fetches();
        let (_dir, store) = temp_store();
        let (mut client, _events) = CardSpyClient::new(api, store.clone(), fast_config());

        let room = client.create_room("Ann").await.unwrap();
        assert_eq!(room.code, "ABC123");
        assert!(client.is_syncing());
        assert_eq!(client.player_id().await.as_deref(), Some("p1"));
        assert!(client.is_host().await);

        // The seeded session is persisted before the first poll.
        assert_eq!(store.load().player_id.as_deref(), Some("p1"));

        settle().await;
        assert!(!fetches.lock().unwrap().is_empty());
        assert_eq!(fetches.lock().unwrap()[0].0, "ABC123");

        client.stop_sync().await;
    }

    #[tokio::test]
    async fn join_room_uppercases_the_code() {
        let api = MockApi::new(vec![]);
        let join_codes = api.join_codes();
        let (_dir, store) = temp_store();
        let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

        client.join_room("  abc123 ", "Ann").await.unwrap();
        assert_eq!(join_codes.lock().unwrap().as_slice(), ["ABC123"]);

        client.stop_sync().await;
    }

    #[tokio::test]
    async fn failed_action_leaves_state_untouched() {
        let mut api = MockApi::new(vec![]);
        api.fail_actions = true;
        let (_dir, store) = temp_store();
        let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

        client.create_room("Ann").await.unwrap();
        let before = client.session().await;

        let err = client.start_round(5).await.unwrap_err();
        assert!(matches!(err, CardSpyError::Api { status: 400, .. }));

        // Room status (and everything else) is unchanged.
        assert_eq!(client.session().await, before);
        assert_eq!(client.room().await.unwrap().status, RoomStatus::Waiting);

        client.stop_sync().await;
    }

    #[tokio::test]
    async fn round_actions_require_a_room() {
        let api = MockApi::new(vec![]);
        let (_dir, store) = temp_store();
        let (client, _events) = CardSpyClient::new(api, store, fast_config());

        assert!(matches!(
            client.start_round(1).await,
            Err(CardSpyError::NotInRoom)
        ));
        assert!(matches!(client.end_round().await, Err(CardSpyError::NotInRoom)));
        assert!(matches!(
            client.reset_round().await,
            Err(CardSpyError::NotInRoom)
        ));
    }

    #[tokio::test]
    async fn leave_with_unreachable_authority_still_clears_locally() {
        let mut api = MockApi::new(vec![]);
        api.fail_leave = true;
        let leaves = api.leaves();
        let (_dir, store) = temp_store();
        let (mut client, mut events) = CardSpyClient::new(api, store.clone(), fast_config());

        client.create_room("Ann").await.unwrap();
        client.leave().await;

        // The notification was attempted, failed, and was ignored.
        assert_eq!(leaves.lock().unwrap().len(), 1);
        assert!(!client.is_syncing());
        assert_eq!(client.session().await, Session::default());
        assert_eq!(store.load(), Session::default());

        let event = events.recv().await.unwrap();
        assert_eq!(event, RoomEvent::SyncStopped { reason: None });
    }

    #[tokio::test]
    async fn failed_poll_stops_the_loop() {
        let api = MockApi::new(vec![
            Ok(state_of(waiting_room("ABC123"))),
            Err(CardSpyError::Request("boom".into())),
        ]);
        let fetches = api.fetches();
        let (_dir, store) = temp_store();
        let (mut client, mut events) = CardSpyClient::new(api, store, fast_config());

        client.create_room("Ann").await.unwrap();
        settle().await;

        assert!(!client.is_syncing());
        let count = fetches.lock().unwrap().len();
        assert_eq!(count, 2, "no fetch may follow a failure");
        settle().await;
        assert_eq!(fetches.lock().unwrap().len(), count);

        // StateUpdated from the successful poll, then the stop notice.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, RoomEvent::StateUpdated { .. }));
        let event = events.recv().await.unwrap();
        if let RoomEvent::SyncStopped { reason } = event {
            assert!(reason.unwrap().contains("boom"));
        } else {
            panic!("expected SyncStopped, got {event:?}");
        }

        // State is frozen at the last applied snapshot, not cleared.
        assert_eq!(client.room().await.unwrap().code, "ABC123");
    }

    #[tokio::test]
    async fn restore_of_empty_store_does_not_start_polling() {
        let api = MockApi::new(vec![]);
        let (_dir, store) = temp_store();
        let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

        assert!(!client.restore().await);
        assert!(!client.is_syncing());
        assert_eq!(client.session().await, Session::default());
    }

    #[tokio::test]
    async fn stop_sync_without_loop_is_a_no_op() {
        let api = MockApi::new(vec![]);
        let (_dir, store) = temp_store();
        let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

        client.stop_sync().await;
        client.stop_sync().await;
        assert!(!client.is_syncing());
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = CardSpyConfig::new();
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.event_channel_capacity, 64);
        assert_eq!(config.stop_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn config_builder_methods() {
        let config = CardSpyConfig::new()
            .with_poll_interval(Duration::from_millis(250))
            .with_event_channel_capacity(128)
            .with_stop_timeout(Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.event_channel_capacity, 128);
        assert_eq!(config.stop_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn event_channel_capacity_is_clamped_to_one() {
        let config = CardSpyConfig::new().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    #[tokio::test]
    async fn full_event_channel_does_not_block_the_loop() {
        let states: Vec<Result<RoomState>> = (0..20)
            .map(|_| Ok(state_of(waiting_room("ABC123"))))
            .collect();
        let api = MockApi::new(states);
        let fetches = api.fetches();
        let (_dir, store) = temp_store();
        let config = fast_config().with_event_channel_capacity(1);
        let (mut client, _events) = CardSpyClient::new(api, store, config);

        // Never read from the receiver; the channel fills after one event.
        client.create_room("Ann").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Polling continued past the full channel.
        assert!(fetches.lock().unwrap().len() > 2);
        client.stop_sync().await;
    }

    #[tokio::test]
    async fn drop_without_stop_aborts_the_loop() {
        let api = MockApi::new(vec![]);
        let (_dir, store) = temp_store();
        let (mut client, _events) = CardSpyClient::new(api, store, fast_config());

        client.create_room("Ann").await.unwrap();
        drop(client);
        // Nothing to assert beyond not hanging or panicking.
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let api = MockApi::new(vec![]);
        let (_dir, store) = temp_store();
        let (client, _events) = CardSpyClient::new(api, store, fast_config());

        let debug_str = format!("{client:?}");
        assert!(debug_str.contains("CardSpyClient"));
        assert!(debug_str.contains("syncing"));
    }
}
