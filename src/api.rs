//! Room-authority abstraction for the Card Spy client.
//!
//! The [`RoomApi`] trait is the seam between the client and the remote room
//! authority. The authority owns room creation, membership, secret assignment,
//! and the round lifecycle; the client only observes it through these calls.
//!
//! Endpoint construction is intentionally NOT part of this trait — the
//! built-in HTTP backend takes a base URL, but a test double or an embedded
//! authority needs no addressing at all. Construct a backend externally, then
//! hand it to `CardSpyClient::new`.
//!
//! # Implementing a Custom Backend
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use card_spy_client::api::RoomApi;
//! use card_spy_client::error::Result;
//! use card_spy_client::protocol::{JoinedRoom, RoomSnapshot, RoomState};
//!
//! struct MyBackend { /* ... */ }
//!
//! #[async_trait]
//! impl RoomApi for MyBackend {
//!     async fn create_room(&self, name: &str) -> Result<JoinedRoom> {
//!         todo!()
//!     }
//!     async fn join_room(&self, code: &str, name: &str) -> Result<JoinedRoom> {
//!         todo!()
//!     }
//!     async fn start_round(&self, code: &str, player_id: &str, spy_count: u32) -> Result<RoomSnapshot> {
//!         todo!()
//!     }
//!     async fn end_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot> {
//!         todo!()
//!     }
//!     async fn reset_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot> {
//!         todo!()
//!     }
//!     async fn leave_room(&self, code: &str, player_id: &str) -> Result<()> {
//!         todo!()
//!     }
//!     async fn fetch_state(&self, code: &str, player_id: Option<&str>) -> Result<RoomState> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{JoinedRoom, RoomSnapshot, RoomState};

/// Async interface to the remote room authority.
///
/// All failures — transport-level and non-success responses alike — surface
/// as errors; the caller never distinguishes between them.
///
/// # Object Safety
///
/// This trait is object-safe; the client holds it as `Arc<dyn RoomApi>` so
/// the background sync loop and the handle share one backend.
#[async_trait]
pub trait RoomApi: Send + Sync + 'static {
    /// Create a new room, joining it as the host.
    async fn create_room(&self, name: &str) -> Result<JoinedRoom>;

    /// Join an existing room by its (already uppercased) code.
    async fn join_room(&self, code: &str, name: &str) -> Result<JoinedRoom>;

    /// Start a round with the given number of spies. Host only.
    ///
    /// The returned snapshot is the authority's immediate view; the client
    /// discards it and waits for the next poll instead.
    async fn start_round(&self, code: &str, player_id: &str, spy_count: u32)
        -> Result<RoomSnapshot>;

    /// End the current round, revealing the card. Host only.
    async fn end_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot>;

    /// Reset an ended round back to the waiting state. Host only.
    async fn reset_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot>;

    /// Remove the player from the room.
    async fn leave_room(&self, code: &str, player_id: &str) -> Result<()>;

    /// Fetch the current room state plus the viewer's role information.
    ///
    /// `player_id` is `None` for unauthenticated viewers; role-specific
    /// fields are then omitted from the response.
    async fn fetch_state(&self, code: &str, player_id: Option<&str>) -> Result<RoomState>;
}
