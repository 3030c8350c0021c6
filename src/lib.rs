//! # Card Spy Client
//!
//! Backend-agnostic async Rust client for Card Spy party-game rooms.
//!
//! Players join a room via a short code, the host starts a round in which all
//! but a configurable number of "spy" players are shown a shared secret card,
//! and the host later reveals it. This crate owns the client side of that:
//! a durable local session, a polling loop that reconciles it against the
//! authoritative room service, and role-appropriate state exposure.
//!
//! ## Features
//!
//! - **Backend-agnostic** — implement the [`RoomApi`] trait for any authority
//! - **HTTP built-in** — default `backend-http` feature provides [`HttpRoomApi`]
//! - **Session continuity** — [`SessionStore`] survives restarts and resumes mid-round
//! - **Event-driven** — observe typed [`RoomEvent`]s via a channel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use card_spy_client::{CardSpyClient, CardSpyConfig, HttpRoomApi, RoomEvent, SessionStore};
//!
//! let api = HttpRoomApi::new("https://rooms.example.com");
//! let store = SessionStore::new("session.json");
//! let (mut client, mut events) = CardSpyClient::new(api, store, CardSpyConfig::new());
//!
//! if !client.restore().await {
//!     client.create_room("Ann").await?;
//! }
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         RoomEvent::StateUpdated { room, you } => { /* render */ }
//!         RoomEvent::SyncStopped { .. } => break,
//!     }
//! }
//! ```

pub mod api;
pub mod backends;
pub mod client;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;

// Re-export primary types for ergonomic imports.
pub use api::RoomApi;
pub use client::{CardSpyClient, CardSpyConfig};
pub use error::CardSpyError;
pub use event::RoomEvent;
pub use protocol::{JoinedRoom, PlayerPublic, Role, RoleInfo, RoomSnapshot, RoomState, RoomStatus};
pub use session::{Session, SessionStore};

#[cfg(feature = "backend-http")]
pub use backends::http::HttpRoomApi;
