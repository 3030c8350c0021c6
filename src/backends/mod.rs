//! Backend implementations of the [`RoomApi`](crate::RoomApi) trait.
//!
//! Concrete backends live behind feature gates. Enable the corresponding
//! Cargo feature to pull one in:
//!
//! | Feature        | Backend         |
//! |----------------|-----------------|
//! | `backend-http` | [`HttpRoomApi`] |
//!
//! # Example
//!
//! ```rust,ignore
//! use card_spy_client::HttpRoomApi;
//!
//! let api = HttpRoomApi::new("https://rooms.example.com");
//! let joined = api.create_room("Ann").await?;
//! println!("room code: {}", joined.room.code);
//! ```

#[cfg(feature = "backend-http")]
pub mod http;

#[cfg(feature = "backend-http")]
pub use http::HttpRoomApi;
