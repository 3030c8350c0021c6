//! Error types for the Card Spy client.

use thiserror::Error;

/// Errors that can occur when using the Card Spy client.
#[derive(Debug, Error)]
pub enum CardSpyError {
    /// A request to the room authority could not be completed
    /// (connection refused, DNS failure, malformed response body, …).
    #[error("request error: {0}")]
    Request(String),

    /// The room authority answered with a non-success status.
    ///
    /// All non-2xx responses are treated uniformly; the status code is
    /// carried for logging only, never for branching.
    #[error("authority rejected request (status {status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Failed to serialize or deserialize a protocol payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted a room operation while not belonging to a room.
    #[error("not in a room")]
    NotInRoom,
}

/// A specialized [`Result`] type for Card Spy client operations.
pub type Result<T> = std::result::Result<T, CardSpyError>;
