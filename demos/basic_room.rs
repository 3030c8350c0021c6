//! # Basic Room Example
//!
//! Demonstrates a complete Card Spy client lifecycle:
//!
//! 1. Restore a previous session, or create/join a room
//! 2. Watch state updates arrive from the background sync loop
//! 3. Start a round as the host once a second player joins
//! 4. Leave cleanly on Ctrl+C
//!
//! ## Running
//!
//! ```sh
//! # Create a room on the public authority:
//! cargo run --example basic_room
//!
//! # Join an existing room instead:
//! CARD_SPY_ROOM=ABC123 cargo run --example basic_room
//!
//! # Override the authority URL:
//! CARD_SPY_API=http://localhost:8000 cargo run --example basic_room
//! ```

use card_spy_client::{
    CardSpyClient, CardSpyConfig, HttpRoomApi, Role, RoomEvent, RoomStatus, SessionStore,
};

/// Default authority URL when `CARD_SPY_API` is not set.
const DEFAULT_API: &str = "http://localhost:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let base = std::env::var("CARD_SPY_API").unwrap_or_else(|_| DEFAULT_API.to_string());
    let name = std::env::var("CARD_SPY_NAME").unwrap_or_else(|_| "RustPlayer".to_string());
    tracing::info!("Using authority at {base}");

    let api = HttpRoomApi::new(base);
    let store = SessionStore::new("card-spy-session.json");
    let (mut client, mut events) = CardSpyClient::new(api, store, CardSpyConfig::new());

    // ── Enter a room ────────────────────────────────────────────────
    // A persisted session from a previous run takes priority; otherwise
    // join the room named in CARD_SPY_ROOM, or create a fresh one.
    if client.restore().await {
        tracing::info!("Resumed previous session");
    } else if let Ok(code) = std::env::var("CARD_SPY_ROOM") {
        let room = client.join_room(&code, &name).await?;
        tracing::info!("Joined room {}", room.code);
    } else {
        let room = client.create_room(&name).await?;
        tracing::info!("Created room {} — share this code to invite players", room.code);
    }

    // ── Event loop ──────────────────────────────────────────────────
    let mut started = false;
    loop {
        tokio::select! {
            // Branch 1: state update from the sync loop.
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    RoomEvent::StateUpdated { room, you } => {
                        let roster: Vec<_> = room.players.iter().map(|p| p.name.as_str()).collect();
                        tracing::info!(status = ?room.status, players = ?roster, "room updated");

                        match room.status {
                            RoomStatus::Waiting => {
                                // Host: start a round as soon as someone else joins.
                                if client.is_host().await && room.players.len() >= 2 && !started {
                                    let spies = 1.min(room.max_spy_count());
                                    tracing::info!("Starting round with {spies} spy");
                                    if let Err(e) = client.start_round(spies).await {
                                        tracing::warn!("start rejected: {e}");
                                    } else {
                                        started = true;
                                    }
                                }
                            }
                            RoomStatus::InRound => match you {
                                Some(info) if info.role == Role::Spy => {
                                    tracing::info!("You are the SPY — figure out the card!");
                                }
                                Some(info) => {
                                    tracing::info!("Your card: {}", info.card.as_deref().unwrap_or("(secret)"));
                                }
                                None => {}
                            },
                            RoomStatus::Ended => {
                                tracing::info!(
                                    "Round over. The card was: {}",
                                    room.reveal.as_deref().unwrap_or("(secret)")
                                );
                                started = false;
                            }
                        }
                    }
                    RoomEvent::SyncStopped { reason: Some(reason) } => {
                        tracing::warn!("Sync stopped: {reason} — rejoin to resume");
                        break;
                    }
                    RoomEvent::SyncStopped { reason: None } => {
                        tracing::info!("Left the room");
                        break;
                    }
                }
            }

            // Branch 2: Ctrl+C — leave the room and exit.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, leaving room");
                client.leave().await;
                break;
            }
        }
    }

    Ok(())
}
