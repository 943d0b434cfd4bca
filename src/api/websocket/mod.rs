//! WebSocket module for real-time relay to browser clients
//!
//! Provides WebSocket endpoint at `/ws`.
//!
//! ## Features
//! - Replay of recent history on connect, then live broadcasts
//! - Per-client bounded send queues; dead or stalled clients are pruned
//! - Client `osc_message` commands forwarded to the outbound OSC peer

pub mod events;
pub mod handler;
pub mod hub;
pub mod state;

pub use events::{ClientMessage, WsMessage};
pub use hub::{ClientId, WebSocketHub};
pub use state::AppState;
