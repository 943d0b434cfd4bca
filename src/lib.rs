//! OSC Bridge
//!
//! A bidirectional relay between an OSC/UDP control protocol and browser
//! WebSocket clients.
//!
//! # Features
//!
//! - **Rate Limiting**: At most one event per OSC address per interval (60 Hz default)
//! - **History Replay**: New WebSocket clients receive the last 100 messages
//! - **Fan-out**: Non-blocking per-client queues; dead clients are pruned
//! - **Batch Flush**: Coalesced updates flushed on a fixed tick
//! - **Two-way**: WebSocket `osc_message` commands are forwarded over UDP
//!
//! # Modules
//!
//! - `types`: Control messages and argument coercion
//! - `relay`: Rate limiter, history, pending buffer, relay and batch scheduler
//! - `osc`: OSC codec, outbound forwarder and inbound receiver
//! - `api`: HTTP router and WebSocket hub
//! - `server`: Startup wiring and shutdown
//! - `config`: Defaults and environment overrides
//! - `utils`: Port-range binding
//!
//! # Example
//!
//! ```no_run
//! use osc_bridge::{BridgeConfig, BridgeServer};
//!
//! #[tokio::main]
//! async fn main() -> osc_bridge::Result<()> {
//!     let server = BridgeServer::bind(BridgeConfig::default()).await?;
//!     server.run(async { let _ = tokio::signal::ctrl_c().await; }).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod osc;
pub mod relay;
pub mod server;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::websocket::{WebSocketHub, WsMessage};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use osc::{OscSink, UdpForwarder};
pub use relay::{BatchScheduler, Disposition, MessageHistory, RateLimiter, Relay};
pub use server::BridgeServer;
pub use types::{coerce_args, ControlMessage, RawArg};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
