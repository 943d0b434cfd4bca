//! API module for HTTP and WebSocket endpoints
//!
//! Serves the monitor page, the `/ws` bridge endpoint and a health check.

pub mod http;
pub mod websocket;
