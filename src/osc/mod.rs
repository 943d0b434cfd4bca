//! OSC transport over UDP
//!
//! - `codec`: packet encode/decode on top of `rosc`
//! - `forwarder`: fire-and-forget sender to the fixed outbound peer
//! - `receiver`: inbound socket loop feeding the relay

pub mod codec;
pub mod forwarder;
pub mod receiver;

pub use forwarder::{OscSink, UdpForwarder};
pub use receiver::OscReceiver;
