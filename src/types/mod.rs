//! Data types for the OSC bridge
//!
//! This module contains the message and argument types shared by both transports.

mod args;
mod message;

pub use args::{coerce_args, RawArg};
pub use message::ControlMessage;
