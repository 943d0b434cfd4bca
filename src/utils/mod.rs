//! Utility functions and helpers
//!
//! This module contains port-range binding used by both transports at startup.

pub mod ports;

pub use ports::{bind_first_available, bind_tcp_in_range, bind_udp_in_range};
