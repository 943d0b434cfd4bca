//! Port-range binding with retry
//!
//! Both listeners try `base`, `base + 1`, ... for a fixed number of attempts
//! and fail startup once the range is exhausted.

use std::future::Future;
use std::io;

use tokio::net::{TcpListener, UdpSocket};
use tracing::warn;

use crate::error::{BridgeError, Result};

/// Call `bind` for each port in `base..base + attempts` until one succeeds
///
/// Returns the bound value and its port. The range is clamped at `u16::MAX`.
pub async fn bind_first_available<T, F, Fut>(
    base: u16,
    attempts: u16,
    mut bind: F,
) -> Result<(T, u16)>
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let end = base.saturating_add(attempts.saturating_sub(1));
    if attempts == 0 {
        return Err(BridgeError::PortRangeExhausted { start: base, end });
    }

    for port in base..=end {
        match bind(port).await {
            Ok(bound) => return Ok((bound, port)),
            Err(source) => {
                let err = BridgeError::PortInUse { port, source };
                if port < end {
                    warn!("{}, trying next port...", err);
                } else {
                    warn!("{}", err);
                }
            }
        }
    }

    Err(BridgeError::PortRangeExhausted { start: base, end })
}

/// Bind the inbound OSC socket
pub async fn bind_udp_in_range(host: &str, base: u16, attempts: u16) -> Result<(UdpSocket, u16)> {
    bind_first_available(base, attempts, |port| UdpSocket::bind((host.to_string(), port))).await
}

/// Bind the HTTP/WebSocket listener
pub async fn bind_tcp_in_range(host: &str, base: u16, attempts: u16) -> Result<(TcpListener, u16)> {
    bind_first_available(base, attempts, |port| TcpListener::bind((host.to_string(), port))).await
}
