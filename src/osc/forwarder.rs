//! Outbound OSC forwarding

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::{debug, warn};

use super::codec::encode_message;
use crate::error::{BridgeError, Result};

/// Destination for relayed control messages
pub trait OscSink: Send + Sync {
    /// Send one message; must not block
    fn send(&self, address: &str, args: &[f64]) -> Result<()>;

    /// Best-effort send: failures are logged and swallowed
    fn forward(&self, address: &str, args: &[f64]) {
        match self.send(address, args) {
            Ok(()) => debug!("Forwarded {} {:?}", address, args),
            Err(e) => warn!("Dropping outbound {}: {}", address, e),
        }
    }
}

/// UDP client bound to an ephemeral port, targeting one fixed peer
///
/// Holds a non-blocking std socket so every send reaches the kernel
/// immediately; there is no reactor readiness to wait for.
pub struct UdpForwarder {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpForwarder {
    /// Bind an ephemeral local socket of the target's address family
    pub fn bind(target: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, target })
    }
}

impl OscSink for UdpForwarder {
    fn send(&self, address: &str, args: &[f64]) -> Result<()> {
        let buf = encode_message(address, args)?;
        // A full socket buffer surfaces as WouldBlock and counts as unreachable
        self.socket
            .send_to(&buf, self.target)
            .map(|_| ())
            .map_err(|e| BridgeError::TransportUnavailable(format!("{}: {}", self.target, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::codec::decode_datagram;
    use crate::types::RawArg;
    use std::time::Duration;
    use tokio::net::UdpSocket as PeerSocket;

    #[tokio::test]
    async fn test_forwarder_delivers_floats() {
        let peer = PeerSocket::bind("127.0.0.1:0").await.unwrap();
        let forwarder = UdpForwarder::bind(peer.local_addr().unwrap()).unwrap();

        // First send on a fresh socket must go out without any prior yield
        forwarder.send("/test/addr", &[1.0, 2.0, 3.0]).unwrap();

        let mut buf = [0u8; 1536];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), peer.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let messages = decode_datagram(&buf[..len]).unwrap();
        assert_eq!(messages[0].address, "/test/addr");
        assert_eq!(
            messages[0].args,
            vec![RawArg::Float(1.0), RawArg::Float(2.0), RawArg::Float(3.0)]
        );
    }

    #[test]
    fn test_forwarder_sends_outside_runtime() {
        let peer = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let forwarder = UdpForwarder::bind(peer.local_addr().unwrap()).unwrap();

        forwarder.send("/a", &[1.0]).unwrap();
        forwarder.send("/b", &[2.0]).unwrap();

        let mut buf = [0u8; 1536];
        let mut addresses = Vec::new();
        for _ in 0..2 {
            let (len, _) = peer.recv_from(&mut buf).unwrap();
            addresses.push(decode_datagram(&buf[..len]).unwrap().remove(0).address);
        }
        assert_eq!(addresses, vec!["/a", "/b"]);
    }
}
