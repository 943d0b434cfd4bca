//! Inbound OSC socket loop

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::codec::{decode_datagram, MAX_DATAGRAM};
use crate::error::Result;
use crate::relay::Relay;

/// Reads datagrams from the inbound socket and hands them to the relay
pub struct OscReceiver {
    socket: UdpSocket,
    relay: Arc<Relay>,
}

impl OscReceiver {
    pub fn new(socket: UdpSocket, relay: Arc<Relay>) -> Self {
        Self { socket, relay }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, from)) => self.handle_datagram(&buf[..len], from),
                        Err(e) => warn!("OSC socket error: {}", e),
                    }
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("OSC receiver stopped");
    }

    fn handle_datagram(&self, buf: &[u8], from: SocketAddr) {
        let messages = match decode_datagram(buf) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Ignoring datagram from {}: {}", from, e);
                return;
            }
        };

        for msg in messages {
            debug!("[OSC] {} {:?} from {}", msg.address, msg.args, from);
            if let Err(e) = self.relay.on_control_message(&msg.address, &msg.args) {
                warn!("Dropping OSC message {}: {}", msg.address, e);
            }
        }
    }
}
