//! Relay core
//!
//! `Relay` is the single service object built at startup. It owns the rate
//! state and the pending buffer and shares the hub and outbound sink with
//! the transport tasks. Each piece of shared state sits behind its own lock.

pub mod batcher;
pub mod history;
pub mod pending;
pub mod rate_limiter;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

pub use batcher::BatchScheduler;
pub use history::MessageHistory;
pub use pending::PendingBuffer;
pub use rate_limiter::{RateLimiter, BATCH_CHANNEL};

use crate::api::websocket::hub::WebSocketHub;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::osc::OscSink;
use crate::types::{coerce_args, ControlMessage, RawArg};

/// What happened to an inbound control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forwarded and broadcast
    Relayed,
    /// Dropped by the rate limiter
    Throttled,
}

/// Rate-limited fan-out from the OSC side to the outbound peer and the hub
pub struct Relay {
    rate: Mutex<RateLimiter>,
    pending: Mutex<PendingBuffer>,
    hub: Arc<WebSocketHub>,
    outbound: Arc<dyn OscSink>,
}

impl Relay {
    pub fn new(config: &BridgeConfig, hub: Arc<WebSocketHub>, outbound: Arc<dyn OscSink>) -> Self {
        Self {
            rate: Mutex::new(RateLimiter::new(config.min_interval)),
            pending: Mutex::new(PendingBuffer::new()),
            hub,
            outbound,
        }
    }

    /// Handle a control message received over OSC
    pub fn on_control_message(&self, address: &str, raw: &[RawArg]) -> Result<Disposition> {
        self.on_control_message_at(address, raw, Instant::now())
    }

    /// Same as [`Relay::on_control_message`] with an explicit clock reading
    ///
    /// Arguments are coerced first; a coercion failure is returned and
    /// nothing is forwarded. Admitted messages go unchanged to the outbound
    /// peer, then into history and out to every WebSocket client.
    pub fn on_control_message_at(
        &self,
        address: &str,
        raw: &[RawArg],
        now: Instant,
    ) -> Result<Disposition> {
        let args = coerce_args(raw)?;

        if !self.rate.lock().admit(address, now) {
            trace!("Rate limited {}", address);
            return Ok(Disposition::Throttled);
        }

        debug!("[OSC] Forwarding: {} {:?}", address, args);
        self.outbound.forward(address, &args);
        self.hub.broadcast(ControlMessage::new(address, args));
        Ok(Disposition::Relayed)
    }

    /// Coalesce an update for the next batch flush instead of relaying it now
    pub fn enqueue_pending(&self, address: &str, raw: &[RawArg]) -> Result<()> {
        let args = coerce_args(raw)?;
        self.pending.lock().insert(address, args);
        Ok(())
    }

    /// Broadcast everything pending if the batch channel admits `now`
    ///
    /// Returns the number of messages broadcast.
    pub fn flush_pending_at(&self, now: Instant) -> usize {
        let drained = {
            let mut pending = self.pending.lock();
            if pending.is_empty() || !self.rate.lock().admit(BATCH_CHANNEL, now) {
                return 0;
            }
            pending.take()
        };

        let count = drained.len();
        for (address, args) in drained {
            self.hub.broadcast(ControlMessage::new(address, args));
        }
        trace!("Flushed {} pending messages", count);
        count
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn hub(&self) -> &Arc<WebSocketHub> {
        &self.hub
    }
}
