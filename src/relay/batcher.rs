//! Periodic flush of coalesced updates

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

use super::Relay;

/// Ticks at a fixed period and drains the relay's pending buffer
///
/// The batch channel of the rate limiter caps how often a flush can happen,
/// so bursts across many addresses collapse into at most one flush per
/// interval.
pub struct BatchScheduler {
    relay: Arc<Relay>,
    period: Duration,
}

impl BatchScheduler {
    pub fn new(relay: Arc<Relay>, period: Duration) -> Self {
        Self { relay, period }
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    /// Anything still pending at shutdown is discarded.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.relay.flush_pending_at(Instant::now());
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Batch scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::websocket::hub::WebSocketHub;
    use crate::config::BridgeConfig;
    use crate::osc::forwarder::testing::RecordingSink;
    use crate::relay::MessageHistory;
    use crate::types::RawArg;

    fn relay_with_client() -> (Arc<Relay>, tokio::sync::mpsc::Receiver<String>) {
        let config = BridgeConfig::default();
        let sink = Arc::new(RecordingSink::default());
        let hub = Arc::new(WebSocketHub::new(Arc::new(MessageHistory::new(10)), sink.clone(), 64));
        let (tx, rx) = hub.channel();
        hub.connect(tx).unwrap();
        (Arc::new(Relay::new(&config, hub, sink)), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_flushes_on_tick() {
        let (relay, mut rx) = relay_with_client();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = BatchScheduler::new(relay.clone(), Duration::from_millis(20));
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        relay.enqueue_pending("/a", &[RawArg::Float(0.5)]).unwrap();
        relay.enqueue_pending("/b", &[RawArg::Float(0.25)]).unwrap();

        let wait = Duration::from_secs(1);
        let first = tokio::time::timeout(wait, rx.recv()).await.unwrap().unwrap();
        let second = tokio::time::timeout(wait, rx.recv()).await.unwrap().unwrap();
        assert!(first.contains("\"/a\""));
        assert!(second.contains("\"/b\""));
        assert_eq!(relay.pending_len(), 0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_stops_when_sender_dropped() {
        let (relay, _rx) = relay_with_client();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = BatchScheduler::new(relay, Duration::from_millis(20));
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
