//! WebSocket client hub
//!
//! Owns the set of connected clients. Each client is represented by the
//! sending half of a bounded queue drained by that connection's writer task,
//! so a broadcast never waits on a slow socket.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::{ClientMessage, WsMessage};
use crate::error::{BridgeError, Result};
use crate::osc::OscSink;
use crate::relay::MessageHistory;
use crate::types::{coerce_args, ControlMessage, RawArg};

/// Unique client identifier.
pub type ClientId = u64;

/// Registry of live connections plus the history used to backfill them
pub struct WebSocketHub {
    clients: Mutex<HashMap<ClientId, mpsc::Sender<String>>>,
    history: Arc<MessageHistory>,
    outbound: Arc<dyn OscSink>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl WebSocketHub {
    pub fn new(
        history: Arc<MessageHistory>,
        outbound: Arc<dyn OscSink>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            history,
            outbound,
            next_id: AtomicU64::new(1),
            queue_capacity,
        }
    }

    /// Create a send queue sized for this hub
    pub fn channel(&self) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(self.queue_capacity.max(1))
    }

    /// Register a connection and replay history to it
    ///
    /// The clients lock is held across replay and registration, so no
    /// broadcast can slip between the replayed history and the live stream.
    /// If the replay cannot be queued the connection is not registered.
    pub fn connect(&self, tx: mpsc::Sender<String>) -> Result<ClientId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut clients = self.clients.lock();

        for msg in self.history.snapshot() {
            let json = serde_json::to_string(&WsMessage::from(&msg))?;
            if tx.try_send(json).is_err() {
                warn!("Replay to client {} failed, dropping connection", id);
                return Err(BridgeError::ClientSendFailure(id));
            }
        }

        clients.insert(id, tx);
        info!("New WebSocket connection {}. Total connections: {}", id, clients.len());
        Ok(id)
    }

    /// Deregister a connection; unknown ids are ignored
    pub fn disconnect(&self, id: ClientId) {
        let mut clients = self.clients.lock();
        if clients.remove(&id).is_some() {
            info!("WebSocket {} disconnected. Remaining connections: {}", id, clients.len());
        }
    }

    /// Record `msg` in history and send it to every registered client
    ///
    /// Sends go to a snapshot of the client set; clients whose queue is
    /// closed or full are removed afterwards in one step. Returns the number
    /// of clients that received the message.
    pub fn broadcast(&self, msg: ControlMessage) -> usize {
        let json = match serde_json::to_string(&WsMessage::from(&msg)) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize broadcast message: {}", e);
                return 0;
            }
        };

        let mut clients = self.clients.lock();
        self.history.append(msg);

        let snapshot: Vec<(ClientId, mpsc::Sender<String>)> =
            clients.iter().map(|(id, tx)| (*id, tx.clone())).collect();

        let mut failed = Vec::new();
        for (id, tx) in &snapshot {
            if let Err(e) = tx.try_send(json.clone()) {
                warn!("{}: {}", BridgeError::ClientSendFailure(*id), e);
                failed.push(*id);
            }
        }

        for id in &failed {
            clients.remove(id);
        }
        if !failed.is_empty() {
            info!(
                "Removed {} dead connections. Remaining connections: {}",
                failed.len(),
                clients.len()
            );
        }

        snapshot.len() - failed.len()
    }

    /// Handle a text frame from a client
    ///
    /// `osc_message` commands are coerced and forwarded to the outbound peer;
    /// other types are ignored. Errors are returned for the caller to log and
    /// never affect the connection.
    pub fn on_client_message(&self, raw: &str) -> Result<()> {
        let msg: ClientMessage = serde_json::from_str(raw)
            .map_err(|e| BridgeError::MalformedClientMessage(e.to_string()))?;

        match msg {
            ClientMessage::OscMessage { address, args } => {
                let raw_args: Vec<RawArg> = args.iter().map(RawArg::from).collect();
                let args = coerce_args(&raw_args)?;
                debug!("[WS->OSC] Forwarding: {} {:?}", address, args);
                self.outbound.forward(&address, &args);
            }
            ClientMessage::Unknown => debug!("Ignoring client message: {}", raw),
        }
        Ok(())
    }

    /// Drop every connection; writer tasks see their queue close and hang up
    pub fn close_all(&self) {
        let mut clients = self.clients.lock();
        if !clients.is_empty() {
            info!("Closing {} WebSocket connections", clients.len());
        }
        clients.clear();
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn history(&self) -> &Arc<MessageHistory> {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::forwarder::testing::RecordingSink;

    fn hub_with_sink(history_capacity: usize) -> (WebSocketHub, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let history = Arc::new(MessageHistory::new(history_capacity));
        let hub = WebSocketHub::new(history, sink.clone(), 64);
        (hub, sink)
    }

    fn address_of(json: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        value["address"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_broadcast_prunes_failed_client() {
        let (hub, _) = hub_with_sink(10);
        let (tx1, mut rx1) = hub.channel();
        let (tx2, rx2) = hub.channel();
        let (tx3, mut rx3) = hub.channel();
        hub.connect(tx1).unwrap();
        let id2 = hub.connect(tx2).unwrap();
        hub.connect(tx3).unwrap();
        drop(rx2);

        assert_eq!(hub.broadcast(ControlMessage::new("/first", vec![1.0])), 2);
        assert_eq!(hub.client_count(), 2);
        assert_eq!(address_of(&rx1.try_recv().unwrap()), "/first");
        assert_eq!(address_of(&rx3.try_recv().unwrap()), "/first");

        assert_eq!(hub.broadcast(ControlMessage::new("/second", vec![2.0])), 2);
        assert_eq!(address_of(&rx1.try_recv().unwrap()), "/second");
        assert_eq!(address_of(&rx3.try_recv().unwrap()), "/second");

        // Already gone; a second disconnect is harmless
        hub.disconnect(id2);
        assert_eq!(hub.client_count(), 2);
    }

    #[test]
    fn test_stalled_client_does_not_block_others() {
        let (hub, _) = hub_with_sink(10);
        let (healthy_tx, mut healthy_rx) = hub.channel();
        // Capacity 1 and never drained: the second broadcast finds it full
        let (stalled_tx, _stalled_rx) = mpsc::channel(1);
        hub.connect(healthy_tx).unwrap();
        let stalled = hub.connect(stalled_tx).unwrap();

        assert_eq!(hub.broadcast(ControlMessage::new("/one", vec![1.0])), 2);
        assert_eq!(hub.client_count(), 2);

        assert_eq!(hub.broadcast(ControlMessage::new("/two", vec![2.0])), 1);
        assert_eq!(hub.client_count(), 1);

        let received: Vec<String> = std::iter::from_fn(|| healthy_rx.try_recv().ok())
            .map(|json| address_of(&json))
            .collect();
        assert_eq!(received, vec!["/one", "/two"]);

        // The stalled client is gone, so later broadcasts only count the healthy one
        assert_eq!(hub.broadcast(ControlMessage::new("/three", vec![3.0])), 1);
        hub.disconnect(stalled);
        assert_eq!(hub.client_count(), 1);
    }

    #[test]
    fn test_connect_replays_history_in_order() {
        let (hub, _) = hub_with_sink(10);
        for address in ["/A", "/B", "/C"] {
            hub.broadcast(ControlMessage::new(address, vec![0.0]));
        }

        let (tx, mut rx) = hub.channel();
        hub.connect(tx).unwrap();
        hub.broadcast(ControlMessage::new("/D", vec![0.0]));

        let received: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|json| address_of(&json))
            .collect();
        assert_eq!(received, vec!["/A", "/B", "/C", "/D"]);
    }

    #[test]
    fn test_connect_fails_when_replay_does_not_fit() {
        let (hub, _) = hub_with_sink(10);
        for i in 0..3 {
            hub.broadcast(ControlMessage::new(format!("/m/{}", i), vec![]));
        }

        let (tx, _rx) = mpsc::channel(2);
        assert!(matches!(hub.connect(tx), Err(BridgeError::ClientSendFailure(_))));
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn test_broadcast_records_history_without_clients() {
        let (hub, _) = hub_with_sink(2);
        for i in 0..3 {
            hub.broadcast(ControlMessage::new(format!("/m/{}", i), vec![]));
        }
        assert_eq!(hub.history().len(), 2);
    }

    #[test]
    fn test_client_message_forwards_coerced_args() {
        let (hub, sink) = hub_with_sink(10);
        hub.on_client_message(r#"{"type":"osc_message","address":"/led","args":["1.5","2","3"]}"#)
            .unwrap();
        assert_eq!(*sink.sent.lock(), vec![("/led".to_string(), vec![1.5, 2.0, 3.0])]);
    }

    #[test]
    fn test_client_message_with_bad_arg_not_forwarded() {
        let (hub, sink) = hub_with_sink(10);
        let err = hub
            .on_client_message(r#"{"type":"osc_message","address":"/led","args":["1.5","2","x"]}"#)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument { index: 2, .. }));
        assert!(sink.sent.lock().is_empty());
    }

    #[test]
    fn test_malformed_and_unknown_messages() {
        let (hub, sink) = hub_with_sink(10);
        assert!(matches!(
            hub.on_client_message("{not json"),
            Err(BridgeError::MalformedClientMessage(_))
        ));
        assert!(hub.on_client_message(r#"{"type":"subscribe","channel":"x"}"#).is_ok());
        assert!(sink.sent.lock().is_empty());
    }

    #[test]
    fn test_close_all_closes_queues() {
        let (hub, _) = hub_with_sink(10);
        let (tx, mut rx) = hub.channel();
        hub.connect(tx).unwrap();
        hub.close_all();
        assert_eq!(hub.client_count(), 0);
        assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
    }
}
