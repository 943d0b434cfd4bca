//! Bridge server
//!
//! Wires the transports to the relay: binds the inbound OSC socket and the
//! HTTP listener (each with port-range retry), then runs the receiver, the
//! batch scheduler and the axum server until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::api::http::create_router;
use crate::api::websocket::{AppState, WebSocketHub};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::osc::{OscReceiver, OscSink, UdpForwarder};
use crate::relay::{BatchScheduler, MessageHistory, Relay};
use crate::utils::{bind_tcp_in_range, bind_udp_in_range};

/// A bridge with both transports bound, ready to run
pub struct BridgeServer {
    config: BridgeConfig,
    relay: Arc<Relay>,
    receiver: OscReceiver,
    listener: TcpListener,
    osc_addr: SocketAddr,
    http_addr: SocketAddr,
}

impl BridgeServer {
    /// Bind both transports using the real UDP forwarder
    pub async fn bind(config: BridgeConfig) -> Result<Self> {
        let forwarder = UdpForwarder::bind(config.forward_addr)?;
        Self::bind_with_sink(config, Arc::new(forwarder)).await
    }

    /// Bind both transports, forwarding through `outbound`
    pub async fn bind_with_sink(config: BridgeConfig, outbound: Arc<dyn OscSink>) -> Result<Self> {
        config.validate()?;

        let history = Arc::new(MessageHistory::new(config.history_capacity));
        let hub = Arc::new(WebSocketHub::new(
            history,
            outbound.clone(),
            config.client_queue_capacity,
        ));
        let relay = Arc::new(Relay::new(&config, hub, outbound));

        let (socket, _) =
            bind_udp_in_range(&config.osc_host, config.osc_base_port, config.port_attempts)
                .await?;
        let receiver = OscReceiver::new(socket, relay.clone());
        let osc_addr = receiver.local_addr()?;

        let (listener, _) =
            bind_tcp_in_range(&config.http_host, config.http_base_port, config.port_attempts)
                .await?;
        let http_addr = listener.local_addr()?;

        Ok(Self {
            config,
            relay,
            receiver,
            listener,
            osc_addr,
            http_addr,
        })
    }

    pub fn osc_addr(&self) -> SocketAddr {
        self.osc_addr
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// The relay, e.g. for feeding `enqueue_pending` from an embedding caller
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Serve until `shutdown` resolves
    ///
    /// On shutdown the receiver and the batch tick stop, every WebSocket is
    /// closed and nothing pending is flushed.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("OSC Bridge started:");
        info!("  - OSC server listening on {}", self.osc_addr);
        info!("  - Web interface available at http://{}", self.http_addr);
        info!("  - Forwarding to {}", self.config.forward_addr);

        let (stop_tx, stop_rx) = watch::channel(false);

        let receiver_handle = tokio::spawn(self.receiver.run(stop_rx.clone()));
        let scheduler = BatchScheduler::new(self.relay.clone(), self.config.batch_period);
        let scheduler_handle = tokio::spawn(scheduler.run(stop_rx));

        let state = Arc::new(AppState::new(self.relay.hub().clone()));
        let app = create_router(state, &self.config.index_path);

        let hub = self.relay.hub().clone();
        let graceful = async move {
            shutdown.await;
            info!("Shutting down servers...");
            hub.close_all();
            let _ = stop_tx.send(true);
        };

        let served = axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(graceful)
        .await;

        // Normally already stopped by the graceful future; also covers a serve error
        receiver_handle.abort();
        scheduler_handle.abort();
        self.relay.hub().close_all();

        if let Err(e) = &served {
            error!("HTTP server error: {}", e);
        }
        info!("OSC Bridge stopped");
        served.map_err(Into::into)
    }
}
