//! Bridge configuration
//!
//! Defaults match the ports the host scripts expect. Every value can be
//! overridden through `OSC_BRIDGE_*` environment variables (optionally loaded
//! from a `.env` file).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "OSC_BRIDGE_";

/// Runtime configuration for the bridge
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Host the inbound OSC socket binds to
    pub osc_host: String,
    /// First port tried for the inbound OSC socket
    pub osc_base_port: u16,
    /// Host the HTTP/WebSocket server binds to
    pub http_host: String,
    /// First port tried for the HTTP/WebSocket server
    pub http_base_port: u16,
    /// Number of consecutive ports tried before giving up
    pub port_attempts: u16,
    /// Peer every relayed message is forwarded to
    pub forward_addr: SocketAddr,
    /// Minimum spacing between admitted events on one channel
    pub min_interval: Duration,
    /// Period of the pending-buffer flush tick
    pub batch_period: Duration,
    /// Messages kept for replay to new WebSocket clients
    pub history_capacity: usize,
    /// Bounded send queue per WebSocket client
    pub client_queue_capacity: usize,
    /// HTML file served at `/`
    pub index_path: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let min_interval = Duration::from_secs_f64(1.0 / 60.0);
        Self {
            osc_host: "127.0.0.1".to_string(),
            osc_base_port: 8001,
            http_host: "127.0.0.1".to_string(),
            http_base_port: 8081,
            port_attempts: 5,
            forward_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            min_interval,
            batch_period: min_interval,
            history_capacity: 100,
            client_queue_capacity: 1024,
            index_path: PathBuf::from("monitor.html"),
        }
    }
}

impl BridgeConfig {
    /// Build a configuration from defaults, `.env` and the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// `lookup` receives the full variable name, e.g. `OSC_BRIDGE_OSC_PORT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(v) = get("OSC_HOST") {
            config.osc_host = v;
        }
        if let Some(v) = get("HTTP_HOST") {
            config.http_host = v;
        }
        if let Some(v) = get("OSC_PORT") {
            config.osc_base_port = parse_value("OSC_PORT", &v)?;
        }
        if let Some(v) = get("HTTP_PORT") {
            config.http_base_port = parse_value("HTTP_PORT", &v)?;
        }
        if let Some(v) = get("PORT_ATTEMPTS") {
            config.port_attempts = parse_value("PORT_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("FORWARD_ADDR") {
            config.forward_addr = parse_value("FORWARD_ADDR", &v)?;
        }

        let min_interval_set = if let Some(v) = get("MIN_INTERVAL_MS") {
            config.min_interval = Duration::from_millis(parse_value("MIN_INTERVAL_MS", &v)?);
            true
        } else {
            false
        };
        match get("BATCH_PERIOD_MS") {
            Some(v) => {
                config.batch_period = Duration::from_millis(parse_value("BATCH_PERIOD_MS", &v)?)
            }
            // The tick follows the rate limit unless set on its own
            None if min_interval_set => config.batch_period = config.min_interval,
            None => {}
        }

        if let Some(v) = get("HISTORY_CAPACITY") {
            config.history_capacity = parse_value("HISTORY_CAPACITY", &v)?;
        }
        if let Some(v) = get("CLIENT_QUEUE") {
            config.client_queue_capacity = parse_value("CLIENT_QUEUE", &v)?;
        }
        if let Some(v) = get("INDEX_PATH") {
            config.index_path = PathBuf::from(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.port_attempts == 0 {
            return Err(BridgeError::Config("port attempts must be at least 1".into()));
        }
        if self.batch_period.is_zero() {
            return Err(BridgeError::Config("batch period must be non-zero".into()));
        }
        if self.client_queue_capacity == 0 {
            return Err(BridgeError::Config("client queue capacity must be at least 1".into()));
        }
        if self.client_queue_capacity < self.history_capacity {
            return Err(BridgeError::Config(format!(
                "client queue capacity ({}) must hold the full history ({})",
                self.client_queue_capacity, self.history_capacity
            )));
        }
        Ok(())
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        BridgeError::Config(format!("{}{}={:?}: {}", ENV_PREFIX, name, raw, e))
    })
}
