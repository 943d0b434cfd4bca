//! WebSocket wire format
//!
//! Both directions use `{"type": "osc_message", "address": ..., "args": [...]}`;
//! server frames add an ISO-8601 `timestamp`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ControlMessage, RawArg};

/// Frames sent to WebSocket clients
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    OscMessage {
        address: String,
        args: Vec<f64>,
        timestamp: DateTime<Utc>,
    },
}

impl From<&ControlMessage> for WsMessage {
    fn from(msg: &ControlMessage) -> Self {
        WsMessage::OscMessage {
            address: msg.address().to_string(),
            args: msg.args().to_vec(),
            timestamp: msg.timestamp(),
        }
    }
}

/// Frames received from WebSocket clients
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Command to forward over OSC
    OscMessage {
        address: String,
        #[serde(default)]
        args: Vec<Value>,
    },

    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

impl From<&Value> for RawArg {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawArg::Int(i),
                None => n.as_f64().map(RawArg::Float).unwrap_or(RawArg::Unsupported("number")),
            },
            Value::String(s) => RawArg::Text(s.clone()),
            Value::Bool(b) => RawArg::Bool(*b),
            Value::Null => RawArg::Unsupported("null"),
            Value::Array(_) => RawArg::Unsupported("array"),
            Value::Object(_) => RawArg::Unsupported("object"),
        }
    }
}
