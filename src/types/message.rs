//! Control message relayed between transports

use chrono::{DateTime, Utc};

/// A single OSC-style control message with numeric arguments
///
/// Fields are private so a message cannot change after it has been recorded
/// in history or broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlMessage {
    address: String,
    args: Vec<f64>,
    timestamp: DateTime<Utc>,
}

impl ControlMessage {
    /// Create a message stamped with the current time
    pub fn new(address: impl Into<String>, args: Vec<f64>) -> Self {
        Self::with_timestamp(address, args, Utc::now())
    }

    /// Create a message with an explicit timestamp
    pub fn with_timestamp(
        address: impl Into<String>,
        args: Vec<f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            address: address.into(),
            args,
            timestamp,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[f64] {
        &self.args
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
