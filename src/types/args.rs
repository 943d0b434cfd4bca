//! Argument coercion
//!
//! Both transports deliver loosely typed argument lists: OSC packets carry
//! ints, floats, strings and more, JSON frames carry numbers, strings and
//! booleans. Everything is normalised to `f64` before it is relayed.

use std::fmt;

use crate::error::{BridgeError, Result};

/// An argument as received, before coercion
#[derive(Clone, Debug, PartialEq)]
pub enum RawArg {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Any other wire type; carries the type name for logging
    Unsupported(&'static str),
}

impl RawArg {
    /// Coerce to a finite `f64`
    ///
    /// Booleans map to 1.0/0.0 and strings are parsed. Non-finite results are
    /// rejected because the WebSocket wire format is JSON.
    pub fn to_f64(&self) -> std::result::Result<f64, String> {
        let value = match self {
            RawArg::Int(i) => *i as f64,
            RawArg::Float(f) => *f,
            RawArg::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            RawArg::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("could not convert string to float: {:?}", s))?,
            RawArg::Unsupported(kind) => return Err(format!("unsupported argument type: {}", kind)),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("non-finite value: {}", value))
        }
    }
}

impl fmt::Display for RawArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawArg::Int(i) => write!(f, "{}", i),
            RawArg::Float(v) => write!(f, "{}", v),
            RawArg::Bool(b) => write!(f, "{}", b),
            RawArg::Text(s) => write!(f, "{:?}", s),
            RawArg::Unsupported(kind) => write!(f, "<{}>", kind),
        }
    }
}

impl From<f64> for RawArg {
    fn from(v: f64) -> Self {
        RawArg::Float(v)
    }
}

impl From<i64> for RawArg {
    fn from(v: i64) -> Self {
        RawArg::Int(v)
    }
}

impl From<&str> for RawArg {
    fn from(v: &str) -> Self {
        RawArg::Text(v.to_string())
    }
}

/// Coerce a full argument list, failing on the first bad element
pub fn coerce_args(raw: &[RawArg]) -> Result<Vec<f64>> {
    raw.iter()
        .enumerate()
        .map(|(index, arg)| {
            arg.to_f64()
                .map_err(|reason| BridgeError::InvalidArgument { index, reason })
        })
        .collect()
}
