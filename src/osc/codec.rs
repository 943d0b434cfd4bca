//! OSC packet codec

use rosc::{OscMessage, OscPacket, OscType};

use crate::error::{BridgeError, Result};
use crate::types::RawArg;

/// Largest datagram the receiver reads: the UDP payload limit, not an MTU
pub const MAX_DATAGRAM: usize = 65_535;

/// A decoded message with its arguments still in wire form
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub address: String,
    pub args: Vec<RawArg>,
}

impl From<&OscType> for RawArg {
    fn from(arg: &OscType) -> Self {
        match arg {
            OscType::Int(i) => RawArg::Int(i64::from(*i)),
            OscType::Long(l) => RawArg::Int(*l),
            OscType::Float(f) => RawArg::Float(f64::from(*f)),
            OscType::Double(d) => RawArg::Float(*d),
            OscType::Bool(b) => RawArg::Bool(*b),
            OscType::String(s) => RawArg::Text(s.clone()),
            OscType::Char(c) => RawArg::Text(c.to_string()),
            OscType::Blob(_) => RawArg::Unsupported("blob"),
            OscType::Time(_) => RawArg::Unsupported("timetag"),
            OscType::Color(_) => RawArg::Unsupported("color"),
            OscType::Midi(_) => RawArg::Unsupported("midi"),
            OscType::Array(_) => RawArg::Unsupported("array"),
            OscType::Nil => RawArg::Unsupported("nil"),
            OscType::Inf => RawArg::Unsupported("infinitum"),
        }
    }
}

/// Decode a datagram, flattening bundles into their messages
pub fn decode_datagram(buf: &[u8]) -> Result<Vec<InboundMessage>> {
    let (_, packet) =
        rosc::decoder::decode_udp(buf).map_err(|e| BridgeError::OscDecode(format!("{:?}", e)))?;

    let mut messages = Vec::new();
    flatten(packet, &mut messages);
    Ok(messages)
}

fn flatten(packet: OscPacket, out: &mut Vec<InboundMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(InboundMessage {
            args: msg.args.iter().map(RawArg::from).collect(),
            address: msg.addr,
        }),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

/// Encode an outbound message with float32 arguments
pub fn encode_message(address: &str, args: &[f64]) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args: args.iter().map(|v| OscType::Float(*v as f32)).collect(),
    });
    rosc::encoder::encode(&packet).map_err(|e| BridgeError::OscDecode(format!("{:?}", e)))
}
