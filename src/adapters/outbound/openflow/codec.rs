//! OpenFlow Wire Codec
//!
//! Encodes the handful of OpenFlow messages the patch panel needs.
//!
//! Uses Sans-IO pattern: message encoding/decoding is separated from I/O for testability.
//! All multi-byte integers are big-endian.

use crate::domain::entities::{FlowAction, FlowCommand, FlowRule};
use crate::domain::error::AdapterError;
use crate::domain::value_objects::{PortNo, ProtocolVersion};
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the common OpenFlow header.
pub const HEADER_LEN: usize = 8;

// Message types shared by every version.
pub const OFPT_HELLO: u8 = 0;
pub const OFPT_ERROR: u8 = 1;
pub const OFPT_ECHO_REQUEST: u8 = 2;
pub const OFPT_ECHO_REPLY: u8 = 3;
pub const OFPT_FLOW_MOD: u8 = 14;

const OFPFC_ADD: u8 = 0;
const OFPFC_DELETE: u8 = 3;

const OFP_DEFAULT_PRIORITY: u16 = 0x8000;
const OFP_NO_BUFFER: u32 = 0xffff_ffff;
const OFPCML_MAX: u16 = 0xffe5;

// OpenFlow 1.0
const OFP10_PORT_MAX: PortNo = 0xff00;
const OFP10_PORT_NONE: u16 = 0xffff;
const OFP10_FW_ALL: u32 = (1 << 22) - 1;
const OFP10_FW_IN_PORT: u32 = 1;
const OFP10_MATCH_LEN: usize = 40;
const OFP10_ACTION_OUTPUT_LEN: u16 = 8;

// OpenFlow 1.2 / 1.3
const OFP13_PORT_MAX: PortNo = 0xffff_ff00;
const OFP13_PORT_ANY: u32 = 0xffff_ffff;
const OFP13_GROUP_ANY: u32 = 0xffff_ffff;
const OFPMT_OXM: u16 = 1;
const OXM_OF_IN_PORT: u32 = 0x8000_0004;
const OFPIT_APPLY_ACTIONS: u16 = 4;
const OFP13_ACTION_OUTPUT_LEN: u16 = 16;

const OFPAT_OUTPUT: u16 = 0;

/// Decoded OpenFlow header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfpHeader {
    pub version: u8,
    pub msg_type: u8,
    pub length: u16,
    pub xid: u32,
}

impl OfpHeader {
    /// Parse the first eight bytes of a message.
    pub fn parse(buf: &[u8]) -> Result<Self, AdapterError> {
        if buf.len() < HEADER_LEN {
            return Err(AdapterError::Protocol(format!(
                "short header: {} bytes",
                buf.len()
            )));
        }
        let header = Self {
            version: buf[0],
            msg_type: buf[1],
            length: u16::from_be_bytes([buf[2], buf[3]]),
            xid: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        };
        if (header.length as usize) < HEADER_LEN {
            return Err(AdapterError::Protocol(format!(
                "invalid message length {}",
                header.length
            )));
        }
        Ok(header)
    }

    /// Number of body bytes following the header.
    pub fn body_len(&self) -> usize {
        self.length as usize - HEADER_LEN
    }
}

/// BARRIER_REQUEST / BARRIER_REPLY message types for a version.
///
/// They moved when OpenFlow 1.1 inserted group and port messages.
pub fn barrier_types(version: ProtocolVersion) -> (u8, u8) {
    match version {
        ProtocolVersion::OpenFlow10 => (18, 19),
        _ => (20, 21),
    }
}

/// Encode a header-only message.
pub fn encode_empty(version: ProtocolVersion, msg_type: u8, xid: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN);
    put_header(&mut buf, version, msg_type, HEADER_LEN as u16, xid);
    buf.freeze()
}

pub fn encode_hello(version: ProtocolVersion, xid: u32) -> Bytes {
    encode_empty(version, OFPT_HELLO, xid)
}

pub fn encode_barrier_request(version: ProtocolVersion, xid: u32) -> Bytes {
    encode_empty(version, barrier_types(version).0, xid)
}

/// Echo reply mirroring the request's xid and payload.
pub fn encode_echo_reply(version: ProtocolVersion, xid: u32, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    put_header(
        &mut buf,
        version,
        OFPT_ECHO_REPLY,
        (HEADER_LEN + payload.len()) as u16,
        xid,
    );
    buf.put_slice(payload);
    buf.freeze()
}

/// Extract `(type, code)` from an OFPT_ERROR body.
pub fn decode_error(body: &[u8]) -> Result<(u16, u16), AdapterError> {
    if body.len() < 4 {
        return Err(AdapterError::Protocol(format!(
            "short error body: {} bytes",
            body.len()
        )));
    }
    Ok((
        u16::from_be_bytes([body[0], body[1]]),
        u16::from_be_bytes([body[2], body[3]]),
    ))
}

/// Encode an OpenFlow 1.0 FLOW_MOD.
///
/// Delete commands carry no actions regardless of `rule`.
pub fn encode_flow_mod_v10(
    command: FlowCommand,
    rule: &FlowRule,
    xid: u32,
) -> Result<Bytes, AdapterError> {
    let in_port = v10_port(rule.in_port)?;
    let outputs = match command {
        FlowCommand::Add => rule
            .actions
            .iter()
            .map(|FlowAction::Output(port)| v10_port(*port))
            .collect::<Result<Vec<_>, _>>()?,
        FlowCommand::Delete => Vec::new(),
    };

    let length =
        HEADER_LEN + OFP10_MATCH_LEN + 24 + outputs.len() * OFP10_ACTION_OUTPUT_LEN as usize;
    let mut buf = BytesMut::with_capacity(length);
    put_header(
        &mut buf,
        ProtocolVersion::OpenFlow10,
        OFPT_FLOW_MOD,
        length as u16,
        xid,
    );

    // ofp_match: everything wildcarded except in_port
    buf.put_u32(OFP10_FW_ALL & !OFP10_FW_IN_PORT);
    buf.put_u16(in_port);
    buf.put_bytes(0, OFP10_MATCH_LEN - 6);

    buf.put_u64(0); // cookie
    buf.put_u16(v10_command(command));
    buf.put_u16(0); // idle_timeout
    buf.put_u16(0); // hard_timeout
    buf.put_u16(OFP_DEFAULT_PRIORITY);
    buf.put_u32(OFP_NO_BUFFER);
    buf.put_u16(OFP10_PORT_NONE);
    buf.put_u16(0); // flags

    for port in outputs {
        buf.put_u16(OFPAT_OUTPUT);
        buf.put_u16(OFP10_ACTION_OUTPUT_LEN);
        buf.put_u16(port);
        buf.put_u16(OFPCML_MAX);
    }

    debug_assert_eq!(buf.len(), length);
    Ok(buf.freeze())
}

/// Encode an OpenFlow 1.2 or 1.3 FLOW_MOD.
///
/// The two versions share the flow-mod layout, OXM match and
/// apply-actions instruction.
pub fn encode_flow_mod_oxm(
    version: ProtocolVersion,
    command: FlowCommand,
    rule: &FlowRule,
    xid: u32,
) -> Result<Bytes, AdapterError> {
    if !matches!(
        version,
        ProtocolVersion::OpenFlow12 | ProtocolVersion::OpenFlow13
    ) {
        return Err(AdapterError::Encode(format!(
            "OXM flow-mod encoding does not cover {}",
            version
        )));
    }

    let in_port = oxm_port(rule.in_port)?;
    let outputs = match command {
        FlowCommand::Add => rule
            .actions
            .iter()
            .map(|FlowAction::Output(port)| oxm_port(*port))
            .collect::<Result<Vec<_>, _>>()?,
        FlowCommand::Delete => Vec::new(),
    };

    // match header (4) + one in_port OXM (8), padded to 8 bytes
    let match_len: u16 = 4 + 8;
    let match_padded = 16;
    let instructions_len = if outputs.is_empty() {
        0
    } else {
        8 + outputs.len() * OFP13_ACTION_OUTPUT_LEN as usize
    };
    let length = HEADER_LEN + 40 + match_padded + instructions_len;

    let mut buf = BytesMut::with_capacity(length);
    put_header(&mut buf, version, OFPT_FLOW_MOD, length as u16, xid);

    buf.put_u64(0); // cookie
    buf.put_u64(0); // cookie_mask
    buf.put_u8(0); // table_id
    buf.put_u8(oxm_command(command));
    buf.put_u16(0); // idle_timeout
    buf.put_u16(0); // hard_timeout
    buf.put_u16(OFP_DEFAULT_PRIORITY);
    buf.put_u32(OFP_NO_BUFFER);
    buf.put_u32(OFP13_PORT_ANY);
    buf.put_u32(OFP13_GROUP_ANY);
    buf.put_u16(0); // flags
    buf.put_bytes(0, 2);

    buf.put_u16(OFPMT_OXM);
    buf.put_u16(match_len);
    buf.put_u32(OXM_OF_IN_PORT);
    buf.put_u32(in_port);
    buf.put_bytes(0, match_padded - match_len as usize);

    if !outputs.is_empty() {
        buf.put_u16(OFPIT_APPLY_ACTIONS);
        buf.put_u16(instructions_len as u16);
        buf.put_bytes(0, 4);
        for port in outputs {
            buf.put_u16(OFPAT_OUTPUT);
            buf.put_u16(OFP13_ACTION_OUTPUT_LEN);
            buf.put_u32(port);
            buf.put_u16(OFPCML_MAX);
            buf.put_bytes(0, 6);
        }
    }

    debug_assert_eq!(buf.len(), length);
    Ok(buf.freeze())
}

fn put_header(buf: &mut BytesMut, version: ProtocolVersion, msg_type: u8, length: u16, xid: u32) {
    buf.put_u8(version.wire_version());
    buf.put_u8(msg_type);
    buf.put_u16(length);
    buf.put_u32(xid);
}

fn v10_port(port: PortNo) -> Result<u16, AdapterError> {
    if port > OFP10_PORT_MAX {
        return Err(AdapterError::Encode(format!(
            "port {} out of range for OpenFlow 1.0",
            port
        )));
    }
    Ok(port as u16)
}

fn oxm_port(port: PortNo) -> Result<u32, AdapterError> {
    if port > OFP13_PORT_MAX {
        return Err(AdapterError::Encode(format!(
            "port {} is a reserved port number",
            port
        )));
    }
    Ok(port)
}

fn v10_command(command: FlowCommand) -> u16 {
    oxm_command(command) as u16
}

fn oxm_command(command: FlowCommand) -> u8 {
    match command {
        FlowCommand::Add => OFPFC_ADD,
        FlowCommand::Delete => OFPFC_DELETE,
    }
}
