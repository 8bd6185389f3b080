//! TCP Switch Channel
//!
//! Delivers a flow-mod over a short-lived OpenFlow connection to the
//! switch's management address and waits for the barrier reply.

use super::adapter::XidGenerator;
use super::codec::{self, OfpHeader, HEADER_LEN};
use crate::domain::entities::SwitchHandle;
use crate::domain::error::AdapterError;
use crate::domain::ports::SwitchChannel;
use crate::domain::value_objects::ProtocolVersion;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Switch channel opening one TCP connection per delivered message.
///
/// The exchange is: HELLO both ways, FLOW_MOD, BARRIER_REQUEST, then wait
/// for the BARRIER_REPLY. An OFPT_ERROR referencing either request fails
/// the delivery. Callers bound the whole exchange with a timeout.
pub struct TcpSwitchChannel {
    xids: Arc<XidGenerator>,
}

impl TcpSwitchChannel {
    pub fn new(xids: Arc<XidGenerator>) -> Self {
        Self { xids }
    }
}

#[async_trait]
impl SwitchChannel for TcpSwitchChannel {
    async fn deliver(&self, switch: &SwitchHandle, message: Bytes) -> Result<(), AdapterError> {
        let mut stream = TcpStream::connect(&switch.address).await?;
        stream.set_nodelay(true)?;
        tracing::debug!("connected to dpid={} at {}", switch.dpid, switch.address);

        transact(
            &mut stream,
            switch.version,
            message,
            self.xids.next(),
            self.xids.next(),
        )
        .await
    }
}

/// Run the hello / request / barrier exchange on an established stream.
pub async fn transact<S>(
    stream: &mut S,
    version: ProtocolVersion,
    message: Bytes,
    hello_xid: u32,
    barrier_xid: u32,
) -> Result<(), AdapterError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = OfpHeader::parse(&message)?;

    stream
        .write_all(&codec::encode_hello(version, hello_xid))
        .await?;

    // Wait for the switch's HELLO before sending anything else.
    loop {
        let (header, body) = read_message(stream).await?;
        match header.msg_type {
            codec::OFPT_HELLO => {
                if header.version < version.wire_version() {
                    return Err(AdapterError::Protocol(format!(
                        "switch offered version 0x{:02x}, need {}",
                        header.version, version
                    )));
                }
                break;
            }
            codec::OFPT_ERROR => {
                let (err_type, err_code) = codec::decode_error(&body)?;
                return Err(AdapterError::Rejected { err_type, err_code });
            }
            codec::OFPT_ECHO_REQUEST => {
                answer_echo(stream, version, header.xid, &body).await?;
            }
            other => {
                tracing::debug!("ignoring message type {} before hello", other);
            }
        }
    }

    let (barrier_request, barrier_reply) = codec::barrier_types(version);
    stream.write_all(&message).await?;
    stream
        .write_all(&codec::encode_empty(version, barrier_request, barrier_xid))
        .await?;
    stream.flush().await?;

    loop {
        let (header, body) = read_message(stream).await?;
        match header.msg_type {
            codec::OFPT_ERROR if header.xid == request.xid || header.xid == barrier_xid => {
                let (err_type, err_code) = codec::decode_error(&body)?;
                tracing::debug!(
                    "switch error for xid={}: type={} code={}",
                    header.xid,
                    err_type,
                    err_code
                );
                return Err(AdapterError::Rejected { err_type, err_code });
            }
            codec::OFPT_ECHO_REQUEST => {
                answer_echo(stream, version, header.xid, &body).await?;
            }
            t if t == barrier_reply && header.xid == barrier_xid => return Ok(()),
            other => {
                tracing::debug!("ignoring message type {} xid={}", other, header.xid);
            }
        }
    }
}

async fn read_message<S>(stream: &mut S) -> Result<(OfpHeader, Vec<u8>), AdapterError>
where
    S: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; HEADER_LEN];
    stream.read_exact(&mut header_buf).await?;
    let header = OfpHeader::parse(&header_buf)?;

    let mut body = vec![0u8; header.body_len()];
    stream.read_exact(&mut body).await?;
    Ok((header, body))
}

async fn answer_echo<S>(
    stream: &mut S,
    version: ProtocolVersion,
    xid: u32,
    payload: &[u8],
) -> Result<(), AdapterError>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(&codec::encode_echo_reply(version, xid, payload))
        .await?;
    Ok(())
}
