//! tuya lan transport
//! - one persistent tcp session per connect
//! - requests are fire and forget, every reply comes back through `receive`
//! - payloads are json, encrypted with the local key depending on the protocol version

use std::time::Duration;
use async_trait::async_trait;
use data_encoding::BASE64;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use super::cipher::TuyaCipher;
use super::codec::TuyaCodec;
use super::entity::*;
use crate::common::error::DriverError;
use crate::driver::traits::{Received, Session, Transport};
use crate::entity::bo::device_identity_bo::{DeviceIdentity, ProtocolVersion};
use crate::entity::bo::telemetry_frame_bo::TelemetryFrame;
use crate::{debug, info, trace, warn};

const LOG_TAG: &str = "tuya_transport";

pub struct TuyaTransport {
    connect_timeout: Duration,
    poll_interval: Duration,
}

impl TuyaTransport {
    pub fn new(connect_timeout: Duration, poll_interval: Duration) -> Self {
        TuyaTransport { connect_timeout, poll_interval }
    }
}

#[async_trait]
impl Transport for TuyaTransport {
    async fn connect(&self, identity: &DeviceIdentity) -> Result<Box<dyn Session>, DriverError> {
        let cipher = TuyaCipher::new(&identity.local_key)?;
        let address = identity.address();
        info!(LOG_TAG, "connecting to device {} at {}, protocol {}", identity.device_id, address, identity.version);

        let stream = timeout(self.connect_timeout, TcpStream::connect(address.as_str()))
            .await
            .map_err(|_| DriverError(format!("connect to {} timed out", address)))??;
        stream.set_nodelay(true)?;

        Ok(Box::new(TuyaSession {
            framed: Framed::new(stream, TuyaCodec),
            cipher,
            device_id: identity.device_id.clone(),
            version: identity.version,
            seqno: 0,
            poll_interval: self.poll_interval,
        }))
    }
}

pub struct TuyaSession {
    framed: Framed<TcpStream, TuyaCodec>,
    cipher: TuyaCipher,
    device_id: String,
    version: ProtocolVersion,
    seqno: u32,
    poll_interval: Duration,
}

impl TuyaSession {
    async fn send_command(&mut self, cmd: TuyaCommand, payload: Value) -> Result<(), DriverError> {
        let json = serde_json::to_vec(&payload)
            .map_err(|e| DriverError(format!("cannot serialize payload: {}", e)))?;
        let payload = match self.version {
            ProtocolVersion::V31 => json,
            ProtocolVersion::V33 => self.cipher.encrypt(&json)?,
        };
        self.seqno = self.seqno.wrapping_add(1);
        trace!(LOG_TAG, "send command {:?}, seqno {}", cmd, self.seqno);
        self.framed
            .send(TuyaMessage {
                seqno: self.seqno,
                cmd: cmd as u32,
                retcode: None,
                payload,
            })
            .await?;
        Ok(())
    }

    /// turn one device message into a frame, undecodable payloads become error frames
    fn decode_message(&self, msg: TuyaMessage) -> Received {
        trace!(LOG_TAG, "got message {:?} ({:#04x}), seqno {}, retcode {:?}, {} bytes",
            TuyaCommand::from_u32(msg.cmd), msg.cmd, msg.seqno, msg.retcode, msg.payload.len());
        let retcode = msg.retcode.unwrap_or(0);

        if msg.payload.is_empty() {
            if retcode != 0 {
                return Received::Frame(TelemetryFrame::error(format!("device returned code {}", retcode)));
            }
            debug!(LOG_TAG, "empty payload, command {:#04x} acknowledged", msg.cmd);
            return Received::NoData;
        }

        let plain = match self.decode_payload(&msg.payload) {
            Ok(plain) => plain,
            Err(e) if retcode != 0 => {
                // some firmwares answer with plain text errors
                let text = String::from_utf8_lossy(&msg.payload).to_string();
                warn!(LOG_TAG, "device returned code {}: {} ({})", retcode, text, e);
                return Received::Frame(TelemetryFrame::error(text));
            }
            Err(e) => {
                warn!(LOG_TAG, "unexpected payload: {}", e);
                return Received::Frame(TelemetryFrame::error(format!("unexpected payload: {}", e)));
            }
        };

        match serde_json::from_slice::<Value>(&plain) {
            Ok(value) => {
                debug!(LOG_TAG, "device payload: {}", value);
                let mut frame = TelemetryFrame::from_json(&value);
                if retcode != 0 && !frame.is_error() {
                    frame.error = Some(format!("device returned code {}", retcode));
                }
                Received::Frame(frame)
            }
            Err(e) => {
                let text = String::from_utf8_lossy(&plain).to_string();
                warn!(LOG_TAG, "payload is not json: {}, error: {}", text, e);
                Received::Frame(TelemetryFrame::error(format!("invalid json payload: {}", text)))
            }
        }
    }

    fn decode_payload(&self, payload: &[u8]) -> Result<Vec<u8>, DriverError> {
        match self.version {
            ProtocolVersion::V31 => {
                if payload.starts_with(b"{") {
                    return Ok(payload.to_vec());
                }
                if !payload.starts_with(ProtocolVersion::V31.as_bytes()) {
                    return Err(DriverError("3.1 payload without version header".to_string()));
                }
                let body = &payload[3..];
                if body.len() < V31_DIGEST_LEN {
                    return Err(DriverError("3.1 payload too short".to_string()));
                }
                let (digest, encoded) = body.split_at(V31_DIGEST_LEN);
                if digest != self.cipher.v31_digest(encoded).as_bytes() {
                    return Err(DriverError("3.1 payload digest mismatch".to_string()));
                }
                let encrypted = BASE64
                    .decode(encoded)
                    .map_err(|e| DriverError(format!("invalid base64 payload: {}", e)))?;
                self.cipher.decrypt(&encrypted)
            }
            ProtocolVersion::V33 => {
                let encrypted = if payload.starts_with(ProtocolVersion::V33.as_bytes()) {
                    payload.get(VERSION_HEADER_LEN..).unwrap_or_default()
                } else {
                    payload
                };
                match self.cipher.decrypt(encrypted) {
                    Ok(plain) => Ok(plain),
                    // a few replies are sent unencrypted
                    Err(_) if payload.starts_with(b"{") => Ok(payload.to_vec()),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn request_payload(&self, with_time: bool) -> Value {
        if with_time {
            json!({
                "gwId": self.device_id,
                "devId": self.device_id,
                "uid": self.device_id,
                "t": chrono::Utc::now().timestamp().to_string(),
            })
        } else {
            json!({
                "gwId": self.device_id,
                "devId": self.device_id,
            })
        }
    }
}

#[async_trait]
impl Session for TuyaSession {
    async fn send_status_request(&mut self) -> Result<(), DriverError> {
        let payload = self.request_payload(true);
        self.send_command(TuyaCommand::DpQuery, payload).await
    }

    async fn send_heartbeat(&mut self) -> Result<(), DriverError> {
        let payload = self.request_payload(false);
        self.send_command(TuyaCommand::HeartBeat, payload).await
    }

    async fn receive(&mut self) -> Result<Received, DriverError> {
        match timeout(self.poll_interval, self.framed.next()).await {
            Err(_) => Ok(Received::NoData),
            Ok(None) => Err(DriverError("session closed by device".to_string())),
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(Some(Ok(msg))) => Ok(self.decode_message(msg)),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.framed.close().await {
            debug!(LOG_TAG, "error while closing session: {}", e);
        }
    }
}
