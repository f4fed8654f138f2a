//! identity of the device the proxy talks to, immutable after startup

use std::fmt::{Display, Formatter};
use std::fmt;
use std::str::FromStr;
use crate::common::error::{ErrorCode, ProxyError};
use crate::common::setting::Device;

/// length of the AES key shared with the device
pub const LOCAL_KEY_LEN: usize = 16;

/// supported lan protocol versions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtocolVersion {
    V31,
    V33,
}

impl ProtocolVersion {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            ProtocolVersion::V31 => b"3.1",
            ProtocolVersion::V33 => b"3.3",
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3.1" => Ok(ProtocolVersion::V31),
            "3.3" => Ok(ProtocolVersion::V33),
            other => Err(ProxyError::new(
                ErrorCode::DeviceIdentityError,
                format!("unsupported protocol version: {}", other),
            )),
        }
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ProtocolVersion::V31 => write!(f, "3.1"),
            ProtocolVersion::V33 => write!(f, "3.3"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub ip_address: String,
    pub port: u16,
    pub local_key: String,
    pub version: ProtocolVersion,
}

impl DeviceIdentity {
    pub fn from_settings(device: &Device) -> Result<Self, ProxyError> {
        if device.device_id.is_empty() {
            return Err(ProxyError::new(ErrorCode::DeviceIdentityError, "device_id is empty"));
        }
        if device.local_key.as_bytes().len() != LOCAL_KEY_LEN {
            return Err(ProxyError::new(
                ErrorCode::DeviceIdentityError,
                format!("local_key must be {} bytes, got {}", LOCAL_KEY_LEN, device.local_key.len()),
            ));
        }
        Ok(DeviceIdentity {
            device_id: device.device_id.clone(),
            ip_address: device.ip_address.clone(),
            port: device.port,
            local_key: device.local_key.clone(),
            version: device.version.parse()?,
        })
    }

    /// `ip:port` of the device
    pub fn address(&self) -> String {
        if self.ip_address.contains(':') {
            format!("[{}]:{}", self.ip_address, self.port)
        } else {
            format!("{}:{}", self.ip_address, self.port)
        }
    }
}
