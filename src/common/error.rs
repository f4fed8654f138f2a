use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // config file missing or malformed
    ConfigError = 1001,
    // device identity rejected (bad local key, unsupported protocol version)
    DeviceIdentityError = 1002,
    // field mapping override rejected
    FieldMappingError = 1003,
    // worker thread or runtime could not start
    StartupError = 1004,
}

/// startup error of the proxy, fatal to the process
#[derive(Debug)]
pub struct ProxyError {
    pub code: ErrorCode,
    pub msg: String,
}

impl ProxyError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        ProxyError { code, msg: msg.into() }
    }
}

impl Display for ProxyError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "proxy error code: {}, msg: {}", self.code as u16, self.msg)
    }
}

impl Error for ProxyError {}

// device driver error, recovered by the supervisor
#[derive(Debug)]
pub struct DriverError(pub String);

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "device driver error msg: {}", self.0)
    }
}

impl Error for DriverError {}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError(format!("io error: {}", e))
    }
}
