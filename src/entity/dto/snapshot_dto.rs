//! snapshot data transmission object, served by the http server

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDto {
    // last update, seconds since epoch
    pub timestamp: i64,
    pub device_id: String,
    // 1 while the receive loop processes frames, otherwise 0
    pub connected: u8,
    // mapped field values, flattened into the top level object
    #[serde(flatten)]
    pub values: Map<String, Value>,
}
