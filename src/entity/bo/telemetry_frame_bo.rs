//! one decoded unit received from the device session

use serde_json::{Map, Value};
use crate::util::json::{find_dps, get_error_str};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    // field code -> raw value
    pub dps: Option<Map<String, Value>>,
    // error reported by the device or by payload decoding
    pub error: Option<String>,
}

impl TelemetryFrame {
    pub fn telemetry(dps: Map<String, Value>) -> Self {
        TelemetryFrame { dps: Some(dps), error: None }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        TelemetryFrame { dps: None, error: Some(msg.into()) }
    }

    /// build a frame from a device payload like `{"devId": .., "dps": {..}}`
    /// or an error object like `{"Err": "904", "Error": ".."}`
    pub fn from_json(value: &Value) -> Self {
        TelemetryFrame {
            dps: find_dps(value).cloned(),
            error: get_error_str(value),
        }
    }

    /// the frame carries at least one field
    pub fn has_fields(&self) -> bool {
        self.dps.as_ref().map_or(false, |dps| !dps.is_empty())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
