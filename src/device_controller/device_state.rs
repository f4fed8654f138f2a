//! device state store
//! - single writer: the connection supervisor
//! - any number of readers: the http server workers
//! - a frame, the connected flag and the timestamp are applied under one lock

use std::sync::{Mutex, MutexGuard, PoisonError};
use serde_json::{Map, Value};
use crate::entity::bo::telemetry_frame_bo::TelemetryFrame;
use crate::entity::dto::snapshot_dto::SnapshotDto;
use super::field_mapping::FieldMapping;
use crate::{debug, info};

const LOG_TAG: &str = "device_state";

#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    // last update, seconds since epoch
    pub timestamp: i64,
    pub connected: bool,
    // field code -> last seen raw value, never cleared
    pub raw_fields: Map<String, Value>,
    // semantic name -> last seen mapped value, never cleared
    pub mapped_values: Map<String, Value>,
}

impl DeviceSnapshot {
    fn new() -> Self {
        DeviceSnapshot {
            timestamp: now_timestamp(),
            ..Default::default()
        }
    }

    /// fold the incoming fields into raw and mapped values, last write wins
    fn merge_fields(&mut self, dps: &Map<String, Value>, mapping: &FieldMapping) {
        for (code, value) in dps.iter() {
            self.raw_fields.insert(code.clone(), value.clone());
            if let Some((name, mapped)) = mapping.transform(code, value) {
                self.mapped_values.insert(name, mapped);
            }
        }
    }
}

pub struct DeviceState {
    device_id: String,
    mapping: FieldMapping,
    snapshot: Mutex<DeviceSnapshot>,
}

impl DeviceState {
    pub fn new(device_id: &str, mapping: FieldMapping) -> Self {
        DeviceState {
            device_id: device_id.to_string(),
            mapping,
            snapshot: Mutex::new(DeviceSnapshot::new()),
        }
    }

    /// apply one received frame
    /// - an error indicator forces disconnected, even if fields are present
    /// - otherwise any field forces connected
    pub fn update(&self, frame: &TelemetryFrame) {
        let mut guard = self.lock();
        if let Some(err) = frame.error.as_ref() {
            if guard.connected {
                info!(LOG_TAG, "device reported error {}, marking disconnected", err);
            }
            guard.connected = false;
        } else if frame.has_fields() {
            if !guard.connected {
                info!(LOG_TAG, "device {} connected", self.device_id);
            }
            guard.connected = true;
        }
        if let Some(dps) = frame.dps.as_ref() {
            debug!(LOG_TAG, "merging dps: {:?}", dps);
            guard.merge_fields(dps, &self.mapping);
        }
        guard.timestamp = now_timestamp();
    }

    /// record a connectivity change without telemetry
    pub fn set_connected(&self, connected: bool) {
        let mut guard = self.lock();
        if guard.connected != connected {
            info!(LOG_TAG, "device {} connected: {}", self.device_id, connected);
        }
        guard.connected = connected;
        guard.timestamp = now_timestamp();
    }

    /// consistent copy of the whole state
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.lock().clone()
    }

    /// flat view served to readers
    pub fn to_dto(&self) -> SnapshotDto {
        let guard = self.lock();
        SnapshotDto {
            timestamp: guard.timestamp,
            device_id: self.device_id.clone(),
            connected: if guard.connected { 1 } else { 0 },
            values: guard.mapped_values.clone(),
        }
    }

    // every update completes inside one critical section, so a poisoned lock still holds a whole snapshot
    fn lock(&self) -> MutexGuard<'_, DeviceSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
