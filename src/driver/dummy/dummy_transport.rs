//! dummy transport, used with env `mode=dummy` when no device is reachable
//! pretends to be a heat pump slowly warming its water

use std::collections::VecDeque;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use crate::common::error::DriverError;
use crate::driver::traits::{Received, Session, Transport};
use crate::entity::bo::device_identity_bo::DeviceIdentity;
use crate::entity::bo::telemetry_frame_bo::TelemetryFrame;
use crate::{debug, info};

const LOG_TAG: &str = "dummy_transport";

// a temperature reading is pushed every PUSH_EVERY polls
const PUSH_EVERY: u64 = 3;

pub struct DummyTransport {
    poll_interval: Duration,
}

impl DummyTransport {
    pub fn new(poll_interval: Duration) -> Self {
        DummyTransport { poll_interval }
    }
}

#[async_trait]
impl Transport for DummyTransport {
    async fn connect(&self, identity: &DeviceIdentity) -> Result<Box<dyn Session>, DriverError> {
        info!(LOG_TAG, "dummy mode, device {} will not be contacted", identity.device_id);
        Ok(Box::new(DummySession {
            poll_interval: self.poll_interval,
            tick: 0,
            pending: VecDeque::new(),
        }))
    }
}

pub struct DummySession {
    poll_interval: Duration,
    tick: u64,
    pending: VecDeque<TelemetryFrame>,
}

impl DummySession {
    // raw temperature in tenths of a degree
    fn current_temp(&self) -> i64 {
        200 + (self.tick % 50) as i64
    }

    fn status_dps(&self) -> Map<String, Value> {
        let status = json!({
            "1": true,
            "2": "Heating",
            "4": 215,
            "5": "Smart",
            "15": 0,
            "16": self.current_temp(),
            "17": "on",
            "25": 18,
        });
        match status {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[async_trait]
impl Session for DummySession {
    async fn send_status_request(&mut self) -> Result<(), DriverError> {
        let dps = self.status_dps();
        self.pending.push_back(TelemetryFrame::telemetry(dps));
        Ok(())
    }

    async fn send_heartbeat(&mut self) -> Result<(), DriverError> {
        debug!(LOG_TAG, "heartbeat");
        Ok(())
    }

    async fn receive(&mut self) -> Result<Received, DriverError> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(Received::Frame(frame));
        }
        tokio::time::sleep(self.poll_interval).await;
        self.tick += 1;
        if self.tick % PUSH_EVERY != 0 {
            return Ok(Received::NoData);
        }
        let mut dps = Map::new();
        dps.insert("16".to_string(), Value::from(self.current_temp()));
        Ok(Received::Frame(TelemetryFrame::telemetry(dps)))
    }
}
