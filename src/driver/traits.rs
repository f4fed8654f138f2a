use async_trait::async_trait;
use crate::common::error::DriverError;
use crate::entity::bo::device_identity_bo::DeviceIdentity;
use crate::entity::bo::telemetry_frame_bo::TelemetryFrame;

/// result of one receive call
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Frame(TelemetryFrame),
    // poll interval elapsed, or the device only acknowledged a request
    NoData,
}

/// opens sessions to the device
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, identity: &DeviceIdentity) -> Result<Box<dyn Session>, DriverError>;
}

/// one persistent session, replies to requests arrive through `receive`
#[async_trait]
pub trait Session: Send {
    /// ask for the full field set, fire and forget
    async fn send_status_request(&mut self) -> Result<(), DriverError>;

    /// liveness probe, fire and forget
    async fn send_heartbeat(&mut self) -> Result<(), DriverError>;

    /// wait up to the poll interval for the next frame
    async fn receive(&mut self) -> Result<Received, DriverError>;

    /// release the session
    async fn close(&mut self) {}
}
