//! connection supervisor
//! keeps one session to the device alive for the life of the process
//! - connect, ask for the full status, then receive frames forever
//! - heartbeat once per silent interval
//! - any failure marks the device disconnected, waits the backoff and starts over

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use crate::common::error::DriverError;
use crate::common::setting;
use crate::driver::traits::{Received, Session, Transport};
use crate::entity::bo::device_identity_bo::DeviceIdentity;
use super::device_state::DeviceState;
use crate::{debug, info, warn};

const LOG_TAG: &str = "supervisor";

#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    // pause between two connect cycles
    pub backoff: Duration,
    // silence after which a heartbeat is sent
    pub heartbeat_after: Duration,
}

impl From<&setting::Supervisor> for SupervisorOptions {
    fn from(settings: &setting::Supervisor) -> Self {
        SupervisorOptions {
            backoff: Duration::from_secs(settings.backoff_secs),
            heartbeat_after: Duration::from_secs(settings.heartbeat_secs),
        }
    }
}

pub struct Supervisor {
    transport: Box<dyn Transport>,
    identity: DeviceIdentity,
    state: Arc<DeviceState>,
    options: SupervisorOptions,
}

impl Supervisor {
    pub fn new(
        transport: Box<dyn Transport>,
        identity: DeviceIdentity,
        state: Arc<DeviceState>,
        options: SupervisorOptions,
    ) -> Self {
        Supervisor { transport, identity, state, options }
    }

    /// run connect cycles forever, never returns
    pub async fn run(self) {
        info!(LOG_TAG, "supervisor starting for device {}", self.identity.device_id);
        loop {
            if let Err(e) = self.run_cycle().await {
                warn!(LOG_TAG, "session ended: {}, retrying in {:?}", e, self.options.backoff);
            }
            self.state.set_connected(false);
            tokio::time::sleep(self.options.backoff).await;
        }
    }

    /// one connect cycle, returns only with the error that ended it
    async fn run_cycle(&self) -> Result<(), DriverError> {
        let mut session = self.transport.connect(&self.identity).await?;
        info!(LOG_TAG, "session opened to device {}", self.identity.device_id);
        let result = self.receive_loop(session.as_mut()).await;
        session.close().await;
        result
    }

    async fn receive_loop(&self, session: &mut dyn Session) -> Result<(), DriverError> {
        session.send_status_request().await?;
        // last frame received or heartbeat sent
        let mut last_activity = Instant::now();

        loop {
            match session.receive().await? {
                Received::Frame(frame) => {
                    self.state.update(&frame);
                    last_activity = Instant::now();
                    if let Some(err) = frame.error {
                        return Err(DriverError(format!("device reported error: {}", err)));
                    }
                }
                Received::NoData => {
                    if last_activity.elapsed() > self.options.heartbeat_after {
                        debug!(LOG_TAG, "no data for {:?}, sending heartbeat", last_activity.elapsed());
                        session.send_heartbeat().await?;
                        last_activity = Instant::now();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use crate::device_controller::field_mapping::FieldMapping;
    use crate::entity::bo::device_identity_bo::ProtocolVersion;
    use crate::entity::bo::telemetry_frame_bo::TelemetryFrame;

    const POLL: Duration = Duration::from_secs(1);

    enum Step {
        Frame(Value),
        Fail,
    }

    /// transport playing one script per successful connect
    #[derive(Default)]
    struct ScriptedTransport {
        failing_connects: AtomicUsize,
        connects: Arc<AtomicUsize>,
        heartbeats: Arc<AtomicUsize>,
        status_requests: Arc<AtomicUsize>,
        scripts: Mutex<VecDeque<Vec<Step>>>,
    }

    struct ScriptedSession {
        steps: VecDeque<Step>,
        heartbeats: Arc<AtomicUsize>,
        status_requests: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn connect(&self, _identity: &DeviceIdentity) -> Result<Box<dyn Session>, DriverError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let failing = self.failing_connects.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_connects.store(failing - 1, Ordering::SeqCst);
                return Err(DriverError("device unreachable".to_string()));
            }
            let steps = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
            Ok(Box::new(ScriptedSession {
                steps: steps.into(),
                heartbeats: self.heartbeats.clone(),
                status_requests: self.status_requests.clone(),
            }))
        }
    }

    #[async_trait]
    impl Session for ScriptedSession {
        async fn send_status_request(&mut self) -> Result<(), DriverError> {
            self.status_requests.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_heartbeat(&mut self) -> Result<(), DriverError> {
            self.heartbeats.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn receive(&mut self) -> Result<Received, DriverError> {
            match self.steps.pop_front() {
                Some(Step::Frame(value)) => Ok(Received::Frame(TelemetryFrame::from_json(&value))),
                Some(Step::Fail) => Err(DriverError("connection reset".to_string())),
                None => {
                    tokio::time::sleep(POLL).await;
                    Ok(Received::NoData)
                }
            }
        }
    }

    struct Harness {
        state: Arc<DeviceState>,
        connects: Arc<AtomicUsize>,
        heartbeats: Arc<AtomicUsize>,
        status_requests: Arc<AtomicUsize>,
        handle: tokio::task::JoinHandle<()>,
    }

    fn start(failing_connects: usize, scripts: Vec<Vec<Step>>) -> Harness {
        let transport = ScriptedTransport {
            failing_connects: AtomicUsize::new(failing_connects),
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        };
        let connects = transport.connects.clone();
        let heartbeats = transport.heartbeats.clone();
        let status_requests = transport.status_requests.clone();

        let identity = DeviceIdentity {
            device_id: "abc123".to_string(),
            ip_address: "127.0.0.1".to_string(),
            port: 6668,
            local_key: "0123456789abcdef".to_string(),
            version: ProtocolVersion::V33,
        };
        let state = Arc::new(DeviceState::new("abc123", FieldMapping::heat_pump()));
        let options = SupervisorOptions {
            backoff: Duration::from_secs(10),
            heartbeat_after: Duration::from_secs(10),
        };
        let supervisor = Supervisor::new(Box::new(transport), identity, state.clone(), options);
        let handle = tokio::spawn(supervisor.run());
        Harness { state, connects, heartbeats, status_requests, handle }
    }

    async fn sleep_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_and_merge() {
        let harness = start(0, vec![vec![Step::Frame(json!({"dps": {"1": true, "4": 215}}))]]);
        sleep_secs(1).await;

        let snapshot = harness.state.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.mapped_values.get("switch"), Some(&json!(1)));
        let temp_set = snapshot.mapped_values.get("temp_set").and_then(Value::as_f64).unwrap();
        assert!((temp_set - 21.5).abs() < 1e-9);
        assert_eq!(harness.status_requests.load(Ordering::SeqCst), 1);
        harness.handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_frame_reconnects_after_backoff() {
        let harness = start(
            0,
            vec![
                vec![
                    Step::Frame(json!({"dps": {"1": true, "4": 215}})),
                    Step::Frame(json!({"Err": "timeout"})),
                ],
                vec![Step::Frame(json!({"dps": {"2": "Heating"}}))],
            ],
        );

        sleep_secs(5).await;
        let snapshot = harness.state.snapshot();
        assert!(!snapshot.connected);
        assert_eq!(snapshot.mapped_values.get("switch"), Some(&json!(1)));
        assert!(snapshot.mapped_values.contains_key("temp_set"));
        assert_eq!(harness.connects.load(Ordering::SeqCst), 1);

        sleep_secs(10).await;
        let snapshot = harness.state.snapshot();
        assert!(snapshot.connected);
        assert_eq!(harness.connects.load(Ordering::SeqCst), 2);
        assert_eq!(harness.status_requests.load(Ordering::SeqCst), 2);
        assert_eq!(snapshot.mapped_values.get("mode"), Some(&json!(1)));
        assert_eq!(snapshot.mapped_values.get("switch"), Some(&json!(1)));
        harness.handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failures_retry_forever() {
        let harness = start(2, vec![vec![Step::Frame(json!({"dps": {"16": 223}}))]]);

        sleep_secs(15).await;
        assert!(!harness.state.snapshot().connected);
        assert_eq!(harness.connects.load(Ordering::SeqCst), 2);

        sleep_secs(10).await;
        let snapshot = harness.state.snapshot();
        assert!(snapshot.connected);
        assert_eq!(harness.connects.load(Ordering::SeqCst), 3);
        let temp = snapshot.mapped_values.get("temp_current").and_then(Value::as_f64).unwrap();
        assert!((temp - 22.3).abs() < 1e-9);
        harness.handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_failure_keeps_values() {
        let harness = start(
            0,
            vec![vec![Step::Frame(json!({"dps": {"1": true, "17": "on"}})), Step::Fail]],
        );

        sleep_secs(5).await;
        let snapshot = harness.state.snapshot();
        assert!(!snapshot.connected);
        assert_eq!(snapshot.mapped_values.get("work_state"), Some(&json!("on")));
        harness.handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_label_does_not_stop_the_loop() {
        let harness = start(
            0,
            vec![vec![
                Step::Frame(json!({"dps": {"2": "Heating"}})),
                Step::Frame(json!({"dps": {"2": "Unknown", "1": false}})),
            ]],
        );

        sleep_secs(5).await;
        let snapshot = harness.state.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.mapped_values.get("mode"), Some(&json!("Unknown")));
        assert_eq!(snapshot.mapped_values.get("switch"), Some(&json!(0)));
        assert_eq!(harness.connects.load(Ordering::SeqCst), 1);
        harness.handle.abort();
    }

    // one heartbeat per silent interval, not one per poll
    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_once_per_interval() {
        let harness = start(0, vec![vec![Step::Frame(json!({"dps": {"1": true}}))]]);

        sleep_secs(5).await;
        assert_eq!(harness.heartbeats.load(Ordering::SeqCst), 0);

        sleep_secs(30).await;
        assert_eq!(harness.heartbeats.load(Ordering::SeqCst), 3);
        assert_eq!(harness.connects.load(Ordering::SeqCst), 1);
        assert!(harness.state.snapshot().connected);
        harness.handle.abort();
    }
}
