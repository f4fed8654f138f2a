mod http_server;
mod common;
mod driver;
mod device_controller;
mod entity;
mod util;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use dotenv::dotenv;
use common::setting::Settings;
use common::logger::init_logger;
use device_controller::device_state::DeviceState;
use device_controller::field_mapping::FieldMapping;
use device_controller::supervisor::{Supervisor, SupervisorOptions};
use device_controller::thread::supervisor_thread;
use driver::dummy::dummy_transport::DummyTransport;
use driver::traits::Transport;
use driver::tuya::tuya_transport::TuyaTransport;
use entity::bo::device_identity_bo::DeviceIdentity;

const LOG_TAG: &str = "main";

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // load .env if present
    dotenv().ok();

    // load config
    let settings = Settings::load()?;

    // set up logger
    init_logger(settings.env.log_level.as_str())?;
    info!(LOG_TAG, "config loaded, device: {}", settings.device.device_id);
    debug!(LOG_TAG, "web: {:?}, supervisor: {:?}", settings.web, settings.supervisor);

    let identity = DeviceIdentity::from_settings(&settings.device)?;
    let mapping = FieldMapping::from_settings(&settings.mapping)?;
    let state = Arc::new(DeviceState::new(identity.device_id.as_str(), mapping));

    // start the supervisor on its own thread, it never returns
    let poll_interval = Duration::from_millis(settings.supervisor.poll_millis);
    let transport: Box<dyn Transport> = if std::env::var("mode").unwrap_or_default() == "dummy" {
        warn!(LOG_TAG, "dummy mode, telemetry is synthetic");
        Box::new(DummyTransport::new(poll_interval))
    } else {
        Box::new(TuyaTransport::new(
            Duration::from_secs(settings.supervisor.connect_timeout_secs),
            poll_interval,
        ))
    };
    let options = SupervisorOptions::from(&settings.supervisor);
    supervisor_thread(Supervisor::new(transport, identity, state.clone(), options))?;

    // serve snapshots
    http_server::server::run(&settings.web.hosts, settings.web.port, state).await?;

    Ok(())
}
