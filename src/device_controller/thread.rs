use std::thread;
use crate::common::error::{ErrorCode, ProxyError};
use super::supervisor::Supervisor;
use crate::info;

const LOG_TAG: &str = "supervisor_thread";
const THREAD_NAME: &str = "tuya-worker";

/// start the supervisor on its own thread with a current thread tokio runtime
/// the thread runs for the life of the process and is never joined
pub fn supervisor_thread(supervisor: Supervisor) -> Result<thread::JoinHandle<()>, ProxyError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ProxyError::new(ErrorCode::StartupError, format!("cannot init tokio runtime: {}", e)))?;

    let handle = thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || {
            info!(LOG_TAG, "supervisor thread started");
            rt.block_on(supervisor.run());
        })
        .map_err(|e| ProxyError::new(ErrorCode::StartupError, format!("cannot spawn supervisor thread: {}", e)))?;
    Ok(handle)
}
