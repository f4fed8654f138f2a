pub mod device_identity_bo;
pub mod telemetry_frame_bo;
