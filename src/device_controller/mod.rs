//! device controller module
//! - keeps the device state store up to date from the device session
//! - maps raw field codes to named values
//! - supervises the connection, reconnecting and probing as needed

pub mod device_state;
pub mod field_mapping;
pub mod supervisor;
pub mod thread;
