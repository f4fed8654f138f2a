//! Tuya lan protocol driver
//! protocol versions 3.1 and 3.3, tcp port 6668
//!
//! 3.3: every payload is AES-128-ECB encrypted, device pushes lead with "3.3" + 12 bytes
//! 3.1: requests are plain json, device pushes are "3.1" + md5 slice + base64 cipher text

pub mod entity;
pub mod cipher;
pub mod codec;
pub mod tuya_transport;
