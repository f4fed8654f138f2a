//! device driver module
//! - traits: transport and session seams used by the connection supervisor
//! - tuya: tuya lan protocol over tcp
//! - dummy: synthetic device for `mode=dummy`

pub mod traits;
pub mod tuya;
pub mod dummy;
