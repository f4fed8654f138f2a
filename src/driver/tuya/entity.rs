//! tuya lan protocol message
//!
//! 0x000055aa  seqno  cmd    len    [retcode]  payload  crc32  0x0000aa55
//! 4 bytes     4      4      4      4          len-8    4      4
//!
//! all integers are big endian, `len` counts everything after itself,
//! crc32 covers everything before the crc field

pub const PREFIX: u32 = 0x0000_55AA;
pub const SUFFIX: u32 = 0x0000_AA55;
pub const PREFIX_BYTES: [u8; 4] = [0x00, 0x00, 0x55, 0xAA];
pub const HEADER_LEN: usize = 16;
// crc32 + suffix
pub const TRAILER_LEN: usize = 8;
pub const MAX_MESSAGE_LEN: usize = 4096;
// "3.3" followed by 12 bytes of padding on device pushes
pub const VERSION_HEADER_LEN: usize = 15;
// md5 digest slice in hex on 3.1 pushes
pub const V31_DIGEST_LEN: usize = 16;

/// commands the proxy sends or expects
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TuyaCommand {
    Control = 0x07,
    Status = 0x08,
    HeartBeat = 0x09,
    DpQuery = 0x0a,
    ControlNew = 0x0d,
    DpQueryNew = 0x10,
    UpdateDps = 0x12,
}

impl TuyaCommand {
    pub fn from_u32(cmd: u32) -> Option<Self> {
        match cmd {
            0x07 => Some(TuyaCommand::Control),
            0x08 => Some(TuyaCommand::Status),
            0x09 => Some(TuyaCommand::HeartBeat),
            0x0a => Some(TuyaCommand::DpQuery),
            0x0d => Some(TuyaCommand::ControlNew),
            0x10 => Some(TuyaCommand::DpQueryNew),
            0x12 => Some(TuyaCommand::UpdateDps),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuyaMessage {
    pub seqno: u32,
    pub cmd: u32,
    // only present on messages sent by the device
    pub retcode: Option<u32>,
    pub payload: Vec<u8>,
}
