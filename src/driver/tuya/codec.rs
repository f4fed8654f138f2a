use std::io;
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use super::entity::*;

/// frame codec of the tuya lan protocol
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TuyaCodec;

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

impl Decoder for TuyaCodec {
    type Item = TuyaMessage;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // skip garbage before the prefix, keep a possible partial prefix
        match buf.windows(PREFIX_BYTES.len()).position(|w| w == PREFIX_BYTES) {
            Some(0) => {}
            Some(n) => buf.advance(n),
            None => {
                let keep = buf.len().min(PREFIX_BYTES.len() - 1);
                buf.advance(buf.len() - keep);
                return Ok(None);
            }
        }

        if buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let len = read_u32(buf, 12) as usize;
        if len < TRAILER_LEN || len > MAX_MESSAGE_LEN {
            return Err(invalid(format!("invalid message length {}", len)));
        }
        let total = HEADER_LEN + len;
        if buf.len() < total {
            buf.reserve(total - buf.len());
            return Ok(None);
        }

        let frame = buf.split_to(total);
        let seqno = read_u32(&frame, 4);
        let cmd = read_u32(&frame, 8);
        let crc = read_u32(&frame, total - TRAILER_LEN);
        let suffix = read_u32(&frame, total - 4);
        if suffix != SUFFIX {
            return Err(invalid(format!("invalid message suffix {:08x}", suffix)));
        }
        let actual = crc32fast::hash(&frame[..total - TRAILER_LEN]);
        if crc != actual {
            return Err(invalid(format!("crc mismatch, expected {:08x}, got {:08x}", crc, actual)));
        }

        // device messages lead with a return code, whose upper bytes are always zero
        let body = &frame[HEADER_LEN..total - TRAILER_LEN];
        let (retcode, payload) = if body.len() >= 4 && read_u32(body, 0) & 0xFFFF_FF00 == 0 {
            (Some(read_u32(body, 0)), &body[4..])
        } else {
            (None, body)
        };

        Ok(Some(TuyaMessage {
            seqno,
            cmd,
            retcode,
            payload: payload.to_vec(),
        }))
    }
}

impl Encoder<TuyaMessage> for TuyaCodec {
    type Error = io::Error;

    fn encode(&mut self, item: TuyaMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let retcode_len = if item.retcode.is_some() { 4 } else { 0 };
        let len = retcode_len + item.payload.len() + TRAILER_LEN;
        if len > MAX_MESSAGE_LEN {
            return Err(invalid(format!("message too long: {}", len)));
        }

        let start = dst.len();
        dst.reserve(HEADER_LEN + len);
        dst.put_u32(PREFIX);
        dst.put_u32(item.seqno);
        dst.put_u32(item.cmd);
        dst.put_u32(len as u32);
        if let Some(retcode) = item.retcode {
            dst.put_u32(retcode);
        }
        dst.put_slice(&item.payload);
        let crc = crc32fast::hash(&dst[start..]);
        dst.put_u32(crc);
        dst.put_u32(SUFFIX);
        Ok(())
    }
}
