//! payload encryption: AES-128-ECB with PKCS#7 padding, keyed by the device local key

use crypto::aes::{self, KeySize};
use crypto::blockmodes::PkcsPadding;
use crypto::buffer::{BufferResult, ReadBuffer, RefReadBuffer, RefWriteBuffer, WriteBuffer};
use crypto::digest::Digest;
use crypto::md5::Md5;
use crate::common::error::DriverError;
use crate::entity::bo::device_identity_bo::LOCAL_KEY_LEN;

const CHUNK_LEN: usize = 1024;

#[derive(Clone)]
pub struct TuyaCipher {
    key: [u8; LOCAL_KEY_LEN],
}

impl TuyaCipher {
    pub fn new(local_key: &str) -> Result<Self, DriverError> {
        let bytes = local_key.as_bytes();
        if bytes.len() != LOCAL_KEY_LEN {
            return Err(DriverError(format!("local key must be {} bytes, got {}", LOCAL_KEY_LEN, bytes.len())));
        }
        let mut key = [0u8; LOCAL_KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(TuyaCipher { key })
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, DriverError> {
        let mut encryptor = aes::ecb_encryptor(KeySize::KeySize128, &self.key, PkcsPadding);
        let mut result = Vec::with_capacity(data.len() + LOCAL_KEY_LEN);
        let mut read_buffer = RefReadBuffer::new(data);
        let mut chunk = [0u8; CHUNK_LEN];
        loop {
            let mut write_buffer = RefWriteBuffer::new(&mut chunk);
            let status = encryptor
                .encrypt(&mut read_buffer, &mut write_buffer, true)
                .map_err(|e| DriverError(format!("cannot encrypt payload: {:?}", e)))?;
            result.extend_from_slice(write_buffer.take_read_buffer().take_remaining());
            if let BufferResult::BufferUnderflow = status {
                break;
            }
        }
        Ok(result)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, DriverError> {
        if data.is_empty() || data.len() % LOCAL_KEY_LEN != 0 {
            return Err(DriverError(format!("cipher text length {} is not a multiple of the block size", data.len())));
        }
        let mut decryptor = aes::ecb_decryptor(KeySize::KeySize128, &self.key, PkcsPadding);
        let mut result = Vec::with_capacity(data.len());
        let mut read_buffer = RefReadBuffer::new(data);
        let mut chunk = [0u8; CHUNK_LEN];
        loop {
            let mut write_buffer = RefWriteBuffer::new(&mut chunk);
            let status = decryptor
                .decrypt(&mut read_buffer, &mut write_buffer, true)
                .map_err(|e| DriverError(format!("cannot decrypt payload: {:?}", e)))?;
            result.extend_from_slice(write_buffer.take_read_buffer().take_remaining());
            if let BufferResult::BufferUnderflow = status {
                break;
            }
        }
        Ok(result)
    }

    /// digest slice carried by 3.1 payloads, computed over the base64 body
    pub fn v31_digest(&self, base64_body: &[u8]) -> String {
        let mut md5 = Md5::new();
        md5.input(b"data=");
        md5.input(base64_body);
        md5.input(b"||lpv=3.1||");
        md5.input(&self.key);
        let hex = md5.result_str();
        hex[8..24].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef";

    #[test]
    fn test_round_trip() {
        let cipher = TuyaCipher::new(KEY).unwrap();
        let plain = br#"{"devId":"abc123","dps":{"1":true,"4":215}}"#;
        let encrypted = cipher.encrypt(plain).unwrap();
        assert_eq!(encrypted.len() % 16, 0);
        assert!(encrypted.len() > plain.len());
        assert_ne!(&encrypted[..16], &plain[..16]);
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), plain.to_vec());
    }

    #[test]
    fn test_block_aligned_input_gets_full_padding_block() {
        let cipher = TuyaCipher::new(KEY).unwrap();
        let encrypted = cipher.encrypt(&[b'x'; 32]).unwrap();
        assert_eq!(encrypted.len(), 48);
    }

    #[test]
    fn test_long_payload() {
        let cipher = TuyaCipher::new(KEY).unwrap();
        let plain = vec![b'a'; 3000];
        let encrypted = cipher.encrypt(&plain).unwrap();
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), plain);
    }

    #[test]
    fn test_reject_bad_input() {
        assert!(TuyaCipher::new("short").is_err());
        let cipher = TuyaCipher::new(KEY).unwrap();
        assert!(cipher.decrypt(&[1, 2, 3]).is_err());
        assert!(cipher.decrypt(&[]).is_err());
    }

    #[test]
    fn test_v31_digest_is_stable() {
        let cipher = TuyaCipher::new(KEY).unwrap();
        let digest = cipher.v31_digest(b"aGVsbG8=");
        assert_eq!(digest.len(), 16);
        assert_eq!(digest, cipher.v31_digest(b"aGVsbG8="));
        assert_ne!(digest, cipher.v31_digest(b"d29ybGQ="));
    }
}
