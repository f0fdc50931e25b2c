//! Wire format primitives.
//!
//! Request:
//!   key_id[1] || kem_id[2] || kdf_id[2] || aead_id[2] || enc[Nenc] || ciphertext
//!
//! Response:
//!   response_nonce[max(Nk, Nn)] || ciphertext
//!
//! Key directory (`application/ohttp-keys`), repeated:
//!   key_id[1] || kem_id[2] || public_key[Npk] || alg_len[2] || (kdf_id[2] || aead_id[2])*
//!
//! Chunk (chunked OHTTP):
//!   varint(len) || ciphertext[len]       non-final, len > 0
//!   varint(0)   || ciphertext            final, to end of stream
//!
//! All integers are big-endian. Varints are QUIC variable-length integers.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::{OhttpError, Result};

/// Payload header size: key_id + kem_id + kdf_id + aead_id
pub const HEADER_BYTES: usize = 1 + 2 + 2 + 2; // 7

/// Largest value a QUIC varint can carry.
pub const MAX_VARINT: u64 = (1 << 62) - 1;

/// Forward-only cursor over borrowed wire bytes.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read exactly `len` bytes; `field` names what was being read.
    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(OhttpError::Truncated(field));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.read_bytes(1, field)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16> {
        let b = self.read_bytes(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a u16 length prefix followed by that many bytes.
    pub fn read_u16_prefixed(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let len = self.read_u16(field)? as usize;
        self.read_bytes(len, field)
    }

    pub fn read_varint(&mut self, field: &'static str) -> Result<u64> {
        let first = *self
            .data
            .get(self.pos)
            .ok_or(OhttpError::Truncated(field))?;
        let len = 1usize << (first >> 6);
        let b = self.read_bytes(len, field)?;
        let mut value = u64::from(b[0] & 0x3f);
        for byte in &b[1..] {
            value = (value << 8) | u64::from(*byte);
        }
        Ok(value)
    }

    /// Everything not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }
}

/// Encoded size of `value` as a QUIC varint.
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=63 => 1,
        64..=16_383 => 2,
        16_384..=1_073_741_823 => 4,
        _ => 8,
    }
}

/// Append `value` as a QUIC varint.
pub fn write_varint(out: &mut Vec<u8>, value: u64) -> Result<()> {
    if value > MAX_VARINT {
        return Err(OhttpError::InvalidArgument("value too large for varint"));
    }
    match varint_len(value) {
        1 => out.push(value as u8),
        2 => out.extend_from_slice(&((value as u16) | 0x4000).to_be_bytes()),
        4 => out.extend_from_slice(&((value as u32) | 0x8000_0000).to_be_bytes()),
        _ => out.extend_from_slice(&(value | 0xc000_0000_0000_0000).to_be_bytes()),
    }
    Ok(())
}
