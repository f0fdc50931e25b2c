//! Key configuration: one `(key_id, kem_id, kdf_id, aead_id)` tuple.
//!
//! Payload header (7 bytes):
//!   key_id[1] || kem_id[2] || kdf_id[2] || aead_id[2]
//!
//! Context info:
//!   request_label || 0x00 || payload header

extern crate alloc;
use alloc::vec::Vec;

use crate::algorithms::{resolve_aead, resolve_kdf, resolve_kem, Aead, Kdf, Kem};
use crate::error::{HeaderField, OhttpError, Result};
use crate::hpke::Suite;
use crate::labels::BHTTP_REQUEST_LABEL;
use crate::wire::{WireReader, HEADER_BYTES};

/// A validated key configuration. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyConfig {
    key_id: u8,
    kem: Kem,
    kdf: Kdf,
    aead: Aead,
}

impl KeyConfig {
    /// Build from raw ids. Any unsupported id is an `InvalidArgument`.
    pub fn create(key_id: u8, kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<Self> {
        let kem = resolve_kem(kem_id).map_err(|_| OhttpError::InvalidArgument("unsupported KEM id"))?;
        let kdf = resolve_kdf(kdf_id).map_err(|_| OhttpError::InvalidArgument("unsupported KDF id"))?;
        let aead = resolve_aead(aead_id).map_err(|_| OhttpError::InvalidArgument("unsupported AEAD id"))?;
        Ok(Self::new(key_id, kem, kdf, aead))
    }

    pub const fn new(key_id: u8, kem: Kem, kdf: Kdf, aead: Aead) -> Self {
        Self {
            key_id,
            kem,
            kdf,
            aead,
        }
    }

    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    pub fn kem(&self) -> Kem {
        self.kem
    }

    pub fn kdf(&self) -> Kdf {
        self.kdf
    }

    pub fn aead(&self) -> Aead {
        self.aead
    }

    pub fn suite(&self) -> Suite {
        Suite::new(self.kem, self.kdf, self.aead)
    }

    pub fn serialize_header(&self) -> [u8; HEADER_BYTES] {
        let kem = self.kem.id().to_be_bytes();
        let kdf = self.kdf.id().to_be_bytes();
        let aead = self.aead.id().to_be_bytes();
        [self.key_id, kem[0], kem[1], kdf[0], kdf[1], aead[0], aead[1]]
    }

    /// Context info under the default `"message/bhttp request"` label.
    pub fn serialize_context_info(&self) -> Vec<u8> {
        self.serialize_context_info_with_label(BHTTP_REQUEST_LABEL)
    }

    pub fn serialize_context_info_with_label(&self, request_label: &[u8]) -> Vec<u8> {
        let mut info = Vec::with_capacity(request_label.len() + 1 + HEADER_BYTES);
        info.extend_from_slice(request_label);
        info.push(0x00);
        info.extend_from_slice(&self.serialize_header());
        info
    }

    /// Read a 7-byte header from `reader` and require every field to equal
    /// this configuration's. Reports the first field that differs.
    pub fn parse_and_verify_header(&self, reader: &mut WireReader<'_>) -> Result<()> {
        let header = PayloadHeader::read(reader)?;
        let checks = [
            (HeaderField::KeyId, u16::from(self.key_id), u16::from(header.key_id)),
            (HeaderField::KemId, self.kem.id(), header.kem_id),
            (HeaderField::KdfId, self.kdf.id(), header.kdf_id),
            (HeaderField::AeadId, self.aead.id(), header.aead_id),
        ];
        for (field, expected, actual) in checks {
            if expected != actual {
                tracing::debug!(%field, expected, actual, "payload header mismatch");
                return Err(OhttpError::HeaderMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// A payload header read without an expected configuration.
///
/// Ids are not validated; use [`PayloadHeader::to_key_config`] for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadHeader {
    pub key_id: u8,
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
}

impl PayloadHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut WireReader::new(bytes))
    }

    pub fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let raw = reader.read_bytes(HEADER_BYTES, "payload header")?;
        Ok(Self {
            key_id: raw[0],
            kem_id: u16::from_be_bytes([raw[1], raw[2]]),
            kdf_id: u16::from_be_bytes([raw[3], raw[4]]),
            aead_id: u16::from_be_bytes([raw[5], raw[6]]),
        })
    }

    pub fn to_key_config(&self) -> Result<KeyConfig> {
        KeyConfig::create(self.key_id, self.kem_id, self.kdf_id, self.aead_id)
    }
}

/// Key id of an encapsulated request, so a gateway holding several keys
/// can pick one before decapsulating.
pub fn key_id_of_request(request: &[u8]) -> Result<u8> {
    WireReader::new(request).read_u8("key id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{AEAD_AES_128_GCM, KDF_HKDF_SHA256, KEM_X25519_HKDF_SHA256};

    fn cfg() -> KeyConfig {
        KeyConfig::create(0x01, KEM_X25519_HKDF_SHA256, KDF_HKDF_SHA256, AEAD_AES_128_GCM).unwrap()
    }

    #[test]
    fn header_bytes() {
        assert_eq!(cfg().serialize_header(), [0x01, 0x00, 0x20, 0x00, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn context_info_bytes() {
        let mut expected = b"message/bhttp request".to_vec();
        expected.extend_from_slice(&[0x00, 0x01, 0x00, 0x20, 0x00, 0x01, 0x00, 0x01]);
        assert_eq!(cfg().serialize_context_info(), expected);
    }

    #[test]
    fn unsupported_ids_are_invalid_arguments() {
        assert!(matches!(
            KeyConfig::create(1, 0x0010, KDF_HKDF_SHA256, AEAD_AES_128_GCM),
            Err(OhttpError::InvalidArgument(_))
        ));
        assert!(matches!(
            KeyConfig::create(1, KEM_X25519_HKDF_SHA256, 0x0004, AEAD_AES_128_GCM),
            Err(OhttpError::InvalidArgument(_))
        ));
        assert!(matches!(
            KeyConfig::create(1, KEM_X25519_HKDF_SHA256, KDF_HKDF_SHA256, 0xffff),
            Err(OhttpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn verify_reports_the_offending_field() {
        let header = cfg().serialize_header();
        let cases = [
            (0, HeaderField::KeyId),
            (2, HeaderField::KemId),
            (4, HeaderField::KdfId),
            (6, HeaderField::AeadId),
        ];
        for (byte, field) in cases {
            let mut h = header;
            h[byte] ^= 0x02;
            let err = cfg().parse_and_verify_header(&mut WireReader::new(&h)).unwrap_err();
            assert!(matches!(err, OhttpError::HeaderMismatch { field: f, .. } if f == field));
        }
    }

    #[test]
    fn verify_short_header_is_truncated() {
        let header = cfg().serialize_header();
        assert!(matches!(
            cfg().parse_and_verify_header(&mut WireReader::new(&header[..6])),
            Err(OhttpError::Truncated(_))
        ));
    }

    #[test]
    fn payload_header_and_key_id() {
        let mut bytes = cfg().serialize_header().to_vec();
        bytes.extend_from_slice(b"rest");
        let parsed = PayloadHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.to_key_config().unwrap(), cfg());
        assert_eq!(key_id_of_request(&bytes).unwrap(), 0x01);
        assert!(key_id_of_request(&[]).is_err());
    }
}
