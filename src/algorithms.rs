//! Algorithm registry.
//!
//! The closed set of HPKE identifiers (IANA "HPKE KEM/KDF/AEAD
//! Identifiers") this crate implements. Everything that reads an id off the
//! wire or from a caller goes through [`resolve_kem`], [`resolve_kdf`] or
//! [`resolve_aead`] before trusting it.

use core::convert::TryFrom;

use crate::error::{AlgorithmKind, OhttpError, Result};

// ---------------------------------------------------------------------------
// KEM
// ---------------------------------------------------------------------------

pub const KEM_X25519_HKDF_SHA256: u16 = 0x0020;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kem {
    /// DHKEM(X25519, HKDF-SHA256)
    X25519HkdfSha256,
}

impl Kem {
    pub const fn id(self) -> u16 {
        match self {
            Self::X25519HkdfSha256 => KEM_X25519_HKDF_SHA256,
        }
    }

    /// Npk: serialized public key length.
    pub const fn public_key_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => 32,
        }
    }

    /// Nenc: encapsulated key length.
    pub const fn enc_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => 32,
        }
    }

    /// Nsk: serialized private key length.
    pub const fn private_key_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => 32,
        }
    }

    /// Nsecret: KEM shared secret length.
    pub const fn shared_secret_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => 32,
        }
    }

    /// The KDF the DHKEM construction itself uses.
    pub const fn kdf(self) -> Kdf {
        match self {
            Self::X25519HkdfSha256 => Kdf::HkdfSha256,
        }
    }
}

// ---------------------------------------------------------------------------
// KDF
// ---------------------------------------------------------------------------

pub const KDF_HKDF_SHA256: u16 = 0x0001;
pub const KDF_HKDF_SHA384: u16 = 0x0002;
pub const KDF_HKDF_SHA512: u16 = 0x0003;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kdf {
    HkdfSha256,
    HkdfSha384,
    HkdfSha512,
}

impl Kdf {
    pub const fn id(self) -> u16 {
        match self {
            Self::HkdfSha256 => KDF_HKDF_SHA256,
            Self::HkdfSha384 => KDF_HKDF_SHA384,
            Self::HkdfSha512 => KDF_HKDF_SHA512,
        }
    }

    /// Nh: hash output length, also the extract output length.
    pub const fn hash_len(self) -> usize {
        match self {
            Self::HkdfSha256 => 32,
            Self::HkdfSha384 => 48,
            Self::HkdfSha512 => 64,
        }
    }
}

// ---------------------------------------------------------------------------
// AEAD
// ---------------------------------------------------------------------------

pub const AEAD_AES_128_GCM: u16 = 0x0001;
pub const AEAD_AES_256_GCM: u16 = 0x0002;
pub const AEAD_CHACHA20_POLY1305: u16 = 0x0003;

/// Authentication tag length shared by every supported AEAD.
pub const AEAD_TAG_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Aead {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl Aead {
    pub const fn id(self) -> u16 {
        match self {
            Self::Aes128Gcm => AEAD_AES_128_GCM,
            Self::Aes256Gcm => AEAD_AES_256_GCM,
            Self::ChaCha20Poly1305 => AEAD_CHACHA20_POLY1305,
        }
    }

    /// Nk
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm | Self::ChaCha20Poly1305 => 32,
        }
    }

    /// Nn
    pub const fn nonce_len(self) -> usize {
        12
    }

    /// Nt
    pub const fn tag_len(self) -> usize {
        AEAD_TAG_BYTES
    }

    /// `max(Nk, Nn)`: the response nonce and exported secret length.
    pub const fn response_secret_len(self) -> usize {
        let nk = self.key_len();
        let nn = self.nonce_len();
        if nk > nn {
            nk
        } else {
            nn
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

pub fn resolve_kem(id: u16) -> Result<Kem> {
    match id {
        KEM_X25519_HKDF_SHA256 => Ok(Kem::X25519HkdfSha256),
        _ => Err(OhttpError::UnsupportedAlgorithm {
            kind: AlgorithmKind::Kem,
            id,
        }),
    }
}

pub fn resolve_kdf(id: u16) -> Result<Kdf> {
    match id {
        KDF_HKDF_SHA256 => Ok(Kdf::HkdfSha256),
        KDF_HKDF_SHA384 => Ok(Kdf::HkdfSha384),
        KDF_HKDF_SHA512 => Ok(Kdf::HkdfSha512),
        _ => Err(OhttpError::UnsupportedAlgorithm {
            kind: AlgorithmKind::Kdf,
            id,
        }),
    }
}

pub fn resolve_aead(id: u16) -> Result<Aead> {
    match id {
        AEAD_AES_128_GCM => Ok(Aead::Aes128Gcm),
        AEAD_AES_256_GCM => Ok(Aead::Aes256Gcm),
        AEAD_CHACHA20_POLY1305 => Ok(Aead::ChaCha20Poly1305),
        _ => Err(OhttpError::UnsupportedAlgorithm {
            kind: AlgorithmKind::Aead,
            id,
        }),
    }
}

impl TryFrom<u16> for Kem {
    type Error = OhttpError;

    fn try_from(id: u16) -> Result<Self> {
        resolve_kem(id)
    }
}

impl TryFrom<u16> for Kdf {
    type Error = OhttpError;

    fn try_from(id: u16) -> Result<Self> {
        resolve_kdf(id)
    }
}

impl TryFrom<u16> for Aead {
    type Error = OhttpError;

    fn try_from(id: u16) -> Result<Self> {
        resolve_aead(id)
    }
}
