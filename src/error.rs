//! Unified error type for the OHTTP codec.
//!
//! Every cryptographic failure on a receive path collapses into
//! [`OhttpError::DecryptionFailed`], whatever the root cause (wrong key,
//! tampered bytes, mismatched context info). Lower layers log the cause at
//! `debug` level; callers only ever see the uniform variant.

use core::fmt;

/// Which algorithm family an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Kem,
    Kdf,
    Aead,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kem => f.write_str("KEM"),
            Self::Kdf => f.write_str("KDF"),
            Self::Aead => f.write_str("AEAD"),
        }
    }
}

/// A field of the 7-byte OHTTP payload header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    KeyId,
    KemId,
    KdfId,
    AeadId,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyId => f.write_str("key_id"),
            Self::KemId => f.write_str("kem_id"),
            Self::KdfId => f.write_str("kdf_id"),
            Self::AeadId => f.write_str("aead_id"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OhttpError {
    /// Empty or malformed caller input.
    InvalidArgument(&'static str),
    /// An identifier outside the supported registry.
    UnsupportedAlgorithm { kind: AlgorithmKind, id: u16 },
    /// Wire bytes ended before a declared field was complete.
    Truncated(&'static str),
    /// A parsed payload header disagrees with the expected key configuration.
    HeaderMismatch {
        field: HeaderField,
        expected: u16,
        actual: u16,
    },
    /// A key directory declares the same key id twice.
    DuplicateKeyId(u8),
    /// A key directory names a KEM whose public-key length is unknown.
    UnknownKem(u16),
    /// No public key is published under this key id.
    NotFound(u8),
    /// The KEM rejected the supplied public key.
    CryptoSetupFailed,
    /// AEAD encryption failed.
    CryptoSealFailed,
    /// Decryption failed. Carries no cause.
    DecryptionFailed,
    /// The operation is not valid in the current state.
    FailedPrecondition(&'static str),
    /// A nonce counter reached the end of its range.
    NonceSpaceExhausted,
    /// The random source could not produce bytes.
    EntropyUnavailable,
}

impl fmt::Display for OhttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::UnsupportedAlgorithm { kind, id } => {
                write!(f, "unsupported {} id: 0x{:04x}", kind, id)
            }
            Self::Truncated(field) => write!(f, "truncated input: {}", field),
            Self::HeaderMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "header mismatch on {}: expected 0x{:04x}, got 0x{:04x}",
                field, expected, actual
            ),
            Self::DuplicateKeyId(id) => write!(f, "duplicate key id: {}", id),
            Self::UnknownKem(id) => write!(f, "unknown KEM id: 0x{:04x}", id),
            Self::NotFound(id) => write!(f, "no key configured for key id {}", id),
            Self::CryptoSetupFailed => write!(f, "key exchange setup failed"),
            Self::CryptoSealFailed => write!(f, "encryption failed"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
            Self::FailedPrecondition(msg) => write!(f, "failed precondition: {}", msg),
            Self::NonceSpaceExhausted => write!(f, "nonce space exhausted"),
            Self::EntropyUnavailable => write!(f, "random source unavailable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OhttpError {}

pub type Result<T> = core::result::Result<T, OhttpError>;
