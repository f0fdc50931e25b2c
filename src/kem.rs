//! DHKEM(X25519, HKDF-SHA256) (RFC 9180 §4.1).
//!
//! Key serialization:
//!   PublicKey  = X25519 u-coordinate[32]
//!   PrivateKey = X25519 scalar[32] (clamped on use)
//!
//! Encapsulated key (on wire) = ephemeral public key[32]
//!
//! shared_secret = LabeledExpand(LabeledExtract("", "eae_prk", dh),
//!                               "shared_secret", enc || pkR, Nsecret)
//! with suite_id = "KEM" || I2OSP(kem_id, 2).

extern crate alloc;
use alloc::vec::Vec;

use core::fmt;

use rand_core::{CryptoRng, OsRng, RngCore};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::algorithms::Kem;
use crate::error::{OhttpError, Result};
use crate::kdf;
use crate::random::RandomSource;

const X25519_KEY_BYTES: usize = 32;

fn kem_suite_id(kem: Kem) -> [u8; 5] {
    let id = kem.id().to_be_bytes();
    [b'K', b'E', b'M', id[0], id[1]]
}

// ---------------------------------------------------------------------------
// Public key
// ---------------------------------------------------------------------------

/// A KEM public key, as published in a key configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    kem: Kem,
    x25519: X25519PublicKey,
}

impl PublicKey {
    pub fn from_bytes(kem: Kem, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OhttpError::InvalidArgument("empty public key"));
        }
        let raw: [u8; X25519_KEY_BYTES] = bytes
            .try_into()
            .map_err(|_| OhttpError::InvalidArgument("public key length does not match KEM"))?;
        Ok(Self {
            kem,
            x25519: X25519PublicKey::from(raw),
        })
    }

    pub fn kem(&self) -> Kem {
        self.kem
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.x25519.as_bytes()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// True for small-order points. A clamped scalar is a multiple of the
    /// cofactor, so any trial DH with such a point is all zeros.
    pub fn is_low_order(&self) -> bool {
        let trial = StaticSecret::from([1u8; X25519_KEY_BYTES]);
        !trial.diffie_hellman(&self.x25519).was_contributory()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("kem", &self.kem)
            .field("bytes", &self.x25519.as_bytes())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Private key
// ---------------------------------------------------------------------------

/// A KEM private key. The scalar is zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    kem: Kem,
    x25519: StaticSecret,
}

impl PrivateKey {
    pub fn from_bytes(kem: Kem, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OhttpError::InvalidArgument("empty private key"));
        }
        let raw: Zeroizing<[u8; X25519_KEY_BYTES]> = Zeroizing::new(
            bytes
                .try_into()
                .map_err(|_| OhttpError::InvalidArgument("private key length does not match KEM"))?,
        );
        Ok(Self {
            kem,
            x25519: StaticSecret::from(*raw),
        })
    }

    pub fn kem(&self) -> Kem {
        self.kem
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            kem: self.kem,
            x25519: X25519PublicKey::from(&self.x25519),
        }
    }

    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.x25519.to_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("kem", &self.kem)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Key pairs
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a key pair from the operating system RNG.
    pub fn generate(kem: Kem) -> Self {
        Self::generate_with_rng(kem, &mut OsRng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(kem: Kem, rng: &mut R) -> Self {
        let private_key = PrivateKey {
            kem,
            x25519: StaticSecret::random_from_rng(rng),
        };
        Self::from_private_key(private_key)
    }

    /// Generate a key pair from an injected random source.
    pub fn generate_from(kem: Kem, random: &dyn RandomSource) -> Result<Self> {
        let mut seed = Zeroizing::new([0u8; X25519_KEY_BYTES]);
        random.fill(&mut seed[..])?;
        Ok(Self::from_private_key(PrivateKey::from_bytes(kem, &seed[..])?))
    }

    /// DeriveKeyPair (RFC 9180 §7.1.3): deterministic key pair from `ikm`.
    pub fn derive(kem: Kem, ikm: &[u8]) -> Result<Self> {
        if ikm.len() < kem.private_key_len() {
            return Err(OhttpError::InvalidArgument("key derivation input too short"));
        }
        let suite_id = kem_suite_id(kem);
        let dkp_prk = kdf::labeled_extract(kem.kdf(), &suite_id, b"", b"dkp_prk", ikm);
        let sk = kdf::labeled_expand(kem.kdf(), &suite_id, &dkp_prk, b"sk", b"", kem.private_key_len())?;
        Ok(Self::from_private_key(PrivateKey::from_bytes(kem, &sk)?))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn into_parts(self) -> (PrivateKey, PublicKey) {
        (self.private_key, self.public_key)
    }
}

// ---------------------------------------------------------------------------
// Encap / Decap
// ---------------------------------------------------------------------------

fn extract_and_expand(kem: Kem, dh: &[u8], kem_context: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let suite_id = kem_suite_id(kem);
    let eae_prk = kdf::labeled_extract(kem.kdf(), &suite_id, b"", b"eae_prk", dh);
    kdf::labeled_expand(
        kem.kdf(),
        &suite_id,
        &eae_prk,
        b"shared_secret",
        kem_context,
        kem.shared_secret_len(),
    )
}

/// Encap against `pk_r` using the ephemeral key `sk_e`.
///
/// Returns `(shared_secret, enc)`. A public key that yields an all-zero DH
/// output is rejected with `CryptoSetupFailed`.
pub fn encap(pk_r: &PublicKey, sk_e: &PrivateKey) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>)> {
    if pk_r.kem != sk_e.kem {
        return Err(OhttpError::CryptoSetupFailed);
    }
    let dh = sk_e.x25519.diffie_hellman(&pk_r.x25519);
    if !dh.was_contributory() {
        tracing::debug!(kem = pk_r.kem.id(), "recipient public key is a low-order point");
        return Err(OhttpError::CryptoSetupFailed);
    }

    let enc = sk_e.public_key().to_bytes();
    let mut kem_context = Vec::with_capacity(enc.len() + X25519_KEY_BYTES);
    kem_context.extend_from_slice(&enc);
    kem_context.extend_from_slice(pk_r.as_bytes());

    let shared_secret = extract_and_expand(pk_r.kem, dh.as_bytes(), &kem_context)?;
    Ok((shared_secret, enc))
}

/// Decap `enc` with the recipient key. Every failure is `DecryptionFailed`.
pub fn decap(enc: &[u8], sk_r: &PrivateKey) -> Result<Zeroizing<Vec<u8>>> {
    if enc.len() != sk_r.kem.enc_len() {
        tracing::debug!(len = enc.len(), "encapsulated key has wrong length");
        return Err(OhttpError::DecryptionFailed);
    }
    let pk_e = PublicKey::from_bytes(sk_r.kem, enc).map_err(|_| OhttpError::DecryptionFailed)?;
    let dh = sk_r.x25519.diffie_hellman(&pk_e.x25519);
    if !dh.was_contributory() {
        tracing::debug!("encapsulated key is a low-order point");
        return Err(OhttpError::DecryptionFailed);
    }

    let pk_r = sk_r.public_key();
    let mut kem_context = Vec::with_capacity(enc.len() + X25519_KEY_BYTES);
    kem_context.extend_from_slice(enc);
    kem_context.extend_from_slice(pk_r.as_bytes());

    extract_and_expand(sk_r.kem, dh.as_bytes(), &kem_context).map_err(|_| OhttpError::DecryptionFailed)
}
