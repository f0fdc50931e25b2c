//! HPKE base mode (RFC 9180 §5.1) over the registry's KEM/KDF/AEAD.
//!
//! suite_id            = "HPKE" || I2OSP(kem_id, 2) || I2OSP(kdf_id, 2) || I2OSP(aead_id, 2)
//! key_schedule_ctx    = mode(0x00) || LabeledExtract("", "psk_id_hash", "")
//!                                  || LabeledExtract("", "info_hash", info)
//! secret              = LabeledExtract(shared_secret, "secret", "")
//! key / base_nonce / exporter_secret = LabeledExpand(secret, "key" | "base_nonce" | "exp", ctx, Nk | Nn | Nh)
//!
//! Per-message nonce = base_nonce XOR I2OSP(seq, Nn). The sequence number
//! never wraps.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::algorithms::{Aead, Kdf, Kem};
use crate::error::{OhttpError, Result};
use crate::kem::{self, PrivateKey, PublicKey};
use crate::{aead, kdf};

const MODE_BASE: u8 = 0x00;

/// A negotiated (KEM, KDF, AEAD) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Suite {
    pub kem: Kem,
    pub kdf: Kdf,
    pub aead: Aead,
}

impl Suite {
    pub const fn new(kem: Kem, kdf: Kdf, aead: Aead) -> Self {
        Self { kem, kdf, aead }
    }

    fn suite_id(&self) -> [u8; 10] {
        let kem = self.kem.id().to_be_bytes();
        let kdf = self.kdf.id().to_be_bytes();
        let aead = self.aead.id().to_be_bytes();
        [b'H', b'P', b'K', b'E', kem[0], kem[1], kdf[0], kdf[1], aead[0], aead[1]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Recipient,
}

/// Live HPKE encryption context. Not `Clone`: reusing a copy would replay
/// sequence numbers.
pub struct HpkeContext {
    suite: Suite,
    role: Role,
    key: Zeroizing<Vec<u8>>,
    base_nonce: Zeroizing<Vec<u8>>,
    exporter_secret: Zeroizing<Vec<u8>>,
    seq: u64,
}

impl core::fmt::Debug for HpkeContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HpkeContext")
            .field("suite", &self.suite)
            .field("role", &self.role)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

fn key_schedule(suite: Suite, role: Role, shared_secret: &[u8], info: &[u8]) -> Result<HpkeContext> {
    let suite_id = suite.suite_id();
    let kdf = suite.kdf;

    let psk_id_hash = kdf::labeled_extract(kdf, &suite_id, b"", b"psk_id_hash", b"");
    let info_hash = kdf::labeled_extract(kdf, &suite_id, b"", b"info_hash", info);

    let mut context = Vec::with_capacity(1 + psk_id_hash.len() + info_hash.len());
    context.push(MODE_BASE);
    context.extend_from_slice(&psk_id_hash);
    context.extend_from_slice(&info_hash);

    let secret = kdf::labeled_extract(kdf, &suite_id, shared_secret, b"secret", b"");

    let key = kdf::labeled_expand(kdf, &suite_id, &secret, b"key", &context, suite.aead.key_len())?;
    let base_nonce = kdf::labeled_expand(
        kdf,
        &suite_id,
        &secret,
        b"base_nonce",
        &context,
        suite.aead.nonce_len(),
    )?;
    let exporter_secret = kdf::labeled_expand(kdf, &suite_id, &secret, b"exp", &context, kdf.hash_len())?;

    Ok(HpkeContext {
        suite,
        role,
        key,
        base_nonce,
        exporter_secret,
        seq: 0,
    })
}

/// SetupBaseS with a caller-chosen ephemeral key. Returns `(enc, context)`.
pub fn setup_sender(
    suite: Suite,
    pk_r: &PublicKey,
    info: &[u8],
    sk_e: &PrivateKey,
) -> Result<(Vec<u8>, HpkeContext)> {
    if pk_r.kem() != suite.kem {
        return Err(OhttpError::CryptoSetupFailed);
    }
    let (shared_secret, enc) = kem::encap(pk_r, sk_e)?;
    let ctx = key_schedule(suite, Role::Sender, &shared_secret, info)?;
    Ok((enc, ctx))
}

/// SetupBaseR. Any failure is reported as `DecryptionFailed`.
pub fn setup_recipient(suite: Suite, sk_r: &PrivateKey, enc: &[u8], info: &[u8]) -> Result<HpkeContext> {
    if sk_r.kem() != suite.kem {
        tracing::debug!(kem = suite.kem.id(), "private key belongs to a different KEM");
        return Err(OhttpError::DecryptionFailed);
    }
    let shared_secret = kem::decap(enc, sk_r)?;
    key_schedule(suite, Role::Recipient, &shared_secret, info).map_err(|_| OhttpError::DecryptionFailed)
}

impl HpkeContext {
    pub fn suite(&self) -> Suite {
        self.suite
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn sequence_number(&self) -> u64 {
        self.seq
    }

    #[cfg(test)]
    pub(crate) fn set_sequence_number(&mut self, seq: u64) {
        self.seq = seq;
    }

    fn compute_nonce(&self) -> Zeroizing<Vec<u8>> {
        let mut nonce = self.base_nonce.clone();
        let seq = self.seq.to_be_bytes();
        let offset = nonce.len() - seq.len();
        for (n, s) in nonce[offset..].iter_mut().zip(seq.iter()) {
            *n ^= s;
        }
        nonce
    }

    fn check_sequence(&self) -> Result<()> {
        if self.seq == u64::MAX {
            tracing::debug!(role = ?self.role, "hpke sequence number exhausted");
            return Err(OhttpError::NonceSpaceExhausted);
        }
        Ok(())
    }

    pub fn seal(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        if self.role != Role::Sender {
            return Err(OhttpError::FailedPrecondition("seal on a recipient context"));
        }
        self.check_sequence()?;
        let nonce = self.compute_nonce();
        let ct = aead::seal(self.suite.aead, &self.key, &nonce, aad, plaintext)?;
        self.seq += 1;
        Ok(ct)
    }

    pub fn open(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if self.role != Role::Recipient {
            return Err(OhttpError::FailedPrecondition("open on a sender context"));
        }
        self.check_sequence()?;
        let nonce = self.compute_nonce();
        let pt = aead::open(self.suite.aead, &self.key, &nonce, aad, ciphertext).map_err(|e| {
            tracing::debug!(seq = self.seq, "hpke open failed");
            e
        })?;
        self.seq += 1;
        Ok(pt)
    }

    /// Secret export: LabeledExpand(exporter_secret, "sec", exporter_context, len).
    pub fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        if len > 255 * self.suite.kdf.hash_len() {
            return Err(OhttpError::InvalidArgument("export length too large"));
        }
        kdf::labeled_expand(
            self.suite.kdf,
            &self.suite.suite_id(),
            &self.exporter_secret,
            b"sec",
            exporter_context,
            len,
        )
    }
}
