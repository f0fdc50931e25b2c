//! Request codec.
//!
//! Encapsulated request:
//!
//! ```text
//!   +--------+---------+---------+----------+-----------------+------------+
//!   | key_id | kem_id  | kdf_id  | aead_id  | enc (Nenc)      | ciphertext |
//!   |  1 B   |  2 B BE |  2 B BE |  2 B BE  | 32 B for X25519 | variable   |
//!   +--------+---------+---------+----------+-----------------+------------+
//! ```
//!
//! The ciphertext is the HPKE seal of the plaintext with empty AAD under
//! `info = request_label || 0x00 || header`.
//!
//! Both sides end up holding a [`Context`]. It is the only way to protect or
//! read the matching response, and it has exactly one owner: a [`Request`]
//! holds it until [`Request::release_context`] moves it out.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::error::{OhttpError, Result};
use crate::hpke::{self, HpkeContext};
use crate::kem::{KeyPair, PrivateKey, PublicKey};
use crate::key_config::KeyConfig;
use crate::labels::Labels;
use crate::random::{RandomSource, SystemRandom};
use crate::wire::{WireReader, HEADER_BYTES};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Live HPKE state for one request plus the encapsulated key that bound it.
///
/// Movable, never copyable.
#[derive(Debug)]
pub struct Context {
    hpke: HpkeContext,
    encapsulated_key: Vec<u8>,
    key_config: KeyConfig,
    labels: Labels,
}

impl Context {
    pub fn encapsulated_key(&self) -> &[u8] {
        &self.encapsulated_key
    }

    pub fn key_config(&self) -> KeyConfig {
        self.key_config
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// HPKE secret export. Does not advance the sequence number.
    pub fn export(&self, label: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        self.hpke.export(label, len)
    }

    pub(crate) fn hpke_mut(&mut self) -> &mut HpkeContext {
        &mut self.hpke
    }
}

/// Client side: ephemeral key agreement against `public_key`.
pub(crate) fn sender_context(
    public_key: &PublicKey,
    key_config: KeyConfig,
    labels: &Labels,
    ephemeral: &PrivateKey,
) -> Result<Context> {
    let info = key_config.serialize_context_info_with_label(labels.request());
    let (encapsulated_key, hpke) = hpke::setup_sender(key_config.suite(), public_key, &info, ephemeral)?;
    Ok(Context {
        hpke,
        encapsulated_key,
        key_config,
        labels: labels.clone(),
    })
}

/// Gateway side: consume `header || enc` from `reader` and set up the
/// recipient context.
pub(crate) fn recipient_context(
    reader: &mut WireReader<'_>,
    private_key: &PrivateKey,
    key_config: KeyConfig,
    labels: &Labels,
) -> Result<Context> {
    key_config.parse_and_verify_header(reader)?;
    let enc = reader.read_bytes(key_config.kem().enc_len(), "encapsulated key")?;
    let info = key_config.serialize_context_info_with_label(labels.request());
    let hpke = hpke::setup_recipient(key_config.suite(), private_key, enc, &info).map_err(|_| {
        tracing::debug!(key_id = key_config.key_id(), "request context setup failed");
        OhttpError::DecryptionFailed
    })?;
    Ok(Context {
        hpke,
        encapsulated_key: enc.to_vec(),
        key_config,
        labels: labels.clone(),
    })
}

/// Parse caller-supplied public key bytes for `key_config`'s KEM.
pub(crate) fn parse_public_key(public_key: &[u8], key_config: KeyConfig) -> Result<PublicKey> {
    if public_key.is_empty() {
        return Err(OhttpError::InvalidArgument("empty public key"));
    }
    PublicKey::from_bytes(key_config.kem(), public_key).map_err(|_| {
        tracing::debug!(len = public_key.len(), "malformed recipient public key");
        OhttpError::CryptoSetupFailed
    })
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Request {
    context: Option<Context>,
    key_config: KeyConfig,
    ciphertext: Vec<u8>,
    plaintext: Vec<u8>,
}

impl Request {
    /// Client path with the default labels and the system random source.
    pub fn encapsulate(plaintext: &[u8], public_key: &[u8], key_config: KeyConfig) -> Result<Self> {
        Self::encapsulate_with(plaintext, public_key, key_config, &Labels::bhttp(), &SystemRandom)
    }

    pub fn encapsulate_with(
        plaintext: &[u8],
        public_key: &[u8],
        key_config: KeyConfig,
        labels: &Labels,
        random: &dyn RandomSource,
    ) -> Result<Self> {
        let public_key = parse_public_key(public_key, key_config)?;
        Self::seal(plaintext, &public_key, key_config, labels, random)
    }

    /// Deterministic client path: `seed` is the ephemeral private key.
    #[doc(hidden)]
    pub fn encapsulate_with_seed_for_testing(
        plaintext: &[u8],
        public_key: &[u8],
        key_config: KeyConfig,
        labels: &Labels,
        seed: &[u8],
    ) -> Result<Self> {
        if plaintext.is_empty() {
            return Err(OhttpError::InvalidArgument("empty request plaintext"));
        }
        let public_key = parse_public_key(public_key, key_config)?;
        let ephemeral = PrivateKey::from_bytes(key_config.kem(), seed)?;
        Self::seal_with_ephemeral(plaintext, &public_key, key_config, labels, &ephemeral)
    }

    pub(crate) fn seal(
        plaintext: &[u8],
        public_key: &PublicKey,
        key_config: KeyConfig,
        labels: &Labels,
        random: &dyn RandomSource,
    ) -> Result<Self> {
        if plaintext.is_empty() {
            return Err(OhttpError::InvalidArgument("empty request plaintext"));
        }
        let ephemeral = KeyPair::generate_from(key_config.kem(), random)?;
        Self::seal_with_ephemeral(plaintext, public_key, key_config, labels, ephemeral.private_key())
    }

    fn seal_with_ephemeral(
        plaintext: &[u8],
        public_key: &PublicKey,
        key_config: KeyConfig,
        labels: &Labels,
        ephemeral: &PrivateKey,
    ) -> Result<Self> {
        let mut context = sender_context(public_key, key_config, labels, ephemeral)?;
        let ciphertext = context.hpke.seal(b"", plaintext)?;
        Ok(Self {
            context: Some(context),
            key_config,
            ciphertext,
            plaintext: plaintext.to_vec(),
        })
    }

    /// Gateway path with the default labels.
    pub fn decapsulate(wire: &[u8], private_key: &PrivateKey, key_config: KeyConfig) -> Result<Self> {
        Self::decapsulate_with_labels(wire, private_key, key_config, &Labels::bhttp())
    }

    pub fn decapsulate_with_labels(
        wire: &[u8],
        private_key: &PrivateKey,
        key_config: KeyConfig,
        labels: &Labels,
    ) -> Result<Self> {
        if wire.is_empty() {
            return Err(OhttpError::InvalidArgument("empty request"));
        }
        let mut reader = WireReader::new(wire);
        let mut context = recipient_context(&mut reader, private_key, key_config, labels)?;
        let ciphertext = reader.rest();
        let plaintext = context.hpke.open(b"", ciphertext).map_err(|_| {
            tracing::debug!(key_id = key_config.key_id(), "request ciphertext did not authenticate");
            OhttpError::DecryptionFailed
        })?;
        Ok(Self {
            context: Some(context),
            key_config,
            ciphertext: ciphertext.to_vec(),
            plaintext,
        })
    }

    /// `header || enc || ciphertext`.
    ///
    /// # Panics
    ///
    /// If the context has already been released.
    pub fn serialize(&self) -> Vec<u8> {
        let context = match &self.context {
            Some(context) => context,
            None => panic!("Request::serialize called after release_context"),
        };
        let enc = context.encapsulated_key();
        let mut out = Vec::with_capacity(HEADER_BYTES + enc.len() + self.ciphertext.len());
        out.extend_from_slice(&self.key_config.serialize_header());
        out.extend_from_slice(enc);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn key_config(&self) -> KeyConfig {
        self.key_config
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Move the context out for use with the response codec.
    ///
    /// # Panics
    ///
    /// On a second call.
    pub fn release_context(&mut self) -> Context {
        match self.context.take() {
            Some(context) => context,
            None => panic!("Request::release_context called twice"),
        }
    }
}
