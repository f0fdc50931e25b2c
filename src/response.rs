//! Response codec.
//!
//! ```text
//!   +------------------------------+------------+
//!   | response_nonce (max(Nk, Nn)) | ciphertext |
//!   +------------------------------+------------+
//! ```
//!
//! Keys are fresh per response:
//!
//! ```text
//!   secret = context.export(response_label, max(Nk, Nn))
//!   salt   = enc || response_nonce
//!   prk    = Extract(salt, secret)
//!   key    = Expand(prk, "key", Nk)
//!   nonce  = Expand(prk, "nonce", Nn)
//! ```
//!
//! A context may protect any number of responses; each draws its own
//! random `response_nonce`.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::aead;
use crate::algorithms::Aead;
use crate::error::{OhttpError, Result};
use crate::kdf;
use crate::random::RandomSource;
use crate::request::Context;

/// AEAD key and nonce for one response (or one chunked response stream).
pub struct ResponseKeys {
    aead: Aead,
    key: Zeroizing<Vec<u8>>,
    nonce: Zeroizing<Vec<u8>>,
}

impl core::fmt::Debug for ResponseKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponseKeys")
            .field("aead", &self.aead)
            .finish_non_exhaustive()
    }
}

impl ResponseKeys {
    pub fn aead(&self) -> Aead {
        self.aead
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }
}

pub fn derive_response_keys(context: &Context, response_nonce: &[u8]) -> Result<ResponseKeys> {
    let config = context.key_config();
    let aead = config.aead();
    let secret_len = aead.response_secret_len();
    if response_nonce.len() != secret_len {
        return Err(OhttpError::InvalidArgument("response nonce has wrong length"));
    }

    let secret = context.export(context.labels().response(), secret_len)?;

    let enc = context.encapsulated_key();
    let mut salt = Vec::with_capacity(enc.len() + response_nonce.len());
    salt.extend_from_slice(enc);
    salt.extend_from_slice(response_nonce);

    let prk = kdf::extract(config.kdf(), &salt, &secret);
    let key = kdf::expand(config.kdf(), &prk, b"key", aead.key_len())?;
    let nonce = kdf::expand(config.kdf(), &prk, b"nonce", aead.nonce_len())?;

    Ok(ResponseKeys { aead, key, nonce })
}

/// Draw a fresh `max(Nk, Nn)`-byte response nonce.
pub(crate) fn fresh_response_nonce(context: &Context, random: &dyn RandomSource) -> Result<Vec<u8>> {
    let mut nonce = alloc::vec![0u8; context.key_config().aead().response_secret_len()];
    random.fill(&mut nonce)?;
    Ok(nonce)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    wire_bytes: Vec<u8>,
    plaintext: Vec<u8>,
}

impl Response {
    /// Gateway path. `context` is borrowed, so it can protect further
    /// responses.
    pub fn encapsulate(plaintext: &[u8], context: &Context, random: &dyn RandomSource) -> Result<Self> {
        if plaintext.is_empty() {
            return Err(OhttpError::InvalidArgument("empty response plaintext"));
        }
        let response_nonce = fresh_response_nonce(context, random)?;
        let keys = derive_response_keys(context, &response_nonce)?;
        let ciphertext = aead::seal(keys.aead, &keys.key, &keys.nonce, b"", plaintext)?;

        let mut wire_bytes = response_nonce;
        wire_bytes.extend_from_slice(&ciphertext);
        Ok(Self {
            wire_bytes,
            plaintext: plaintext.to_vec(),
        })
    }

    /// Client path.
    pub fn decapsulate(wire: &[u8], context: &Context) -> Result<Self> {
        let secret_len = context.key_config().aead().response_secret_len();
        if wire.len() < secret_len {
            return Err(OhttpError::InvalidArgument("response shorter than its nonce"));
        }
        let (response_nonce, ciphertext) = wire.split_at(secret_len);
        let keys = derive_response_keys(context, response_nonce)?;
        let plaintext = aead::open(keys.aead, &keys.key, &keys.nonce, b"", ciphertext).map_err(|_| {
            tracing::debug!(len = wire.len(), "response did not authenticate");
            OhttpError::DecryptionFailed
        })?;
        Ok(Self {
            wire_bytes: wire.to_vec(),
            plaintext,
        })
    }

    pub fn wire_bytes(&self) -> &[u8] {
        &self.wire_bytes
    }

    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    pub fn into_plaintext(self) -> Vec<u8> {
        self.plaintext
    }
}
