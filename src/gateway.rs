//! Gateway façade: one private key, many requests.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::chunked::{ChunkedRequestDecoder, ChunkedResponseEncoder};
use crate::error::{OhttpError, Result};
use crate::kem::{PrivateKey, PublicKey};
use crate::key_config::KeyConfig;
use crate::key_configs::{KeyConfigSet, KeyEntry, SymmetricAlgorithm};
use crate::labels::Labels;
use crate::random::{RandomSource, SystemRandom};
use crate::request::{Context, Request};
use crate::response::Response;

/// Binds the gateway's private key and the key configuration it serves.
#[derive(Debug, Clone)]
pub struct Gateway<R: RandomSource = SystemRandom> {
    private_key: PrivateKey,
    public_key: PublicKey,
    key_config: KeyConfig,
    labels: Labels,
    chunked_labels: Labels,
    random: R,
}

impl Gateway<SystemRandom> {
    /// `private_key` is the serialized KEM private key for `key_config`.
    pub fn new(private_key: &[u8], key_config: KeyConfig) -> Result<Self> {
        let private_key = PrivateKey::from_bytes(key_config.kem(), private_key)?;
        let public_key = private_key.public_key();
        tracing::debug!(key_id = key_config.key_id(), "gateway key loaded");
        Ok(Self {
            private_key,
            public_key,
            key_config,
            labels: Labels::bhttp(),
            chunked_labels: Labels::chunked_bhttp(),
            random: SystemRandom,
        })
    }
}

impl<R: RandomSource> Gateway<R> {
    /// Labels for single-shot messages.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Labels for chunked messages.
    pub fn with_chunked_labels(mut self, labels: Labels) -> Self {
        self.chunked_labels = labels;
        self
    }

    pub fn with_random<S: RandomSource>(self, random: S) -> Gateway<S> {
        Gateway {
            private_key: self.private_key,
            public_key: self.public_key,
            key_config: self.key_config,
            labels: self.labels,
            chunked_labels: self.chunked_labels,
            random,
        }
    }

    pub fn decrypt_request(&self, wire: &[u8]) -> Result<Request> {
        Request::decapsulate_with_labels(wire, &self.private_key, self.key_config, &self.labels)
    }

    pub fn create_response(&self, plaintext: &[u8], context: &Context) -> Result<Response> {
        Response::encapsulate(plaintext, context, &self.random)
    }

    pub fn chunked_request_decoder(&self) -> ChunkedRequestDecoder<'_> {
        ChunkedRequestDecoder::new(&self.private_key, self.key_config, &self.chunked_labels)
    }

    pub fn chunked_response_encoder(&self, context: &Context) -> Result<ChunkedResponseEncoder> {
        ChunkedResponseEncoder::new(context, &self.random)
    }

    pub fn public_key(&self) -> &[u8] {
        self.public_key.as_bytes()
    }

    pub fn key_config(&self) -> KeyConfig {
        self.key_config
    }

    /// The `application/ohttp-keys` document advertising this gateway's key.
    pub fn key_directory(&self) -> Result<Vec<u8>> {
        let entry = KeyEntry {
            key_id: self.key_config.key_id(),
            kem_id: self.key_config.kem().id(),
            public_key: self.public_key.to_bytes(),
            symmetric_algorithms: vec![SymmetricAlgorithm {
                kdf_id: self.key_config.kdf().id(),
                aead_id: self.key_config.aead().id(),
            }],
        };
        let set = KeyConfigSet::from_entries([entry]).map_err(|e| {
            tracing::debug!(error = %e, "gateway key does not form a valid directory");
            OhttpError::FailedPrecondition("gateway key directory")
        })?;
        Ok(set.serialize())
    }
}
