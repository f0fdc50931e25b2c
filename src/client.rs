//! Client façade: one gateway public key, many requests.

use crate::chunked::{ChunkedRequestEncoder, ChunkedResponseDecoder};
use crate::error::{OhttpError, Result};
use crate::kem::PublicKey;
use crate::key_config::KeyConfig;
use crate::labels::Labels;
use crate::random::{RandomSource, SystemRandom};
use crate::request::{Context, Request};
use crate::response::Response;

/// Binds a gateway's public key and key configuration.
///
/// Stateless after construction; share it freely across threads when `R`
/// allows.
#[derive(Debug, Clone)]
pub struct Client<R: RandomSource = SystemRandom> {
    public_key: PublicKey,
    key_config: KeyConfig,
    labels: Labels,
    chunked_labels: Labels,
    random: R,
}

impl Client<SystemRandom> {
    pub fn new(public_key: &[u8], key_config: KeyConfig) -> Result<Self> {
        let public_key = PublicKey::from_bytes(key_config.kem(), public_key)?;
        if public_key.is_low_order() {
            tracing::debug!(key_id = key_config.key_id(), "gateway public key is a low-order point");
            return Err(OhttpError::InvalidArgument("public key is a low-order point"));
        }
        Ok(Self {
            public_key,
            key_config,
            labels: Labels::bhttp(),
            chunked_labels: Labels::chunked_bhttp(),
            random: SystemRandom,
        })
    }
}

impl<R: RandomSource> Client<R> {
    /// Labels for single-shot requests.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Labels for chunked requests.
    pub fn with_chunked_labels(mut self, labels: Labels) -> Self {
        self.chunked_labels = labels;
        self
    }

    pub fn with_random<S: RandomSource>(self, random: S) -> Client<S> {
        Client {
            public_key: self.public_key,
            key_config: self.key_config,
            labels: self.labels,
            chunked_labels: self.chunked_labels,
            random,
        }
    }

    pub fn create_request(&self, plaintext: &[u8]) -> Result<Request> {
        Request::seal(plaintext, &self.public_key, self.key_config, &self.labels, &self.random)
    }

    pub fn decrypt_response(&self, wire: &[u8], context: &Context) -> Result<Response> {
        Response::decapsulate(wire, context)
    }

    pub fn chunked_request_encoder(&self) -> Result<ChunkedRequestEncoder> {
        ChunkedRequestEncoder::for_public_key(&self.public_key, self.key_config, &self.chunked_labels, &self.random)
    }

    pub fn chunked_response_decoder<'c>(&self, context: &'c Context) -> ChunkedResponseDecoder<'c> {
        ChunkedResponseDecoder::new(context)
    }

    pub fn public_key(&self) -> &[u8] {
        self.public_key.as_bytes()
    }

    pub fn key_config(&self) -> KeyConfig {
        self.key_config
    }
}

