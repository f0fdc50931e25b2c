//! Chunked OHTTP: incremental request and response streams.
//!
//! ```text
//!   request stream  = header || enc || chunk* || final_chunk
//!   response stream = response_nonce  || chunk* || final_chunk
//!
//!   chunk           = varint(len) || ciphertext[len]      len > 0, AAD ""
//!   final_chunk     = varint(0)   || ciphertext           to end, AAD "final"
//! ```
//!
//! Request chunks are sealed by the HPKE context, so their nonces follow its
//! sequence number. Response chunks use keys derived once per stream (see
//! [`crate::response`]) and a [`ChunkCounter`]:
//!
//! ```text
//!   chunk_nonce = aead_nonce XOR I2OSP(counter, Nn)
//! ```
//!
//! A stream that ends before its final chunk is `Truncated`. Because the
//! final chunk is authenticated under a different AAD, a non-final chunk
//! cannot be replayed as the last one.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::aead;
use crate::error::{OhttpError, Result};
use crate::kem::{KeyPair, PrivateKey, PublicKey};
use crate::key_config::KeyConfig;
use crate::labels::Labels;
use crate::random::RandomSource;
use crate::request::{self, Context};
use crate::response::{self, ResponseKeys};
use crate::wire::{write_varint, WireReader, HEADER_BYTES};

const FINAL_CHUNK_AAD: &[u8] = b"final";

/// Largest chunk ciphertext accepted or produced, final chunk included.
pub const MAX_CHUNK_BYTES: usize = 1 << 24;

fn chunk_aad(is_final: bool) -> &'static [u8] {
    if is_final {
        FINAL_CHUNK_AAD
    } else {
        b""
    }
}

// ---------------------------------------------------------------------------
// Chunk counter
// ---------------------------------------------------------------------------

/// Per-stream nonce sequence. Never wraps: the largest counter value for
/// `Nn` bytes is used once, after which the counter is exhausted.
pub struct ChunkCounter {
    base_nonce: Zeroizing<Vec<u8>>,
    counter: u128,
    max: u128,
    exhausted: bool,
}

impl core::fmt::Debug for ChunkCounter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChunkCounter")
            .field("counter", &self.counter)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl ChunkCounter {
    pub fn new(base_nonce: &[u8]) -> Result<Self> {
        let width = base_nonce.len();
        if width == 0 || width > 16 {
            return Err(OhttpError::InvalidArgument("chunk base nonce length"));
        }
        let max = if width == 16 {
            u128::MAX
        } else {
            (1u128 << (8 * width)) - 1
        };
        Ok(Self {
            base_nonce: Zeroizing::new(base_nonce.to_vec()),
            counter: 0,
            max,
            exhausted: false,
        })
    }

    /// Nonce for the next chunk.
    pub fn next_nonce(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if self.exhausted {
            return Err(OhttpError::NonceSpaceExhausted);
        }
        let mut nonce = self.base_nonce.clone();
        let counter = self.counter.to_be_bytes();
        let offset = counter.len() - nonce.len();
        for (n, c) in nonce.iter_mut().zip(&counter[offset..]) {
            *n ^= c;
        }
        if self.counter == self.max {
            tracing::debug!("chunk counter exhausted");
            self.exhausted = true;
        } else {
            self.counter += 1;
        }
        Ok(nonce)
    }

    pub fn counter(&self) -> u128 {
        self.counter
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

fn check_chunk_plaintext(plaintext: &[u8], is_final: bool, tag_len: usize) -> Result<()> {
    if !is_final && plaintext.is_empty() {
        return Err(OhttpError::InvalidArgument("empty non-final chunk"));
    }
    if plaintext.len() > MAX_CHUNK_BYTES - tag_len {
        return Err(OhttpError::InvalidArgument("chunk exceeds maximum size"));
    }
    Ok(())
}

fn frame_chunk(out: &mut Vec<u8>, ciphertext: &[u8], is_final: bool) -> Result<()> {
    let len = if is_final { 0 } else { ciphertext.len() as u64 };
    write_varint(out, len)?;
    out.extend_from_slice(ciphertext);
    Ok(())
}

#[derive(Debug)]
enum Chunk {
    Intermediate(Vec<u8>),
    Final(Vec<u8>),
}

/// Buffers partial input until whole chunks are available.
#[derive(Debug, Default)]
struct ChunkBuffer {
    pending: Vec<u8>,
}

impl ChunkBuffer {
    fn push(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
    }

    fn len(&self) -> usize {
        self.pending.len()
    }

    fn take_prefix(&mut self, len: usize) -> Vec<u8> {
        self.pending.drain(..len).collect()
    }

    /// Next complete chunk, or `None` if more input is needed.
    fn next_chunk(&mut self, end_of_stream: bool) -> Result<Option<Chunk>> {
        if self.pending.is_empty() {
            return if end_of_stream {
                Err(OhttpError::Truncated("final chunk"))
            } else {
                Ok(None)
            };
        }

        let mut reader = WireReader::new(&self.pending);
        let len = match reader.read_varint("chunk length") {
            Ok(len) => len,
            Err(e) if end_of_stream => return Err(e),
            Err(_) => return Ok(None),
        };
        let header_len = reader.position();

        if len == 0 {
            if reader.remaining() > MAX_CHUNK_BYTES {
                tracing::debug!(buffered = reader.remaining(), "final chunk over size limit");
                return Err(OhttpError::InvalidArgument("chunk exceeds maximum size"));
            }
            if !end_of_stream {
                return Ok(None);
            }
            let ciphertext = self.pending.split_off(header_len);
            self.pending.clear();
            return Ok(Some(Chunk::Final(ciphertext)));
        }

        let len = match usize::try_from(len) {
            Ok(len) if len <= MAX_CHUNK_BYTES => len,
            _ => {
                tracing::debug!(declared = len, "chunk length over size limit");
                return Err(OhttpError::InvalidArgument("chunk exceeds maximum size"));
            }
        };
        if reader.remaining() < len {
            return if end_of_stream {
                Err(OhttpError::Truncated("chunk"))
            } else {
                Ok(None)
            };
        }
        let mut chunk = self.take_prefix(header_len + len);
        let ciphertext = chunk.split_off(header_len);
        Ok(Some(Chunk::Intermediate(ciphertext)))
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Client side of a chunked request.
#[derive(Debug)]
pub struct ChunkedRequestEncoder {
    context: Context,
    prefix: Option<Vec<u8>>,
    finished: bool,
}

impl ChunkedRequestEncoder {
    pub fn new(
        public_key: &[u8],
        key_config: KeyConfig,
        labels: &Labels,
        random: &dyn RandomSource,
    ) -> Result<Self> {
        let public_key = request::parse_public_key(public_key, key_config)?;
        Self::for_public_key(&public_key, key_config, labels, random)
    }

    pub(crate) fn for_public_key(
        public_key: &PublicKey,
        key_config: KeyConfig,
        labels: &Labels,
        random: &dyn RandomSource,
    ) -> Result<Self> {
        let ephemeral = KeyPair::generate_from(key_config.kem(), random)?;
        Self::with_ephemeral(public_key, key_config, labels, ephemeral.private_key())
    }

    /// Deterministic variant: `seed` is the ephemeral private key.
    #[doc(hidden)]
    pub fn new_with_seed_for_testing(
        public_key: &[u8],
        key_config: KeyConfig,
        labels: &Labels,
        seed: &[u8],
    ) -> Result<Self> {
        let public_key = request::parse_public_key(public_key, key_config)?;
        let ephemeral = PrivateKey::from_bytes(key_config.kem(), seed)?;
        Self::with_ephemeral(&public_key, key_config, labels, &ephemeral)
    }

    fn with_ephemeral(
        public_key: &PublicKey,
        key_config: KeyConfig,
        labels: &Labels,
        ephemeral: &PrivateKey,
    ) -> Result<Self> {
        let context = request::sender_context(public_key, key_config, labels, ephemeral)?;
        let enc = context.encapsulated_key();
        let mut prefix = Vec::with_capacity(HEADER_BYTES + enc.len());
        prefix.extend_from_slice(&key_config.serialize_header());
        prefix.extend_from_slice(enc);
        Ok(Self {
            context,
            prefix: Some(prefix),
            finished: false,
        })
    }

    /// Seal one chunk. The first call's output also carries `header || enc`.
    pub fn encrypt_chunk(&mut self, plaintext: &[u8], is_final: bool) -> Result<Vec<u8>> {
        if self.finished {
            return Err(OhttpError::FailedPrecondition("request stream already finished"));
        }
        let tag_len = self.context.key_config().aead().tag_len();
        check_chunk_plaintext(plaintext, is_final, tag_len)?;
        let ciphertext = self.context.hpke_mut().seal(chunk_aad(is_final), plaintext)?;

        let mut out = self.prefix.take().unwrap_or_default();
        frame_chunk(&mut out, &ciphertext, is_final)?;
        self.finished = is_final;
        Ok(out)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Hand over the context once the final chunk has been sealed.
    pub fn release_context(self) -> Result<Context> {
        if !self.finished {
            return Err(OhttpError::FailedPrecondition("request stream not finished"));
        }
        Ok(self.context)
    }
}

/// Gateway side of a chunked request.
///
/// Any error other than waiting for input fails the stream: later calls
/// and `release_context` are rejected.
#[derive(Debug)]
pub struct ChunkedRequestDecoder<'k> {
    private_key: &'k PrivateKey,
    key_config: KeyConfig,
    labels: Labels,
    context: Option<Context>,
    buffer: ChunkBuffer,
    finished: bool,
    failed: bool,
}

impl<'k> ChunkedRequestDecoder<'k> {
    pub fn new(private_key: &'k PrivateKey, key_config: KeyConfig, labels: &Labels) -> Self {
        Self {
            private_key,
            key_config,
            labels: labels.clone(),
            context: None,
            buffer: ChunkBuffer::default(),
            finished: false,
            failed: false,
        }
    }

    /// Feed the next slice of the stream; returns the plaintext of every
    /// chunk it completed. `data` may split chunks anywhere.
    pub fn decrypt(&mut self, data: &[u8], end_of_stream: bool) -> Result<Vec<u8>> {
        if self.failed {
            return Err(OhttpError::FailedPrecondition("request stream failed"));
        }
        if self.finished {
            if data.is_empty() {
                return Ok(Vec::new());
            }
            return Err(OhttpError::FailedPrecondition("request stream already finished"));
        }
        let result = self.decrypt_buffered(data, end_of_stream);
        self.failed = result.is_err();
        result
    }

    fn decrypt_buffered(&mut self, data: &[u8], end_of_stream: bool) -> Result<Vec<u8>> {
        self.buffer.push(data);

        let context = match self.context.take() {
            Some(context) => context,
            None => match self.open_header(end_of_stream)? {
                Some(context) => context,
                None => return Ok(Vec::new()),
            },
        };
        let context = self.context.insert(context);

        let mut plaintext = Vec::new();
        while let Some(chunk) = self.buffer.next_chunk(end_of_stream)? {
            let (ciphertext, is_final) = match chunk {
                Chunk::Intermediate(ct) => (ct, false),
                Chunk::Final(ct) => (ct, true),
            };
            let pt = context.hpke_mut().open(chunk_aad(is_final), &ciphertext).map_err(|e| {
                tracing::debug!(is_final, error = %e, "request chunk rejected");
                e
            })?;
            plaintext.extend_from_slice(&pt);
            if is_final {
                self.finished = true;
                break;
            }
        }
        Ok(plaintext)
    }

    /// Set up the context once `header || enc` has arrived.
    fn open_header(&mut self, end_of_stream: bool) -> Result<Option<Context>> {
        let prefix_len = HEADER_BYTES + self.key_config.kem().enc_len();
        if self.buffer.len() < prefix_len {
            if end_of_stream {
                return Err(OhttpError::Truncated("chunked request header"));
            }
            return Ok(None);
        }
        let prefix = self.buffer.take_prefix(prefix_len);
        let mut reader = WireReader::new(&prefix);
        request::recipient_context(&mut reader, self.private_key, self.key_config, &self.labels)
            .map(Some)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Hand over the context once the final chunk has been opened.
    pub fn release_context(self) -> Result<Context> {
        if self.failed {
            return Err(OhttpError::FailedPrecondition("request stream failed"));
        }
        if !self.finished {
            return Err(OhttpError::FailedPrecondition("request stream not finished"));
        }
        self.context
            .ok_or(OhttpError::FailedPrecondition("request stream not finished"))
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Gateway side of a chunked response.
#[derive(Debug)]
pub struct ChunkedResponseEncoder {
    keys: ResponseKeys,
    counter: ChunkCounter,
    prefix: Option<Vec<u8>>,
    finished: bool,
}

impl ChunkedResponseEncoder {
    pub fn new(context: &Context, random: &dyn RandomSource) -> Result<Self> {
        let response_nonce = response::fresh_response_nonce(context, random)?;
        let keys = response::derive_response_keys(context, &response_nonce)?;
        let counter = ChunkCounter::new(keys.nonce())?;
        Ok(Self {
            keys,
            counter,
            prefix: Some(response_nonce),
            finished: false,
        })
    }

    /// Seal one chunk. The first call's output also carries the response
    /// nonce.
    pub fn encrypt_chunk(&mut self, plaintext: &[u8], is_final: bool) -> Result<Vec<u8>> {
        if self.finished {
            return Err(OhttpError::FailedPrecondition("response stream already finished"));
        }
        check_chunk_plaintext(plaintext, is_final, self.keys.aead().tag_len())?;
        let nonce = self.counter.next_nonce()?;
        let ciphertext = aead::seal(
            self.keys.aead(),
            self.keys.key(),
            &nonce,
            chunk_aad(is_final),
            plaintext,
        )?;

        let mut out = self.prefix.take().unwrap_or_default();
        frame_chunk(&mut out, &ciphertext, is_final)?;
        self.finished = is_final;
        Ok(out)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Client side of a chunked response. Fails the stream on the first error,
/// like [`ChunkedRequestDecoder`].
#[derive(Debug)]
pub struct ChunkedResponseDecoder<'c> {
    context: &'c Context,
    state: Option<(ResponseKeys, ChunkCounter)>,
    buffer: ChunkBuffer,
    finished: bool,
    failed: bool,
}

impl<'c> ChunkedResponseDecoder<'c> {
    pub fn new(context: &'c Context) -> Self {
        Self {
            context,
            state: None,
            buffer: ChunkBuffer::default(),
            finished: false,
            failed: false,
        }
    }

    /// Feed the next slice of the stream; returns the plaintext of every
    /// chunk it completed.
    pub fn decrypt(&mut self, data: &[u8], end_of_stream: bool) -> Result<Vec<u8>> {
        if self.failed {
            return Err(OhttpError::FailedPrecondition("response stream failed"));
        }
        if self.finished {
            if data.is_empty() {
                return Ok(Vec::new());
            }
            return Err(OhttpError::FailedPrecondition("response stream already finished"));
        }
        let result = self.decrypt_buffered(data, end_of_stream);
        self.failed = result.is_err();
        result
    }

    fn decrypt_buffered(&mut self, data: &[u8], end_of_stream: bool) -> Result<Vec<u8>> {
        self.buffer.push(data);

        let state = match self.state.take() {
            Some(state) => state,
            None => match self.read_nonce(end_of_stream)? {
                Some(state) => state,
                None => return Ok(Vec::new()),
            },
        };
        let (keys, counter) = self.state.insert(state);

        let mut plaintext = Vec::new();
        while let Some(chunk) = self.buffer.next_chunk(end_of_stream)? {
            let (ciphertext, is_final) = match chunk {
                Chunk::Intermediate(ct) => (ct, false),
                Chunk::Final(ct) => (ct, true),
            };
            let nonce = counter.next_nonce()?;
            let pt = aead::open(keys.aead(), keys.key(), &nonce, chunk_aad(is_final), &ciphertext)
                .map_err(|e| {
                    tracing::debug!(is_final, counter = counter.counter(), "response chunk did not authenticate");
                    e
                })?;
            plaintext.extend_from_slice(&pt);
            if is_final {
                self.finished = true;
                break;
            }
        }
        Ok(plaintext)
    }

    /// Derive the stream keys once the response nonce has arrived.
    fn read_nonce(&mut self, end_of_stream: bool) -> Result<Option<(ResponseKeys, ChunkCounter)>> {
        let nonce_len = self.context.key_config().aead().response_secret_len();
        if self.buffer.len() < nonce_len {
            if end_of_stream {
                return Err(OhttpError::Truncated("response nonce"));
            }
            return Ok(None);
        }
        let response_nonce = self.buffer.take_prefix(nonce_len);
        let keys = response::derive_response_keys(self.context, &response_nonce)?;
        let counter = ChunkCounter::new(keys.nonce())?;
        Ok(Some((keys, counter)))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
