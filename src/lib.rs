//! # Oblivious HTTP
//!
//! Request/response encapsulation for Oblivious HTTP (RFC 9458) over HPKE
//! base mode (RFC 9180), plus chunked streaming.
//!
//! ## Quick Start
//!
//! ```rust
//! use oblivious_http::{Client, Gateway, KeyConfig, KeyPair, Kem};
//!
//! let config = KeyConfig::create(1, 0x0020, 0x0001, 0x0001).unwrap();
//! let keys = KeyPair::generate(Kem::X25519HkdfSha256);
//!
//! let gateway = Gateway::new(&keys.private_key().to_bytes(), config).unwrap();
//! let client = Client::new(gateway.public_key(), config).unwrap();
//!
//! // Client -> relay -> gateway
//! let mut request = client.create_request(b"ping").unwrap();
//! let wire = request.serialize();
//! let client_context = request.release_context();
//!
//! let mut received = gateway.decrypt_request(&wire).unwrap();
//! assert_eq!(received.plaintext(), b"ping");
//! let gateway_context = received.release_context();
//!
//! // Gateway -> relay -> client
//! let response = gateway.create_response(b"pong", &gateway_context).unwrap();
//! let decrypted = client.decrypt_response(response.wire_bytes(), &client_context).unwrap();
//! assert_eq!(decrypted.plaintext(), b"pong");
//! ```
//!
//! ## Security Properties
//!
//! - **Uniform errors**: every cryptographic failure on a receive path is
//!   [`OhttpError::DecryptionFailed`]
//! - **Context binding**: the key configuration and labels are bound into
//!   the HPKE context info; a mismatch fails decryption
//! - **Fresh response keys**: each response derives its own key from a
//!   random nonce
//! - **No nonce reuse**: sequence numbers and chunk counters never wrap
//!
//! ## What's NOT Provided
//!
//! - Binary HTTP framing (payloads are opaque bytes)
//! - Relay or transport plumbing
//! - Key storage or rotation

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/oblivious-http/0.1.0")]

extern crate alloc;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

pub mod aead;
pub mod algorithms;
pub mod hpke;
pub mod kdf;
pub mod kem;
pub mod random;

// Wire helpers are exposed for fuzzing and inspection, not as stable API.
#[doc(hidden)]
pub mod wire;

// ---------------------------------------------------------------------------
// OHTTP
// ---------------------------------------------------------------------------

pub mod chunked;
pub mod client;
pub mod error;
pub mod gateway;
pub mod key_config;
pub mod key_configs;
pub mod labels;
pub mod request;
pub mod response;

pub use algorithms::{resolve_aead, resolve_kdf, resolve_kem, Aead, Kdf, Kem};
pub use chunked::{
    ChunkCounter, ChunkedRequestDecoder, ChunkedRequestEncoder, ChunkedResponseDecoder,
    ChunkedResponseEncoder, MAX_CHUNK_BYTES,
};
pub use client::Client;
pub use error::{AlgorithmKind, HeaderField, OhttpError, Result};
pub use gateway::Gateway;
pub use kem::{KeyPair, PrivateKey, PublicKey};
pub use key_config::{key_id_of_request, KeyConfig, PayloadHeader};
pub use key_configs::{KeyConfigSet, KeyEntry, SymmetricAlgorithm};
pub use labels::Labels;
pub use random::{RandomSource, SystemRandom};
pub use request::{Context, Request};
pub use response::{derive_response_keys, Response, ResponseKeys};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
