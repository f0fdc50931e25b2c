//! Key configuration set: the gateway's published key directory
//! (`application/ohttp-keys`).
//!
//! Record (repeated, no separators):
//!   key_id[1] || kem_id[2] || public_key[Npk] || alg_len[2] || (kdf_id[2] || aead_id[2])*
//!
//! Invariants: every key id with a public key has at least one
//! configuration, and no key id appears twice. Immutable after
//! construction, so it can be shared across threads freely.

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use core::cmp::Reverse;

use crate::algorithms::{resolve_kem, Kem};
use crate::error::{OhttpError, Result};
use crate::kem::PublicKey;
use crate::key_config::{KeyConfig, PayloadHeader};
use crate::wire::WireReader;

/// Size of one `(kdf_id, aead_id)` pair on the wire.
const SYMMETRIC_ALGORITHM_BYTES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymmetricAlgorithm {
    pub kdf_id: u16,
    pub aead_id: u16,
}

/// One public key and the symmetric algorithms offered with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub key_id: u8,
    pub kem_id: u16,
    pub public_key: Vec<u8>,
    pub symmetric_algorithms: Vec<SymmetricAlgorithm>,
}

#[derive(Debug, Clone)]
pub struct KeyConfigSet {
    configs: BTreeMap<Reverse<u8>, Vec<KeyConfig>>,
    public_keys: BTreeMap<u8, PublicKey>,
    preferred: KeyConfig,
}

#[derive(Default)]
struct Builder {
    configs: BTreeMap<Reverse<u8>, Vec<KeyConfig>>,
    public_keys: BTreeMap<u8, PublicKey>,
}

impl Builder {
    fn insert(
        &mut self,
        key_id: u8,
        kem: Kem,
        public_key: &[u8],
        algorithms: impl IntoIterator<Item = SymmetricAlgorithm>,
    ) -> Result<()> {
        if self.public_keys.contains_key(&key_id) {
            tracing::debug!(key_id, "duplicate key id in key directory");
            return Err(OhttpError::DuplicateKeyId(key_id));
        }
        if public_key.len() != kem.public_key_len() {
            return Err(OhttpError::InvalidArgument("public key length does not match KEM"));
        }
        let public_key = PublicKey::from_bytes(kem, public_key)?;

        let mut configs: Vec<KeyConfig> = Vec::new();
        for alg in algorithms {
            let config = KeyConfig::create(key_id, kem.id(), alg.kdf_id, alg.aead_id)?;
            if !configs.contains(&config) {
                configs.push(config);
            }
        }
        if configs.is_empty() {
            return Err(OhttpError::InvalidArgument("key has no symmetric algorithms"));
        }
        if configs.len() * SYMMETRIC_ALGORITHM_BYTES > usize::from(u16::MAX) {
            return Err(OhttpError::InvalidArgument("too many symmetric algorithms"));
        }

        self.configs.insert(Reverse(key_id), configs);
        self.public_keys.insert(key_id, public_key);
        Ok(())
    }

    fn finish(self) -> Result<KeyConfigSet> {
        let preferred = self
            .configs
            .values()
            .next()
            .and_then(|configs| configs.first())
            .copied()
            .ok_or(OhttpError::InvalidArgument("empty key directory"))?;
        Ok(KeyConfigSet {
            configs: self.configs,
            public_keys: self.public_keys,
            preferred,
        })
    }
}

impl KeyConfigSet {
    /// Parse concatenated key configuration records.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OhttpError::InvalidArgument("empty key directory"));
        }
        let mut reader = WireReader::new(bytes);
        let mut builder = Builder::default();

        while !reader.is_empty() {
            let key_id = reader.read_u8("key id")?;
            let kem_id = reader.read_u16("kem id")?;
            let kem = resolve_kem(kem_id).map_err(|_| {
                tracing::debug!(key_id, kem_id, "key directory names an unknown KEM");
                OhttpError::UnknownKem(kem_id)
            })?;
            let public_key = reader.read_bytes(kem.public_key_len(), "public key")?;

            let algorithms = reader.read_u16_prefixed("symmetric algorithms")?;
            if algorithms.len() % SYMMETRIC_ALGORITHM_BYTES != 0 {
                return Err(OhttpError::Truncated("symmetric algorithms"));
            }
            let pairs = algorithms
                .chunks_exact(SYMMETRIC_ALGORITHM_BYTES)
                .map(|pair| SymmetricAlgorithm {
                    kdf_id: u16::from_be_bytes([pair[0], pair[1]]),
                    aead_id: u16::from_be_bytes([pair[2], pair[3]]),
                });

            builder.insert(key_id, kem, public_key, pairs)?;
        }

        builder.finish()
    }

    /// Build from explicit entries, validated exactly as `parse` would.
    pub fn from_entries(entries: impl IntoIterator<Item = KeyEntry>) -> Result<Self> {
        let mut builder = Builder::default();
        for entry in entries {
            let kem = resolve_kem(entry.kem_id).map_err(|_| OhttpError::UnknownKem(entry.kem_id))?;
            builder.insert(
                entry.key_id,
                kem,
                &entry.public_key,
                entry.symmetric_algorithms.iter().copied(),
            )?;
        }
        builder.finish()
    }

    /// Regenerate the `application/ohttp-keys` bytes, highest key id first.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (Reverse(key_id), configs) in &self.configs {
            let Some(public_key) = self.public_keys.get(key_id) else {
                continue;
            };
            out.push(*key_id);
            out.extend_from_slice(&public_key.kem().id().to_be_bytes());
            out.extend_from_slice(public_key.as_bytes());
            // Bounded by the check in `Builder::insert`.
            let alg_len = (configs.len() * SYMMETRIC_ALGORITHM_BYTES) as u16;
            out.extend_from_slice(&alg_len.to_be_bytes());
            for config in configs {
                out.extend_from_slice(&config.kdf().id().to_be_bytes());
                out.extend_from_slice(&config.aead().id().to_be_bytes());
            }
        }
        out
    }

    /// First configuration under the numerically greatest key id.
    pub fn preferred_config(&self) -> KeyConfig {
        self.preferred
    }

    pub fn public_key_for(&self, key_id: u8) -> Result<&[u8]> {
        self.public_keys
            .get(&key_id)
            .map(PublicKey::as_bytes)
            .ok_or(OhttpError::NotFound(key_id))
    }

    pub fn configs_for(&self, key_id: u8) -> Result<&[KeyConfig]> {
        self.configs
            .get(&Reverse(key_id))
            .map(Vec::as_slice)
            .ok_or(OhttpError::NotFound(key_id))
    }

    /// The configuration an encapsulated request was made under.
    pub fn config_for_request(&self, request: &[u8]) -> Result<KeyConfig> {
        let header = PayloadHeader::parse(request)?;
        self.configs_for(header.key_id)?
            .iter()
            .find(|c| {
                c.kem().id() == header.kem_id && c.kdf().id() == header.kdf_id && c.aead().id() == header.aead_id
            })
            .copied()
            .ok_or(OhttpError::NotFound(header.key_id))
    }

    pub fn num_keys(&self) -> usize {
        self.public_keys.len()
    }

    /// Every configuration, highest key id first.
    pub fn iter(&self) -> impl Iterator<Item = &KeyConfig> + '_ {
        self.configs.values().flatten()
    }
}
