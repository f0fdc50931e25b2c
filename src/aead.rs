//! AEAD: AES-128-GCM, AES-256-GCM, ChaCha20-Poly1305.
//!
//! Seal failures map to `CryptoSealFailed`, open failures to the uniform
//! `DecryptionFailed`.

extern crate alloc;
use alloc::vec::Vec;

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead as _, KeyInit, Payload},
    Aes128Gcm, Aes256Gcm,
};
use chacha20poly1305::ChaCha20Poly1305;

use crate::algorithms::Aead;
use crate::error::{OhttpError, Result};

/// AEAD seal (encrypt path). Returns `ciphertext || tag`.
pub fn seal(aead: Aead, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != aead.key_len() || nonce.len() != aead.nonce_len() {
        return Err(OhttpError::CryptoSealFailed);
    }
    let n = GenericArray::from_slice(nonce);
    let payload = Payload { msg: plaintext, aad };
    let sealed = match aead {
        Aead::Aes128Gcm => Aes128Gcm::new_from_slice(key)
            .map_err(|_| OhttpError::CryptoSealFailed)?
            .encrypt(n, payload),
        Aead::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(|_| OhttpError::CryptoSealFailed)?
            .encrypt(n, payload),
        Aead::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| OhttpError::CryptoSealFailed)?
            .encrypt(n, payload),
    };
    sealed.map_err(|_| OhttpError::CryptoSealFailed)
}

/// AEAD open (decrypt path).
pub fn open(aead: Aead, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != aead.key_len() || nonce.len() != aead.nonce_len() {
        return Err(OhttpError::DecryptionFailed);
    }
    if ciphertext.len() < aead.tag_len() {
        return Err(OhttpError::DecryptionFailed);
    }
    let n = GenericArray::from_slice(nonce);
    let payload = Payload { msg: ciphertext, aad };
    let opened = match aead {
        Aead::Aes128Gcm => Aes128Gcm::new_from_slice(key)
            .map_err(|_| OhttpError::DecryptionFailed)?
            .decrypt(n, payload),
        Aead::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(|_| OhttpError::DecryptionFailed)?
            .decrypt(n, payload),
        Aead::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| OhttpError::DecryptionFailed)?
            .decrypt(n, payload),
    };
    opened.map_err(|_| OhttpError::DecryptionFailed)
}
