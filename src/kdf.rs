//! KDF: HKDF over SHA-256/384/512, plus the RFC 9180 labeled forms.
//!
//! labeled_ikm  = "HPKE-v1" || suite_id || label || ikm
//! labeled_info = I2OSP(L, 2) || "HPKE-v1" || suite_id || label || info

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::algorithms::Kdf;
use crate::error::{OhttpError, Result};

/// Version prefix for every labeled derivation.
pub const HPKE_VERSION_ID: &[u8] = b"HPKE-v1";

/// HKDF-Extract. An empty salt is equivalent to `Nh` zero bytes.
pub fn extract(kdf: Kdf, salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
    let prk = match kdf {
        Kdf::HkdfSha256 => Hkdf::<Sha256>::extract(Some(salt), ikm).0.to_vec(),
        Kdf::HkdfSha384 => Hkdf::<Sha384>::extract(Some(salt), ikm).0.to_vec(),
        Kdf::HkdfSha512 => Hkdf::<Sha512>::extract(Some(salt), ikm).0.to_vec(),
    };
    Zeroizing::new(prk)
}

/// HKDF-Expand to exactly `len` bytes.
pub fn expand(kdf: Kdf, prk: &[u8], info: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut okm = Zeroizing::new(vec![0u8; len]);
    let expanded = match kdf {
        Kdf::HkdfSha256 => Hkdf::<Sha256>::from_prk(prk)
            .map_err(|_| OhttpError::InvalidArgument("pseudorandom key too short"))?
            .expand(info, &mut okm),
        Kdf::HkdfSha384 => Hkdf::<Sha384>::from_prk(prk)
            .map_err(|_| OhttpError::InvalidArgument("pseudorandom key too short"))?
            .expand(info, &mut okm),
        Kdf::HkdfSha512 => Hkdf::<Sha512>::from_prk(prk)
            .map_err(|_| OhttpError::InvalidArgument("pseudorandom key too short"))?
            .expand(info, &mut okm),
    };
    expanded.map_err(|_| OhttpError::InvalidArgument("requested output too long for KDF"))?;
    Ok(okm)
}

pub fn labeled_extract(
    kdf: Kdf,
    suite_id: &[u8],
    salt: &[u8],
    label: &[u8],
    ikm: &[u8],
) -> Zeroizing<Vec<u8>> {
    let mut labeled_ikm =
        Zeroizing::new(Vec::with_capacity(HPKE_VERSION_ID.len() + suite_id.len() + label.len() + ikm.len()));
    labeled_ikm.extend_from_slice(HPKE_VERSION_ID);
    labeled_ikm.extend_from_slice(suite_id);
    labeled_ikm.extend_from_slice(label);
    labeled_ikm.extend_from_slice(ikm);
    extract(kdf, salt, &labeled_ikm)
}

pub fn labeled_expand(
    kdf: Kdf,
    suite_id: &[u8],
    prk: &[u8],
    label: &[u8],
    info: &[u8],
    len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let len_prefix = u16::try_from(len)
        .map_err(|_| OhttpError::InvalidArgument("requested output too long for KDF"))?;

    let mut labeled_info =
        Vec::with_capacity(2 + HPKE_VERSION_ID.len() + suite_id.len() + label.len() + info.len());
    labeled_info.extend_from_slice(&len_prefix.to_be_bytes());
    labeled_info.extend_from_slice(HPKE_VERSION_ID);
    labeled_info.extend_from_slice(suite_id);
    labeled_info.extend_from_slice(label);
    labeled_info.extend_from_slice(info);
    expand(kdf, prk, &labeled_info, len)
}
