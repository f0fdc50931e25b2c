//! Secure random source.
//!
//! Injected wherever the codec draws randomness (ephemeral KEM keys,
//! response nonces) so callers can supply a test double. The default,
//! [`SystemRandom`], reads the operating system's entropy source and is
//! safe to share across threads.

use crate::error::{OhttpError, Result};

pub trait RandomSource: Send + Sync {
    /// Fill `dest` with cryptographically secure random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// OS-provided entropy (`getrandom`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        getrandom::getrandom(dest).map_err(|_| OhttpError::EntropyUnavailable)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &T {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        (**self).fill(dest)
    }
}
