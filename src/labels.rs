//! Domain-separation labels.
//!
//! The request label is bound into the HPKE context info, the response
//! label into the exporter call that seeds response keys. Both sides must
//! agree on the pair or decryption fails.

extern crate alloc;
use alloc::borrow::Cow;
use alloc::vec::Vec;

use crate::error::{OhttpError, Result};

pub const BHTTP_REQUEST_LABEL: &[u8] = b"message/bhttp request";
pub const BHTTP_RESPONSE_LABEL: &[u8] = b"message/bhttp response";
pub const CHUNKED_BHTTP_REQUEST_LABEL: &[u8] = b"message/bhttp chunked request";
pub const CHUNKED_BHTTP_RESPONSE_LABEL: &[u8] = b"message/bhttp chunked response";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    request: Cow<'static, [u8]>,
    response: Cow<'static, [u8]>,
}

impl Labels {
    /// Binary HTTP messages (RFC 9458 §4.1).
    pub const fn bhttp() -> Self {
        Self {
            request: Cow::Borrowed(BHTTP_REQUEST_LABEL),
            response: Cow::Borrowed(BHTTP_RESPONSE_LABEL),
        }
    }

    /// Chunked binary HTTP messages.
    pub const fn chunked_bhttp() -> Self {
        Self {
            request: Cow::Borrowed(CHUNKED_BHTTP_REQUEST_LABEL),
            response: Cow::Borrowed(CHUNKED_BHTTP_RESPONSE_LABEL),
        }
    }

    /// Application-defined media types. Neither label may be empty.
    pub fn custom(request: impl Into<Vec<u8>>, response: impl Into<Vec<u8>>) -> Result<Self> {
        let request = request.into();
        let response = response.into();
        if request.is_empty() || response.is_empty() {
            return Err(OhttpError::InvalidArgument("empty label"));
        }
        Ok(Self {
            request: Cow::Owned(request),
            response: Cow::Owned(response),
        })
    }

    pub fn request(&self) -> &[u8] {
        &self.request
    }

    pub fn response(&self) -> &[u8] {
        &self.response
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::bhttp()
    }
}
