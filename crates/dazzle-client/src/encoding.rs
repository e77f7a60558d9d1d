// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload normalisation for transport.
//
// ZPL may carry 8-bit graphics data inside what looks like text, so text is
// never run through a multi-byte encoder: every UTF-16 code unit contributes
// exactly its low byte. Binary payloads pass through untouched. The canonical
// bytes are then base64-encoded (standard alphabet, padded, no line breaks)
// for the text-only request body.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use dazzle_core::error::{DazzleError, Result};

/// A print payload as handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Byte-per-character text (Latin-1 style).
    Text(String),
    /// Raw bytes, sent as-is.
    Bytes(Vec<u8>),
}

impl Payload {
    /// Canonical byte sequence for this payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Text(text) => text_to_bytes(text),
            Self::Bytes(bytes) => bytes.clone(),
        }
    }

    /// Base64 text of [`Payload::to_bytes`].
    pub fn to_base64(&self) -> String {
        encode_base64(&self.to_bytes())
    }

    /// Number of canonical bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.encode_utf16().count(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Payload {
    fn from(bytes: [u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(bytes: &[u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Take the low 8 bits of each UTF-16 code unit.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().map(|unit| (unit & 0xFF) as u8).collect()
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| DazzleError::InvalidPayload(format!("invalid base64: {e}")))
}
