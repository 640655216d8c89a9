//! Canonical document identifiers.
//!
//! A [`DocumentId`] is 12 bytes: a 4-byte big-endian seconds timestamp
//! followed by 8 random bytes, rendered as 24 hex characters. Inside a
//! document the canonical form is the extended-JSON object
//! `{"$oid": "<hex>"}`, which is what identifier-lookup coercion produces
//! before an equality query is built.

use chrono::Utc;
use rand::RngCore;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Key of the extended-JSON identifier form.
pub const OID_KEY: &str = "$oid";

/// A 12-byte document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId([u8; 12]);

/// Why a string failed to parse as a [`DocumentId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// Wrong input length
    #[error("expected 24 hex characters, got {0}")]
    Length(usize),
    /// A non-hex byte in the input
    #[error("invalid hex digit {0:?}")]
    Digit(char),
}

impl DocumentId {
    /// Generate a fresh identifier: current time in the leading 4 bytes,
    /// random tail.
    pub fn new() -> Self {
        let mut bytes = [0u8; 12];
        let secs = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[4..]);
        Self(bytes)
    }

    /// Parse a 24-character hex string.
    pub fn parse_str(s: &str) -> Result<Self, IdParseError> {
        let raw = s.as_bytes();
        if raw.len() != 24 {
            return Err(IdParseError::Length(raw.len()));
        }
        let mut bytes = [0u8; 12];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            bytes[i] = (hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?;
        }
        Ok(Self(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Seconds timestamp embedded in the leading bytes.
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// The canonical in-document form: `{"$oid": "<hex>"}`.
    pub fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::with_capacity(1);
        obj.insert(OID_KEY.to_string(), Value::String(self.to_string()));
        Value::Object(obj)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for DocumentId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

fn hex_nibble(byte: u8) -> Result<u8, IdParseError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        other => Err(IdParseError::Digit(other as char)),
    }
}
