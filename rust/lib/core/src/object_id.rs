//! 12-byte document identifiers.
//!
//! Layout (big-endian):
//!
//! ```text
//! [0..4)   seconds since the Unix epoch
//! [4..9)   random value, fixed for the lifetime of the process
//! [9..12)  counter, seeded randomly, wraps at 2^24
//! ```
//!
//! The text form is exactly 24 lowercase hex characters. Anything else is
//! rejected by [`ObjectId::parse`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the text form.
pub const HEX_LEN: usize = 24;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Binary document identifier. Serialized as its 12 raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId([u8; 12]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid id {0:?}: expected {HEX_LEN} lowercase hex characters")]
pub struct InvalidObjectId(pub String);

impl ObjectId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let process = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().r#gen());
        let count = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().r#gen::<u32>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parse the 24-char lowercase hex form. Returns None for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != HEX_LEN
            || !text
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return None;
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(text, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Canonical lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidObjectId(s.to_string()))
    }
}
