pub mod chain;
pub mod constants;
pub mod error;
pub mod mine;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use chain::{Chain, ChainConfig, ChainViolation, ViolationKind};
pub use error::{LedgerError, Result};
pub use pow::Difficulty;

/// SHA-256 of the UTF-8 bytes of `input`, as lowercase hex.
pub fn digest_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Milliseconds since the Unix epoch. A clock set before 1970 reads as 0.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn content_string(
    position: u64,
    created_at: u64,
    previous_hash: &str,
    payload: &str,
    nonce: u64,
) -> String {
    format!("{position}{created_at}{previous_hash}{payload}{nonce}")
}

/// The fields of a block that are fixed before the nonce search starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub position: u64,
    pub created_at: u64,
    pub previous_hash: String,
    pub payload: String,
}

impl BlockTemplate {
    pub fn new(position: u64, payload: impl Into<String>, previous_hash: impl Into<String>) -> Self {
        Self::with_timestamp(position, now_millis(), payload, previous_hash)
    }

    pub fn with_timestamp(
        position: u64,
        created_at: u64,
        payload: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            position,
            created_at,
            previous_hash: previous_hash.into(),
            payload: payload.into(),
        }
    }

    /// Canonical content string for this template at the given nonce:
    /// position, created_at, previous_hash, payload, nonce with no separators.
    pub fn content(&self, nonce: u64) -> String {
        content_string(
            self.position,
            self.created_at,
            &self.previous_hash,
            &self.payload,
            nonce,
        )
    }

    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        digest_hex(&self.content(nonce))
    }

    /// Finalize without any proof-of-work (nonce 0).
    pub fn seal(self) -> Block {
        let hash = self.hash_with_nonce(0);
        Block::from_parts(self, 0, hash)
    }

    /// Search nonces until the hash meets `difficulty`. See [`mine::mine_block`].
    pub fn mine(self, difficulty: Difficulty, max_attempts: Option<u64>) -> Result<Block> {
        mine::mine_block(self, difficulty, max_attempts)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) position: u64,
    pub(crate) created_at: u64,
    pub(crate) payload: String,
    pub(crate) previous_hash: String,
    pub(crate) nonce: u64,
    pub(crate) hash: String,
}

impl Block {
    /// A block with `created_at` set to now, nonce 0 and its hash computed.
    pub fn new(position: u64, payload: impl Into<String>, previous_hash: impl Into<String>) -> Self {
        BlockTemplate::new(position, payload, previous_hash).seal()
    }

    pub fn with_timestamp(
        position: u64,
        created_at: u64,
        payload: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        BlockTemplate::with_timestamp(position, created_at, payload, previous_hash).seal()
    }

    pub(crate) fn from_parts(template: BlockTemplate, nonce: u64, hash: String) -> Self {
        Self {
            position: template.position,
            created_at: template.created_at,
            payload: template.payload,
            previous_hash: template.previous_hash,
            nonce,
            hash,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The hash stored at construction time.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Recompute the digest from the current field values.
    pub fn compute_hash(&self) -> String {
        digest_hex(&content_string(
            self.position,
            self.created_at,
            &self.previous_hash,
            &self.payload,
            self.nonce,
        ))
    }

    pub fn is_intact(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn meets_difficulty(&self, difficulty: Difficulty) -> bool {
        pow::meets_difficulty(&self.hash, difficulty)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block {{")?;
        writeln!(f, "   position: {}", self.position)?;
        writeln!(f, "   created_at: {}", self.created_at)?;
        writeln!(f, "   payload: '{}'", self.payload)?;
        writeln!(f, "   previous_hash: '{}'", self.previous_hash)?;
        writeln!(f, "   hash: '{}'", self.hash)?;
        writeln!(f, "   nonce: {}", self.nonce)?;
        write!(f, "}}")
    }
}

pub mod pow {
    use crate::constants::{HASH_HEX_SIZE, POW_DEFAULT_DIFFICULTY};
    use crate::error::{LedgerError, Result};
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// Number of leading `'0'` hex digits a mined hash must carry.
    /// Always below the hex length of a digest, so a search can succeed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(try_from = "u32", into = "u32")]
    pub struct Difficulty(u32);

    impl Difficulty {
        pub const ZERO: Difficulty = Difficulty(0);

        pub fn new(zeros: u32) -> Result<Self> {
            if (zeros as usize) < HASH_HEX_SIZE {
                Ok(Self(zeros))
            } else {
                Err(LedgerError::DifficultyOutOfRange(zeros))
            }
        }

        pub fn zeros(self) -> u32 {
            self.0
        }
    }

    impl Default for Difficulty {
        fn default() -> Self {
            Self(POW_DEFAULT_DIFFICULTY)
        }
    }

    impl TryFrom<u32> for Difficulty {
        type Error = LedgerError;

        fn try_from(zeros: u32) -> Result<Self> {
            Self::new(zeros)
        }
    }

    impl From<Difficulty> for u32 {
        fn from(d: Difficulty) -> u32 {
            d.0
        }
    }

    impl fmt::Display for Difficulty {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    pub fn count_leading_zero_digits(hash: &str) -> u32 {
        hash.bytes().take_while(|b| *b == b'0').count() as u32
    }

    pub fn meets_difficulty(hash: &str, difficulty: Difficulty) -> bool {
        count_leading_zero_digits(hash) >= difficulty.zeros()
    }
}
