//! The append-only block sequence and its validation walk.

use crate::{
    constants::{GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH},
    error::{LedgerError, Result},
    pow::Difficulty,
    Block, BlockTemplate,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Settings fixed when a chain is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainConfig {
    pub difficulty: Difficulty,
    /// Upper bound on nonces tried per block. `None` means unbounded.
    pub max_attempts: Option<u64>,
}

impl ChainConfig {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    #[error("stored hash {stored} does not match recomputed hash {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("previous hash {found} does not match predecessor hash {expected}")]
    LinkageMismatch { expected: String, found: String },

    #[error("position {found} found where {expected} was expected")]
    PositionMismatch { expected: u64, found: u64 },
}

/// The first broken link found by [`Chain::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {position} is invalid: {kind}")]
pub struct ChainViolation {
    pub position: u64,
    pub kind: ViolationKind,
}

#[derive(Clone, Debug)]
pub struct Chain {
    blocks: Vec<Block>,
    config: ChainConfig,
}

impl Chain {
    /// Create a chain holding a freshly mined genesis block.
    pub fn new(config: ChainConfig) -> Result<Self> {
        let genesis = genesis_block(&config)?;
        info!(hash = %genesis.hash(), "genesis block created");
        Ok(Self {
            blocks: vec![genesis],
            config,
        })
    }

    pub fn with_difficulty(zeros: u32) -> Result<Self> {
        Self::new(ChainConfig::new(Difficulty::new(zeros)?))
    }

    /// Rebuild a chain from previously exported blocks. Nothing is checked
    /// here; call [`Chain::validate`] before trusting the result.
    pub fn from_blocks(blocks: Vec<Block>, config: ChainConfig) -> Self {
        Self { blocks, config }
    }

    pub fn config(&self) -> ChainConfig {
        self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn get(&self, position: u64) -> Option<&Block> {
        usize::try_from(position)
            .ok()
            .and_then(|i| self.blocks.get(i))
    }

    pub fn latest(&self) -> Result<&Block> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    /// Mine a block carrying `payload` on top of the current tip and store it.
    pub fn append(&mut self, payload: impl Into<String>) -> Result<&Block> {
        let previous_hash = self.latest()?.hash().to_string();
        let position = self.blocks.len() as u64;
        let block = BlockTemplate::new(position, payload, previous_hash)
            .mine(self.config.difficulty, self.config.max_attempts)?;
        debug!(position, nonce = block.nonce(), "appending block");
        self.blocks.push(block);
        self.latest()
    }

    /// Accept a block mined elsewhere, if it extends the tip and carries
    /// enough work.
    pub fn try_append_block(&mut self, block: Block) -> Result<&Block> {
        let tip = self.latest()?;
        let expected_position = self.blocks.len() as u64;
        let position = block.position();

        let reject = |reason: String| {
            warn!(position, %reason, "block rejected");
            Err(LedgerError::Rejected { position, reason })
        };

        if position != expected_position {
            return reject(format!(
                "invalid position, expected {expected_position}, got {position}"
            ));
        }
        if block.previous_hash() != tip.hash() {
            return reject(format!(
                "invalid previous hash, expected {}, got {}",
                tip.hash(),
                block.previous_hash()
            ));
        }
        if !block.is_intact() {
            return reject("stored hash does not match block content".to_string());
        }
        if !block.meets_difficulty(self.config.difficulty) {
            return reject(format!(
                "hash does not meet difficulty {}",
                self.config.difficulty
            ));
        }

        self.blocks.push(block);
        self.latest()
    }

    /// Walk every block in order and report the first violation, if any.
    ///
    /// Per block: the stored hash must match the recomputed one, the
    /// position must equal the block's index, and `previous_hash` must equal
    /// the predecessor's hash (`"0"` for the first block).
    pub fn validate(&self) -> std::result::Result<(), ChainViolation> {
        let mut expected_previous = GENESIS_PREVIOUS_HASH;
        for (index, block) in self.blocks.iter().enumerate() {
            let index = index as u64;
            if let Some(kind) = check_block(block, index, expected_previous) {
                let violation = ChainViolation {
                    position: index,
                    kind,
                };
                warn!("{violation}");
                return Err(violation);
            }
            expected_previous = block.hash();
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn check_block(block: &Block, index: u64, expected_previous: &str) -> Option<ViolationKind> {
    let computed = block.compute_hash();
    if block.hash() != computed {
        return Some(ViolationKind::HashMismatch {
            stored: block.hash().to_string(),
            computed,
        });
    }
    if block.position() != index {
        return Some(ViolationKind::PositionMismatch {
            expected: index,
            found: block.position(),
        });
    }
    if block.previous_hash() != expected_previous {
        return Some(ViolationKind::LinkageMismatch {
            expected: expected_previous.to_string(),
            found: block.previous_hash().to_string(),
        });
    }
    None
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            writeln!(f, "Block #{i}:")?;
            writeln!(f, "{block}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The genesis block for `config`: position 0, previous hash `"0"`, mined
/// at the configured difficulty.
pub fn genesis_block(config: &ChainConfig) -> Result<Block> {
    BlockTemplate::new(0, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH)
        .mine(config.difficulty, config.max_attempts)
}
