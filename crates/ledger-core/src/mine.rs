use crate::{
    error::{LedgerError, Result},
    pow::{meets_difficulty, Difficulty},
    Block, BlockTemplate,
};
use tracing::{debug, info};

/// Mines a block by trying nonces 0, 1, 2, ... until the hash has at least
/// `difficulty` leading zero hex digits. The first qualifying nonce wins, so
/// the result is deterministic for a given template.
///
/// `max_attempts` caps the number of nonces tried; `None` searches the whole
/// `u64` range. Difficulty zero returns the template sealed at nonce 0.
pub fn mine_block(
    template: BlockTemplate,
    difficulty: Difficulty,
    max_attempts: Option<u64>,
) -> Result<Block> {
    if difficulty == Difficulty::ZERO {
        return Ok(template.seal());
    }

    let limit = max_attempts.unwrap_or(u64::MAX);
    debug!(
        position = template.position,
        %difficulty,
        limit,
        "searching nonce"
    );

    let found = (0..limit)
        .map(|nonce| (nonce, template.hash_with_nonce(nonce)))
        .find(|(_, hash)| meets_difficulty(hash, difficulty));

    match found {
        Some((nonce, hash)) => {
            info!(
                "Mined block {} with nonce {} and hash {}",
                template.position, nonce, hash
            );
            Ok(Block::from_parts(template, nonce, hash))
        }
        None => Err(LedgerError::NonceNotFound {
            position: template.position,
            attempts: limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};

    const FIXED_TS: u64 = 1_700_000_000_000;

    fn genesis_template() -> BlockTemplate {
        BlockTemplate::with_timestamp(0, FIXED_TS, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH)
    }

    fn d(zeros: u32) -> Difficulty {
        Difficulty::new(zeros).unwrap()
    }

    #[test]
    fn mined_genesis_golden() {
        let block = mine_block(genesis_template(), d(2), None).unwrap();
        assert_eq!(block.nonce(), 406);
        assert_eq!(
            block.hash(),
            "0026e54300079d345e76a5d093f644451bc786c01bb6cc5b60c863082aa49224"
        );
        assert!(block.is_intact());
    }

    #[test]
    fn mined_successor_golden() {
        let genesis = mine_block(genesis_template(), d(2), None).unwrap();
        let next = BlockTemplate::with_timestamp(1, FIXED_TS + 1, "A", genesis.hash());
        let block = next.mine(d(2), None).unwrap();
        assert_eq!(block.nonce(), 167);
        assert_eq!(
            block.hash(),
            "00634c92c904da0c293c5037ebe2d9d3c7b139d789e70a5c273737cffa00e7e7"
        );
        assert_eq!(block.previous_hash(), genesis.hash());
    }

    #[test]
    fn difficulty_zero_keeps_nonce_zero() {
        let block = mine_block(genesis_template(), Difficulty::ZERO, Some(0)).unwrap();
        assert_eq!(block.nonce(), 0);
        assert_eq!(block, genesis_template().seal());
    }

    #[test]
    fn mined_hash_meets_difficulty() {
        let template = BlockTemplate::new(5, "proof", "abc");
        let block = mine_block(template, d(3), None).unwrap();
        assert!(block.hash().starts_with("000"));
        assert!(block.meets_difficulty(d(3)));
        assert!(block.is_intact());
    }

    #[test]
    fn attempt_cap_reports_not_found() {
        // The winning nonce is 406, so 406 attempts (0..=405) fall short.
        let err = mine_block(genesis_template(), d(2), Some(406)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::NonceNotFound {
                position: 0,
                attempts: 406
            }
        );
        let block = mine_block(genesis_template(), d(2), Some(407)).unwrap();
        assert_eq!(block.nonce(), 406);
    }
}
