use ledger_core::{Block, Chain, ChainConfig, Difficulty};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn config(zeros: u32) -> ChainConfig {
    ChainConfig::new(Difficulty::new(zeros).expect("difficulty in range"))
}

pub fn build_chain(zeros: u32, payloads: &[&str]) -> Chain {
    let mut chain = Chain::new(config(zeros)).expect("genesis mined");
    for payload in payloads {
        chain.append(*payload).expect("block mined");
    }
    chain
}

/// A chain of `len` appended blocks with random payloads from a seeded rng.
pub fn random_chain(seed: u64, zeros: u32, len: usize) -> Chain {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut chain = Chain::new(config(zeros)).expect("genesis mined");
    for _ in 0..len {
        let size = rng.gen_range(0..48);
        let payload: String = (0..size)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        chain.append(payload).expect("block mined");
    }
    chain
}

/// Round-trip the chain through JSON, letting `edit` change one block's
/// fields without recomputing its hash.
pub fn tamper<F>(chain: &Chain, position: usize, edit: F) -> Chain
where
    F: FnOnce(&mut serde_json::Map<String, serde_json::Value>),
{
    let mut value = serde_json::to_value(chain.blocks()).expect("serialize blocks");
    let block = value[position]
        .as_object_mut()
        .expect("block is a JSON object");
    edit(block);
    let blocks: Vec<Block> = serde_json::from_value(value).expect("deserialize blocks");
    Chain::from_blocks(blocks, chain.config())
}
