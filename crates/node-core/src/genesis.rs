use crate::block::Block;
use crate::types::{ConsensusTag, Difficulty, Timestamp};
use node_crypto::{Address, Hash256};

/// Config-seeded initial balance allocation, applied by the genesis block.
#[derive(Debug, Clone)]
pub struct GenesisAllocation {
    pub address: Address,
    pub balance: u64,
}

/// Builds the deterministic genesis block: index 0, zero previous hash, no
/// transactions, sealed with the initial difficulty. Initial balances are
/// applied directly by the ledger rather than encoded as transactions,
/// since there is no sender to debit at genesis.
pub fn genesis_block(initial_difficulty: Difficulty, proposer: Address) -> Block {
    let mut block = Block::assemble(0, Hash256::zero(), Vec::new(), initial_difficulty, proposer);
    block.timestamp = Timestamp::from_unix(0);
    block.consensus_tag = ConsensusTag::Pow;
    block.hash = block.compute_hash();
    block
}
