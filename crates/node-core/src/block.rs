use crate::transaction::Transaction;
use crate::types::{BlockHeight, ConsensusTag, Difficulty, Timestamp};
use node_crypto::{sha256, Address, Hash256, MerkleTree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: BlockHeight,
    pub timestamp: Timestamp,
    pub previous_hash: Hash256,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub difficulty: Difficulty,
    pub merkle_root: Hash256,
    pub proposer: Address,
    pub consensus_tag: ConsensusTag,
    /// The implicit coinbase credit for this block (spec.md §4.3): a fixed
    /// amount for PoW, stake-proportional for PoS. Computed by whichever
    /// consensus sub-engine seals the block; the ledger applies it blindly
    /// on `append_block` without needing to know either reward formula.
    pub reward: crate::types::Amount,
    pub hash: Hash256,
}

impl Block {
    /// Merkle root over transaction ids, using the same hash function used
    /// for block hashing (spec.md §3).
    pub fn compute_merkle_root(transactions: &[Transaction]) -> Hash256 {
        let leaves: Vec<Hash256> = transactions.iter().map(|t| t.id.hash()).collect();
        MerkleTree::from_leaves(&leaves).root()
    }

    /// Deterministic hash over every field except `hash` itself.
    pub fn compute_hash(&self) -> Hash256 {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.index.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.as_unix().to_be_bytes());
        buf.extend_from_slice(self.previous_hash.as_bytes());
        buf.extend_from_slice(self.merkle_root.as_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.difficulty.to_be_bytes());
        buf.extend_from_slice(self.proposer.as_bytes());
        buf.push(consensus_tag_byte(&self.consensus_tag));
        buf.extend_from_slice(&self.reward.to_be_bytes());
        sha256(&buf)
    }

    /// Builds an unsealed block: merkle root computed, hash left at zero
    /// until a consensus engine seals it (spec.md §4.1's `assemble_block`
    /// "does not seal").
    pub fn assemble(
        index: BlockHeight,
        previous_hash: Hash256,
        transactions: Vec<Transaction>,
        difficulty: Difficulty,
        proposer: Address,
    ) -> Self {
        let merkle_root = Self::compute_merkle_root(&transactions);
        Self {
            index,
            timestamp: Timestamp::now(),
            previous_hash,
            transactions,
            nonce: 0,
            difficulty,
            merkle_root,
            proposer,
            consensus_tag: ConsensusTag::Pow,
            reward: 0,
            hash: Hash256::zero(),
        }
    }
}

fn consensus_tag_byte(tag: &ConsensusTag) -> u8 {
    match tag {
        ConsensusTag::Pow => 0,
        ConsensusTag::Pos => 1,
        ConsensusTag::Hybrid => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_crypto::Keypair;

    fn addr() -> Address {
        Address::from_public_key(&Keypair::generate().public())
    }

    #[test]
    fn merkle_root_matches_transaction_set() {
        let block = Block::assemble(1, Hash256::zero(), vec![], 1, addr());
        assert_eq!(block.merkle_root, Hash256::zero());
    }

    #[test]
    fn hash_changes_with_nonce() {
        let mut block = Block::assemble(1, Hash256::zero(), vec![], 1, addr());
        let h1 = block.compute_hash();
        block.nonce += 1;
        let h2 = block.compute_hash();
        assert_ne!(h1, h2);
    }
}
