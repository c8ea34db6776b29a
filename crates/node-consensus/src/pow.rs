use crate::cancel::CancelToken;
use crate::{ConsensusError, Result, POW_BASE_REWARD};
use node_core::{Block, ConsensusTag};

/// Nonce attempts between cancellation checks. Small enough to cancel
/// promptly, large enough that the atomic load doesn't dominate hashing.
const CANCEL_CHECK_INTERVAL: u64 = 2048;

/// Seals `block` by incrementing its nonce until the hash has at least
/// `block.difficulty` leading zero nibbles (spec.md §4.3). Returns
/// `ConsensusError::Cancelled` if `cancel` fires first, so the miner task
/// can abandon a sealing attempt when a peer block advances the chain out
/// from under it (spec.md §5).
pub fn seal(block: &mut Block, cancel: &CancelToken) -> Result<()> {
    block.consensus_tag = ConsensusTag::Pow;
    block.reward = POW_BASE_REWARD;
    block.nonce = 0;
    loop {
        if block.nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(ConsensusError::Cancelled);
        }
        block.hash = block.compute_hash();
        if block.hash.leading_zero_nibbles() >= block.difficulty {
            return Ok(());
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}

/// Recomputes the hash, checks the zero-nibble prefix, and pins `reward` to
/// the fixed base reward (spec.md §4.3) so a peer can't mint an inflated
/// reward through an otherwise self-consistent, difficulty-satisfying seal.
pub fn verify(block: &Block) -> bool {
    block.consensus_tag == ConsensusTag::Pow
        && block.reward == POW_BASE_REWARD
        && block.hash == block.compute_hash()
        && block.hash.leading_zero_nibbles() >= block.difficulty
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_core::Block as CoreBlock;
    use node_crypto::{Address, Hash256, Keypair};

    fn addr() -> Address {
        Address::from_public_key(&Keypair::generate().public())
    }

    #[test]
    fn seals_and_verifies_low_difficulty_block() {
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 1, addr());
        let cancel = CancelToken::new();
        seal(&mut block, &cancel).unwrap();
        assert!(verify(&block));
    }

    #[test]
    fn cancellation_stops_sealing() {
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 64, addr());
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(seal(&mut block, &cancel), Err(ConsensusError::Cancelled));
    }

    #[test]
    fn tampering_with_nonce_breaks_verification() {
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 1, addr());
        let cancel = CancelToken::new();
        seal(&mut block, &cancel).unwrap();
        block.nonce = block.nonce.wrapping_add(1);
        assert!(!verify(&block));
    }
}
