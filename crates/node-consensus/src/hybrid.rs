use crate::cancel::CancelToken;
use crate::{pos, pow, ConsensusError, ConsensusMode, Result};
use node_core::Block;
use node_crypto::Address;
use rand::Rng;
use std::collections::HashMap;

/// Picks an underlying engine for one seal attempt according to
/// `pow_weight`/`pos_weight` (spec.md §4.3: "Hybrid... probabilistically
/// picks an underlying engine per seal attempt, weighted by its configured
/// ratio"), then seals with it. The block is tagged with whichever concrete
/// engine actually sealed it; `ConsensusTag::Hybrid` is never written.
///
/// PoS is tried only when the node holds an active stake slot for
/// `block.proposer`; a node with no stake falls back to PoW regardless of
/// the draw so a non-validator can still mine.
pub fn seal(
    block: &mut Block,
    mode: ConsensusMode,
    active_validators: &HashMap<Address, u64>,
    cancel: &CancelToken,
) -> Result<()> {
    match mode {
        ConsensusMode::Pow => pow::seal(block, cancel),
        ConsensusMode::Pos => pos::seal(block, active_validators),
        ConsensusMode::Hybrid {
            pow_weight,
            pos_weight,
        } => {
            let is_validator = active_validators.contains_key(&block.proposer);
            let draw_pos = is_validator && draw_favors_pos(pow_weight, pos_weight);
            if draw_pos {
                pos::seal(block, active_validators)
            } else {
                pow::seal(block, cancel)
            }
        }
    }
}

fn draw_favors_pos(pow_weight: f64, pos_weight: f64) -> bool {
    let total = pow_weight + pos_weight;
    if total <= 0.0 {
        return false;
    }
    let threshold = pos_weight / total;
    rand::thread_rng().gen_range(0.0..1.0) < threshold
}

/// Verifies a block sealed under hybrid mode by dispatching on its recorded
/// tag, same as [`crate::verify_seal`]. Exposed separately so the `node`
/// binary can verify without reconstructing a `ConsensusMode`.
pub fn verify(block: &Block, active_validators: &HashMap<Address, u64>) -> bool {
    crate::verify_seal(block, active_validators)
}

/// Used by a hybrid node to decide a fallback reward/seal path when its own
/// proposer has no active stake at all; kept separate from [`seal`] so the
/// `node` binary can short-circuit before spending effort on a PoS attempt
/// that would only fail with `NotActiveValidator`.
pub fn requires_pow_fallback(proposer: &Address, active_validators: &HashMap<Address, u64>) -> bool {
    !active_validators.contains_key(proposer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_core::{Block as CoreBlock, ConsensusTag};
    use node_crypto::{Hash256, Keypair};

    fn addr() -> Address {
        Address::from_public_key(&Keypair::generate().public())
    }

    #[test]
    fn pure_pow_mode_always_tags_pow() {
        let proposer = addr();
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 1, proposer);
        let cancel = CancelToken::new();
        seal(&mut block, ConsensusMode::Pow, &HashMap::new(), &cancel).unwrap();
        assert_eq!(block.consensus_tag, ConsensusTag::Pow);
    }

    #[test]
    fn pure_pos_mode_requires_active_stake() {
        let proposer = addr();
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 1, proposer);
        let cancel = CancelToken::new();
        let result = seal(&mut block, ConsensusMode::Pos, &HashMap::new(), &cancel);
        assert_eq!(result, Err(ConsensusError::NotActiveValidator));
    }

    #[test]
    fn hybrid_falls_back_to_pow_for_non_validator() {
        let proposer = addr();
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 1, proposer);
        let cancel = CancelToken::new();
        let mode = ConsensusMode::Hybrid {
            pow_weight: 0.1,
            pos_weight: 0.9,
        };
        seal(&mut block, mode, &HashMap::new(), &cancel).unwrap();
        assert_eq!(block.consensus_tag, ConsensusTag::Pow);
    }

    #[test]
    fn hybrid_never_writes_the_hybrid_tag_itself() {
        let proposer = addr();
        let mut validators = HashMap::new();
        validators.insert(proposer, 100);
        let mut block = CoreBlock::assemble(1, Hash256::zero(), vec![], 1, proposer);
        let cancel = CancelToken::new();
        let mode = ConsensusMode::Hybrid {
            pow_weight: 0.3,
            pos_weight: 0.7,
        };
        seal(&mut block, mode, &validators, &cancel).unwrap();
        assert_ne!(block.consensus_tag, ConsensusTag::Hybrid);
        assert!(crate::verify_seal(&block, &validators));
    }

    #[test]
    fn requires_pow_fallback_reflects_stake_membership() {
        let proposer = addr();
        let mut validators = HashMap::new();
        validators.insert(proposer, 10);
        assert!(!requires_pow_fallback(&proposer, &validators));
        validators.remove(&proposer);
        assert!(requires_pow_fallback(&proposer, &validators));
    }
}
