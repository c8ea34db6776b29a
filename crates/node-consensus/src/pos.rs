use crate::{ConsensusError, Result, POS_REWARD_POOL};
use node_core::{Block, ConsensusTag};
use node_crypto::Address;
use rand::Rng;
use std::collections::HashMap;

/// Draws a proposer from `validators` weighted by stake, ties among equal
/// weight broken by address order (spec.md §4.3: "weighted random draw over
/// the validator set with weight = stake"). `None` if the set is empty or
/// every stake is zero.
pub fn select_proposer(validators: &HashMap<Address, u64>) -> Option<Address> {
    let total: u64 = validators.values().sum();
    if total == 0 {
        return None;
    }
    let mut ordered: Vec<(&Address, &u64)> = validators.iter().collect();
    ordered.sort_by_key(|(addr, _)| **addr);

    let mut draw = rand::thread_rng().gen_range(0..total);
    for (addr, stake) in ordered {
        if draw < *stake {
            return Some(*addr);
        }
        draw -= *stake;
    }
    None
}

/// Seals `block` for a proposer already chosen by [`select_proposer`] (or
/// otherwise known to be in `active_validators`), crediting it a share of
/// `POS_REWARD_POOL` proportional to its stake.
pub fn seal(block: &mut Block, active_validators: &HashMap<Address, u64>) -> Result<()> {
    let stake = *active_validators
        .get(&block.proposer)
        .ok_or(ConsensusError::NotActiveValidator)?;
    let total: u64 = active_validators.values().sum();
    block.consensus_tag = ConsensusTag::Pos;
    block.reward = if total == 0 {
        0
    } else {
        (POS_REWARD_POOL * stake) / total
    };
    block.nonce = 0;
    block.hash = block.compute_hash();
    Ok(())
}

/// Checks that `block` is tagged PoS, self-consistent, proposed by a
/// still-active validator, and carries exactly the stake-proportional
/// reward that proposer is owed (spec.md §4.3) — recomputed here so a peer
/// can't smuggle an inflated `reward` through an otherwise valid seal.
pub fn verify(block: &Block, active_validators: &HashMap<Address, u64>) -> bool {
    let Some(&stake) = active_validators.get(&block.proposer) else {
        return false;
    };
    let total: u64 = active_validators.values().sum();
    let expected_reward = if total == 0 { 0 } else { (POS_REWARD_POOL * stake) / total };

    block.consensus_tag == ConsensusTag::Pos
        && block.reward == expected_reward
        && block.hash == block.compute_hash()
}
