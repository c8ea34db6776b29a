pub mod cancel;
pub mod hybrid;
pub mod pos;
pub mod pow;

use node_core::Block;
use node_crypto::Address;
use std::collections::HashMap;
use thiserror::Error;

/// Fixed base reward credited to a PoW proposer (spec.md §4.3).
pub const POW_BASE_REWARD: u64 = 10;
/// Scale used to turn PoS stake into a proportional reward: a validator
/// holding the whole active stake earns this many units; smaller stakes
/// earn a proportional share.
pub const POS_REWARD_POOL: u64 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("sealing was cancelled")]
    Cancelled,
    #[error("proposer is not an active validator")]
    NotActiveValidator,
    #[error("no active validators to select a proposer from")]
    NoActiveValidators,
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Which consensus sub-engine(s) this node runs, per spec.md §6's
/// `consensus_mode` config option. A node configured purely with `Pow` or
/// `Pos` bypasses the hybrid selector entirely (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub enum ConsensusMode {
    Pow,
    Pos,
    Hybrid { pow_weight: f64, pos_weight: f64 },
}

/// Verifies a sealed block's consensus proof, dispatching by
/// `block.consensus_tag` (spec.md §4.3's Hybrid verify).
pub fn verify_seal(block: &Block, active_validators: &HashMap<Address, u64>) -> bool {
    match block.consensus_tag {
        node_core::ConsensusTag::Pow => pow::verify(block),
        node_core::ConsensusTag::Pos => pos::verify(block, active_validators),
        // Hybrid is never itself written as a tag (see pow/pos dispatch in
        // `hybrid::seal`); a block claiming it is unverifiable.
        node_core::ConsensusTag::Hybrid => false,
    }
}
