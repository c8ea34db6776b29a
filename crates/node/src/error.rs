use thiserror::Error;

/// Top-level error wrapping each collaborator's error type (spec.md §7's
/// ambient note: "a top-level `node::Error` wrapping each via `#[from]`").
/// Only used at the binary's outer edges; inner tasks handle their own
/// crate's errors without needing to unify types across an await point.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] node_core::Error),
    #[error(transparent)]
    Consensus(#[from] node_consensus::ConsensusError),
    #[error(transparent)]
    Network(#[from] node_network::NetworkError),
    #[error(transparent)]
    Storage(#[from] node_storage::StorageError),
    #[error(transparent)]
    Config(#[from] anyhow::Error),
}
