pub mod address;
pub mod hash;
pub mod signature;

use thiserror::Error;

/// Errors surfaced by the crypto primitives.
///
/// These are the lowest-level errors in the workspace; callers in
/// `node-core` and `node-network` wrap them into their own error kinds
/// rather than propagating this type across crate boundaries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
    #[error("invalid address encoding: {0}")]
    InvalidAddress(String),
    #[error("invalid public key bytes")]
    InvalidPublicKey,
    #[error("invalid private key bytes")]
    InvalidPrivateKey,
    #[error("invalid signature bytes")]
    InvalidSignature,
    #[error("signature verification failed")]
    SignatureMismatch,
}

pub type Result<T> = std::result::Result<T, CryptoError>;

pub use address::Address;
pub use hash::{sha256, Hash256, MerkleTree};
pub use signature::{Keypair, PublicKey, Signature};
