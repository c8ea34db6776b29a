use crate::hash::sha256;
use crate::signature::PublicKey;
use crate::{CryptoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address: the base58 encoding of the SHA-256 hash of a public
/// key, truncated to 20 bytes (a standard pubkey-hash shape, kept short
/// since this ledger is account-balance, not UTXO).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_public_key(pk: &PublicKey) -> Self {
        let digest = sha256(pk.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }

    /// Builds an address from raw bytes without requiring a public key —
    /// used for config-seeded genesis allocations and the reserved
    /// `stake_registry` address.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidAddress("expected 20 bytes".into()))?;
        Ok(Self(arr))
    }

    /// A deterministic, well-known address used to mark stake-registration
    /// transactions. Not a real spendable account.
    pub fn stake_registry() -> Self {
        Self([0xFFu8; 20])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Keypair;

    #[test]
    fn base58_roundtrip() {
        let kp = Keypair::generate();
        let addr = Address::from_public_key(&kp.public());
        let encoded = addr.to_base58();
        assert_eq!(Address::from_base58(&encoded).unwrap(), addr);
    }

    #[test]
    fn stake_registry_is_stable() {
        assert_eq!(Address::stake_registry(), Address::stake_registry());
    }
}
