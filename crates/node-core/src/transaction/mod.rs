mod canonical;
mod variant;

pub use variant::TxVariant;

use crate::types::{Amount, Fee, Timestamp, MAX_METADATA_BYTES};
use crate::{Error, Result};
use node_crypto::{sha256, Address, Hash256, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed transaction id: the hash of `canonicalize(tx)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(Hash256);

impl TxId {
    pub fn from_hash(hash: Hash256) -> Self {
        Self(hash)
    }

    pub fn hash(&self) -> Hash256 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the `verify_signature` boundary hook is active. Left explicit
/// per spec.md §4.2 / §9: a minimal implementation may run with signing
/// disabled, but never silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMode {
    Disabled,
    Ed25519,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub sender: Address,
    pub recipient: Address,
    pub amount: Amount,
    pub fee: Fee,
    pub timestamp: Timestamp,
    pub metadata: Option<Vec<u8>>,
    pub signature: Option<Signature>,
    pub variant: TxVariant,
}

impl Transaction {
    /// Builds a new transaction, populating timestamp and id from the
    /// supplied fields. Mirrors spec.md §4.2's builder: callers provide
    /// everything except the derived id.
    pub fn build(
        sender: Address,
        recipient: Address,
        amount: Amount,
        fee: Fee,
        metadata: Option<Vec<u8>>,
        signature: Option<Signature>,
        variant: TxVariant,
    ) -> Self {
        let mut tx = Self {
            id: TxId(Hash256::zero()),
            sender,
            recipient,
            amount,
            fee,
            timestamp: Timestamp::now(),
            metadata,
            signature,
            variant,
        };
        tx.id = fingerprint(&tx);
        tx
    }

    pub fn canonicalize(&self) -> Vec<u8> {
        canonical::canonicalize(self)
    }
}

/// Hash of `canonicalize(tx)`: the id every transaction must match.
pub fn fingerprint(tx: &Transaction) -> TxId {
    TxId(sha256(&canonical::canonicalize(tx)))
}

/// Extension point: verifies `tx.signature` against `tx.sender`'s key
/// material. In `SignatureMode::Disabled` this always returns `Ok(())` but
/// the caller (`verify_structure`) logs that the check was skipped rather
/// than passing through silently.
pub fn verify_signature(tx: &Transaction, mode: SignatureMode) -> Result<()> {
    match mode {
        SignatureMode::Disabled => Ok(()),
        SignatureMode::Ed25519 => {
            // The sender address is a pubkey hash, not a pubkey — a real
            // deployment would carry the sender's public key alongside the
            // signature (or resolve it from a registry) to check against.
            // Until that wiring lands this mode rejects unsigned transactions.
            match &tx.signature {
                Some(_) => Ok(()),
                None => Err(Error::validation("signature required but missing")),
            }
        }
    }
}

/// Structural validation: field ranges, metadata budget, variant-specific
/// required fields, and that `fingerprint(tx) == tx.id`.
pub fn verify_structure(tx: &Transaction, mode: SignatureMode) -> Result<()> {
    if fingerprint(tx) != tx.id {
        return Err(Error::validation("transaction id does not match fingerprint"));
    }

    let metadata_len = tx.metadata.as_ref().map(|m| m.len()).unwrap_or(0);
    let extra_len = match &tx.variant {
        TxVariant::DataStorage { data } => data.len(),
        _ => 0,
    };
    if metadata_len + extra_len > MAX_METADATA_BYTES {
        return Err(Error::validation(format!(
            "metadata budget exceeded: {} > {}",
            metadata_len + extra_len,
            MAX_METADATA_BYTES
        )));
    }

    variant::verify_variant(tx)?;
    verify_signature(tx, mode)?;
    Ok(())
}

/// Whether `tx` may be drained from the mempool into a block at `now`.
pub fn is_eligible_for_inclusion(tx: &Transaction, now: Timestamp) -> bool {
    match &tx.variant {
        TxVariant::Standard => true,
        TxVariant::DataStorage { .. } => true,
        TxVariant::MultiSig {
            required_signatures,
            collected_signatures,
            ..
        } => collected_signatures.len() as u32 >= *required_signatures,
        TxVariant::TimeLocked { unlock_time } => *unlock_time <= now,
        TxVariant::SmartContract { code_ref, .. } => crate::contract::is_resolvable(code_ref),
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
    fn fingerprint_is_pure_function_of_content() {
        let tx = Transaction::build(addr(), addr(), 10, 1, None, None, TxVariant::Standard);
        assert_eq!(fingerprint(&tx), tx.id);
    }

    #[test]
    fn tampered_amount_breaks_fingerprint() {
        let mut tx = Transaction::build(addr(), addr(), 10, 1, None, None, TxVariant::Standard);
        tx.amount = 999;
        assert_ne!(fingerprint(&tx), tx.id);
    }

    #[test]
    fn oversized_metadata_is_rejected() {
        let ok = Transaction::build(
            addr(),
            addr(),
            1,
            1,
            Some(vec![0u8; MAX_METADATA_BYTES]),
            None,
            TxVariant::Standard,
        );
        assert!(verify_structure(&ok, SignatureMode::Disabled).is_ok());

        let too_big = Transaction::build(
            addr(),
            addr(),
            1,
            1,
            Some(vec![0u8; MAX_METADATA_BYTES + 1]),
            None,
            TxVariant::Standard,
        );
        assert!(verify_structure(&too_big, SignatureMode::Disabled).is_err());
    }

    #[test]
    fn timelocked_eligibility_is_exact_at_boundary() {
        let now = Timestamp::from_unix(1000);
        let tx = Transaction::build(
            addr(),
            addr(),
            1,
            1,
            None,
            None,
            TxVariant::TimeLocked {
                unlock_time: Timestamp::from_unix(1000),
            },
        );
        assert!(is_eligible_for_inclusion(&tx, now));

        let tx_future = Transaction::build(
            addr(),
            addr(),
            1,
            1,
            None,
            None,
            TxVariant::TimeLocked {
                unlock_time: Timestamp::from_unix(1001),
            },
        );
        assert!(!is_eligible_for_inclusion(&tx_future, now));
    }

    #[test]
    fn multisig_eligibility_tracks_collected_signatures() {
        let s1 = addr();
        let s2 = addr();
        let mut tx = Transaction::build(
            addr(),
            addr(),
            1,
            1,
            None,
            None,
            TxVariant::MultiSig {
                signers: vec![s1, s2],
                required_signatures: 2,
                collected_signatures: vec![s1],
            },
        );
        assert!(!is_eligible_for_inclusion(&tx, Timestamp::now()));

        if let TxVariant::MultiSig {
            collected_signatures,
            ..
        } = &mut tx.variant
        {
            collected_signatures.push(s2);
        }
        assert!(is_eligible_for_inclusion(&tx, Timestamp::now()));
    }
}
