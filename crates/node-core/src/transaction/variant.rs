use crate::types::Timestamp;
use crate::{Error, Result};
use node_crypto::Address;
use serde::{Deserialize, Serialize};

/// The tagged transaction variants of spec.md §3. The enum discriminant
/// itself is the "variant-tag" field; no separate tag field is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TxVariant {
    Standard,
    MultiSig {
        signers: Vec<Address>,
        required_signatures: u32,
        /// Addresses that have attested so far. Append-only up to
        /// `required_signatures`; this is the one field spec.md §3 permits
        /// to mutate after mempool admission.
        collected_signatures: Vec<Address>,
    },
    TimeLocked {
        unlock_time: Timestamp,
    },
    DataStorage {
        data: Vec<u8>,
    },
    SmartContract {
        code_ref: String,
        args: Vec<u8>,
    },
}

impl TxVariant {
    pub fn tag(&self) -> &'static str {
        match self {
            TxVariant::Standard => "standard",
            TxVariant::MultiSig { .. } => "multisig",
            TxVariant::TimeLocked { .. } => "timelocked",
            TxVariant::DataStorage { .. } => "data_storage",
            TxVariant::SmartContract { .. } => "smart_contract",
        }
    }
}

pub fn verify_variant(tx: &super::Transaction) -> Result<()> {
    match &tx.variant {
        TxVariant::Standard => Ok(()),
        TxVariant::MultiSig {
            signers,
            required_signatures,
            collected_signatures,
        } => {
            if signers.is_empty() {
                return Err(Error::validation("multisig requires at least one signer"));
            }
            if *required_signatures == 0 || *required_signatures as usize > signers.len() {
                return Err(Error::validation(
                    "multisig required_signatures out of range",
                ));
            }
            if collected_signatures.len() > signers.len() {
                return Err(Error::validation(
                    "multisig collected more signatures than signers",
                ));
            }
            for signer in collected_signatures {
                if !signers.contains(signer) {
                    return Err(Error::validation(
                        "multisig collected signature from a non-signer",
                    ));
                }
            }
            Ok(())
        }
        TxVariant::TimeLocked { .. } => Ok(()),
        TxVariant::DataStorage { .. } => Ok(()),
        TxVariant::SmartContract { code_ref, .. } => {
            if code_ref.is_empty() {
                return Err(Error::validation("smart contract requires a code_ref"));
            }
            Ok(())
        }
    }
}
