use super::{Transaction, TxVariant};

/// Deterministic encoding of a transaction's non-signature fields: fixed
/// field order, fixed-width numbers, length-prefixed variable-length data.
/// This is both the fingerprint input and the on-wire payload body (spec.md
/// §4.2, §6) — one encoding serves both purposes.
///
/// Excluded from the encoding: `signature` (never part of the fingerprint)
/// and `MultiSig::collected_signatures` (the one field allowed to mutate
/// after admission — including it would make the id a moving target).
pub fn canonicalize(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::new();
    push_bytes(&mut buf, tx.sender.as_bytes());
    push_bytes(&mut buf, tx.recipient.as_bytes());
    buf.extend_from_slice(&tx.amount.to_be_bytes());
    buf.extend_from_slice(&tx.fee.to_be_bytes());
    buf.extend_from_slice(&tx.timestamp.as_unix().to_be_bytes());
    push_opt_blob(&mut buf, tx.metadata.as_deref());

    buf.push(variant_tag(&tx.variant));
    match &tx.variant {
        TxVariant::Standard => {}
        TxVariant::MultiSig {
            signers,
            required_signatures,
            ..
        } => {
            buf.extend_from_slice(&(signers.len() as u32).to_be_bytes());
            for signer in signers {
                push_bytes(&mut buf, signer.as_bytes());
            }
            buf.extend_from_slice(&required_signatures.to_be_bytes());
        }
        TxVariant::TimeLocked { unlock_time } => {
            buf.extend_from_slice(&unlock_time.as_unix().to_be_bytes());
        }
        TxVariant::DataStorage { data } => {
            push_blob(&mut buf, data);
        }
        TxVariant::SmartContract { code_ref, args } => {
            push_blob(&mut buf, code_ref.as_bytes());
            push_blob(&mut buf, args);
        }
    }
    buf
}

fn variant_tag(variant: &TxVariant) -> u8 {
    match variant {
        TxVariant::Standard => 0,
        TxVariant::MultiSig { .. } => 1,
        TxVariant::TimeLocked { .. } => 2,
        TxVariant::DataStorage { .. } => 3,
        TxVariant::SmartContract { .. } => 4,
    }
}

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(bytes);
}

fn push_blob(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn push_opt_blob(buf: &mut Vec<u8>, bytes: Option<&[u8]>) {
    match bytes {
        Some(b) => {
            buf.push(1);
            push_blob(buf, b);
        }
        None => buf.push(0),
    }
}
