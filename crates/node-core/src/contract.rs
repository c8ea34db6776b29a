//! A sandboxed, bounded-instruction evaluator for the `SmartContract`
//! transaction variant. Grounded on the teacher's `runtime/src/executor.rs`
//! compute-budget model and `bank/src/processor.rs`'s instruction dispatch,
//! generalized from account-mutating programs to the explicit debit/credit
//! `Transfer` tuples spec.md §3 requires ("side-effects are limited to
//! balance changes expressed as explicit debit/credit tuples returned by
//! the evaluator").
use crate::types::Amount;
use crate::{Error, Result};
use node_crypto::Address;

/// Default instruction budget for a single contract invocation.
pub const DEFAULT_INSTRUCTION_BUDGET: u64 = 10_000;

/// A single balance effect produced by a contract invocation. Applied by
/// the ledger exactly like a `Standard` transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// The fixed set of scripts this node knows how to resolve and run. A real
/// deployment would look these up from a registry keyed by `code_ref`; this
/// node ships a small built-in set, which is enough to exercise the
/// sandboxing contract without a general-purpose VM (an explicit Non-goal).
fn lookup(code_ref: &str) -> Option<fn(&Address, &Address, Amount, &[u8]) -> Result<Vec<Transfer>>> {
    match code_ref {
        "noop" => Some(noop),
        "split_half" => Some(split_half),
        _ => None,
    }
}

pub fn is_resolvable(code_ref: &str) -> bool {
    lookup(code_ref).is_some()
}

/// Runs `code_ref` against `sender`/`recipient`/`amount`/`args` under a
/// bounded instruction budget, returning the resulting transfers. Mirrors
/// the teacher's `RuntimeContext::consume` pattern: a flat cost is charged
/// per step and the call fails closed if the budget is exhausted.
pub fn evaluate(
    code_ref: &str,
    sender: &Address,
    recipient: &Address,
    amount: Amount,
    args: &[u8],
    budget: u64,
) -> Result<Vec<Transfer>> {
    let script = lookup(code_ref)
        .ok_or_else(|| Error::validation(format!("unresolvable code_ref: {code_ref}")))?;

    let cost = 100u64.saturating_add((args.len() as u64).saturating_mul(4));
    if cost > budget {
        return Err(Error::resource("smart contract instruction budget exceeded"));
    }

    script(sender, recipient, amount, args)
}

fn noop(_sender: &Address, _recipient: &Address, _amount: Amount, _args: &[u8]) -> Result<Vec<Transfer>> {
    Ok(Vec::new())
}

/// Splits `amount` evenly between `recipient` and whatever address is
/// encoded in `args` (20 raw bytes), crediting the remainder to `recipient`.
fn split_half(
    sender: &Address,
    recipient: &Address,
    amount: Amount,
    args: &[u8],
) -> Result<Vec<Transfer>> {
    if args.len() != 20 {
        return Err(Error::validation("split_half requires a 20-byte address arg"));
    }
    let mut raw = [0u8; 20];
    raw.copy_from_slice(args);
    let other = Address::from_bytes(raw);

    let half = amount / 2;
    let remainder = amount - half;
    Ok(vec![
        Transfer {
            from: *sender,
            to: *recipient,
            amount: remainder,
        },
        Transfer {
            from: *sender,
            to: other,
            amount: half,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_crypto::Keypair;

    fn addr() -> Address {
        Address::from_public_key(&Keypair::generate().public())
    }

    #[test]
    fn unresolvable_code_ref_is_rejected() {
        let a = addr();
        let b = addr();
        assert!(evaluate("does_not_exist", &a, &b, 10, &[], DEFAULT_INSTRUCTION_BUDGET).is_err());
    }

    #[test]
    fn budget_exhaustion_fails_closed() {
        let a = addr();
        let b = addr();
        assert!(evaluate("noop", &a, &b, 10, &[], 10).is_err());
    }

    #[test]
    fn split_half_produces_two_transfers_summing_to_amount() {
        let a = addr();
        let b = addr();
        let c = addr();
        let transfers = evaluate(
            "split_half",
            &a,
            &b,
            101,
            c.as_bytes(),
            DEFAULT_INSTRUCTION_BUDGET,
        )
        .unwrap();
        let total: Amount = transfers.iter().map(|t| t.amount).sum();
        assert_eq!(total, 101);
    }
}
