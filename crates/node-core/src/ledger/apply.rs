use crate::block::Block;
use crate::contract::{self, Transfer};
use crate::error::Error;
use crate::transaction::TxVariant;
use crate::types::Amount;
use crate::Result;
use node_crypto::Address;
use std::collections::HashMap;

/// The balance/stake deltas produced by applying one block. Only entries
/// that changed are present; callers merge these into their own maps.
pub struct BlockEffects {
    pub balances: HashMap<Address, Amount>,
    pub stakes: HashMap<Address, Amount>,
}

/// Computes the effect of applying `block` on top of `balances`/`stakes`
/// without mutating either, rejecting the block if any address would be
/// debited below zero in aggregate (spec.md §8 invariant 4: "no double-spend
/// within the block"). Used both by normal `append_block` and by the
/// from-scratch replay `try_reorg` performs to validate a candidate chain.
pub fn compute_effects(
    balances: &HashMap<Address, Amount>,
    stakes: &HashMap<Address, Amount>,
    block: &Block,
    contract_budget: u64,
) -> Result<BlockEffects> {
    let mut debits: HashMap<Address, Amount> = HashMap::new();
    let mut credits: HashMap<Address, Amount> = HashMap::new();
    let mut stake_increases: HashMap<Address, Amount> = HashMap::new();
    let mut collected_fees: Amount = 0;

    for tx in &block.transactions {
        collected_fees = collected_fees.saturating_add(tx.fee);
        match &tx.variant {
            TxVariant::Standard | TxVariant::MultiSig { .. } | TxVariant::TimeLocked { .. } => {
                debit(&mut debits, tx.sender, tx.amount.saturating_add(tx.fee));
                if tx.recipient == Address::stake_registry() {
                    *stake_increases.entry(tx.sender).or_insert(0) += tx.amount;
                } else {
                    credit(&mut credits, tx.recipient, tx.amount);
                }
            }
            TxVariant::DataStorage { .. } => {
                debit(&mut debits, tx.sender, tx.fee);
            }
            TxVariant::SmartContract { code_ref, args } => {
                debit(&mut debits, tx.sender, tx.fee);
                let transfers: Vec<Transfer> = contract::evaluate(
                    code_ref,
                    &tx.sender,
                    &tx.recipient,
                    tx.amount,
                    args,
                    contract_budget,
                )?;
                for transfer in transfers {
                    debit(&mut debits, transfer.from, transfer.amount);
                    credit(&mut credits, transfer.to, transfer.amount);
                }
            }
        }
    }

    // The proposer collects every transaction fee in the block plus the
    // consensus-engine-computed reward (spec.md §4.3's implicit coinbase
    // credit) — matching S1's "miner credited by +1 fee plus the base
    // reward".
    credit(&mut credits, block.proposer, collected_fees.saturating_add(block.reward));

    for (addr, total_debit) in &debits {
        let available = balances.get(addr).copied().unwrap_or(0);
        if available < *total_debit {
            return Err(Error::validation(format!(
                "block double-spend: {addr} debited {total_debit}, has {available}"
            )));
        }
    }

    let mut touched: HashMap<Address, Amount> = HashMap::new();
    for (addr, debit_amount) in &debits {
        let base = balances.get(addr).copied().unwrap_or(0);
        touched.insert(*addr, base - debit_amount);
    }
    for (addr, credit_amount) in &credits {
        let base = touched
            .get(addr)
            .copied()
            .unwrap_or_else(|| balances.get(addr).copied().unwrap_or(0));
        touched.insert(*addr, base.saturating_add(*credit_amount));
    }

    let mut new_stakes: HashMap<Address, Amount> = HashMap::new();
    for (addr, increase) in stake_increases {
        let base = stakes.get(&addr).copied().unwrap_or(0);
        new_stakes.insert(addr, base.saturating_add(increase));
    }

    Ok(BlockEffects {
        balances: touched,
        stakes: new_stakes,
    })
}

fn debit(map: &mut HashMap<Address, Amount>, addr: Address, amount: Amount) {
    *map.entry(addr).or_insert(0) += amount;
}

fn credit(map: &mut HashMap<Address, Amount>, addr: Address, amount: Amount) {
    *map.entry(addr).or_insert(0) += amount;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use crate::types::{ConsensusTag, Timestamp};
    use node_crypto::{Hash256, Keypair};

    fn addr() -> Address {
        Address::from_public_key(&Keypair::generate().public())
    }

    fn block_with(transactions: Vec<Transaction>, proposer: Address, reward: Amount) -> Block {
        let merkle_root = Block::compute_merkle_root(&transactions);
        Block {
            index: 1,
            timestamp: Timestamp::now(),
            previous_hash: Hash256::zero(),
            transactions,
            nonce: 0,
            difficulty: 1,
            merkle_root,
            proposer,
            consensus_tag: ConsensusTag::Pow,
            reward,
            hash: Hash256::zero(),
        }
    }

    #[test]
    fn rejects_aggregate_overspend_within_block() {
        let sender = addr();
        let recipient = addr();
        let mut balances = HashMap::new();
        balances.insert(sender, 50);

        let tx1 = Transaction::build(sender, recipient, 30, 1, None, None, TxVariant::Standard);
        let tx2 = Transaction::build(sender, recipient, 30, 1, None, None, TxVariant::Standard);
        let block = block_with(vec![tx1, tx2], addr(), 0);

        let result = compute_effects(&balances, &HashMap::new(), &block, 10_000);
        assert!(result.is_err());
    }

    #[test]
    fn reward_credits_proposer() {
        let proposer = addr();
        let block = block_with(vec![], proposer, 50);
        let effects = compute_effects(&HashMap::new(), &HashMap::new(), &block, 10_000).unwrap();
        assert_eq!(effects.balances.get(&proposer), Some(&50));
    }

    #[test]
    fn stake_registry_transfer_increases_stake_not_balance() {
        let sender = addr();
        let mut balances = HashMap::new();
        balances.insert(sender, 200);
        let tx = Transaction::build(
            sender,
            Address::stake_registry(),
            150,
            1,
            None,
            None,
            TxVariant::Standard,
        );
        let block = block_with(vec![tx], addr(), 0);
        let effects = compute_effects(&balances, &HashMap::new(), &block, 10_000).unwrap();
        assert_eq!(effects.balances.get(&sender), Some(&49));
        assert_eq!(effects.stakes.get(&sender), Some(&150));
    }
}
