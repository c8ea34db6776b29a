mod apply;

use crate::block::Block;
use crate::contract;
use crate::error::Error;
use crate::genesis::genesis_block;
use crate::mempool::Mempool;
use crate::transaction::{verify_structure, SignatureMode, Transaction, TxId, TxVariant};
use crate::types::{Amount, Difficulty, Timestamp, BlockHeight};
use crate::Result;
use apply::BlockEffects;
use node_crypto::Address;
use std::collections::{HashMap, HashSet};

pub const DIFFICULTY_MIN: Difficulty = 1;
pub const DIFFICULTY_MAX: Difficulty = 10;

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub max_block_transactions: usize,
    pub mempool_capacity: usize,
    pub difficulty_window: u64,
    pub target_block_interval_secs: i64,
    pub initial_difficulty: Difficulty,
    pub min_validator_stake: Amount,
    pub signature_mode: SignatureMode,
    pub contract_instruction_budget: u64,
    pub genesis_allocations: Vec<(Address, Amount)>,
    pub genesis_proposer: Address,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_block_transactions: 500,
            mempool_capacity: 5_000,
            difficulty_window: 100,
            target_block_interval_secs: 30,
            initial_difficulty: 1,
            min_validator_stake: 100,
            signature_mode: SignatureMode::Disabled,
            contract_instruction_budget: contract::DEFAULT_INSTRUCTION_BUDGET,
            genesis_allocations: Vec::new(),
            genesis_proposer: Address::stake_registry(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Admitted,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Accepted,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorgOutcome {
    Reorged,
    Rejected(String),
}

/// Owns the chain, mempool, validator registry, and balance projection;
/// exposes admission, assembly, append, and query (spec.md §4.1). All
/// mutations go through `&mut self` methods — the single-writer discipline
/// of spec.md §5/§9 is enforced by whoever holds this behind a mutex, not by
/// this type itself.
pub struct Ledger {
    config: LedgerConfig,
    chain: Vec<Block>,
    mempool: Mempool,
    balances: HashMap<Address, Amount>,
    validator_stakes: HashMap<Address, Amount>,
    /// The validator set used for PoS proposer selection, refreshed only at
    /// difficulty-window boundaries — see DESIGN.md's Open Question
    /// resolution for why this doesn't track `validator_stakes` live.
    active_validators: HashMap<Address, Amount>,
    current_difficulty: Difficulty,
    included_tx_ids: HashSet<TxId>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        let genesis = genesis_block(config.initial_difficulty, config.genesis_proposer);
        let mut balances = HashMap::new();
        for (addr, amount) in &config.genesis_allocations {
            balances.insert(*addr, *amount);
        }
        let difficulty = config.initial_difficulty.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX);
        let mempool = Mempool::new(config.mempool_capacity);
        Self {
            chain: vec![genesis],
            mempool,
            balances,
            validator_stakes: HashMap::new(),
            active_validators: HashMap::new(),
            current_difficulty: difficulty,
            included_tx_ids: HashSet::new(),
            config,
        }
    }

    pub fn head(&self) -> &Block {
        self.chain.last().expect("chain always has a genesis block")
    }

    pub fn block_at(&self, index: BlockHeight) -> Result<&Block> {
        self.chain
            .get(index as usize)
            .ok_or_else(|| Error::not_found(format!("no block at index {index}")))
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn block_by_hash(&self, hash: &node_crypto::Hash256) -> Result<&Block> {
        self.chain
            .iter()
            .find(|b| &b.hash == hash)
            .ok_or_else(|| Error::not_found(format!("no block with hash {hash}")))
    }

    pub fn chain_slice(&self, from: BlockHeight, limit: usize) -> Vec<Block> {
        self.chain
            .iter()
            .skip(from as usize)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn balance(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn stake(&self, address: &Address) -> Amount {
        self.validator_stakes.get(address).copied().unwrap_or(0)
    }

    pub fn active_validators(&self) -> &HashMap<Address, Amount> {
        &self.active_validators
    }

    pub fn current_difficulty(&self) -> Difficulty {
        self.current_difficulty
    }

    pub fn mempool_snapshot(&self) -> Vec<Transaction> {
        self.mempool.snapshot()
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    /// Sum of amount+fee already promised to the mempool by `sender`,
    /// excluding `exclude` (used when re-evaluating an existing entry).
    fn pending_obligations(&self, sender: &Address, exclude: Option<&TxId>) -> Amount {
        self.mempool
            .snapshot()
            .iter()
            .filter(|tx| &tx.sender == sender && Some(&tx.id) != exclude)
            .map(|tx| tx.amount.saturating_add(tx.fee))
            .sum()
    }

    pub fn submit_transaction(&mut self, tx: Transaction) -> SubmitOutcome {
        if let Err(e) = verify_structure(&tx, self.config.signature_mode) {
            return SubmitOutcome::Rejected(e.reason);
        }

        if self.included_tx_ids.contains(&tx.id) {
            return SubmitOutcome::Rejected("duplicate: already in chain".into());
        }

        if let Some(existing) = self.mempool.get(&tx.id) {
            return self.merge_or_reject_duplicate(existing.clone(), tx);
        }

        let available = self.balance(&tx.sender);
        let pending = self.pending_obligations(&tx.sender, None);
        let required = tx.amount.saturating_add(tx.fee);
        if available < pending.saturating_add(required) {
            return SubmitOutcome::Rejected(format!(
                "insufficient funds: have {}, pending {}, need {}",
                available, pending, required
            ));
        }

        let survived = self.mempool.insert(tx);
        if survived {
            SubmitOutcome::Admitted
        } else {
            SubmitOutcome::Rejected("mempool full: evicted as lowest-fee candidate".into())
        }
    }

    /// Resubmission of an id already in the mempool. For `MultiSig` this is
    /// signature progression (union the collected signatures); otherwise
    /// it's a plain duplicate (invariant 8: idempotent on id).
    fn merge_or_reject_duplicate(&mut self, existing: Transaction, incoming: Transaction) -> SubmitOutcome {
        match (&existing.variant, &incoming.variant) {
            (
                TxVariant::MultiSig {
                    collected_signatures: existing_sigs,
                    ..
                },
                TxVariant::MultiSig {
                    collected_signatures: incoming_sigs,
                    ..
                },
            ) => {
                let mut merged = existing_sigs.clone();
                for signer in incoming_sigs {
                    if !merged.contains(signer) {
                        merged.push(*signer);
                    }
                }
                if merged.len() != existing_sigs.len() {
                    let mut updated = existing;
                    if let TxVariant::MultiSig {
                        collected_signatures,
                        ..
                    } = &mut updated.variant
                    {
                        *collected_signatures = merged;
                    }
                    self.mempool.remove(&updated.id);
                    self.mempool.insert(updated);
                }
                SubmitOutcome::Admitted
            }
            _ => SubmitOutcome::Admitted,
        }
    }

    /// Drains up to `max_block_transactions` eligible entries in mempool
    /// order and assembles an unsealed block. Does not seal.
    pub fn assemble_block(&self, proposer: Address) -> Block {
        let now = Timestamp::now();
        let selected: Vec<Transaction> = self
            .mempool
            .eligible_ordered(now)
            .into_iter()
            .take(self.config.max_block_transactions)
            .cloned()
            .collect();

        Block::assemble(
            self.head().index + 1,
            self.head().hash,
            selected,
            self.current_difficulty,
            proposer,
        )
    }

    /// Full validation and, on success, commit of a sealed block.
    /// `seal_valid` delegates consensus-seal verification to the caller
    /// (the Consensus Engine), keeping this crate free of PoW/PoS logic.
    pub fn append_block(&mut self, block: Block, seal_valid: impl FnOnce(&Block) -> bool) -> AppendOutcome {
        if block.hash == self.head().hash
            || self.chain.iter().any(|b| b.hash == block.hash)
        {
            return AppendOutcome::Rejected("already present".into());
        }

        if let Err(reason) = self.validate_candidate(&block, self.head(), seal_valid) {
            return AppendOutcome::Rejected(reason.reason);
        }

        let effects = match apply::compute_effects(
            &self.balances,
            &self.validator_stakes,
            &block,
            self.config.contract_instruction_budget,
        ) {
            Ok(effects) => effects,
            Err(e) => return AppendOutcome::Rejected(e.reason),
        };

        self.commit(block, effects);
        AppendOutcome::Accepted
    }

    fn validate_candidate(
        &self,
        block: &Block,
        parent: &Block,
        seal_valid: impl FnOnce(&Block) -> bool,
    ) -> Result<()> {
        if block.index != parent.index + 1 {
            return Err(Error::validation("block index is not parent.index + 1"));
        }
        if block.previous_hash != parent.hash {
            return Err(Error::validation("previous_hash does not match head"));
        }
        if block.merkle_root != Block::compute_merkle_root(&block.transactions) {
            return Err(Error::validation("merkle_root does not match transactions"));
        }
        if block.hash != block.compute_hash() {
            return Err(Error::validation("block hash is not self-consistent"));
        }
        if !seal_valid(block) {
            return Err(Error::consensus("consensus seal verification failed"));
        }
        for tx in &block.transactions {
            verify_structure(tx, self.config.signature_mode)?;
            if self.included_tx_ids.contains(&tx.id) {
                return Err(Error::validation(format!(
                    "transaction {} already included in chain",
                    tx.id
                )));
            }
            if !crate::transaction::is_eligible_for_inclusion(tx, block.timestamp) {
                return Err(Error::validation(format!(
                    "transaction {} is not eligible for inclusion",
                    tx.id
                )));
            }
        }
        Ok(())
    }

    fn commit(&mut self, block: Block, effects: BlockEffects) {
        let included_ids: Vec<TxId> = block.transactions.iter().map(|t| t.id).collect();
        for (addr, balance) in effects.balances {
            self.balances.insert(addr, balance);
        }
        for (addr, stake) in effects.stakes {
            self.validator_stakes.insert(addr, stake);
        }
        self.mempool.remove_many(included_ids.iter().copied());
        self.included_tx_ids.extend(included_ids);
        self.chain.push(block);
        self.maybe_adjust_window();
    }

    fn maybe_adjust_window(&mut self) {
        let window = self.config.difficulty_window.max(1);
        if (self.head().index) % window != 0 || self.head().index == 0 {
            return;
        }
        let window_start = (self.head().index - window) as usize;
        let start_ts = self.chain[window_start].timestamp.as_unix();
        let end_ts = self.head().timestamp.as_unix();
        let elapsed = (end_ts - start_ts).max(1) as f64;
        let actual_interval = elapsed / window as f64;
        let target = self.config.target_block_interval_secs.max(1) as f64;
        let ratio = target / actual_interval;
        let adjusted = (self.current_difficulty as f64 * ratio).round() as i64;
        self.current_difficulty = (adjusted.clamp(DIFFICULTY_MIN as i64, DIFFICULTY_MAX as i64)) as Difficulty;

        self.active_validators = self
            .validator_stakes
            .iter()
            .filter(|(_, stake)| **stake >= self.config.min_validator_stake)
            .map(|(addr, stake)| (*addr, *stake))
            .collect();
    }

    /// Adopts a peer-supplied chain fragment if it is valid end-to-end and
    /// strictly longer than the local chain from the shared fork point
    /// (spec.md §4.1). `seal_valid` is applied per candidate block.
    pub fn try_reorg(
        &mut self,
        candidate: Vec<Block>,
        seal_valid: impl Fn(&Block) -> bool,
    ) -> ReorgOutcome {
        let Some(first) = candidate.first() else {
            return ReorgOutcome::Rejected("empty candidate fragment".into());
        };
        let fork_index = match first.index.checked_sub(1) {
            Some(i) => i,
            None => return ReorgOutcome::Rejected("candidate fragment starts at genesis".into()),
        };
        let Ok(fork_block) = self.block_at(fork_index).cloned() else {
            return ReorgOutcome::Rejected("unknown fork point".into());
        };
        if first.previous_hash != fork_block.hash {
            return ReorgOutcome::Rejected("candidate does not attach to a known ancestor".into());
        }

        let local_suffix_len = self.head().index - fork_index;
        if candidate.len() as u64 <= local_suffix_len {
            return ReorgOutcome::Rejected("candidate is not strictly longer".into());
        }

        // Replay from the fork point to validate the whole candidate
        // end-to-end without mutating local state until it is known-good.
        let mut balances = self.balances_at(fork_index);
        let mut stakes = self.stakes_at(fork_index);
        let mut parent = fork_block.clone();
        let mut replayed_ids: HashSet<TxId> = self.included_ids_up_to(fork_index);

        for block in &candidate {
            if let Err(reason) = self.validate_candidate_against(
                block,
                &parent,
                &replayed_ids,
                |b| seal_valid(b),
            ) {
                return ReorgOutcome::Rejected(reason.reason);
            }
            let effects = match apply::compute_effects(
                &balances,
                &stakes,
                block,
                self.config.contract_instruction_budget,
            ) {
                Ok(effects) => effects,
                Err(e) => return ReorgOutcome::Rejected(e.reason),
            };
            for (addr, balance) in effects.balances {
                balances.insert(addr, balance);
            }
            for (addr, stake) in effects.stakes {
                stakes.insert(addr, stake);
            }
            replayed_ids.extend(block.transactions.iter().map(|t| t.id));
            parent = block.clone();
        }

        // Collect transactions from the local blocks being discarded so
        // they can be returned to the mempool.
        let discarded: Vec<Transaction> = self.chain[(fork_index as usize + 1)..]
            .iter()
            .flat_map(|b| b.transactions.clone())
            .collect();

        self.chain.truncate(fork_index as usize + 1);
        self.chain.extend(candidate);
        self.balances = balances;
        self.validator_stakes = stakes;
        self.included_tx_ids = replayed_ids;
        self.recompute_difficulty_and_validators();

        // Eligibility (e.g. an unlock_time still in the future) is
        // re-checked by the mempool at selection time, not here, so a
        // still-locked TimeLocked transaction returns to the mempool and
        // becomes mineable once it unlocks instead of being dropped.
        for tx in discarded {
            if self.included_tx_ids.contains(&tx.id) {
                continue;
            }
            if verify_structure(&tx, self.config.signature_mode).is_err() {
                continue;
            }
            self.mempool.insert(tx);
        }

        ReorgOutcome::Reorged
    }

    fn validate_candidate_against(
        &self,
        block: &Block,
        parent: &Block,
        already_included: &HashSet<TxId>,
        seal_valid: impl FnOnce(&Block) -> bool,
    ) -> Result<()> {
        if block.index != parent.index + 1 {
            return Err(Error::validation("block index is not parent.index + 1"));
        }
        if block.previous_hash != parent.hash {
            return Err(Error::validation("previous_hash does not match parent"));
        }
        if block.merkle_root != Block::compute_merkle_root(&block.transactions) {
            return Err(Error::validation("merkle_root does not match transactions"));
        }
        if block.hash != block.compute_hash() {
            return Err(Error::validation("block hash is not self-consistent"));
        }
        if !seal_valid(block) {
            return Err(Error::consensus("consensus seal verification failed"));
        }
        for tx in &block.transactions {
            verify_structure(tx, self.config.signature_mode)?;
            if already_included.contains(&tx.id) {
                return Err(Error::validation("duplicate transaction within candidate chain"));
            }
            if !crate::transaction::is_eligible_for_inclusion(tx, block.timestamp) {
                return Err(Error::validation(format!(
                    "transaction {} is not eligible for inclusion",
                    tx.id
                )));
            }
        }
        Ok(())
    }

    fn balances_at(&self, index: BlockHeight) -> HashMap<Address, Amount> {
        let mut balances: HashMap<Address, Amount> = HashMap::new();
        for (addr, amount) in &self.config.genesis_allocations {
            balances.insert(*addr, *amount);
        }
        let mut stakes: HashMap<Address, Amount> = HashMap::new();
        for block in &self.chain[1..=index as usize] {
            if let Ok(effects) = apply::compute_effects(
                &balances,
                &stakes,
                block,
                self.config.contract_instruction_budget,
            ) {
                for (a, b) in effects.balances {
                    balances.insert(a, b);
                }
                for (a, s) in effects.stakes {
                    stakes.insert(a, s);
                }
            }
        }
        balances
    }

    fn stakes_at(&self, index: BlockHeight) -> HashMap<Address, Amount> {
        let mut balances: HashMap<Address, Amount> = HashMap::new();
        for (addr, amount) in &self.config.genesis_allocations {
            balances.insert(*addr, *amount);
        }
        let mut stakes: HashMap<Address, Amount> = HashMap::new();
        for block in &self.chain[1..=index as usize] {
            if let Ok(effects) = apply::compute_effects(
                &balances,
                &stakes,
                block,
                self.config.contract_instruction_budget,
            ) {
                for (a, b) in effects.balances {
                    balances.insert(a, b);
                }
                for (a, s) in effects.stakes {
                    stakes.insert(a, s);
                }
            }
        }
        stakes
    }

    fn included_ids_up_to(&self, index: BlockHeight) -> HashSet<TxId> {
        self.chain[..=index as usize]
            .iter()
            .flat_map(|b| b.transactions.iter().map(|t| t.id))
            .collect()
    }

    fn recompute_difficulty_and_validators(&mut self) {
        let window = self.config.difficulty_window.max(1);
        self.current_difficulty = self.config.initial_difficulty.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX);
        let mut idx = window;
        while idx <= self.head().index {
            let window_start = (idx - window) as usize;
            let start_ts = self.chain[window_start].timestamp.as_unix();
            let end_ts = self.chain[idx as usize].timestamp.as_unix();
            let elapsed = (end_ts - start_ts).max(1) as f64;
            let actual_interval = elapsed / window as f64;
            let target = self.config.target_block_interval_secs.max(1) as f64;
            let ratio = target / actual_interval;
            let adjusted = (self.current_difficulty as f64 * ratio).round() as i64;
            self.current_difficulty = adjusted.clamp(DIFFICULTY_MIN as i64, DIFFICULTY_MAX as i64) as Difficulty;
            idx += window;
        }
        self.active_validators = self
            .validator_stakes
            .iter()
            .filter(|(_, stake)| **stake >= self.config.min_validator_stake)
            .map(|(addr, stake)| (*addr, *stake))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_crypto::Keypair;

    fn addr() -> Address {
        Address::from_public_key(&Keypair::generate().public())
    }

    fn always_valid(_: &Block) -> bool {
        true
    }

    fn ledger_with(alice: Address, alice_balance: Amount) -> Ledger {
        let config = LedgerConfig {
            genesis_allocations: vec![(alice, alice_balance)],
            ..LedgerConfig::default()
        };
        Ledger::new(config)
    }

    /// S1 — single-node standard transfer.
    #[test]
    fn standard_transfer_updates_balances_and_clears_mempool() {
        let alice = addr();
        let bob = addr();
        let miner = addr();
        let mut ledger = ledger_with(alice, 100);

        let tx = Transaction::build(alice, bob, 40, 1, None, None, TxVariant::Standard);
        assert_eq!(ledger.submit_transaction(tx), SubmitOutcome::Admitted);

        let mut block = ledger.assemble_block(miner);
        block.reward = 10;
        block.hash = block.compute_hash();
        assert_eq!(ledger.append_block(block, always_valid), AppendOutcome::Accepted);

        assert_eq!(ledger.chain_len(), 2);
        assert_eq!(ledger.balance(&alice), 59);
        assert_eq!(ledger.balance(&bob), 40);
        assert_eq!(ledger.balance(&miner), 10 + 1);
        assert_eq!(ledger.mempool_len(), 0);
    }

    /// S2 — insufficient funds are rejected and the mempool is unchanged.
    #[test]
    fn insufficient_funds_is_rejected() {
        let alice = addr();
        let bob = addr();
        let mut ledger = ledger_with(alice, 59);

        let tx = Transaction::build(alice, bob, 100, 1, None, None, TxVariant::Standard);
        match ledger.submit_transaction(tx) {
            SubmitOutcome::Rejected(_) => {}
            SubmitOutcome::Admitted => panic!("expected rejection"),
        }
        assert_eq!(ledger.mempool_len(), 0);
    }

    /// S5 — a TimeLocked transaction is excluded until its unlock time.
    #[test]
    fn timelocked_transaction_waits_for_unlock() {
        let alice = addr();
        let bob = addr();
        let miner = addr();
        let mut ledger = ledger_with(alice, 100);

        let far_future = Timestamp::from_unix(Timestamp::now().as_unix() + 3600);
        let tx = Transaction::build(
            alice,
            bob,
            10,
            1,
            None,
            None,
            TxVariant::TimeLocked {
                unlock_time: far_future,
            },
        );
        ledger.submit_transaction(tx);

        let block = ledger.assemble_block(miner);
        assert!(block.transactions.is_empty());
    }

    /// S6 — a MultiSig transaction is included only once fully signed.
    #[test]
    fn multisig_is_included_once_fully_signed() {
        let alice = addr();
        let bob = addr();
        let miner = addr();
        let signer_a = addr();
        let signer_b = addr();
        let mut ledger = ledger_with(alice, 100);

        let tx = Transaction::build(
            alice,
            bob,
            10,
            1,
            None,
            None,
            TxVariant::MultiSig {
                signers: vec![signer_a, signer_b],
                required_signatures: 2,
                collected_signatures: vec![signer_a],
            },
        );
        let id = tx.id;
        ledger.submit_transaction(tx);

        let block = ledger.assemble_block(miner);
        assert!(block.transactions.is_empty());

        let resigned = Transaction {
            id,
            sender: alice,
            recipient: bob,
            amount: 10,
            fee: 1,
            timestamp: ledger.mempool.get(&id).unwrap().timestamp,
            metadata: None,
            signature: None,
            variant: TxVariant::MultiSig {
                signers: vec![signer_a, signer_b],
                required_signatures: 2,
                collected_signatures: vec![signer_b],
            },
        };
        ledger.submit_transaction(resigned);

        let mut block = ledger.assemble_block(miner);
        assert_eq!(block.transactions.len(), 1);
        block.hash = block.compute_hash();
        assert_eq!(ledger.append_block(block, always_valid), AppendOutcome::Accepted);
        assert_eq!(ledger.chain_len(), 2);
    }

    #[test]
    fn append_block_is_idempotent() {
        let alice = addr();
        let bob = addr();
        let miner = addr();
        let mut ledger = ledger_with(alice, 100);
        let tx = Transaction::build(alice, bob, 10, 1, None, None, TxVariant::Standard);
        ledger.submit_transaction(tx);

        let mut block = ledger.assemble_block(miner);
        block.hash = block.compute_hash();
        assert_eq!(
            ledger.append_block(block.clone(), always_valid),
            AppendOutcome::Accepted
        );
        match ledger.append_block(block, always_valid) {
            AppendOutcome::Rejected(reason) => assert!(reason.contains("already present")),
            AppendOutcome::Accepted => panic!("duplicate append must be rejected"),
        }
    }

    #[test]
    fn difficulty_never_leaves_clamped_bounds() {
        let alice = addr();
        let mut ledger = ledger_with(alice, 0);
        ledger.config.difficulty_window = 2;
        ledger.config.target_block_interval_secs = 30;
        for i in 0..6u64 {
            let mut block = ledger.assemble_block(addr());
            block.timestamp = Timestamp::from_unix(i as i64 * 1);
            block.hash = block.compute_hash();
            assert_eq!(ledger.append_block(block, always_valid), AppendOutcome::Accepted);
            assert!(ledger.current_difficulty() >= DIFFICULTY_MIN);
            assert!(ledger.current_difficulty() <= DIFFICULTY_MAX);
        }
    }

    #[test]
    fn try_reorg_returns_discarded_transactions_to_mempool() {
        let alice = addr();
        let bob = addr();
        let carol = addr();
        let miner = addr();
        let mut local = ledger_with(alice, 1000);

        // Local extends by one block with a transaction that will be orphaned.
        let orphaned_tx = Transaction::build(alice, bob, 10, 1, None, None, TxVariant::Standard);
        local.submit_transaction(orphaned_tx.clone());
        let mut b1 = local.assemble_block(miner);
        b1.hash = b1.compute_hash();
        assert_eq!(local.append_block(b1, always_valid), AppendOutcome::Accepted);

        // A longer candidate fragment forks right after genesis.
        let mut fork_ledger = ledger_with(alice, 1000);
        let fork_tx1 = Transaction::build(alice, carol, 5, 1, None, None, TxVariant::Standard);
        fork_ledger.submit_transaction(fork_tx1);
        let mut f1 = fork_ledger.assemble_block(miner);
        f1.hash = f1.compute_hash();
        fork_ledger.append_block(f1.clone(), always_valid);
        let fork_tx2 = Transaction::build(alice, carol, 5, 1, None, None, TxVariant::Standard);
        fork_ledger.submit_transaction(fork_tx2);
        let mut f2 = fork_ledger.assemble_block(miner);
        f2.hash = f2.compute_hash();
        fork_ledger.append_block(f2.clone(), always_valid);

        let outcome = local.try_reorg(vec![f1, f2], always_valid);
        assert_eq!(outcome, ReorgOutcome::Reorged);
        assert_eq!(local.chain_len(), 3);
        // The orphaned transaction is still valid under the new head, so it
        // should have returned to the mempool rather than vanishing.
        assert!(local.mempool_snapshot().iter().any(|t| t.id == orphaned_tx.id));
    }
}
