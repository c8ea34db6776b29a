use crate::transaction::{is_eligible_for_inclusion, Transaction, TxId};
use crate::types::Timestamp;
use indexmap::IndexMap;

struct Entry {
    tx: Transaction,
    /// Monotonic admission sequence, used as the ascending-admission-time
    /// tie-break independent of wall-clock timestamp resolution.
    seq: u64,
}

/// The set of admitted, unconfirmed transactions (spec.md §3). Ordered for
/// block assembly by descending fee, ties broken by ascending admission
/// order; bounded by `capacity`, evicting the lowest-fee entry when full.
pub struct Mempool {
    entries: IndexMap<TxId, Entry>,
    capacity: usize,
    next_seq: u64,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &TxId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &TxId) -> Option<&Transaction> {
        self.entries.get(id).map(|e| &e.tx)
    }

    /// Inserts `tx`, evicting the lowest-fee entry if this pushes the
    /// mempool over capacity. Returns `true` if `tx` itself is the entry
    /// still present afterward (it may be the one evicted, if it was
    /// itself the lowest-fee candidate).
    pub fn insert(&mut self, tx: Transaction) -> bool {
        let id = tx.id;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(id, Entry { tx, seq });

        if self.entries.len() > self.capacity {
            if let Some(evict_id) = self.lowest_fee_id() {
                self.entries.shift_remove(&evict_id);
            }
        }

        self.entries.contains_key(&id)
    }

    pub fn remove(&mut self, id: &TxId) -> Option<Transaction> {
        self.entries.shift_remove(id).map(|e| e.tx)
    }

    pub fn remove_many(&mut self, ids: impl IntoIterator<Item = TxId>) {
        for id in ids {
            self.remove(&id);
        }
    }

    fn lowest_fee_id(&self) -> Option<TxId> {
        self.entries
            .iter()
            .min_by(|(_, a), (_, b)| a.tx.fee.cmp(&b.tx.fee).then(b.seq.cmp(&a.seq)))
            .map(|(id, _)| *id)
    }

    /// Transactions eligible for inclusion at `now`, ordered by descending
    /// fee then ascending admission order — the order `assemble_block`
    /// drains from.
    pub fn eligible_ordered(&self, now: Timestamp) -> Vec<&Transaction> {
        let mut items: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| is_eligible_for_inclusion(&e.tx, now))
            .collect();
        items.sort_by(|a, b| b.tx.fee.cmp(&a.tx.fee).then(a.seq.cmp(&b.seq)));
        items.into_iter().map(|e| &e.tx).collect()
    }

    pub fn snapshot(&self) -> Vec<Transaction> {
        self.entries.values().map(|e| e.tx.clone()).collect()
    }
}
