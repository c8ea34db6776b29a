use crate::network_io::{InboundEnvelope, OutboundRegistry};
use node_core::{AppendOutcome, Ledger, ReorgOutcome, SubmitOutcome, TxId};
use node_crypto::Hash256;
use node_network::gossip::SeenSet;
use node_network::message::{Message, NodeId};
use node_network::peer::PeerRegistry;
use node_storage::ChainStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// How many ready peers a gossiped item is forwarded to (spec.md §4.4's
/// "forwarded to a bounded fanout of peers", same knob the teacher's
/// `Network::gossip_message` exposed).
const GOSSIP_FANOUT: usize = 4;

/// How many seen ids to remember before the oldest is evicted; generous
/// relative to one block's transaction count so a busy mempool doesn't
/// churn the set every block.
const SEEN_CAPACITY: usize = 10_000;

/// Everything the "Peer dispatcher" task (spec.md §5) needs to act on an
/// inbound message: the single ledger writer, the peer registry, the
/// per-peer outbound channels, and gossip/reconciliation bookkeeping.
pub struct Dispatcher {
    local_node_id: NodeId,
    ledger: Arc<Mutex<Ledger>>,
    peers: PeerRegistry,
    outbound: OutboundRegistry,
    seen_txs: Mutex<SeenSet<TxId>>,
    seen_blocks: Mutex<SeenSet<Hash256>>,
    backtrack_attempts: Mutex<HashMap<NodeId, u32>>,
    store: Arc<dyn ChainStore>,
}

impl Dispatcher {
    pub fn new(
        local_node_id: NodeId,
        ledger: Arc<Mutex<Ledger>>,
        peers: PeerRegistry,
        outbound: OutboundRegistry,
        store: Arc<dyn ChainStore>,
    ) -> Self {
        Self {
            local_node_id,
            ledger,
            peers,
            outbound,
            seen_txs: Mutex::new(SeenSet::new(SEEN_CAPACITY)),
            seen_blocks: Mutex::new(SeenSet::new(SEEN_CAPACITY)),
            backtrack_attempts: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Consumes the shared inbound channel fed by every peer's reader loop
    /// (spec.md §5 ordering guarantee 1: messages from one peer are
    /// delivered to the dispatcher in the order that peer sent them, since
    /// a single producer's sends into an mpsc channel preserve order at
    /// the one consumer even as different peers interleave).
    pub async fn run(self, mut inbound: mpsc::UnboundedReceiver<InboundEnvelope>) {
        while let Some(envelope) = inbound.recv().await {
            self.handle(envelope).await;
        }
    }

    async fn handle(&self, envelope: InboundEnvelope) {
        let InboundEnvelope { from, message } = envelope;
        match message {
            Message::Hello { .. } | Message::HelloAck { .. } => {
                tracing::debug!(%from, "ignoring post-handshake HELLO");
            }
            Message::Ping { timestamp } => {
                self.peers.mark_seen(&from).await;
                self.outbound.send_to(&from, Message::Pong { timestamp }).await;
            }
            Message::Pong { .. } => {
                self.peers.mark_seen(&from).await;
            }
            Message::GetPeers => {
                let addrs = self.peers.addrs().await;
                self.outbound.send_to(&from, Message::Peers(addrs)).await;
            }
            Message::Peers(addrs) => {
                tracing::debug!(%from, count = addrs.len(), "received peer addresses");
            }
            Message::GetChain { from_index, limit } => {
                let slice = self.ledger.lock().await.chain_slice(from_index, limit as usize);
                self.outbound.send_to(&from, Message::Chain(slice)).await;
            }
            Message::Chain(blocks) => self.handle_chain(&from, blocks).await,
            Message::NewTx(tx) => self.handle_new_tx(&from, tx).await,
            Message::NewBlock(block) => self.handle_new_block(&from, block).await,
            Message::GetMempool => {
                let snapshot = self.ledger.lock().await.mempool_snapshot();
                self.outbound.send_to(&from, Message::Mempool(snapshot)).await;
            }
            Message::Mempool(txs) => {
                for tx in txs {
                    self.handle_new_tx(&from, tx).await;
                }
            }
        }
    }

    async fn handle_new_tx(&self, from: &str, tx: node_core::Transaction) {
        let newly_seen = self.seen_txs.lock().await.insert(tx.id);
        if !newly_seen {
            return;
        }
        let outcome = self.ledger.lock().await.submit_transaction(tx.clone());
        if matches!(outcome, SubmitOutcome::Admitted) {
            self.gossip(Some(from), Message::NewTx(tx)).await;
        }
    }

    async fn handle_new_block(&self, from: &str, block: node_core::Block) {
        let newly_seen = self.seen_blocks.lock().await.insert(block.hash);
        if !newly_seen {
            return;
        }

        let active_validators = self.ledger.lock().await.active_validators().clone();
        let head = self.ledger.lock().await.head().clone();

        if block.index <= head.index {
            return;
        }

        if block.previous_hash == head.hash {
            let outcome = {
                let mut ledger = self.ledger.lock().await;
                ledger.append_block(block.clone(), |b| {
                    node_consensus::verify_seal(b, &active_validators)
                })
            };
            if matches!(outcome, AppendOutcome::Accepted) {
                self.backtrack_attempts.lock().await.remove(from);
                if let Err(e) = self.store.append_block(&block).await {
                    tracing::warn!(error = %e, "failed to persist accepted block");
                }
                // Only forward a block the local node has itself accepted
                // (spec.md §5 ordering guarantee 4).
                self.gossip(Some(from), Message::NewBlock(block)).await;
            } else {
                tracing::debug!(%from, "rejected candidate block extending local head");
            }
            return;
        }

        // Parent unknown: request a backtracking chain slice and widen the
        // window on repeated misses (spec.md §4.4).
        let mut attempts = self.backtrack_attempts.lock().await;
        let attempt = attempts.entry(from.to_string()).or_insert(0);
        let from_index = node_network::backtrack_from_index(head.index, *attempt);
        *attempt += 1;
        drop(attempts);

        self.outbound
            .send_to(
                from,
                Message::GetChain {
                    from_index,
                    limit: (head.index - from_index + 1).max(1) as u32,
                },
            )
            .await;
    }

    async fn handle_chain(&self, from: &str, blocks: Vec<node_core::Block>) {
        if blocks.is_empty() {
            return;
        }
        let active_validators = self.ledger.lock().await.active_validators().clone();
        let outcome = {
            let mut ledger = self.ledger.lock().await;
            ledger.try_reorg(blocks, |b| {
                node_consensus::verify_seal(b, &active_validators)
            })
        };
        match outcome {
            ReorgOutcome::Reorged => {
                self.backtrack_attempts.lock().await.remove(from);
                tracing::info!(%from, "adopted a longer candidate chain");
            }
            ReorgOutcome::Rejected(reason) => {
                tracing::debug!(%from, %reason, "candidate chain fragment rejected");
            }
        }
    }

    /// Forwards `message` to up to [`GOSSIP_FANOUT`] ready peers, excluding
    /// whoever it arrived from.
    async fn gossip(&self, exclude: Option<&str>, message: Message) {
        let targets = self.peers.gossip_targets(GOSSIP_FANOUT, exclude).await;
        for target in targets {
            if target.node_id == self.local_node_id {
                continue;
            }
            self.outbound.send_to(&target.node_id, message.clone()).await;
        }
    }
}
