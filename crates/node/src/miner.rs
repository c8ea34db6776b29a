use node_consensus::cancel::CancelToken;
use node_consensus::{ConsensusError, ConsensusMode};
use node_core::{AppendOutcome, Ledger};
use node_crypto::Address;
use node_network::peer::PeerRegistry;
use node_storage::ChainStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::network_io::OutboundRegistry;

const GOSSIP_FANOUT: usize = 4;
const IDLE_POLL: Duration = Duration::from_millis(500);
const HEAD_WATCH_INTERVAL: Duration = Duration::from_millis(200);

/// Assembles, seals, and appends blocks in a loop while `mining_enabled` is
/// set (spec.md §5's "Miner" task). Sealing runs on a blocking thread since
/// PoW nonce search is CPU-bound and must not stall the async runtime; a
/// concurrent watcher cancels the in-flight attempt as soon as the ledger's
/// head advances out from under it (spec.md §5: "sealing... abandons the
/// attempt when a peer block extends the chain first").
pub async fn run_miner(
    ledger: Arc<Mutex<Ledger>>,
    peers: PeerRegistry,
    outbound: OutboundRegistry,
    mining_enabled: Arc<AtomicBool>,
    mode: ConsensusMode,
    proposer: Address,
    store: Arc<dyn ChainStore>,
) {
    loop {
        if !mining_enabled.load(Ordering::Relaxed) {
            tokio::time::sleep(IDLE_POLL).await;
            continue;
        }

        let (block, active_validators, head_index) = {
            let ledger = ledger.lock().await;
            (
                ledger.assemble_block(proposer),
                ledger.active_validators().clone(),
                ledger.head().index,
            )
        };

        let cancel = CancelToken::new();
        let watch_cancel = cancel.clone();
        let watch_ledger = Arc::clone(&ledger);
        let watcher = tokio::spawn(async move {
            loop {
                tokio::time::sleep(HEAD_WATCH_INTERVAL).await;
                if watch_ledger.lock().await.head().index != head_index {
                    watch_cancel.cancel();
                    break;
                }
            }
        });

        let seal_validators = active_validators.clone();
        let seal_result = tokio::task::spawn_blocking(move || {
            let mut block = block;
            node_consensus::hybrid::seal(&mut block, mode, &seal_validators, &cancel).map(|_| block)
        })
        .await
        .expect("sealing task panicked");

        watcher.abort();

        match seal_result {
            Ok(sealed) => {
                let outcome = {
                    let mut ledger = ledger.lock().await;
                    ledger.append_block(sealed.clone(), |b| {
                        node_consensus::verify_seal(b, &active_validators)
                    })
                };
                if matches!(outcome, AppendOutcome::Accepted) {
                    tracing::info!(index = sealed.index, "mined a new block");
                    if let Err(e) = store.append_block(&sealed).await {
                        tracing::warn!(error = %e, "failed to persist mined block");
                    }
                    let targets = peers.gossip_targets(GOSSIP_FANOUT, None).await;
                    for target in targets {
                        outbound
                            .send_to(&target.node_id, node_network::message::Message::NewBlock(sealed.clone()))
                            .await;
                    }
                } else {
                    tracing::debug!("sealed block was rejected on append, head moved under us");
                }
            }
            Err(ConsensusError::Cancelled) => {
                tracing::debug!("sealing cancelled, head advanced");
            }
            Err(e) => {
                tracing::warn!(error = %e, "sealing attempt failed");
                tokio::time::sleep(IDLE_POLL).await;
            }
        }
    }
}
