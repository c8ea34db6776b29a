mod config;
mod dispatcher;
mod error;
mod liveness;
mod miner;
mod network_io;

use clap::Parser;
use dispatcher::Dispatcher;
use network_io::{InboundEnvelope, OutboundRegistry};
use node_core::Ledger;
use node_network::peer::PeerRegistry;
use node_storage::{ChainStore, FileChainStore, InMemoryChainStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use error::NodeError;

#[derive(Parser, Debug)]
#[command(about = "hybrid PoW/PoS blockchain node")]
struct Cli {
    /// Path to a TOML config file; defaults are used for anything missing.
    #[arg(long, default_value = "node.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), NodeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = config::NodeConfig::load(&cli.config)?;
    tracing::info!(node_id = %config.node_id, "starting node");

    if matches!(config.signature_mode(), node_core::transaction::SignatureMode::Disabled) {
        tracing::warn!("signature verification is disabled; transactions are not authenticated");
    }

    let ledger_config = config.ledger_config()?;
    let store: Arc<dyn ChainStore> = match &config.chain_log_path {
        Some(path) => Arc::new(FileChainStore::open(path)?),
        None => Arc::new(InMemoryChainStore::new()),
    };

    let mut ledger = Ledger::new(ledger_config);
    replay_persisted_chain(&mut ledger, store.as_ref()).await?;
    let ledger = Arc::new(Mutex::new(ledger));

    let peers = PeerRegistry::new();
    let mut known_peer_addrs: Vec<String> = Vec::new();
    if let Some(path) = &config.peer_snapshot_path {
        if let Some(snapshot) =
            node_storage::snapshot::load_json::<Vec<node_network::message::PeerAddr>>(path)?
        {
            tracing::info!(count = snapshot.len(), "loaded peer snapshot");
            known_peer_addrs.extend(snapshot.iter().map(|p| format!("{}:{}", p.host, p.port)));
        }
    }

    let outbound = OutboundRegistry::new();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundEnvelope>();

    let api_state = node_api::ApiState::new(Arc::clone(&ledger), peers.clone());
    api_state
        .mining_enabled
        .store(config.mining_enabled, std::sync::atomic::Ordering::Relaxed);
    let mining_enabled = Arc::clone(&api_state.mining_enabled);

    let api_task = tokio::spawn(node_api::serve(api_state, config.api_bind_port));

    let (head_index, head_hash) = {
        let ledger = ledger.lock().await;
        (ledger.head().index, ledger.head().hash)
    };

    let bind_addr = format!("{}:{}", config.listen_address, config.listen_port);
    let listener_task = tokio::spawn(network_io::run_listener(
        bind_addr,
        config.node_id.clone(),
        head_index,
        head_hash,
        peers.clone(),
        outbound.clone(),
        inbound_tx.clone(),
    ));

    for seed in config.seed_peers.iter().chain(known_peer_addrs.iter()) {
        tokio::spawn(network_io::dial_seed(
            seed.clone(),
            config.node_id.clone(),
            head_index,
            head_hash,
            peers.clone(),
            outbound.clone(),
            inbound_tx.clone(),
        ));
    }

    let dispatcher = Dispatcher::new(
        config.node_id.clone(),
        Arc::clone(&ledger),
        peers.clone(),
        outbound.clone(),
        store.clone(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run(inbound_rx));

    let liveness_task = tokio::spawn(liveness::run_liveness(peers.clone(), outbound.clone()));

    let miner_task = tokio::spawn(miner::run_miner(
        Arc::clone(&ledger),
        peers.clone(),
        outbound.clone(),
        mining_enabled,
        config.consensus_mode(),
        config.miner_address()?,
        store.clone(),
    ));

    if let Some(path) = config.validator_snapshot_path.clone() {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let stakes: std::collections::BTreeMap<String, u64> = ledger
                    .lock()
                    .await
                    .active_validators()
                    .iter()
                    .map(|(addr, stake)| (addr.to_base58(), *stake))
                    .collect();
                if let Err(e) = node_storage::snapshot::save_json(&path, &stakes) {
                    tracing::warn!(error = %e, "failed to snapshot validator set");
                }
            }
        });
    }

    if let Some(path) = config.peer_snapshot_path.clone() {
        let peers = peers.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let addrs: Vec<node_network::message::PeerAddr> =
                    peers.snapshot().await.into_iter().map(|p| p.addr).collect();
                if let Err(e) = node_storage::snapshot::save_json(&path, &addrs) {
                    tracing::warn!(error = %e, "failed to snapshot peer registry");
                }
            }
        });
    }

    let _ = tokio::join!(api_task, listener_task, dispatcher_task, liveness_task, miner_task);
    Ok(())
}

/// Rebuilds ledger state from a persisted chain log by replaying every
/// block after genesis through the normal append path, so a restart
/// reaches the same state a full gossip replay would have produced.
async fn replay_persisted_chain(
    ledger: &mut Ledger,
    store: &dyn ChainStore,
) -> anyhow::Result<()> {
    let len = store.len().await?;
    for height in 1..len {
        let Some(block) = store.get_block_by_height(height).await? else {
            break;
        };
        let active_validators = ledger.active_validators().clone();
        let outcome = ledger.append_block(block, |b| {
            node_consensus::verify_seal(b, &active_validators)
        });
        if !matches!(outcome, node_core::AppendOutcome::Accepted) {
            anyhow::bail!("persisted chain log failed to replay at height {height}");
        }
    }
    Ok(())
}

