use node_core::Ledger;
use node_network::peer::PeerRegistry;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything a handler needs, cloned cheaply into each warp filter chain.
/// `ledger` is the single writer-serialized ledger (spec.md §5's "guarded
/// by a single logical writer discipline"); `mining_enabled` is the flag
/// the miner task polls and `POST /mining/{start,stop}` flips.
#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub peers: PeerRegistry,
    pub mining_enabled: Arc<AtomicBool>,
}

impl ApiState {
    pub fn new(ledger: Arc<Mutex<Ledger>>, peers: PeerRegistry) -> Self {
        Self {
            ledger,
            peers,
            mining_enabled: Arc::new(AtomicBool::new(true)),
        }
    }
}
