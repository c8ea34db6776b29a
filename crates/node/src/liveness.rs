use crate::network_io::OutboundRegistry;
use node_network::message::Message;
use node_network::peer::PeerRegistry;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Ping interval T (spec.md §4.4's liveness window is expressed in
/// multiples of this). Peers go stale after one missed interval and are
/// dropped after three more, per `PeerRegistry::tick_liveness`.
const PING_INTERVAL: Duration = Duration::from_secs(15);

/// Periodically PINGs every known peer and ages the registry (spec.md §5's
/// "Liveness ticker" task).
pub async fn run_liveness(peers: PeerRegistry, outbound: OutboundRegistry) {
    loop {
        tokio::time::sleep(PING_INTERVAL).await;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        for peer in peers.snapshot().await {
            outbound.send_to(&peer.node_id, Message::Ping { timestamp }).await;
        }

        let dropped = peers.tick_liveness().await;
        for node_id in dropped {
            tracing::info!(%node_id, "dropped unresponsive peer");
            outbound.unregister(&node_id).await;
        }
    }
}
