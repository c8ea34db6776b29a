use node_core::BlockHeight;
use node_crypto::Hash256;
use node_network::message::{Message, NodeId, PeerAddr, PROTOCOL_VERSION};
use node_network::peer::{PeerDescriptor, PeerRegistry};
use node_network::{framing, handshake, NetworkError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};

pub type OutboundSender = mpsc::UnboundedSender<Message>;

/// One message received from a peer, tagged with who sent it (the "Peer
/// I/O" task's output, consumed by the "Peer dispatcher" task — spec.md
/// §5's two distinct tasks).
pub struct InboundEnvelope {
    pub from: NodeId,
    pub message: Message,
}

/// Per-peer outbound channels, keyed by node_id, so the dispatcher and the
/// miner can push a message to one peer (a reply) or several (gossip)
/// without holding a reference to that peer's socket.
#[derive(Clone, Default)]
pub struct OutboundRegistry(Arc<RwLock<HashMap<NodeId, OutboundSender>>>);

impl OutboundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, node_id: NodeId, tx: OutboundSender) {
        self.0.write().await.insert(node_id, tx);
    }

    pub async fn unregister(&self, node_id: &str) {
        self.0.write().await.remove(node_id);
    }

    pub async fn send_to(&self, node_id: &str, message: Message) {
        let senders = self.0.read().await;
        if let Some(tx) = senders.get(node_id) {
            let _ = tx.send(message);
        }
    }
}

/// Runs one peer channel end to end: handshake, then a reader loop feeding
/// `inbound_tx` and a writer loop draining this peer's outbound channel.
/// Exits (and deregisters the peer) when either direction errors.
pub async fn run_connection(
    stream: TcpStream,
    peer_addr: PeerAddr,
    local_node_id: NodeId,
    local_head_index: BlockHeight,
    local_head_hash: Hash256,
    registry: PeerRegistry,
    outbound: OutboundRegistry,
    inbound_tx: mpsc::UnboundedSender<InboundEnvelope>,
) -> Result<(), NetworkError> {
    let mut stream = stream;
    let (peer_node_id, peer_head_index, peer_head_hash) =
        handshake(&mut stream, &local_node_id, local_head_index, local_head_hash).await?;

    registry
        .upsert(PeerDescriptor::new(
            peer_addr,
            peer_node_id.clone(),
            PROTOCOL_VERSION,
        ))
        .await;
    registry
        .mark_ready(&peer_node_id, peer_head_index, peer_head_hash)
        .await;

    let (mut read_half, mut write_half) = stream.into_split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    outbound.register(peer_node_id.clone(), out_tx).await;

    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            if framing::write_message(&mut write_half, &message).await.is_err() {
                break;
            }
        }
    });

    let mut parse_failures = 0u32;
    loop {
        match framing::read_message(&mut read_half).await {
            Ok(message) => {
                parse_failures = 0;
                if inbound_tx
                    .send(InboundEnvelope {
                        from: peer_node_id.clone(),
                        message,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Err(NetworkError::Deserialization(_)) => {
                parse_failures += 1;
                if parse_failures >= node_network::MAX_PARSE_FAILURES {
                    tracing::warn!(peer = %peer_node_id, "dropping peer after repeated parse failures");
                    break;
                }
            }
            Err(_) => break,
        }
    }

    writer.abort();
    outbound.unregister(&peer_node_id).await;
    registry.remove(&peer_node_id).await;
    Ok(())
}

/// Accepts inbound connections forever, spawning one [`run_connection`]
/// task per peer (spec.md §5's "Peer I/O — one logical reader and one
/// logical writer per peer channel").
pub async fn run_listener(
    bind_addr: String,
    local_node_id: NodeId,
    local_head_index: BlockHeight,
    local_head_hash: Hash256,
    registry: PeerRegistry,
    outbound: OutboundRegistry,
    inbound_tx: mpsc::UnboundedSender<InboundEnvelope>,
) -> Result<(), NetworkError> {
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "peer listener bound");
    loop {
        let (socket, addr) = listener.accept().await?;
        let peer_addr = PeerAddr {
            host: addr.ip().to_string(),
            port: addr.port(),
        };
        let registry = registry.clone();
        let outbound = outbound.clone();
        let inbound_tx = inbound_tx.clone();
        let node_id = local_node_id.clone();
        tokio::spawn(async move {
            if let Err(e) = run_connection(
                socket,
                peer_addr,
                node_id,
                local_head_index,
                local_head_hash,
                registry,
                outbound,
                inbound_tx,
            )
            .await
            {
                tracing::warn!(error = %e, "peer connection ended");
            }
        });
    }
}

/// Dials a configured seed peer once; failures are logged and left to the
/// caller to retry (spec.md §4.4: "Connection drops are logged... moved to
/// connecting for one retry cycle").
pub async fn dial_seed(
    addr: String,
    local_node_id: NodeId,
    local_head_index: BlockHeight,
    local_head_hash: Hash256,
    registry: PeerRegistry,
    outbound: OutboundRegistry,
    inbound_tx: mpsc::UnboundedSender<InboundEnvelope>,
) {
    match TcpStream::connect(&addr).await {
        Ok(socket) => {
            let (host, port) = split_host_port(&addr);
            let peer_addr = PeerAddr { host, port };
            if let Err(e) = run_connection(
                socket,
                peer_addr,
                local_node_id,
                local_head_index,
                local_head_hash,
                registry,
                outbound,
                inbound_tx,
            )
            .await
            {
                tracing::warn!(%addr, error = %e, "seed peer connection ended");
            }
        }
        Err(e) => tracing::warn!(%addr, error = %e, "failed to dial seed peer"),
    }
}

fn split_host_port(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(0)),
        None => (addr.to_string(), 0),
    }
}
