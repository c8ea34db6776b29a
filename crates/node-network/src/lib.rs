pub mod framing;
pub mod gossip;
pub mod message;
pub mod peer;

use message::{Message, NodeId, PROTOCOL_VERSION};
use node_core::BlockHeight;
use node_crypto::Hash256;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// Backtrack window K for chain reconciliation (spec.md §4.4): when a
/// NEW_BLOCK arrives with an unknown previous_hash, GET_CHAIN starts at
/// `max(local.head.index - K, 0)`.
pub const CHAIN_BACKTRACK_WINDOW: BlockHeight = 32;

/// Upper bound on how far reconciliation will back up before giving up on a
/// peer's claimed chain (spec.md §4.4: "a larger backtrack is attempted up
/// to a configured bound, after which the peer's claim is dropped").
pub const MAX_CHAIN_BACKTRACK: BlockHeight = CHAIN_BACKTRACK_WINDOW * 8;

/// How many consecutive message-parse failures from one peer before it is
/// dropped (spec.md §4.4: "Repeated parse failures from the same peer drop
/// the peer").
pub const MAX_PARSE_FAILURES: u32 = 5;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
    #[error("peer protocol version {0} is incompatible")]
    VersionMismatch(u32),
    #[error("handshake reply did not match expected shape")]
    UnexpectedHandshakeReply,
}

/// Computes the starting index for a GET_CHAIN request given the local
/// head, widening from `CHAIN_BACKTRACK_WINDOW` up to `MAX_CHAIN_BACKTRACK`
/// as `attempt` increases (spec.md §4.4's widening backtrack).
pub fn backtrack_from_index(local_head: BlockHeight, attempt: u32) -> BlockHeight {
    let window = CHAIN_BACKTRACK_WINDOW
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_CHAIN_BACKTRACK);
    local_head.saturating_sub(window)
}

/// Runs the symmetric HELLO / HELLO_ACK handshake over an already-connected
/// channel (spec.md §4.4: "on establishing a channel, both sides send
/// HELLO, exchange HELLO_ACK, and enter ready"). Returns the peer's
/// advertised identity and head, or `VersionMismatch` if incompatible.
pub async fn handshake<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    local_node_id: &NodeId,
    local_head_index: BlockHeight,
    local_head_hash: Hash256,
) -> Result<(NodeId, BlockHeight, Hash256), NetworkError> {
    framing::write_message(
        stream,
        &Message::Hello {
            node_id: local_node_id.clone(),
            version: PROTOCOL_VERSION,
            head_index: local_head_index,
            head_hash: local_head_hash,
        },
    )
    .await?;

    match framing::read_message(stream).await? {
        Message::Hello {
            node_id,
            version,
            head_index,
            head_hash,
        } => {
            if version != PROTOCOL_VERSION {
                return Err(NetworkError::VersionMismatch(version));
            }
            framing::write_message(
                stream,
                &Message::HelloAck {
                    node_id: local_node_id.clone(),
                    version: PROTOCOL_VERSION,
                    head_index: local_head_index,
                    head_hash: local_head_hash,
                },
            )
            .await?;
            match framing::read_message(stream).await? {
                Message::HelloAck { .. } => Ok((node_id, head_index, head_hash)),
                _ => Err(NetworkError::UnexpectedHandshakeReply),
            }
        }
        _ => Err(NetworkError::UnexpectedHandshakeReply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtrack_widens_geometrically_up_to_the_bound() {
        assert_eq!(backtrack_from_index(1000, 0), 1000 - CHAIN_BACKTRACK_WINDOW);
        assert_eq!(
            backtrack_from_index(1000, 1),
            1000 - CHAIN_BACKTRACK_WINDOW * 2
        );
        assert_eq!(backtrack_from_index(1000, 10), 1000 - MAX_CHAIN_BACKTRACK);
    }

    #[test]
    fn backtrack_never_underflows_a_short_chain() {
        assert_eq!(backtrack_from_index(5, 0), 0);
    }

    #[tokio::test]
    async fn handshake_completes_symmetrically_over_a_duplex_stream() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let hash = Hash256::zero();

        let side_a = tokio::spawn(async move {
            handshake(&mut a, &"node-a".to_string(), 10, hash).await
        });
        let side_b = handshake(&mut b, &"node-b".to_string(), 20, hash).await;

        let (node_id_b, head_b, _) = side_b.unwrap();
        assert_eq!(node_id_b, "node-a");
        assert_eq!(head_b, 10);

        let (node_id_a, head_a, _) = side_a.await.unwrap().unwrap();
        assert_eq!(node_id_a, "node-b");
        assert_eq!(head_a, 20);
    }
}
