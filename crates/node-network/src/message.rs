use node_core::{Block, BlockHeight, Transaction};
use node_crypto::Hash256;
use serde::{Deserialize, Serialize};

/// Opaque identifier a node picks for itself and advertises in HELLO
/// (spec.md §4.4). Distinct from any on-chain `Address` — a node can change
/// its node_id across restarts without affecting ledger identity.
pub type NodeId = String;

/// The wire-level protocol version. A peer whose HELLO carries a different
/// value is dropped during handshake (spec.md §4.4: "A peer whose version
/// is incompatible is dropped").
pub const PROTOCOL_VERSION: u32 = 1;

/// One entry of the peer descriptor list exchanged in PEERS responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

/// The full message catalogue from spec.md §4.4's table. Framing wraps this
/// enum in a length prefix; see [`crate::framing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    Hello {
        node_id: NodeId,
        version: u32,
        head_index: BlockHeight,
        head_hash: Hash256,
    },
    HelloAck {
        node_id: NodeId,
        version: u32,
        head_index: BlockHeight,
        head_hash: Hash256,
    },
    Ping {
        timestamp: i64,
    },
    Pong {
        timestamp: i64,
    },
    GetPeers,
    Peers(Vec<PeerAddr>),
    GetChain {
        from_index: BlockHeight,
        limit: u32,
    },
    Chain(Vec<Block>),
    NewTx(Transaction),
    NewBlock(Block),
    GetMempool,
    Mempool(Vec<Transaction>),
}

impl Message {
    /// A short tag for logging; avoids dumping full block/tx payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "HELLO",
            Message::HelloAck { .. } => "HELLO_ACK",
            Message::Ping { .. } => "PING",
            Message::Pong { .. } => "PONG",
            Message::GetPeers => "GET_PEERS",
            Message::Peers(_) => "PEERS",
            Message::GetChain { .. } => "GET_CHAIN",
            Message::Chain(_) => "CHAIN",
            Message::NewTx(_) => "NEW_TX",
            Message::NewBlock(_) => "NEW_BLOCK",
            Message::GetMempool => "GET_MEMPOOL",
            Message::Mempool(_) => "MEMPOOL",
        }
    }
}
