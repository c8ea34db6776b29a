//! Exercises the peer-layer half of chain reconciliation (spec.md §4.4,
//! scenarios S3/S4 from spec.md §8) over in-process duplex streams standing
//! in for sockets: a handshake establishes both sides' claimed heads, the
//! behind side computes a backtrack window and asks for a chain slice, and
//! the ahead side answers with the blocks. Ledger-level reorg validation
//! itself is `node-core::ledger`'s concern and is tested there; this test
//! only checks that the peer-layer messages carry the handshake through.

use node_core::Block;
use node_crypto::{Address, Hash256, Keypair};
use node_network::message::Message;
use node_network::{backtrack_from_index, framing, handshake};

fn addr() -> Address {
    Address::from_public_key(&Keypair::generate().public())
}

fn chain(len: u64) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut previous_hash = Hash256::zero();
    for index in 0..len {
        let mut block = Block::assemble(index, previous_hash, vec![], 1, addr());
        let mut bytes = [0u8; 32];
        bytes[0] = index as u8 + 1;
        block.hash = Hash256::from_bytes(bytes);
        previous_hash = block.hash;
        blocks.push(block);
    }
    blocks
}

/// S3-shaped: a node behind by one block asks for exactly the missing
/// suffix and receives it.
#[tokio::test]
async fn behind_peer_requests_and_receives_the_missing_suffix() {
    let (mut ahead, mut behind) = tokio::io::duplex(64 * 1024);
    let ahead_chain = chain(3); // heights 0,1,2
    let ahead_head = ahead_chain.last().unwrap();

    let ahead_side = tokio::spawn({
        let ahead_head_hash = ahead_head.hash;
        let ahead_head_index = ahead_head.index;
        let reply_chain = ahead_chain.clone();
        async move {
            handshake(&mut ahead, &"ahead".to_string(), ahead_head_index, ahead_head_hash)
                .await
                .unwrap();
            match framing::read_message(&mut ahead).await.unwrap() {
                Message::GetChain { from_index, limit } => {
                    let slice: Vec<Block> = reply_chain
                        .into_iter()
                        .skip(from_index as usize)
                        .take(limit as usize)
                        .collect();
                    framing::write_message(&mut ahead, &Message::Chain(slice))
                        .await
                        .unwrap();
                }
                other => panic!("expected GET_CHAIN, got {}", other.kind()),
            }
        }
    });

    let (_, ahead_head_index, ahead_head_hash) =
        handshake(&mut behind, &"behind".to_string(), 1, Hash256::zero())
            .await
            .unwrap();

    let from_index = backtrack_from_index(ahead_head_index, 0);
    framing::write_message(
        &mut behind,
        &Message::GetChain {
            from_index,
            limit: (ahead_head_index - from_index + 1) as u32,
        },
    )
    .await
    .unwrap();

    let received = match framing::read_message(&mut behind).await.unwrap() {
        Message::Chain(blocks) => blocks,
        other => panic!("expected CHAIN, got {}", other.kind()),
    };

    ahead_side.await.unwrap();
    assert_eq!(received.len(), (ahead_head_index - from_index + 1) as usize);
    assert_eq!(received.last().unwrap().hash, ahead_head_hash);
}

/// S4-shaped: when the behind side's first guess doesn't reach far enough
/// back (its stored suffix is shorter than the peer's fork depth), a second
/// attempt widens the window per `backtrack_from_index`'s geometric growth.
#[tokio::test]
async fn repeated_misses_widen_the_backtrack_window() {
    let head = 1_000u64;
    let first = backtrack_from_index(head, 0);
    let second = backtrack_from_index(head, 1);
    let third = backtrack_from_index(head, 2);
    assert!(second < first);
    assert!(third < second);
}
