use crate::error::Result;
use async_trait::async_trait;
use node_core::{Block, BlockHeight};
use node_crypto::Hash256;
use tokio::sync::Mutex;

/// Persists the chain independently of the in-memory `Ledger` (spec.md §6:
/// the ledger's chain is authoritative state, and a node restart must be
/// able to rebuild it). Mirrors the teacher's `Storage` trait shape, with
/// `truncate_to` added so a `try_reorg` rollback can be persisted too.
#[async_trait]
pub trait ChainStore: Send + Sync {
    async fn append_block(&self, block: &Block) -> Result<()>;
    async fn get_block_by_height(&self, height: BlockHeight) -> Result<Option<Block>>;
    async fn get_block_by_hash(&self, hash: &Hash256) -> Result<Option<Block>>;
    async fn latest_block(&self) -> Result<Option<Block>>;
    async fn truncate_to(&self, height: BlockHeight) -> Result<()>;
    async fn len(&self) -> Result<BlockHeight>;
}

/// A `ChainStore` that keeps blocks only in memory; useful for tests and
/// for a node explicitly configured without persistence.
#[derive(Default)]
pub struct InMemoryChainStore {
    blocks: Mutex<Vec<Block>>,
}

impl InMemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChainStore for InMemoryChainStore {
    async fn append_block(&self, block: &Block) -> Result<()> {
        self.blocks.lock().await.push(block.clone());
        Ok(())
    }

    async fn get_block_by_height(&self, height: BlockHeight) -> Result<Option<Block>> {
        Ok(self
            .blocks
            .lock()
            .await
            .iter()
            .find(|b| b.index == height)
            .cloned())
    }

    async fn get_block_by_hash(&self, hash: &Hash256) -> Result<Option<Block>> {
        Ok(self
            .blocks
            .lock()
            .await
            .iter()
            .find(|b| b.hash == *hash)
            .cloned())
    }

    async fn latest_block(&self) -> Result<Option<Block>> {
        Ok(self.blocks.lock().await.last().cloned())
    }

    async fn truncate_to(&self, height: BlockHeight) -> Result<()> {
        self.blocks.lock().await.retain(|b| b.index < height);
        Ok(())
    }

    async fn len(&self) -> Result<BlockHeight> {
        Ok(self.blocks.lock().await.len() as BlockHeight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_crypto::{Address, Hash256 as CryptoHash};

    fn block(index: BlockHeight, hash_byte: u8) -> Block {
        let mut b = Block::assemble(index, CryptoHash::zero(), vec![], 1, Address::stake_registry());
        b.hash = {
            let mut bytes = [0u8; 32];
            bytes[0] = hash_byte;
            CryptoHash::from_bytes(bytes)
        };
        b
    }

    #[tokio::test]
    async fn appended_blocks_are_queryable_by_height_and_hash() {
        let store = InMemoryChainStore::new();
        store.append_block(&block(0, 1)).await.unwrap();
        store.append_block(&block(1, 2)).await.unwrap();

        assert_eq!(store.get_block_by_height(1).await.unwrap().unwrap().index, 1);
        let by_hash = store
            .get_block_by_hash(&block(1, 2).hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_hash.index, 1);
        assert_eq!(store.latest_block().await.unwrap().unwrap().index, 1);
    }

    #[tokio::test]
    async fn truncate_drops_blocks_at_or_above_height() {
        let store = InMemoryChainStore::new();
        for i in 0..5 {
            store.append_block(&block(i, i as u8 + 1)).await.unwrap();
        }
        store.truncate_to(2).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
        assert!(store.get_block_by_height(2).await.unwrap().is_none());
    }
}
