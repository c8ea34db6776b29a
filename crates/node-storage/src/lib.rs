pub mod chain_store;
pub mod error;
pub mod file_store;
pub mod snapshot;

pub use chain_store::{ChainStore, InMemoryChainStore};
pub use error::StorageError;
pub use file_store::FileChainStore;
pub type Result<T> = error::Result<T>;
