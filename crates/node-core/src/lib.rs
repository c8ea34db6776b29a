pub mod block;
pub mod contract;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod mempool;
pub mod transaction;
pub mod types;

pub use block::Block;
pub use error::{Error, ErrorKind};
pub use ledger::{AppendOutcome, Ledger, LedgerConfig, ReorgOutcome, SubmitOutcome};
pub use mempool::Mempool;
pub use transaction::{Transaction, TxId, TxVariant};
pub use types::{BlockHeight, ConsensusTag, Timestamp};

pub type Result<T> = std::result::Result<T, Error>;
