use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("corrupt log record at offset {0}")]
    CorruptRecord(u64),
}

pub type Result<T> = std::result::Result<T, StorageError>;
