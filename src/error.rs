use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend's total capacity would be exceeded by the write.
    #[error("storage quota exceeded: {used} of {limit} bytes")]
    QuotaExceeded { used: usize, limit: usize },

    /// A single entry is larger than the backend allows.
    #[error("entry too large for storage: {size} bytes (limit {limit})")]
    EntryTooLarge { size: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
