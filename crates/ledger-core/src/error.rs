use thiserror::Error;

use crate::constants::HASH_HEX_SIZE;

/// Failures of a [`ChainStore`](crate::store::ChainStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chain store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("chain store holds malformed data: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("chain store backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("difficulty {0} cannot be met by a {max}-digit hex digest", max = HASH_HEX_SIZE)]
    DifficultyOutOfRange(u32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
