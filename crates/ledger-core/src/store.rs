use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

use crate::block::{Block, BlockRecord};
use crate::error::StoreError;

/// Durable home of the ordered block sequence.
/// This lives in `ledger-core` so storage backends can depend on the core
/// without a cycle.
pub trait ChainStore: Send + Sync {
    /// Reads the whole chain back. `Ok(None)` means nothing has been stored yet.
    fn try_load(&self) -> Result<Option<Vec<Block>>, StoreError>;

    /// Replaces whatever was stored with `blocks`.
    fn save(&self, blocks: &[Block]) -> Result<(), StoreError>;

    /// Human-readable location for diagnostics.
    fn describe(&self) -> String;

    /// Fail-soft load: an absent or unreadable store yields an empty chain.
    /// Unreadable history is discarded, so it is reported at `error` level.
    fn load(&self) -> Vec<Block> {
        match self.try_load() {
            Ok(Some(blocks)) => {
                info!("loaded {} blocks from {}", blocks.len(), self.describe());
                blocks
            }
            Ok(None) => {
                info!("no chain stored at {} yet", self.describe());
                Vec::new()
            }
            Err(err) => {
                error!(
                    "failed to load chain from {}, starting from an empty chain: {}",
                    self.describe(),
                    err
                );
                Vec::new()
            }
        }
    }
}

impl<S: ChainStore + ?Sized> ChainStore for Box<S> {
    fn try_load(&self) -> Result<Option<Vec<Block>>, StoreError> {
        (**self).try_load()
    }

    fn save(&self, blocks: &[Block]) -> Result<(), StoreError> {
        (**self).save(blocks)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Process-local store holding persisted records, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Option<Vec<BlockRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<BlockRecord>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
        }
    }

    /// Snapshot of what was last saved.
    ///
    /// The guarded value is replaced whole on every save, so a lock
    /// poisoned by a panicking holder still holds a complete snapshot.
    pub fn records(&self) -> Option<Vec<BlockRecord>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ChainStore for MemoryStore {
    fn try_load(&self) -> Result<Option<Vec<Block>>, StoreError> {
        Ok(self
            .records()
            .map(|records| records.into_iter().map(Block::from_record).collect()))
    }

    fn save(&self, blocks: &[Block]) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        *records = Some(blocks.iter().map(Block::record).collect());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
