use ledger_core::{Block, BlockRecord, ChainStore, StoreError};
use sled::{Batch, Db, IVec, Tree};
use std::path::{Path, PathBuf};
use tracing::info;

const TREE_BLOCKS: &str = "blocks";

fn backend(err: impl std::fmt::Display) -> StoreError {
  StoreError::Backend(err.to_string())
}

/// Embedded key-value backend: one `blocks` tree keyed by big-endian index,
/// values are bincode-encoded block records.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  path: PathBuf,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
    let db = sled::open(path.as_ref()).map_err(backend)?;
    info!("sled store opened at {}", path.as_ref().display());
    Ok(Self {
      db,
      path: path.as_ref().to_path_buf(),
    })
  }

  fn blocks(&self) -> Result<Tree, StoreError> {
    self.db.open_tree(TREE_BLOCKS).map_err(backend)
  }

  /// Flushes pending writes to disk.
  pub fn close(&self) -> Result<(), StoreError> {
    self.db.flush().map(|_| ()).map_err(backend)
  }
}

impl ChainStore for SledStore {
  fn try_load(&self) -> Result<Option<Vec<Block>>, StoreError> {
    let tree = self.blocks()?;
    if tree.is_empty() {
      return Ok(None);
    }

    let mut blocks = Vec::with_capacity(tree.len());
    for entry in tree.iter() {
      let (_key, value): (IVec, IVec) = entry.map_err(backend)?;
      let record: BlockRecord = bincode::deserialize(&value).map_err(backend)?;
      blocks.push(Block::from_record(record));
    }
    Ok(Some(blocks))
  }

  fn save(&self, blocks: &[Block]) -> Result<(), StoreError> {
    let tree = self.blocks()?;
    let mut batch = Batch::default();

    for block in blocks {
      let bytes = bincode::serialize(&block.record()).map_err(backend)?;
      batch.insert(block.index().to_be_bytes().to_vec(), bytes);
    }

    // drop keys no longer part of the chain
    let kept: std::collections::HashSet<[u8; 8]> =
      blocks.iter().map(|b| b.index().to_be_bytes()).collect();
    for key in tree.iter().keys() {
      let key = key.map_err(backend)?;
      if key.len() != 8 || !kept.contains(key.as_ref()) {
        batch.remove(key);
      }
    }

    tree.apply_batch(batch).map_err(backend)?;
    self.db.flush().map_err(backend)?;

    info!("saved {} blocks to {}", blocks.len(), self.path.display());
    Ok(())
  }

  fn describe(&self) -> String {
    format!("sled:{}", self.path.display())
  }
}
