//! Core of a single-node, append-only transfer ledger: proof-of-work sealed
//! blocks, chain verification and balance replay over free-text transfers.

pub mod balances;
pub mod block;
pub mod constants;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod store;
pub mod tx;

pub use balances::{calculate_balances, Balances};
pub use block::{pow, Block, BlockRecord, BlockView};
pub use error::{LedgerError, StoreError};
pub use ledger::{IntegrityViolation, Ledger};
pub use store::{ChainStore, MemoryStore};
pub use tx::{Transfer, TxParseError};
