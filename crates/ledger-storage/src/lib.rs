//! Durable [`ChainStore`](ledger_core::ChainStore) backends.

pub mod json_store;
pub mod sled_store;

pub use json_store::JsonFileStore;
pub use sled_store::SledStore;
