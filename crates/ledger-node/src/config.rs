use clap::{Parser, ValueEnum};
use ledger_core::constants::{DEFAULT_DIFFICULTY, HASH_HEX_SIZE};
use ledger_core::ChainStore;
use ledger_storage::{JsonFileStore, SledStore};
use std::{net::SocketAddr, path::PathBuf};

use crate::constants::{DEFAULT_DATA_FILE, DEFAULT_LISTEN, DEFAULT_SYSTEM_ACCOUNT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Single JSON file, readable by older deployments
    Json,
    /// sled database directory
    Sled,
}

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "HTTP front for the proof-of-work transfer ledger")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, env = "LEDGER_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Chain file (json) or database directory (sled)
    #[arg(long, env = "LEDGER_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Storage backend
    #[arg(long, env = "LEDGER_STORE", value_enum, default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// Leading zero hex digits required of every new block hash
    #[arg(
        long,
        env = "LEDGER_DIFFICULTY",
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = clap::value_parser!(u32).range(1..=HASH_HEX_SIZE as i64)
    )]
    pub difficulty: u32,

    /// Account named as sender of top-ups
    #[arg(long, env = "LEDGER_SYSTEM_ACCOUNT", default_value = DEFAULT_SYSTEM_ACCOUNT)]
    pub system_account: String,
}

impl Args {
    pub fn open_store(&self) -> anyhow::Result<Box<dyn ChainStore>> {
        Ok(match self.store {
            StoreKind::Json => Box::new(JsonFileStore::new(&self.data_file)),
            StoreKind::Sled => Box::new(SledStore::open(&self.data_file)?),
        })
    }
}
