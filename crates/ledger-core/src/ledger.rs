use thiserror::Error;
use tracing::info;

use crate::balances::{self, Balances};
use crate::block::{now_seconds, Block, BlockView};
use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_TRANSACTIONS, HASH_HEX_SIZE};
use crate::error::{LedgerError, Result};
use crate::store::ChainStore;

/// First place where the chain stops being self-consistent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("block {index} does not hash to its stored hash")]
    HashMismatch { index: u64 },
    #[error("block {index} does not reference the hash of the block before it")]
    BrokenLink { index: u64 },
}

/// The authoritative in-process chain.
///
/// Not internally synchronized: callers serving concurrent requests must
/// wrap the ledger in a mutex so that "read tip, mine, persist" runs as one
/// step. Every append rewrites the whole chain in the store.
pub struct Ledger<S: ChainStore> {
    store: S,
    chain: Vec<Block>,
    difficulty: u32,
}

impl<S: ChainStore> Ledger<S> {
    /// Loads the stored chain, minting and persisting a genesis block when
    /// the store is empty, absent or unreadable.
    pub fn open(store: S, difficulty: u32) -> Result<Self> {
        if difficulty as usize > HASH_HEX_SIZE {
            return Err(LedgerError::DifficultyOutOfRange(difficulty));
        }

        let chain = store.load();
        let mut ledger = Self {
            store,
            chain,
            difficulty,
        };

        if ledger.chain.is_empty() {
            let genesis = Block::new(
                0,
                GENESIS_TRANSACTIONS,
                now_seconds(),
                GENESIS_PREVIOUS_HASH,
                difficulty,
            )?;
            info!("created genesis block {}", genesis.hash());
            ledger.chain.push(genesis);
            ledger.store.save(&ledger.chain)?;
        }

        Ok(ledger)
    }

    /// Mines a block carrying `transactions` on top of the tip and persists
    /// the chain. The text is not inspected here. If persisting fails the
    /// block is dropped again and the error is returned.
    pub fn append(&mut self, transactions: impl Into<String>) -> Result<&Block> {
        let last = self.last();
        let block = Block::new(
            last.index() + 1,
            transactions,
            now_seconds(),
            last.hash(),
            self.difficulty,
        )?;

        self.chain.push(block);
        if let Err(err) = self.store.save(&self.chain) {
            self.chain.pop();
            return Err(err.into());
        }

        let tip = self.last();
        info!(
            "appended block {} to {} ({} blocks)",
            tip.index(),
            self.store.describe(),
            self.chain.len()
        );
        Ok(tip)
    }

    /// Checks every block after genesis against its own contents and its
    /// predecessor's hash.
    pub fn verify(&self) -> std::result::Result<(), IntegrityViolation> {
        for pair in self.chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.hash() != current.compute_hash() {
                return Err(IntegrityViolation::HashMismatch {
                    index: current.index(),
                });
            }
            if current.previous_hash() != previous.hash() {
                return Err(IntegrityViolation::BrokenLink {
                    index: current.index(),
                });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }

    pub fn get_chain(&self) -> Vec<BlockView> {
        self.chain.iter().map(Block::view).collect()
    }

    pub fn calculate_balances(&self) -> Balances {
        balances::calculate_balances(&self.chain)
    }

    pub fn balance_of(&self, party: &str) -> i128 {
        self.calculate_balances().get(party).copied().unwrap_or(0)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn last(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
