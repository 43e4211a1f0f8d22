use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::constants::HASH_HEX_SIZE;
use crate::error::{LedgerError, Result};
use crate::hasher;

/// Persisted shape of a block. Field names and order are the on-disk
/// compatibility contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub transactions: String,
    pub timestamp: f64,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
}

/// Read-only display shape: same fields, timestamp rendered in local time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockView {
    pub index: u64,
    pub transactions: String,
    pub timestamp: String,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
}

/// A sealed, hash-linked ledger entry.
///
/// Blocks built with [`Block::new`] are mined on construction. Blocks
/// rebuilt with [`Block::from_record`] trust the persisted nonce and hash;
/// their integrity is checked later by the ledger's validation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    index: u64,
    transactions: String,
    timestamp: f64,
    previous_hash: String,
    difficulty: u32,
    nonce: u64,
    hash: String,
}

impl Block {
    /// Builds and seals a block. The nonce search has no upper bound; only a
    /// difficulty wider than the digest itself is refused.
    pub fn new(
        index: u64,
        transactions: impl Into<String>,
        timestamp: f64,
        previous_hash: impl Into<String>,
        difficulty: u32,
    ) -> Result<Self> {
        if difficulty as usize > HASH_HEX_SIZE {
            return Err(LedgerError::DifficultyOutOfRange(difficulty));
        }

        let transactions = transactions.into();
        let previous_hash = previous_hash.into();
        let (nonce, hash) = pow::mine(index, &transactions, timestamp, &previous_hash, difficulty);

        info!(
            "Mined block {} with nonce {} and hash {}",
            index, nonce, hash
        );

        Ok(Self {
            index,
            transactions,
            timestamp,
            previous_hash,
            difficulty,
            nonce,
            hash,
        })
    }

    pub fn from_record(record: BlockRecord) -> Self {
        Self {
            index: record.index,
            transactions: record.transactions,
            timestamp: record.timestamp,
            previous_hash: record.previous_hash,
            difficulty: record.difficulty,
            nonce: record.nonce,
            hash: record.hash,
        }
    }

    /// Re-derives the digest from the current fields, ignoring the stored hash.
    pub fn compute_hash(&self) -> String {
        hasher::digest(
            self.index,
            &self.transactions,
            self.timestamp,
            &self.previous_hash,
            self.nonce,
        )
    }

    pub fn meets_difficulty(&self) -> bool {
        pow::meets_difficulty(&self.hash, self.difficulty)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transactions(&self) -> &str {
        &self.transactions
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn record(&self) -> BlockRecord {
        BlockRecord {
            index: self.index,
            transactions: self.transactions.clone(),
            timestamp: self.timestamp,
            previous_hash: self.previous_hash.clone(),
            hash: self.hash.clone(),
            nonce: self.nonce,
            difficulty: self.difficulty,
        }
    }

    pub fn view(&self) -> BlockView {
        BlockView {
            index: self.index,
            transactions: self.transactions.clone(),
            timestamp: render_local_time(self.timestamp),
            previous_hash: self.previous_hash.clone(),
            hash: self.hash.clone(),
            nonce: self.nonce,
            difficulty: self.difficulty,
        }
    }
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        Self::from_record(record)
    }
}

pub mod pow {
    use crate::hasher;

    /// Searches nonces upward from 0 and returns the first one whose digest
    /// starts with `difficulty` hex zeros, together with that digest.
    pub fn mine(
        index: u64,
        transactions: &str,
        timestamp: f64,
        previous_hash: &str,
        difficulty: u32,
    ) -> (u64, String) {
        let mut nonce = 0u64;
        loop {
            let hash = hasher::digest(index, transactions, timestamp, previous_hash, nonce);
            if meets_difficulty(&hash, difficulty) {
                return (nonce, hash);
            }
            nonce += 1;
        }
    }

    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        count_leading_zero_digits(hash) >= difficulty as usize
    }

    pub fn count_leading_zero_digits(hash: &str) -> usize {
        hash.bytes().take_while(|b| *b == b'0').count()
    }
}

/// Seconds since the Unix epoch with sub-second precision.
pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// `Mon Oct 19 14:03:09 2026` style rendering in the local timezone.
pub fn render_local_time(seconds: f64) -> String {
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    match Local.timestamp_opt(whole as i64, nanos.min(999_999_999)).earliest() {
        Some(t) => t.format("%a %b %e %H:%M:%S %Y").to_string(),
        None => hasher::canonical_seconds(seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mined_block_matches_known_vector() {
        let block = Block::new(1, "Alice -> Bob: Rp100", 1_700_000_000.5, "000abc", 3).unwrap();
        assert_eq!(block.nonce(), 2248);
        assert_eq!(
            block.hash(),
            "0007e20e7cfddfa827d31839c4a41339277e112dd26c045fb755d0f73f8614b4"
        );
    }

    #[test]
    fn mined_block_hash_is_its_digest_and_meets_difficulty() {
        let block = Block::new(4, "Bob -> Carol: Rp40", 1_650_000_000.25, "00ff", 2).unwrap();
        assert_eq!(block.hash(), block.compute_hash());
        assert_eq!(
            block.hash(),
            hasher::digest(4, "Bob -> Carol: Rp40", 1_650_000_000.25, "00ff", block.nonce())
        );
        assert!(block.hash().starts_with("00"));
        assert!(block.meets_difficulty());
    }

    #[test]
    fn mined_nonce_is_minimal() {
        let block = Block::new(0, "Genesis Block", 1_700_000_000.0, "0", 2).unwrap();
        assert_eq!(block.nonce(), 48);
        for nonce in 0..block.nonce() {
            let candidate = hasher::digest(0, "Genesis Block", 1_700_000_000.0, "0", nonce);
            assert!(!pow::meets_difficulty(&candidate, 2), "nonce {nonce} also qualifies");
        }
    }

    #[test]
    fn zero_difficulty_accepts_first_nonce() {
        let block = Block::new(9, "anything", 1.0, "prev", 0).unwrap();
        assert_eq!(block.nonce(), 0);
        assert!(block.meets_difficulty());
    }

    #[test]
    fn difficulty_wider_than_digest_is_rejected() {
        let err = Block::new(1, "tx", 1.0, "0", 65).unwrap_err();
        assert!(matches!(err, LedgerError::DifficultyOutOfRange(65)));
    }

    #[test]
    fn from_record_trusts_persisted_nonce_and_hash() {
        let record = BlockRecord {
            index: 3,
            transactions: "Alice -> Bob: Rp1".into(),
            timestamp: 1_600_000_000.75,
            previous_hash: "000aaa".into(),
            hash: "not-a-real-hash".into(),
            nonce: 5,
            difficulty: 3,
        };
        let block = Block::from_record(record.clone());
        assert_eq!(block.nonce(), 5);
        assert_eq!(block.hash(), "not-a-real-hash");
        assert_ne!(block.compute_hash(), block.hash());
        assert!(!block.meets_difficulty());
        assert_eq!(block.record(), record);
    }

    #[test]
    fn record_serializes_fields_in_contract_order() {
        let record = BlockRecord {
            index: 1,
            transactions: "t".into(),
            timestamp: 2.5,
            previous_hash: "p".into(),
            hash: "h".into(),
            nonce: 3,
            difficulty: 1,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"index":1,"transactions":"t","timestamp":2.5,"previous_hash":"p","hash":"h","nonce":3,"difficulty":1}"#
        );
    }

    #[test]
    fn view_renders_timestamp_as_text() {
        let block = Block::new(2, "x", 1_700_000_000.9, "0", 1).unwrap();
        let view = block.view();
        assert_eq!(view.timestamp, render_local_time(1_700_000_000.9));
        assert_eq!(view.hash, block.hash());
        assert_eq!(view.index, 2);
        // "Www Mmm dd hh:mm:ss yyyy"
        assert_eq!(view.timestamp.len(), 24);
        assert!(view.timestamp.ends_with("2023"));
    }

    #[test]
    fn leading_zero_digit_examples() {
        assert_eq!(pow::count_leading_zero_digits("000a"), 3);
        assert_eq!(pow::count_leading_zero_digits("a000"), 0);
        assert!(pow::meets_difficulty("00ab", 2));
        assert!(!pow::meets_difficulty("0ab", 2));
        assert!(!pow::meets_difficulty("0", 2));
    }
}
