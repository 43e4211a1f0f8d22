pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: u32 = 3;
pub const GENESIS_TRANSACTIONS: &str = "Genesis Block";
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const TRANSFER_ARROW: &str = " -> ";
pub const AMOUNT_MARKER: &str = ": Rp";
