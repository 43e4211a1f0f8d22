use std::collections::BTreeMap;
use tracing::warn;

use crate::block::Block;
use crate::tx;

/// Party name to signed balance, derived by replaying the chain.
/// Every amount fits in `i64`, so `i128` totals cannot overflow on any
/// chain that fits in memory.
pub type Balances = BTreeMap<String, i128>;

/// Replays every block's transfer text. Text that is not a transfer is
/// skipped silently; text that only partially matches is logged and skipped.
pub fn calculate_balances(blocks: &[Block]) -> Balances {
    let mut balances = Balances::new();
    for block in blocks {
        let transfer = match tx::parse(block.transactions()) {
            Ok(transfer) => transfer,
            Err(err) => {
                if err.is_partial_match() {
                    warn!(
                        index = block.index(),
                        "skipping transaction {:?}: {}",
                        block.transactions(),
                        err
                    );
                }
                continue;
            }
        };

        let amount = i128::from(transfer.amount);
        *balances.entry(transfer.sender).or_insert(0) -= amount;
        *balances.entry(transfer.receiver).or_insert(0) += amount;
    }
    balances
}
