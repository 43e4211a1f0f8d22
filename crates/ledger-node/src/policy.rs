//! Admission rules applied before anything is appended to the ledger.
//! The ledger itself accepts any text; these checks are the node's job.

use ledger_core::{tx, Balances, Transfer, TxParseError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("malformed transfer, expected \"A -> B: Rp10000\": {0}")]
    Malformed(#[from] TxParseError),
    #[error("amount must be greater than 0")]
    NonPositiveAmount,
    #[error("insufficient balance: {party} only has Rp{balance}")]
    InsufficientBalance { party: String, balance: i128 },
    #[error("account name {0:?} cannot be used in a transfer")]
    InvalidAccount(String),
}

/// Accepts `text` as a spend when it parses, moves a positive amount and
/// the sender can cover it.
pub fn check_spend(balances: &Balances, text: &str) -> Result<Transfer, Rejection> {
    let transfer = tx::parse(text)?;
    if transfer.amount == 0 {
        return Err(Rejection::NonPositiveAmount);
    }

    let balance = balances.get(&transfer.sender).copied().unwrap_or(0);
    if balance < i128::from(transfer.amount) {
        return Err(Rejection::InsufficientBalance {
            party: transfer.sender,
            balance,
        });
    }
    Ok(transfer)
}

/// Builds a top-up funded by `system_account`. The rendered transfer must
/// parse back to itself so the balance replay credits exactly `account`.
pub fn top_up(system_account: &str, account: &str, amount: u64) -> Result<Transfer, Rejection> {
    if amount == 0 {
        return Err(Rejection::NonPositiveAmount);
    }
    tx::check_receiver(account)?;
    if account.trim() != account {
        return Err(Rejection::InvalidAccount(account.to_string()));
    }

    let transfer = Transfer {
        sender: system_account.to_string(),
        receiver: account.to_string(),
        amount,
    };
    let reparsed = tx::parse(&transfer.to_string())?;
    if reparsed != transfer {
        return Err(Rejection::InvalidAccount(account.to_string()));
    }
    Ok(transfer)
}
