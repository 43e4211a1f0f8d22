//! Grammar of a transfer line: `<sender> -> <receiver>: Rp<amount>`.
//!
//! Both the append-path validation in the node and the balance replay use
//! [`parse`], so the two can never disagree about what a transfer is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{AMOUNT_MARKER, TRANSFER_ARROW};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TxParseError {
    /// The text lacks `" -> "` or `": Rp"`; it is not meant as a transfer.
    #[error("not a transfer: expected \"<sender> -> <receiver>: Rp<amount>\"")]
    NotATransfer,
    #[error("transfer has an empty sender")]
    EmptySender,
    #[error("transfer has an empty receiver")]
    EmptyReceiver,
    /// The receiver contains `" -> "` or `':'`, so the text names more
    /// than one hop or a mangled amount.
    #[error("receiver {0:?} cannot contain \" -> \" or ':'")]
    AmbiguousReceiver(String),
    #[error("amount {0:?} is not a whole number of rupiah")]
    InvalidAmount(String),
    #[error("amount {0} is too large")]
    AmountTooLarge(String),
}

impl TxParseError {
    /// True when the text partially matched the grammar and is worth a diagnostic.
    pub fn is_partial_match(&self) -> bool {
        !matches!(self, TxParseError::NotATransfer)
    }
}

pub fn parse(text: &str) -> Result<Transfer, TxParseError> {
    let (sender, rest) = text
        .split_once(TRANSFER_ARROW)
        .ok_or(TxParseError::NotATransfer)?;
    let (receiver, amount) = rest
        .split_once(AMOUNT_MARKER)
        .ok_or(TxParseError::NotATransfer)?;

    if sender.trim().is_empty() {
        return Err(TxParseError::EmptySender);
    }
    let receiver = receiver.trim();
    check_receiver(receiver)?;

    let amount = amount.trim();
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TxParseError::InvalidAmount(amount.to_string()));
    }
    let amount = amount
        .parse::<u64>()
        .ok()
        .filter(|a| i64::try_from(*a).is_ok())
        .ok_or_else(|| TxParseError::AmountTooLarge(amount.to_string()))?;

    Ok(Transfer {
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        amount,
    })
}

/// Rule a receiver name must satisfy for a transfer naming it to parse.
pub fn check_receiver(name: &str) -> Result<(), TxParseError> {
    if name.trim().is_empty() {
        return Err(TxParseError::EmptyReceiver);
    }
    if name.contains(TRANSFER_ARROW) || name.contains(':') {
        return Err(TxParseError::AmbiguousReceiver(name.to_string()));
    }
    Ok(())
}

impl FromStr for Transfer {
    type Err = TxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{TRANSFER_ARROW}{}{AMOUNT_MARKER}{}",
            self.sender, self.receiver, self.amount
        )
    }
}
