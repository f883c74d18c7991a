//! Pure construction of transaction requests.
//!
//! [`build`] turns a message kind, its payload record and the caller's
//! transfer fields into one canonical [`TransactionRequest`]. It performs no
//! I/O, so identical inputs always produce structurally equal requests.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;
use crate::error::SentinelError;
use crate::messages::{MessageKind, MessageParams};

/// Longest memo the chain accepts, in bytes.
pub const MAX_MEMO_LEN: usize = 128;

/// Caller-supplied fields that sit next to the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFields {
    pub recipient: Option<Address>,
    pub memo: Option<String>,
    pub amount: Option<Amount>,
}

impl TransferFields {
    pub fn with_memo(memo: impl Into<String>) -> Self {
        Self {
            memo: Some(memo.into()),
            ..Self::default()
        }
    }
}

/// The canonical, validated record that gets signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub kind: MessageKind,
    pub amount: Option<Amount>,
    pub recipient: Option<Address>,
    pub memo: Option<String>,
    pub message: MessageParams,
}

/// Builds a transaction request for `kind` from its payload record.
///
/// - `params` must be the payload variant of `kind`.
/// - Fund-moving kinds take their amount from the payload coins; an explicit
///   `transfer.amount` must agree with them.
/// - Without an explicit recipient, kinds whose payload names a payee send to
///   that payee.
pub fn build(
    kind: MessageKind,
    params: MessageParams,
    transfer: TransferFields,
) -> Result<TransactionRequest, SentinelError> {
    if params.kind() != kind {
        return Err(SentinelError::validation(format!(
            "{kind:?} request given {:?} parameters",
            params.kind()
        )));
    }

    let message = params.into_canonical()?;

    let memo = match transfer.memo {
        Some(memo) if memo.len() > MAX_MEMO_LEN => {
            return Err(SentinelError::validation(format!(
                "memo is {} bytes, limit is {MAX_MEMO_LEN}",
                memo.len()
            )));
        }
        Some(memo) if memo.is_empty() => None,
        other => other,
    };

    if let Some(amount) = &transfer.amount {
        amount.validate()?;
    }

    let amount = match (message.coins(), transfer.amount) {
        (Some(coins), Some(explicit)) if *coins != explicit => {
            return Err(SentinelError::validation(format!(
                "amount {explicit} disagrees with {kind:?} coins {coins}"
            )));
        }
        (Some(coins), _) => Some(coins.clone()),
        (None, explicit) => explicit,
    };

    let recipient = transfer.recipient.or_else(|| message.payee());

    Ok(TransactionRequest {
        kind,
        amount,
        recipient,
        memo,
        message,
    })
}

/// Builds a request from an untyped kind code and JSON payload, e.g. form input.
pub fn build_from_json(
    kind_code: u32,
    params: serde_json::Value,
    transfer: TransferFields,
) -> Result<TransactionRequest, SentinelError> {
    let kind = MessageKind::from_code(kind_code)?;
    let params = MessageParams::from_json(kind, params)?;
    build(kind, params, transfer)
}
