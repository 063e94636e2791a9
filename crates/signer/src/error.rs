use ethers::types::{Address, U256, U64};
use thiserror::Error;

/// Errors produced on the dispatch and reconciliation path
///
/// Nothing here is retried internally. Resubmitting an already-included
/// operation is safe (the entry point rejects the duplicate nonce), but
/// retrying after an ambiguous timeout requires fresh nonce and state
/// knowledge, so retry is a caller-level policy decision.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Inputs could not be turned into a valid user operation. Fatal.
    #[error("encoding error: {inner}")]
    Encoding {
        /// The inner error message
        inner: String,
    },

    /// The entry point reverted the operation. The revert reason is surfaced
    /// unchanged; usually a logic, nonce, or signature bug, so not retried.
    #[error("entry point rejected user operation (sender: {sender:?}, nonce: {nonce}): {reason}")]
    ChainRejected {
        /// Smart account the operation acted for
        sender: Address,
        /// Nonce the operation carried
        nonce: U256,
        /// Revert reason exactly as the entry point reported it
        reason: String,
    },

    /// The remote relay could not be reached. Retryable by the caller with backoff.
    #[error("relay unavailable: {inner}")]
    RelayUnavailable {
        /// The inner error message
        inner: String,
    },

    /// The remote relay accepted the connection but declined the request.
    /// A configuration issue (e.g. unsupported entry point); fatal.
    #[error("relay rejected request: {inner}")]
    RelayRejected {
        /// The inner error message
        inner: String,
    },

    /// No completion event for the operation inside the search window.
    /// The on-chain state is otherwise valid; reported, not fatal.
    #[error("no completion event for sender {sender:?} with nonce {nonce} at block {block}")]
    ReconciliationIncomplete {
        /// Smart account the operation acted for
        sender: Address,
        /// Nonce the operation carried
        nonce: U256,
        /// Confirming block the search started at
        block: U64,
    },

    /// Ethereum client failure outside the entry point itself
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },
}

impl SignerError {
    pub(crate) fn provider<E: std::fmt::Display>(err: E) -> Self {
        Self::Provider { inner: err.to_string() }
    }
}
