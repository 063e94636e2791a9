//! Client-side account abstraction (ERC-4337) dispatch
//!
//! This crate contains the operation dispatch core: the [AaSigner] facade
//! that turns an intent to act as a smart account into a signed user
//! operation, the two interchangeable transports that deliver it
//! ([LocalSubmitter] straight into the entry point, [RemoteSubmitter]
//! through a relay), and the [Reconciler] that afterwards cross-checks what
//! the account paid against what the entry point reported.

mod config;
mod error;
mod local;
mod reconcile;
mod remote;
mod signer;
mod transport;

pub use config::SessionConfig;
pub use error::SignerError;
pub use local::LocalSubmitter;
pub use reconcile::{reconcile_amounts, Reconciler, Reconciliation, SpendAsset};
pub use remote::{RelayApiClient, RemoteSubmitter};
pub use signer::{AaSigner, Execution, GasConfig};
pub use transport::{select_transport, SendUserOp, SubmissionReceipt};
