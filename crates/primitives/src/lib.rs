//! Account abstraction (ERC-4337) client primitive types
//!
//! This crate contains the primitive types used when acting as a smart
//! account: the user operation record and its canonical hash, the account
//! identity with its deterministic address derivation, and the owner wallet
//! that signs operation hashes.

pub mod account;
pub mod constants;
mod user_operation;
mod utils;
mod wallet;

pub use account::{AccountDeriver, AccountId};
pub use user_operation::{UserOperation, UserOperationHash, UserOperationReceipt};
pub use utils::get_address;
pub use wallet::Wallet;
