//! Account abstraction (ERC-4337) smart contract interfaces
//!
//! Typed client-side views of the on-chain collaborators: the entry point,
//! the account factory, the paymaster, and the ERC-20 reference asset.

pub mod entry_point;
mod error;
mod factory;
pub mod gen;
mod paymaster;

pub use entry_point::EntryPoint;
pub use error::{decode_revert_error, decode_revert_string, EntryPointError};
pub use factory::AccountFactory;
pub use gen::{
    entry_point_api, simple_account_api, AccountFactoryAPI, EntryPointAPI, FailedOp, PaymasterAPI,
    SimpleAccountAPI, UserOperationEventFilter, ERC20API,
};
pub use paymaster::Paymaster;
