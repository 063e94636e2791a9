use crate::{error::EntryPointError, gen::AccountFactoryAPI};
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;

use crate::gen::account_factory_api::CreateAccountCall;

/// Client-side view of the account factory that deploys smart accounts
/// deterministically from (owner, index)
#[derive(Clone)]
pub struct AccountFactory<M: Middleware + 'static> {
    address: Address,
    api: AccountFactoryAPI<M>,
}

impl<M: Middleware + 'static> AccountFactory<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let api = AccountFactoryAPI::new(address, eth_client);
        Self { address, api }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Deterministic address derivation query served by the factory itself
    pub async fn get_address(&self, owner: Address, index: U256) -> Result<Address, EntryPointError> {
        self.api
            .get_address(owner, index)
            .call()
            .await
            .map_err(|e| EntryPointError::Other { inner: format!("get address error: {e:?}") })
    }

    /// Creates the account on-chain; a no-op if it already exists
    pub async fn create_account(&self, owner: Address, index: U256) -> Result<(), EntryPointError> {
        let call = self.api.create_account(owner, index);
        let pending = call
            .send()
            .await
            .map_err(|e| EntryPointError::Other { inner: format!("create account error: {e:?}") })?;
        pending
            .await
            .map_err(|e| EntryPointError::Provider { inner: e.to_string() })?;
        Ok(())
    }

    /// Init code the entry point executes to deploy the account as part of
    /// processing its first user operation: factory address followed by the
    /// `createAccount` calldata
    pub fn init_code(&self, owner: Address, index: U256) -> Bytes {
        let call = CreateAccountCall { owner, index };
        [self.address.as_bytes().to_vec(), call.encode()].concat().into()
    }
}
