use crate::{error::EntryPointError, gen::PaymasterAPI};
use ethers::{
    providers::Middleware,
    types::{Address, U256},
};
use std::sync::Arc;

/// Client-side view of a paymaster contract that sponsors gas for smart
/// accounts out of its entry point deposit
#[derive(Clone)]
pub struct Paymaster<M: Middleware + 'static> {
    address: Address,
    api: PaymasterAPI<M>,
}

impl<M: Middleware + 'static> Paymaster<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let api = PaymasterAPI::new(address, eth_client);
        Self { address, api }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Funds the paymaster's entry point deposit with native value
    pub async fn deposit(&self, value: U256) -> Result<(), EntryPointError> {
        let call = self.api.deposit().value(value);
        let pending = call
            .send()
            .await
            .map_err(|e| EntryPointError::Other { inner: format!("deposit error: {e:?}") })?;
        pending
            .await
            .map_err(|e| EntryPointError::Provider { inner: e.to_string() })?;
        Ok(())
    }

    /// Current entry point deposit held by the paymaster
    pub async fn get_deposit(&self) -> Result<U256, EntryPointError> {
        self.api
            .get_deposit()
            .call()
            .await
            .map_err(|e| EntryPointError::Other { inner: format!("get deposit error: {e:?}") })
    }
}
