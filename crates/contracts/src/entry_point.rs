pub use super::{
    error::EntryPointError,
    gen::{EntryPointAPI, UserOperationEventFilter},
};
use super::gen::entry_point_api::{
    DepositInfo, EntryPointAPIErrors, SenderAddressResult, UserOperation,
};
use crate::error::decode_revert_error;
use ethers::{
    contract::LogMeta,
    prelude::ContractError,
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, H256, U256, U64},
};
use std::sync::Arc;

/// Client-side view of the entry point (the singleton coordinator that
/// validates and executes user operations)
#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    eth_client: Arc<M>,
    address: Address,
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let entry_point_api = EntryPointAPI::new(address, eth_client.clone());
        Self { eth_client, address, entry_point_api }
    }

    pub fn entry_point_api(&self) -> &EntryPointAPI<M> {
        &self.entry_point_api
    }

    pub fn eth_client(&self) -> Arc<M> {
        self.eth_client.clone()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn deserialize_error_msg(
        err: ContractError<M>,
    ) -> Result<EntryPointAPIErrors, EntryPointError> {
        match err {
            ContractError::DecodingError(e) => {
                Err(EntryPointError::Decode { inner: e.to_string() })
            }
            ContractError::AbiError(e) => Err(EntryPointError::ABI { inner: e.to_string() }),
            ContractError::MiddlewareError { e } => EntryPointError::from_middleware_error::<M>(e),
            ContractError::ProviderError { e } => EntryPointError::from_provider_error(&e),
            ContractError::Revert(data) => decode_revert_error(data),
            _ => Err(EntryPointError::Other { inner: err.to_string() }),
        }
    }

    /// Dry-runs a `handleOps` batch via eth_call so the coordinator's revert
    /// reason surfaces before any transaction is sent
    pub async fn handle_ops<U: Into<UserOperation>>(
        &self,
        uos: Vec<U>,
        beneficiary: Address,
    ) -> Result<(), EntryPointError> {
        self.entry_point_api
            .handle_ops(uos.into_iter().map(|u| u.into()).collect(), beneficiary)
            .call()
            .await
            .or_else(|e| {
                Self::deserialize_error_msg(e).and_then(|op| match op {
                    EntryPointAPIErrors::FailedOp(err) => Err(EntryPointError::FailedOp(err)),
                    EntryPointAPIErrors::RevertString(reason) => {
                        Err(EntryPointError::ExecutionReverted(reason))
                    }
                    _ => Err(EntryPointError::Other { inner: format!("handle ops error: {op:?}") }),
                })
            })
    }

    /// The `handleOps` transaction for real submission; the caller supplies
    /// sender, fees and gas before sending
    pub fn handle_ops_tx<U: Into<UserOperation>>(
        &self,
        uos: Vec<U>,
        beneficiary: Address,
    ) -> TypedTransaction {
        self.entry_point_api
            .handle_ops(uos.into_iter().map(|u| u.into()).collect(), beneficiary)
            .tx
    }

    /// Next valid nonce for the given sender, as tracked by the entry point
    pub async fn get_nonce(&self, address: &Address, key: U256) -> Result<U256, EntryPointError> {
        let res = self.entry_point_api.get_nonce(*address, key).call().await;

        match res {
            Ok(nonce) => Ok(nonce),
            Err(err) => Err(EntryPointError::Other { inner: format!("get nonce error: {err:?}") }),
        }
    }

    /// Asks the entry point which address the given init code deploys.
    /// The call always reverts; the address is carried in the revert data.
    pub async fn get_sender_address(
        &self,
        init_code: Bytes,
    ) -> Result<SenderAddressResult, EntryPointError> {
        let res = self.entry_point_api.get_sender_address(init_code).call().await;

        match res {
            Ok(_) => Err(EntryPointError::NoRevert { function: "get_sender_address".into() }),
            Err(e) => Self::deserialize_error_msg(e).and_then(|op| match op {
                EntryPointAPIErrors::SenderAddressResult(res) => Ok(res),
                EntryPointAPIErrors::FailedOp(err) => Err(EntryPointError::FailedOp(err)),
                _ => Err(EntryPointError::Other {
                    inner: format!("get sender address error: {op:?}"),
                }),
            }),
        }
    }

    /// Deposit balance the entry point holds for the given account (or paymaster)
    pub async fn balance_of(&self, addr: &Address) -> Result<U256, EntryPointError> {
        let res = self.entry_point_api.balance_of(*addr).call().await;

        match res {
            Ok(balance) => Ok(balance),
            Err(err) => Err(EntryPointError::Other { inner: format!("balance of error: {err:?}") }),
        }
    }

    pub async fn get_deposit_info(&self, addr: &Address) -> Result<DepositInfo, EntryPointError> {
        let res = self.entry_point_api.get_deposit_info(*addr).call().await;

        match res {
            Ok((deposit, staked, stake, unstake_delay_sec, withdraw_time)) => {
                Ok(DepositInfo { deposit, staked, stake, unstake_delay_sec, withdraw_time })
            }
            Err(err) => {
                Err(EntryPointError::Other { inner: format!("get deposit info error: {err:?}") })
            }
        }
    }

    /// Tops up the entry point deposit of the given account
    pub async fn deposit_to(&self, addr: Address, value: U256) -> Result<(), EntryPointError> {
        let call = self.entry_point_api.deposit_to(addr).value(value);
        let pending = call
            .send()
            .await
            .map_err(|e| EntryPointError::Other { inner: format!("deposit to error: {e:?}") })?;
        pending
            .await
            .map_err(|e| EntryPointError::Provider { inner: e.to_string() })?;
        Ok(())
    }

    /// Completion event the entry point emitted for the given sender and
    /// nonce, searched within the given block range only
    pub async fn query_user_operation_event(
        &self,
        sender: Address,
        nonce: U256,
        from_block: U64,
        to_block: U64,
    ) -> Result<Option<(UserOperationEventFilter, LogMeta)>, EntryPointError> {
        let filter = self
            .entry_point_api
            .event::<UserOperationEventFilter>()
            .from_block(from_block)
            .to_block(to_block)
            .topic2(H256::from(sender));
        let res: Vec<(UserOperationEventFilter, LogMeta)> = filter
            .query_with_meta()
            .await
            .map_err(|e| EntryPointError::Provider { inner: e.to_string() })?;

        Ok(res.into_iter().find(|(ev, _)| ev.nonce == nonce))
    }
}
