use crate::{
    error::SignerError,
    transport::{SendUserOp, SubmissionReceipt},
};
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use parking_lot::Mutex;
use quill_contracts::{simple_account_api::ExecuteCall, AccountFactory, EntryPoint};
use quill_primitives::{constants, AccountDeriver, AccountId, UserOperation, Wallet};
use std::sync::Arc;
use tracing::{info, trace};

/// Gas limits and fee caps stamped onto every dispatched operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasConfig {
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            call_gas_limit: constants::gas::CALL_GAS_LIMIT.into(),
            verification_gas_limit: constants::gas::VERIFICATION_GAS_LIMIT.into(),
            pre_verification_gas: constants::gas::PRE_VERIFICATION_GAS.into(),
            max_fee_per_gas: constants::gas::MAX_FEE_PER_GAS.into(),
            max_priority_fee_per_gas: constants::gas::MAX_PRIORITY_FEE_PER_GAS.into(),
        }
    }
}

/// A call to execute through the smart account
#[derive(Clone, Debug, Default)]
pub struct Execution {
    /// Target contract
    pub dest: Address,
    /// Native value forwarded with the call
    pub value: U256,
    /// Calldata for the target
    pub func: Bytes,
}

/// Lifecycle of the smart account behind a signer.
///
/// The address is resolved lazily and memoized; deployment happens atomically
/// with the first submitted operation, after which init code must never be
/// sent again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AccountState {
    Unresolved,
    Resolved { address: Address, deployed: bool },
}

/// Signer facade for a smart account.
///
/// Callers hand it high-level calls; it resolves (and if needed initializes)
/// the account, turns the call into a signed user operation, and delegates
/// delivery to the configured transport. The owner key never crosses the
/// transport boundary; only the produced signature does.
///
/// Entry point, transport, and paymaster are fixed at construction. The
/// builder methods consume the signer, so none of them can change while an
/// operation is in flight.
pub struct AaSigner<M, S>
where
    M: Middleware + 'static,
    S: SendUserOp + ?Sized,
{
    wallet: Wallet,
    account: AccountId,
    chain_id: U256,
    eth_client: Arc<M>,
    entry_point: EntryPoint<M>,
    factory: AccountFactory<M>,
    deriver: Option<AccountDeriver>,
    paymaster: Option<Address>,
    gas: GasConfig,
    transport: Arc<S>,
    state: Mutex<AccountState>,
    // nonce fetch and submission form a critical section: concurrent
    // submissions for one sender race on nonce assignment and all but one
    // get rejected by the entry point
    submit_lock: tokio::sync::Mutex<()>,
}

impl<M, S> AaSigner<M, S>
where
    M: Middleware + 'static,
    S: SendUserOp + ?Sized,
{
    /// Creates a signer for the account identified by `(owner, index)`
    pub fn new(
        wallet: Wallet,
        index: U256,
        chain_id: u64,
        eth_client: Arc<M>,
        entry_point: Address,
        factory: Address,
        transport: Arc<S>,
    ) -> Self {
        let account = AccountId::new(wallet.address(), index);
        let entry_point = EntryPoint::new(eth_client.clone(), entry_point);
        let factory = AccountFactory::new(eth_client.clone(), factory);
        Self {
            wallet,
            account,
            chain_id: chain_id.into(),
            eth_client,
            entry_point,
            factory,
            deriver: None,
            paymaster: None,
            gas: GasConfig::default(),
            transport,
            state: Mutex::new(AccountState::Unresolved),
            submit_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Enables local counterfactual address derivation
    pub fn with_deriver(mut self, deriver: AccountDeriver) -> Self {
        self.deriver = Some(deriver);
        self
    }

    /// Attaches a fee sponsor to every subsequent operation.
    ///
    /// The sponsor must hold a sufficient entry point deposit, otherwise
    /// submission fails at the entry point with an insufficient-funds
    /// condition.
    pub fn with_paymaster(mut self, paymaster: Address) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    /// Clears any attached fee sponsor; the account pays directly
    pub fn without_paymaster(mut self) -> Self {
        self.paymaster = None;
        self
    }

    /// Overrides the gas values stamped onto operations
    pub fn with_gas(mut self, gas: GasConfig) -> Self {
        self.gas = gas;
        self
    }

    /// Identity of the account this signer acts for
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Entry point the signer dispatches through
    pub fn entry_point_address(&self) -> Address {
        self.entry_point.address()
    }

    /// Fee sponsor attached to outgoing operations, if any
    pub fn paymaster(&self) -> Option<Address> {
        self.paymaster
    }

    /// Smart account address, derived on first use and memoized.
    ///
    /// Requires either a configured [AccountDeriver] or a previously
    /// connected address.
    pub fn address(&self) -> Result<Address, SignerError> {
        let mut state = self.state.lock();
        match *state {
            AccountState::Resolved { address, .. } => Ok(address),
            AccountState::Unresolved => {
                let deriver = self.deriver.as_ref().ok_or_else(|| SignerError::Encoding {
                    inner: "no account deriver configured and no account address connected".into(),
                })?;
                let address = deriver.derive(&self.account);
                *state = AccountState::Resolved { address, deployed: false };
                Ok(address)
            }
        }
    }

    /// Binds an account address obtained out-of-band, e.g. from the
    /// factory's `getAddress` query.
    ///
    /// The caller guarantees the address matches the deterministic
    /// derivation for `(owner, index)`; no on-chain verification is
    /// performed here.
    pub fn connect_account_address(&self, address: Address) -> Result<(), SignerError> {
        let mut state = self.state.lock();
        match *state {
            AccountState::Unresolved => {
                *state = AccountState::Resolved { address, deployed: false };
                Ok(())
            }
            AccountState::Resolved { address: bound, .. } if bound == address => Ok(()),
            AccountState::Resolved { address: bound, .. } => Err(SignerError::Encoding {
                inner: format!("account already resolved to {bound:?}"),
            }),
        }
    }

    /// Whether the account is known to be deployed
    pub fn is_deployed(&self) -> bool {
        matches!(*self.state.lock(), AccountState::Resolved { deployed: true, .. })
    }

    fn mark_deployed(&self) {
        let mut state = self.state.lock();
        if let AccountState::Resolved { address, .. } = *state {
            *state = AccountState::Resolved { address, deployed: true };
        }
    }

    /// Executes a call through the smart account and waits for inclusion.
    ///
    /// Cancelling before inclusion leaves the operation's on-chain fate
    /// undetermined (it may still be included later); re-query the sender
    /// nonce instead of assuming it had no effect.
    pub async fn execute(&self, execution: Execution) -> Result<SubmissionReceipt, SignerError> {
        let call = ExecuteCall {
            dest: execution.dest,
            value: execution.value,
            func: execution.func,
        };
        self.send_call_data(call.encode().into()).await
    }

    /// Signs and submits a user operation carrying the given account calldata
    pub async fn send_call_data(
        &self,
        call_data: Bytes,
    ) -> Result<SubmissionReceipt, SignerError> {
        let _guard = self.submit_lock.lock().await;

        let sender = self.address()?;

        // exactly one of { init code, already deployed } holds at submission
        let init_code = if self.is_deployed() {
            Bytes::default()
        } else {
            let code = self
                .eth_client
                .get_code(sender, None)
                .await
                .map_err(SignerError::provider)?;
            if code.is_empty() {
                self.factory.init_code(self.account.owner, self.account.index)
            } else {
                self.mark_deployed();
                Bytes::default()
            }
        };

        // the nonce must be the entry point's next expected value, so it is
        // fetched fresh inside the critical section for every dispatch
        let nonce = self
            .entry_point
            .get_nonce(&sender, U256::zero())
            .await
            .map_err(SignerError::provider)?;

        let paymaster_and_data: Bytes = self
            .paymaster
            .map(|paymaster| paymaster.as_bytes().to_vec().into())
            .unwrap_or_default();

        let uo = UserOperation::default()
            .sender(sender)
            .nonce(nonce)
            .init_code(init_code.clone())
            .call_data(call_data)
            .call_gas_limit(self.gas.call_gas_limit)
            .verification_gas_limit(self.gas.verification_gas_limit)
            .pre_verification_gas(self.gas.pre_verification_gas)
            .max_fee_per_gas(self.gas.max_fee_per_gas)
            .max_priority_fee_per_gas(self.gas.max_priority_fee_per_gas)
            .paymaster_and_data(paymaster_and_data);

        let uo = self
            .wallet
            .sign_uo(&uo, &self.entry_point.address(), &self.chain_id)
            .await
            .map_err(|e| SignerError::Encoding { inner: format!("signing failed: {e}") })?;

        trace!("Dispatching user operation: {uo:?}");
        info!(
            "Submitting user operation, sender: {:?}, nonce: {}, init code: {}",
            sender,
            nonce,
            !init_code.is_empty()
        );

        let receipt = self.transport.submit(uo).await?;

        // a successful submission proves the account exists on-chain, with or
        // without init code; from here on init code would deterministically fail
        self.mark_deployed();

        Ok(receipt)
    }
}
