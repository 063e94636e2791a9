use crate::{
    error::SignerError,
    local::LocalSubmitter,
    remote::RemoteSubmitter,
};
use ethers::{
    providers::Middleware,
    signers::LocalWallet,
    types::{Address, H256, U256, U64},
};
use quill_primitives::UserOperation;
use std::sync::Arc;

/// Receipt produced once a submitted user operation confirmed on-chain.
///
/// Consumed immediately by gas reconciliation; not retained.
#[derive(Clone, Debug)]
pub struct SubmissionReceipt {
    /// Smart account the operation acted for
    pub sender: Address,
    /// Nonce the operation consumed
    pub nonce: U256,
    /// Hash of the enclosing transaction
    pub tx_hash: H256,
    /// Block the transaction confirmed in
    pub block_number: U64,
    /// Gas used as reported by the chain receipt
    pub gas_used: U256,
    /// Gas used as reported by the relay; absent for local submission
    pub relay_gas_used: Option<U256>,
}

/// A strategy for delivering signed user operations to the entry point
///
/// Exactly two production implementations exist: [LocalSubmitter] invokes
/// `handleOps` directly with a locally held relay key, [RemoteSubmitter]
/// forwards to a remote relay and polls for inclusion. Both expose the same
/// submit contract and are selected once per session.
#[async_trait::async_trait]
pub trait SendUserOp: Send + Sync + 'static {
    /// Entry point this transport was configured for
    fn entry_point(&self) -> Address;

    /// Whether the transport can deliver to the given entry point
    async fn supports_entry_point(&self, entry_point: Address) -> Result<bool, SignerError>;

    /// Submit a signed user operation and wait for inclusion
    async fn submit(&self, uo: UserOperation) -> Result<SubmissionReceipt, SignerError>;
}

/// Builds the transport for a session: a remote relay when a URL is
/// configured, direct entry point submission otherwise.
///
/// The choice is made once here and is not swapped mid-flight; there is no
/// fallback between the two.
pub async fn select_transport<M: Middleware + 'static>(
    relay_url: Option<&str>,
    eth_client: Arc<M>,
    relay_key: LocalWallet,
    entry_point: Address,
    beneficiary: Address,
    chain_id: u64,
) -> Result<Arc<dyn SendUserOp>, SignerError> {
    match relay_url {
        Some(url) => Ok(Arc::new(RemoteSubmitter::connect(url, entry_point).await?)),
        None => Ok(Arc::new(LocalSubmitter::new(
            eth_client,
            relay_key,
            entry_point,
            beneficiary,
            chain_id,
        ))),
    }
}
