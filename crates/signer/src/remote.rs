use crate::{
    error::SignerError,
    transport::{SendUserOp, SubmissionReceipt},
};
use ethers::types::Address;
use jsonrpsee::{
    core::{Error as RpcError, RpcResult},
    http_client::{HttpClient, HttpClientBuilder},
    proc_macros::rpc,
};
use quill_primitives::{constants, UserOperation, UserOperationHash, UserOperationReceipt};
use std::time::Duration;
use tracing::{info, trace};

/// The ERC-4337 `eth` namespace methods a remote relay serves
#[rpc(client, namespace = "eth")]
pub trait RelayApi {
    /// Get the entry points the relay accepts user operations for
    #[method(name = "supportedEntryPoints")]
    async fn supported_entry_points(&self) -> RpcResult<Vec<String>>;

    /// Forward a signed user operation to the relay
    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash>;

    /// Retrieve the receipt of a user operation, if it has been included
    #[method(name = "getUserOperationReceipt")]
    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: String,
    ) -> RpcResult<Option<UserOperationReceipt>>;
}

/// Submits user operations through a remote relay (bundler) over JSON-RPC
/// and polls for inclusion
#[derive(Clone, Debug)]
pub struct RemoteSubmitter {
    client: HttpClient,
    url: String,
    entry_point: Address,
    poll_interval: Duration,
    poll_retries: u32,
}

impl RemoteSubmitter {
    /// Connects to the relay and verifies it serves the target entry point.
    ///
    /// A relay that does not list the entry point indicates a network or
    /// bundler misconfiguration, so this fails fast with
    /// [SignerError::RelayRejected] instead of ever submitting.
    pub async fn connect(url: &str, entry_point: Address) -> Result<Self, SignerError> {
        let client = HttpClientBuilder::default()
            .build(url)
            .map_err(|e| SignerError::RelayUnavailable { inner: e.to_string() })?;

        let submitter = Self {
            client,
            url: url.to_string(),
            entry_point,
            poll_interval: Duration::from_millis(constants::relay::POLL_INTERVAL_MILLIS),
            poll_retries: constants::relay::POLL_RETRIES,
        };

        if !submitter.supports_entry_point(entry_point).await? {
            return Err(SignerError::RelayRejected {
                inner: format!(
                    "relay {} does not support entry point {:?}",
                    submitter.url, entry_point
                ),
            });
        }

        Ok(submitter)
    }

    /// Sets the interval between inclusion polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the number of inclusion polls before giving up
    pub fn with_poll_retries(mut self, retries: u32) -> Self {
        self.poll_retries = retries;
        self
    }
}

fn relay_error(err: RpcError) -> SignerError {
    match err {
        // the relay answered and declined
        RpcError::Call(call) => SignerError::RelayRejected {
            inner: format!("code {}: {}", call.code(), call.message()),
        },
        // the relay could not be reached or timed out
        other => SignerError::RelayUnavailable { inner: other.to_string() },
    }
}

#[async_trait::async_trait]
impl SendUserOp for RemoteSubmitter {
    fn entry_point(&self) -> Address {
        self.entry_point
    }

    async fn supports_entry_point(&self, entry_point: Address) -> Result<bool, SignerError> {
        let supported =
            self.client.supported_entry_points().await.map_err(relay_error)?;
        Ok(supported
            .iter()
            .filter_map(|ep| ep.parse::<Address>().ok())
            .any(|ep| ep == entry_point))
    }

    async fn submit(&self, uo: UserOperation) -> Result<SubmissionReceipt, SignerError> {
        let sender = uo.sender;
        let nonce = uo.nonce;

        let uo_hash = self
            .client
            .send_user_operation(uo, self.entry_point)
            .await
            .map_err(relay_error)?;

        info!(
            "User operation forwarded to relay {}, hash: {:?}, sender: {:?}, nonce: {}",
            self.url, uo_hash.0, sender, nonce
        );

        for _ in 0..self.poll_retries {
            tokio::time::sleep(self.poll_interval).await;

            let receipt = self
                .client
                .get_user_operation_receipt(format!("{:?}", uo_hash.0))
                .await
                .map_err(relay_error)?;

            let Some(receipt) = receipt else {
                trace!("User operation {:?} not yet included", uo_hash.0);
                continue;
            };

            if !receipt.success {
                return Err(SignerError::ChainRejected {
                    sender,
                    nonce,
                    reason: receipt.reason,
                });
            }

            let tx = receipt.tx_receipt;
            return Ok(SubmissionReceipt {
                sender,
                nonce,
                tx_hash: tx.transaction_hash,
                block_number: tx.block_number.ok_or_else(|| SignerError::Provider {
                    inner: format!(
                        "relay receipt for {:?} is missing a block number",
                        uo_hash.0
                    ),
                })?,
                gas_used: tx.gas_used.unwrap_or_default(),
                relay_gas_used: Some(receipt.actual_gas_used),
            });
        }

        // the operation may still be included later; the caller must re-query
        // sender state before resubmitting
        Err(SignerError::RelayUnavailable {
            inner: format!(
                "user operation {:?} not included after {} polls",
                uo_hash.0, self.poll_retries
            ),
        })
    }
}
