use crate::{
    error::SignerError,
    transport::{SendUserOp, SubmissionReceipt},
};
use ethers::{
    middleware::SignerMiddleware,
    providers::Middleware,
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, Eip1559TransactionRequest, U64,
    },
};
use quill_contracts::{EntryPoint, EntryPointError};
use quill_primitives::UserOperation;
use std::{sync::Arc, time::Duration};
use tracing::{info, trace};

type SignerClient<M> = SignerMiddleware<Arc<M>, LocalWallet>;

/// Submits user operations by calling the entry point's `handleOps` directly,
/// paying gas from a locally held relay key
#[derive(Clone)]
pub struct LocalSubmitter<M: Middleware + 'static> {
    eth_client: Arc<SignerClient<M>>,
    entry_point: EntryPoint<SignerClient<M>>,
    beneficiary: Address,
    chain_id: u64,
}

impl<M: Middleware + 'static> LocalSubmitter<M> {
    /// Creates a local submitter
    ///
    /// # Arguments
    /// * `eth_client` - Connection to the Ethereum execution client
    /// * `relay_key` - Key that signs and pays for the `handleOps` transactions
    /// * `entry_point` - Entry point contract address
    /// * `beneficiary` - Address the entry point refunds gas to
    /// * `chain_id` - Chain id of the network
    pub fn new(
        eth_client: Arc<M>,
        relay_key: LocalWallet,
        entry_point: Address,
        beneficiary: Address,
        chain_id: u64,
    ) -> Self {
        let client = Arc::new(SignerMiddleware::new(
            eth_client,
            relay_key.with_chain_id(chain_id),
        ));
        let entry_point = EntryPoint::new(client.clone(), entry_point);
        Self { eth_client: client, entry_point, beneficiary, chain_id }
    }
}

#[async_trait::async_trait]
impl<M: Middleware + 'static> SendUserOp for LocalSubmitter<M> {
    fn entry_point(&self) -> Address {
        self.entry_point.address()
    }

    async fn supports_entry_point(&self, entry_point: Address) -> Result<bool, SignerError> {
        Ok(entry_point == self.entry_point.address())
    }

    async fn submit(&self, uo: UserOperation) -> Result<SubmissionReceipt, SignerError> {
        let sender = uo.sender;
        let nonce = uo.nonce;

        // dry run first so the entry point's revert reason surfaces unchanged
        // instead of an opaque estimation failure
        match self.entry_point.handle_ops(vec![uo.clone()], self.beneficiary).await {
            Ok(()) => {}
            Err(EntryPointError::FailedOp(op)) => {
                return Err(SignerError::ChainRejected { sender, nonce, reason: op.reason })
            }
            Err(EntryPointError::ExecutionReverted(reason)) => {
                return Err(SignerError::ChainRejected { sender, nonce, reason })
            }
            Err(e) => return Err(SignerError::provider(e)),
        }

        let relay = self.eth_client.signer().address();
        let mut tx = self.entry_point.handle_ops_tx(vec![uo], self.beneficiary);
        tx.set_from(relay);

        let tx_nonce = self
            .eth_client
            .get_transaction_count(relay, None)
            .await
            .map_err(SignerError::provider)?;
        let gas = self.eth_client.estimate_gas(&tx, None).await.map_err(SignerError::provider)?;
        let (max_fee_per_gas, max_priority_fee_per_gas) =
            self.eth_client.estimate_eip1559_fees(None).await.map_err(SignerError::provider)?;

        let tx = TypedTransaction::Eip1559(Eip1559TransactionRequest {
            to: tx.to().cloned(),
            from: Some(relay),
            data: tx.data().cloned(),
            chain_id: Some(U64::from(self.chain_id)),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
            max_fee_per_gas: Some(max_fee_per_gas),
            gas: Some(gas),
            nonce: Some(tx_nonce),
            value: None,
            access_list: Default::default(),
        });

        trace!("Sending handleOps transaction to the execution client: {tx:?}");

        let pending = self
            .eth_client
            .send_transaction(tx, None)
            .await
            .map_err(SignerError::provider)?
            .interval(Duration::from_millis(75));
        let tx_hash = pending.tx_hash();

        let receipt = pending
            .await
            .map_err(SignerError::provider)?
            .ok_or_else(|| SignerError::Provider {
                inner: format!("no receipt for transaction {tx_hash:?}"),
            })?;

        if receipt.status == Some(U64::zero()) {
            return Err(SignerError::ChainRejected {
                sender,
                nonce,
                reason: "handleOps transaction reverted on-chain".into(),
            });
        }

        info!(
            "User operation included, sender: {:?}, nonce: {}, tx: {:?}",
            sender, nonce, receipt.transaction_hash
        );

        Ok(SubmissionReceipt {
            sender,
            nonce,
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.ok_or_else(|| SignerError::Provider {
                inner: format!("receipt for {tx_hash:?} is missing a block number"),
            })?,
            gas_used: receipt.gas_used.unwrap_or_default(),
            relay_gas_used: None,
        })
    }
}
