use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, H256, U256, U64};
use jsonrpsee::{
    core::RpcResult,
    proc_macros::rpc,
    server::{ServerBuilder, ServerHandle},
    types::ErrorObjectOwned,
};
use quill_primitives::{UserOperation, UserOperationHash, UserOperationReceipt};
use quill_signer::{SendUserOp, SignerError, SubmissionReceipt};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

pub const CHAIN_ID: u64 = 31_337;
pub const OWNER_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f";

/// In-memory transport enforcing the entry point's nonce and deployment
/// rules, for exercising the signer's state machine without a chain
#[derive(Default)]
pub struct MockTransport {
    pub submitted: Mutex<Vec<UserOperation>>,
    deployed: Mutex<HashSet<Address>>,
}

#[async_trait]
impl SendUserOp for MockTransport {
    fn entry_point(&self) -> Address {
        Address::zero()
    }

    async fn supports_entry_point(&self, _entry_point: Address) -> Result<bool, SignerError> {
        Ok(true)
    }

    async fn submit(&self, uo: UserOperation) -> Result<SubmissionReceipt, SignerError> {
        let mut submitted = self.submitted.lock().unwrap();
        if submitted.iter().any(|prev| prev.sender == uo.sender && prev.nonce == uo.nonce) {
            return Err(SignerError::ChainRejected {
                sender: uo.sender,
                nonce: uo.nonce,
                reason: "AA25 invalid account nonce".into(),
            });
        }

        let mut deployed = self.deployed.lock().unwrap();
        if !uo.init_code.is_empty() && deployed.contains(&uo.sender) {
            return Err(SignerError::ChainRejected {
                sender: uo.sender,
                nonce: uo.nonce,
                reason: "AA10 sender already constructed".into(),
            });
        }
        if uo.init_code.is_empty() && !deployed.contains(&uo.sender) {
            return Err(SignerError::ChainRejected {
                sender: uo.sender,
                nonce: uo.nonce,
                reason: "AA20 account not deployed".into(),
            });
        }

        deployed.insert(uo.sender);
        let receipt = SubmissionReceipt {
            sender: uo.sender,
            nonce: uo.nonce,
            tx_hash: H256::random(),
            block_number: U64::from(submitted.len() as u64 + 1),
            gas_used: U256::from(90_000),
            relay_gas_used: None,
        };
        submitted.push(uo);
        Ok(receipt)
    }
}

#[rpc(server, namespace = "eth")]
pub trait MockRelay {
    #[method(name = "supportedEntryPoints")]
    async fn supported_entry_points(&self) -> RpcResult<Vec<String>>;

    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash>;

    #[method(name = "getUserOperationReceipt")]
    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: String,
    ) -> RpcResult<Option<UserOperationReceipt>>;
}

#[derive(Clone, Default)]
pub struct RelayState {
    pub sent: Arc<Mutex<Vec<UserOperation>>>,
}

pub struct MockRelayImpl {
    pub supported: Vec<String>,
    pub reject_sends: bool,
    pub state: RelayState,
}

#[async_trait]
impl MockRelayServer for MockRelayImpl {
    async fn supported_entry_points(&self) -> RpcResult<Vec<String>> {
        Ok(self.supported.clone())
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash> {
        if self.reject_sends {
            return Err(ErrorObjectOwned::owned(-32602, "user operation declined", None::<()>));
        }
        let hash = user_operation.hash(&entry_point, &U256::from(CHAIN_ID));
        self.state.sent.lock().unwrap().push(user_operation);
        Ok(hash)
    }

    async fn get_user_operation_receipt(
        &self,
        _user_operation_hash: String,
    ) -> RpcResult<Option<UserOperationReceipt>> {
        let sent = self.state.sent.lock().unwrap();
        let Some(uo) = sent.last() else {
            return Ok(None);
        };
        Ok(Some(UserOperationReceipt {
            user_operation_hash: UserOperationHash::default(),
            sender: uo.sender,
            nonce: uo.nonce,
            paymaster: None,
            actual_gas_cost: U256::from(97_000),
            actual_gas_used: U256::from(97),
            success: true,
            reason: String::new(),
            logs: vec![],
            tx_receipt: TransactionReceipt {
                transaction_hash: H256::random(),
                block_number: Some(U64::from(7)),
                gas_used: Some(U256::from(100)),
                ..Default::default()
            },
        }))
    }
}

/// Spawns a mock relay on a random port; the server stops when the returned
/// handle is dropped
pub async fn spawn_relay(
    supported: Vec<String>,
    reject_sends: bool,
) -> eyre::Result<(String, RelayState, ServerHandle)> {
    let server = ServerBuilder::default().build("127.0.0.1:0").await?;
    let addr = server.local_addr()?;
    let state = RelayState::default();
    let handle =
        server.start(MockRelayImpl { supported, reject_sends, state: state.clone() }.into_rpc());
    Ok((format!("http://{addr}"), state, handle))
}
