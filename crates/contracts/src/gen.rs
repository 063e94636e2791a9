use ethers::contract::abigen;

abigen!(
    EntryPointAPI,
    r#"[
        struct UserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;uint256 callGasLimit;uint256 verificationGasLimit;uint256 preVerificationGas;uint256 maxFeePerGas;uint256 maxPriorityFeePerGas;bytes paymasterAndData;bytes signature;}
        struct DepositInfo {uint112 deposit;bool staked;uint112 stake;uint32 unstakeDelaySec;uint48 withdrawTime;}
        function handleOps(UserOperation[] calldata ops,address payable beneficiary) external
        function getNonce(address sender, uint192 key) public view returns (uint256 nonce)
        function getSenderAddress(bytes memory initCode) external
        function getUserOpHash(UserOperation calldata userOp) external view returns (bytes32)
        function balanceOf(address account) external view returns (uint256)
        function depositTo(address account) external payable
        function getDepositInfo(address account) external view returns (DepositInfo memory info)
        error FailedOp(uint256 opIndex, string reason)
        error SenderAddressResult(address sender)
        event UserOperationEvent(bytes32 indexed userOpHash,address indexed sender,address indexed paymaster,uint256 nonce,bool success,uint256 actualGasCost,uint256 actualGasUsed)
        event UserOperationRevertReason(bytes32 indexed userOpHash,address indexed sender,uint256 nonce,bytes revertReason)
        event AccountDeployed(bytes32 indexed userOpHash,address indexed sender,address factory,address paymaster)
    ]"#
);

abigen!(
    AccountFactoryAPI,
    r#"[
        function createAccount(address owner,uint256 index) external returns (address)
        function getAddress(address owner,uint256 index) external view returns (address)
    ]"#
);

abigen!(
    SimpleAccountAPI,
    r#"[
        function execute(address dest,uint256 value,bytes calldata func) external
        function executeBatch(address[] calldata dest,bytes[] calldata func) external
    ]"#
);

abigen!(
    PaymasterAPI,
    r#"[
        function deposit() public payable
        function getDeposit() public view returns (uint256)
    ]"#
);

abigen!(
    ERC20API,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function transfer(address to, uint256 amount) external returns (bool)
        function approve(address spender, uint256 amount) external returns (bool)
        function allowance(address owner, address spender) external view returns (uint256)
        event Transfer(address indexed from, address indexed to, uint256 value)
        event Approval(address indexed owner, address indexed spender, uint256 value)
    ]"#
);

impl From<quill_primitives::UserOperation> for entry_point_api::UserOperation {
    fn from(uo: quill_primitives::UserOperation) -> Self {
        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            init_code: uo.init_code,
            call_data: uo.call_data,
            call_gas_limit: uo.call_gas_limit,
            verification_gas_limit: uo.verification_gas_limit,
            pre_verification_gas: uo.pre_verification_gas,
            max_fee_per_gas: uo.max_fee_per_gas,
            max_priority_fee_per_gas: uo.max_priority_fee_per_gas,
            paymaster_and_data: uo.paymaster_and_data,
            signature: uo.signature,
        }
    }
}
