//! A `Wallet` is a wrapper around the owner's ethers signing key
use crate::UserOperation;
use ethers::{
    prelude::k256::ecdsa::SigningKey,
    signers::{coins_bip39::English, MnemonicBuilder, Signer},
    types::{Address, U256},
};

/// Wrapper around ethers wallet
///
/// Holds the owner key that authorizes user operations. The key itself never
/// leaves this type; collaborators only ever see produced signatures.
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Create a new wallet from the given mnemonic phrase
    ///
    /// # Arguments
    /// * `phrase` - The mnemonic phrase
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_phrase(phrase: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from a hex-encoded private key
    pub fn from_key(key: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet = key.parse::<ethers::signers::Wallet<SigningKey>>()?;
        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Address of the owner key
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs the user operation
    ///
    /// # Arguments
    /// * `uo` - The [UserOperation](UserOperation) to be signed
    /// * `ep` - The entry point contract address
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `UserOperation` - The signed [UserOperation](UserOperation)
    pub async fn sign_uo(
        &self,
        uo: &UserOperation,
        ep: &Address,
        chain_id: &U256,
    ) -> eyre::Result<UserOperation> {
        let h = uo.hash(ep, chain_id);
        let sig = self.signer.sign_message(h.0.as_bytes()).await?;
        Ok(UserOperation { signature: sig.to_vec().into(), ..uo.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Signature;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f";

    #[tokio::test]
    async fn signature_recovers_to_owner() {
        let wallet = Wallet::from_key(KEY, 31_337).unwrap();
        let ep: Address = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap();
        let chain_id: U256 = 31_337.into();

        let uo = UserOperation::default()
            .sender(Address::random())
            .verification_gas_limit(100_000.into())
            .pre_verification_gas(21_000.into());
        let signed = wallet.sign_uo(&uo, &ep, &chain_id).await.unwrap();

        let h = uo.hash(&ep, &chain_id);
        let sig = Signature::try_from(signed.signature.as_ref()).unwrap();
        sig.verify(h.0.as_bytes().to_vec(), wallet.address()).unwrap();
    }

    #[tokio::test]
    async fn mnemonic_derives_expected_address() {
        let phrase = "test test test test test test test test test test test junk";
        let wallet = Wallet::from_phrase(phrase, 1).unwrap();
        // first address of the well-known test mnemonic
        assert_eq!(
            wallet.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }
}
