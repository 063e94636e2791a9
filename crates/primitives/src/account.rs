//! Smart account identity and counterfactual address derivation

use ethers::{
    abi::{self, Token},
    types::{Address, Bytes, U256},
    utils::{get_create2_address_from_hash, keccak256},
};

/// Identity of one smart account.
///
/// The same owner key can control multiple independent accounts,
/// distinguished by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccountId {
    /// Externally held owner key address
    pub owner: Address,
    /// Per-owner account discriminator
    pub index: U256,
}

impl AccountId {
    /// Creates a new account identity
    pub fn new(owner: Address, index: U256) -> Self {
        Self { owner, index }
    }
}

/// Computes the counterfactual address of a smart account without any chain
/// query, mirroring the CREATE2 computation the account factory performs.
///
/// The factory deploys a proxy whose constructor receives the account
/// implementation and the `initialize(owner)` call, salted with the account
/// index, so the derived address is a pure function of
/// (factory, owner, index).
#[derive(Clone, Debug)]
pub struct AccountDeriver {
    /// Account factory contract
    pub factory: Address,
    /// Account implementation behind the deployed proxy
    pub implementation: Address,
    /// Creation code of the proxy the factory deploys
    pub proxy_creation_code: Bytes,
}

impl AccountDeriver {
    /// Creates a new deriver for the given factory
    pub fn new(factory: Address, implementation: Address, proxy_creation_code: Bytes) -> Self {
        Self { factory, implementation, proxy_creation_code }
    }

    /// Derives the smart account address for the given identity
    ///
    /// Repeated calls return identical results; no chain query is involved.
    pub fn derive(&self, id: &AccountId) -> Address {
        let init_code = [
            self.proxy_creation_code.to_vec(),
            abi::encode(&[
                Token::Address(self.implementation),
                Token::Bytes(initialize_call(id.owner)),
            ]),
        ]
        .concat();

        let mut salt = [0u8; 32];
        id.index.to_big_endian(&mut salt);

        get_create2_address_from_hash(self.factory, salt, keccak256(init_code))
    }
}

// initialize(address) calldata the factory passes to the proxy constructor
fn initialize_call(owner: Address) -> Vec<u8> {
    let mut data = keccak256("initialize(address)".as_bytes())[..4].to_vec();
    data.extend(abi::encode(&[Token::Address(owner)]));
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deriver() -> AccountDeriver {
        AccountDeriver::new(
            "0x9406Cc6185a346906296840746125a0E44976454".parse().unwrap(),
            "0x8ABB13360b87Be5EEb1B98647A016adD927a136c".parse().unwrap(),
            "0x60806040".parse().unwrap(),
        )
    }

    #[test]
    fn derivation_is_deterministic() {
        let id = AccountId::new("0xCe0fEfa6f7979C4c9B5373e0f5105b7259092c6D".parse().unwrap(), U256::zero());
        let deriver = deriver();
        assert_eq!(deriver.derive(&id), deriver.derive(&id));
    }

    #[test]
    fn derivation_distinguishes_owner_and_index() {
        let deriver = deriver();
        let owner: Address = "0xCe0fEfa6f7979C4c9B5373e0f5105b7259092c6D".parse().unwrap();

        let base = deriver.derive(&AccountId::new(owner, U256::zero()));
        let other_index = deriver.derive(&AccountId::new(owner, U256::one()));
        let other_owner = deriver.derive(&AccountId::new(Address::random(), U256::zero()));

        assert_ne!(base, other_index);
        assert_ne!(base, other_owner);
    }

    #[test]
    fn derivation_matches_create2() {
        let deriver = deriver();
        let id = AccountId::new("0xCe0fEfa6f7979C4c9B5373e0f5105b7259092c6D".parse().unwrap(), 2.into());

        let init_code = [
            deriver.proxy_creation_code.to_vec(),
            abi::encode(&[
                Token::Address(deriver.implementation),
                Token::Bytes(initialize_call(id.owner)),
            ]),
        ]
        .concat();
        let mut salt = [0u8; 32];
        id.index.to_big_endian(&mut salt);

        let mut preimage = vec![0xffu8];
        preimage.extend_from_slice(deriver.factory.as_bytes());
        preimage.extend_from_slice(&salt);
        preimage.extend_from_slice(&keccak256(init_code));
        let expected = Address::from_slice(&keccak256(preimage)[12..]);

        assert_eq!(deriver.derive(&id), expected);
    }
}
