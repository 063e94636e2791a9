//! Misc utils

use ethers::{
    types::Address,
    utils::to_checksum,
};

/// Converts address to checksum address
pub fn as_checksum<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_from_prefix() {
        let addr: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap();
        let mut buf = addr.as_bytes().to_vec();
        buf.extend_from_slice(&[0xde, 0xad]);
        assert_eq!(get_address(&buf), Some(addr));
        assert_eq!(get_address(&buf[0..10]), None);
    }
}
