//! Session configuration read from the environment

use ethers::types::U256;
use quill_primitives::constants;
use std::env;

/// Environment-level inputs for a dispatch session.
///
/// Neither value is part of the dispatch API itself: the relay URL decides
/// which transport gets built, the index selects which of the owner's
/// accounts to act as.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Remote relay endpoint; absent means local submission
    pub relay_url: Option<String>,
    /// Per-owner account index
    pub index: U256,
}

impl SessionConfig {
    /// Reads `AA_URL` and `AA_INDEX` (default 0) from the environment
    pub fn from_env() -> Self {
        let relay_url = env::var("AA_URL").ok().filter(|url| !url.is_empty());
        let index = env::var("AA_INDEX")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(constants::account::DEFAULT_INDEX);
        Self { relay_url, index: index.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local_transport_index_zero() {
        let config = SessionConfig::default();
        assert!(config.relay_url.is_none());
        assert_eq!(config.index, U256::zero());
    }
}
