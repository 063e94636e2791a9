//! Account abstraction (ERC-4337)-related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
}

/// Smart account
pub mod account {
    /// Default per-owner account index
    pub const DEFAULT_INDEX: u64 = 0;
}

/// Gas defaults stamped onto user operations when the caller supplies none.
/// Sized for test networks; production callers provide their own values.
pub mod gas {
    pub const CALL_GAS_LIMIT: u64 = 200_000;
    pub const VERIFICATION_GAS_LIMIT: u64 = 1_000_000;
    pub const PRE_VERIFICATION_GAS: u64 = 50_000;
    pub const MAX_FEE_PER_GAS: u64 = 3_000_000_000;
    pub const MAX_PRIORITY_FEE_PER_GAS: u64 = 1_000_000_000;
}

/// Remote relay polling
pub mod relay {
    /// Interval between inclusion polls (in milliseconds)
    pub const POLL_INTERVAL_MILLIS: u64 = 3_000;
    /// Number of inclusion polls before giving up
    pub const POLL_RETRIES: u32 = 20;
}
