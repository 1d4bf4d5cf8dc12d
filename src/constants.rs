//! Application-wide constants and magic numbers
//!
//! Defaults for configuration live here so the config layer and the tests
//! agree on them.

/// Retry executor defaults
pub mod retry {
    /// Attempts per remote call before giving up
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Upper bound on attempts; keeps every backoff wait strictly larger
    /// than the one before it
    pub const MAX_ATTEMPTS_LIMIT: u32 = 32;

    /// Exponential backoff base; the wait before retry n is base * 2^n
    pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
}

/// Venue connection defaults
pub mod venue {
    pub const DEFAULT_BASE_URL: &str = "https://omni.apex.exchange/api";

    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

    pub const ENV_API_KEY: &str = "APEX_API_KEY";
    pub const ENV_API_SECRET: &str = "APEX_API_SECRET";
    pub const ENV_API_PASSPHRASE: &str = "APEX_API_PASSPHRASE";
}

/// Trading constants
pub mod trading {
    use rust_decimal::Decimal;

    /// Leverage is entered as a multiplier and applied as a percentage of margin
    pub const LEVERAGE_PERCENT_SCALE: Decimal = Decimal::ONE_HUNDRED;

    /// Take-profit and stop-loss offsets are given in percent
    pub const PERCENT: Decimal = Decimal::ONE_HUNDRED;
}

pub mod bus {
    pub const DEFAULT_CAPACITY: usize = 64;
}

/// Logging event names for structured logging
pub mod events {
    pub const RETRY_SCHEDULED: &str = "retry_scheduled";
    pub const RETRIES_EXHAUSTED: &str = "retries_exhausted";
    pub const STAGE_REACHED: &str = "stage_reached";
    pub const ORDER_ACKNOWLEDGED: &str = "order_acknowledged";
    pub const PIPELINE_ABORTED: &str = "pipeline_aborted";
}
