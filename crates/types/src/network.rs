//! Network constants for the SDF testnet deployment.

/// Passphrase every signed envelope is bound to.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Default ledger query/submit endpoint; override with the `HORIZON_URL`
/// environment variable.
pub const HORIZON_URL: &str = "https://horizon-testnet.stellar.org";

/// Testnet faucet.
pub const FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Manual funding fallback shown when the faucet call fails.
pub const LABORATORY_URL: &str = "https://laboratory.stellar.org/#account-creator?network=test";

/// Where to send users who have no wallet extension installed.
pub const FREIGHTER_DOWNLOAD_URL: &str = "https://www.freighter.app/";

/// Where to send operators who have no `stellar` CLI on their PATH.
pub const STELLAR_CLI_RELEASES_URL: &str = "https://github.com/stellar/stellar-cli/releases";

/// The deployed micro-insurance contract.
pub const INSURANCE_CONTRACT_ID: &str = "CBMT5ZHB7D34ATEG5Q3NETD6OOLAU2MOL6YYFUUGY2PVQAGWBJTJTAAQ";

/// Seconds an unsigned envelope stays valid once built.
pub const TX_TIMEOUT_SECS: u64 = 300;

/// Network identity the external `stellar` CLI pins before every command.
pub const CLI_NETWORK: &str = "test-sdf";

/// Network name recorded in the persisted deploy config.
pub const NETWORK_NAME: &str = "testnet";
