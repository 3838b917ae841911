use crate::provider::{ProviderError, ProviderHost, WalletProvider};
use microvault_horizon::LedgerClient;
use microvault_types::{Address, WalletAccount};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// How often the detection loop re-checks the injection surface.
pub const POLL_INTERVAL: Duration = Duration::from_millis(150);
/// How long detection waits before giving up on an extension appearing.
pub const MAX_WAIT: Duration = Duration::from_secs(15);
/// Grace period after surfacing the wallet UI, so the user can approve.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

const PROGRESS_EVERY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// No provider appeared within the detection bound. Drives the
    /// install call-to-action rather than the retry path.
    #[error("no wallet extension detected")]
    NotInstalled,
    /// A provider exists but every address method failed or came back empty.
    #[error("wallet did not yield an address")]
    AddressUnavailable,
}

/// Detects an injected wallet provider and establishes a connection.
///
/// One connector carries all timing knobs; tests shrink them to keep the
/// polling paths fast.
pub struct Connector<H, L> {
    host: H,
    ledger: L,
    poll_interval: Duration,
    max_wait: Duration,
    settle_delay: Duration,
}

impl<H, L> Connector<H, L>
where
    H: ProviderHost,
    L: LedgerClient,
{
    pub fn new(host: H, ledger: L) -> Self {
        Self {
            host,
            ledger,
            poll_interval: POLL_INTERVAL,
            max_wait: MAX_WAIT,
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_timing(
        mut self,
        poll_interval: Duration,
        max_wait: Duration,
        settle_delay: Duration,
    ) -> Self {
        self.poll_interval = poll_interval;
        self.max_wait = max_wait;
        self.settle_delay = settle_delay;
        self
    }

    /// One-shot check with no waiting and no side effects.
    pub fn is_wallet_installed(&self) -> bool {
        self.host.lookup().is_some()
    }

    /// Current provider, if any. Used after a successful connect to hand
    /// the signing capability to the transaction layer.
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.host.lookup()
    }

    /// Establish a connection to the injected wallet.
    ///
    /// Polls for a provider up to the detection bound, surfaces the wallet
    /// UI best-effort, resolves an address through the capability fallbacks,
    /// and loads the account balance. A missing ledger account is not an
    /// error; fresh addresses simply show a zero balance.
    pub async fn connect(&self) -> Result<WalletAccount, ConnectError> {
        let provider = self
            .wait_for_provider()
            .await
            .ok_or(ConnectError::NotInstalled)?;
        tracing::info!(provider = provider.name(), "wallet extension detected");

        match provider.show_wallet().await {
            Ok(()) => tokio::time::sleep(self.settle_delay).await,
            Err(err) => tracing::warn!(%err, "show_wallet failed, continuing"),
        }

        let address = self.resolve_address(provider.as_ref()).await?;
        let balance = match self.ledger.load_account(&address).await {
            Ok(record) => record.native_balance().to_string(),
            Err(err) => {
                tracing::warn!(%address, %err, "account not on ledger yet, assuming unfunded");
                "0".to_string()
            }
        };

        tracing::info!(%address, %balance, "wallet connected");
        Ok(WalletAccount { address, balance })
    }

    async fn wait_for_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        let started = Instant::now();
        let mut last_progress = started;
        loop {
            if let Some(provider) = self.host.lookup() {
                return Some(provider);
            }
            if started.elapsed() >= self.max_wait {
                tracing::warn!(waited = ?started.elapsed(), "no wallet extension appeared");
                return None;
            }
            if last_progress.elapsed() >= PROGRESS_EVERY {
                tracing::info!(waited = ?started.elapsed(), "still waiting for a wallet extension");
                last_progress = Instant::now();
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Try the address capabilities in priority order; the first non-empty
    /// value wins. Individual failures are logged and skipped.
    async fn resolve_address(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<Address, ConnectError> {
        let mut raw = accept("get_address", provider.get_address().await);
        if raw.is_none() {
            raw = accept("get_public_key", provider.get_public_key().await);
        }
        if raw.is_none() {
            raw = accept("request_public_key", provider.request_public_key().await);
        }
        let raw = raw.ok_or(ConnectError::AddressUnavailable)?;
        raw.trim().parse().map_err(|err| {
            tracing::warn!(%err, "wallet returned an unusable address");
            ConnectError::AddressUnavailable
        })
    }
}

fn accept(method: &'static str, result: Result<String, ProviderError>) -> Option<String> {
    match result {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            tracing::debug!(method, "wallet returned an empty address");
            None
        }
        Err(err) => {
            tracing::debug!(method, %err, "address method failed, trying next");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use microvault_horizon::{AccountRecord, BalanceLine, HorizonError, SubmitReceipt};
    use microvault_types::Address;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    const ADDR: &str = "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR";

    const FAST_POLL: Duration = Duration::from_millis(2);
    const FAST_WAIT: Duration = Duration::from_millis(60);
    const FAST_SETTLE: Duration = Duration::from_millis(1);

    #[derive(Clone, Default)]
    struct StubLedger {
        fail_load: bool,
        balance: Option<&'static str>,
    }

    #[async_trait]
    impl LedgerClient for StubLedger {
        async fn load_account(
            &self,
            _address: &Address,
        ) -> microvault_horizon::Result<AccountRecord> {
            if self.fail_load {
                return Err(HorizonError::Api {
                    status: 404,
                    body: "not found".to_string(),
                });
            }
            Ok(AccountRecord {
                sequence: "7".to_string(),
                balances: self
                    .balance
                    .map(|b| {
                        vec![BalanceLine {
                            balance: b.to_string(),
                            asset_type: "native".to_string(),
                        }]
                    })
                    .unwrap_or_default(),
                ..Default::default()
            })
        }

        async fn submit(&self, _envelope: &str) -> microvault_horizon::Result<SubmitReceipt> {
            Ok(SubmitReceipt::default())
        }
    }

    struct ScriptedProvider {
        show_fails: bool,
        get_address: Result<String, ProviderError>,
        get_public_key: Result<String, ProviderError>,
        request_public_key: Result<String, ProviderError>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedProvider {
        fn with_address(addr: &str) -> Self {
            Self {
                show_fails: false,
                get_address: Ok(addr.to_string()),
                get_public_key: Err(ProviderError::Unsupported("get_public_key")),
                request_public_key: Err(ProviderError::Unsupported("request_public_key")),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn show_wallet(&self) -> Result<(), ProviderError> {
            self.calls.lock().unwrap().push("show_wallet");
            if self.show_fails {
                Err(ProviderError::Call("popup blocked".to_string()))
            } else {
                Ok(())
            }
        }

        async fn get_address(&self) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push("get_address");
            self.get_address.clone()
        }

        async fn get_public_key(&self) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push("get_public_key");
            self.get_public_key.clone()
        }

        async fn request_public_key(&self) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push("request_public_key");
            self.request_public_key.clone()
        }
    }

    /// Host that only starts answering after a number of lookups, the way a
    /// content script injects its object a beat after page load.
    struct LateHost {
        misses: AtomicU32,
        threshold: u32,
        provider: Arc<dyn WalletProvider>,
    }

    impl ProviderHost for LateHost {
        fn lookup(&self) -> Option<Arc<dyn WalletProvider>> {
            if self.misses.fetch_add(1, Ordering::SeqCst) >= self.threshold {
                Some(self.provider.clone())
            } else {
                None
            }
        }
    }

    struct EmptyHost;

    impl ProviderHost for EmptyHost {
        fn lookup(&self) -> Option<Arc<dyn WalletProvider>> {
            None
        }
    }

    #[tokio::test]
    async fn absent_provider_classifies_not_installed() {
        let connector = Connector::new(EmptyHost, StubLedger::default()).with_timing(FAST_POLL, FAST_WAIT, FAST_SETTLE);
        assert!(!connector.is_wallet_installed());
        assert_eq!(connector.connect().await, Err(ConnectError::NotInstalled));
    }

    #[tokio::test]
    async fn provider_appearing_mid_poll_is_detected() {
        let host = LateHost {
            misses: AtomicU32::new(0),
            threshold: 3,
            provider: Arc::new(ScriptedProvider::with_address(ADDR)),
        };
        let ledger = StubLedger {
            balance: Some("42.0000000"),
            ..Default::default()
        };
        let connector = Connector::new(host, ledger).with_timing(FAST_POLL, FAST_WAIT, FAST_SETTLE);
        let account = connector.connect().await.unwrap();
        assert_eq!(account.address.as_str(), ADDR);
        assert_eq!(account.balance, "42.0000000");
    }

    #[tokio::test]
    async fn fresh_account_gets_zero_balance() {
        let provider = Arc::new(ScriptedProvider::with_address(ADDR));
        let host = LateHost {
            misses: AtomicU32::new(0),
            threshold: 0,
            provider,
        };
        let ledger = StubLedger {
            fail_load: true,
            ..Default::default()
        };
        let connector = Connector::new(host, ledger).with_timing(FAST_POLL, FAST_WAIT, FAST_SETTLE);
        let account = connector.connect().await.unwrap();
        assert_eq!(account.balance, "0");
    }

    #[tokio::test]
    async fn address_methods_fall_back_in_order() {
        let provider = Arc::new(ScriptedProvider {
            show_fails: false,
            get_address: Err(ProviderError::Unsupported("get_address")),
            get_public_key: Ok(String::new()),
            request_public_key: Ok(ADDR.to_string()),
            calls: Mutex::new(Vec::new()),
        });
        let host = LateHost {
            misses: AtomicU32::new(0),
            threshold: 0,
            provider: provider.clone(),
        };
        let connector = Connector::new(host, StubLedger::default()).with_timing(FAST_POLL, FAST_WAIT, FAST_SETTLE);
        let account = connector.connect().await.unwrap();
        assert_eq!(account.address.as_str(), ADDR);
        let calls = provider.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "show_wallet",
                "get_address",
                "get_public_key",
                "request_public_key"
            ]
        );
    }

    #[tokio::test]
    async fn all_address_methods_exhausted_is_address_unavailable() {
        let provider = Arc::new(ScriptedProvider {
            show_fails: false,
            get_address: Err(ProviderError::Call("denied".to_string())),
            get_public_key: Ok(String::new()),
            request_public_key: Err(ProviderError::Unsupported("request_public_key")),
            calls: Mutex::new(Vec::new()),
        });
        let host = LateHost {
            misses: AtomicU32::new(0),
            threshold: 0,
            provider,
        };
        let connector = Connector::new(host, StubLedger::default()).with_timing(FAST_POLL, FAST_WAIT, FAST_SETTLE);
        assert_eq!(
            connector.connect().await,
            Err(ConnectError::AddressUnavailable)
        );
    }

    #[tokio::test]
    async fn show_wallet_failure_is_swallowed() {
        let provider = Arc::new(ScriptedProvider {
            show_fails: true,
            ..ScriptedProvider::with_address(ADDR)
        });
        let host = LateHost {
            misses: AtomicU32::new(0),
            threshold: 0,
            provider,
        };
        let connector = Connector::new(host, StubLedger::default()).with_timing(FAST_POLL, FAST_WAIT, FAST_SETTLE);
        assert!(connector.connect().await.is_ok());
    }
}
