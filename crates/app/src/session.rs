use crate::data::PolicySource;
use microvault_horizon::LedgerClient;
use microvault_types::{
    Address, ContractId, DashboardStats, Policy, PolicyRequest, WalletAccount,
    FREIGHTER_DOWNLOAD_URL, INSURANCE_CONTRACT_ID, TESTNET_PASSPHRASE,
};
use microvault_wallet::{ConnectError, Connector, ProviderHost, TxError, Wallet, WalletBuilder};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveTab {
    #[default]
    Dashboard,
    Buy,
    Policies,
}

/// Connect failures collapse into two user-visible treatments: an install
/// call-to-action, or a generic message with retry guidance.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UiError {
    #[error("no wallet extension installed; get one at {FREIGHTER_DOWNLOAD_URL}")]
    WalletNotInstalled,
    #[error("{0}")]
    Other(String),
}

impl From<ConnectError> for UiError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::NotInstalled => UiError::WalletNotInstalled,
            other => UiError::Other(other.to_string()),
        }
    }
}

impl From<TxError> for UiError {
    fn from(err: TxError) -> Self {
        UiError::Other(err.to_string())
    }
}

/// One user's UI session: connection state, policy list, active tab.
///
/// Actions never panic across this boundary; failures land in `last_error`
/// for rendering. The busy flag drops duplicate triggers from the same
/// control while an action is in flight.
pub struct Session<L, P>
where
    L: LedgerClient + Clone,
    P: PolicySource,
{
    connector: Connector<Arc<dyn ProviderHost>, L>,
    ledger: L,
    source: P,
    account: Option<WalletAccount>,
    policies: Vec<Policy>,
    stats: DashboardStats,
    tab: ActiveTab,
    busy: bool,
    last_error: Option<UiError>,
}

impl<L, P> Session<L, P>
where
    L: LedgerClient + Clone,
    P: PolicySource,
{
    pub fn new(host: Arc<dyn ProviderHost>, ledger: L, source: P) -> Self {
        let connector = Connector::new(host, ledger.clone());
        Self::with_connector(connector, ledger, source)
    }

    pub fn with_connector(
        connector: Connector<Arc<dyn ProviderHost>, L>,
        ledger: L,
        source: P,
    ) -> Self {
        Self {
            connector,
            ledger,
            source,
            account: None,
            policies: Vec::new(),
            stats: DashboardStats::default(),
            tab: ActiveTab::default(),
            busy: false,
            last_error: None,
        }
    }

    pub fn account(&self) -> Option<&WalletAccount> {
        self.account.as_ref()
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ActiveTab) {
        self.tab = tab;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&UiError> {
        self.last_error.as_ref()
    }

    /// Detect and connect a wallet, then pull the account's policy data.
    pub async fn connect(&mut self) {
        if !self.begin() {
            return;
        }
        match self.connector.connect().await {
            Ok(account) => {
                let address = account.address.clone();
                self.account = Some(account);
                self.last_error = None;
                self.refresh(&address).await;
            }
            Err(err) => {
                self.last_error = Some(err.into());
            }
        }
        self.finish();
    }

    /// Purchase a policy with the connected wallet.
    pub async fn buy(&mut self, request: PolicyRequest) {
        if !self.begin() {
            return;
        }
        let outcome = self.buy_inner(&request).await;
        self.record(outcome);
        self.finish();
    }

    /// File a claim against one of the listed policies.
    pub async fn claim(&mut self, policy_id: u64) {
        if !self.begin() {
            return;
        }
        let outcome = self.claim_inner(policy_id).await;
        self.record(outcome);
        self.finish();
    }

    async fn buy_inner(&mut self, request: &PolicyRequest) -> Result<(), UiError> {
        request
            .validate()
            .map_err(|err| UiError::Other(err.to_string()))?;
        let wallet = self.wallet()?;
        wallet
            .buy_insurance(&request.premium, &request.coverage, request.policy_type)
            .await?;
        let address = wallet.address().clone();
        self.refresh(&address).await;
        Ok(())
    }

    async fn claim_inner(&mut self, policy_id: u64) -> Result<(), UiError> {
        let wallet = self.wallet()?;
        wallet.claim_insurance(policy_id).await?;
        let address = wallet.address().clone();
        self.refresh(&address).await;
        Ok(())
    }

    fn wallet(&self) -> Result<Wallet<L>, UiError> {
        let account = self
            .account
            .as_ref()
            .ok_or_else(|| UiError::Other("connect a wallet first".to_string()))?;
        let provider = self
            .connector
            .provider()
            .ok_or(UiError::WalletNotInstalled)?;
        let contract_id: ContractId = INSURANCE_CONTRACT_ID
            .parse()
            .map_err(|err: microvault_types::AddressError| UiError::Other(err.to_string()))?;
        WalletBuilder::default()
            .provider(provider)
            .ledger(self.ledger.clone())
            .address(account.address.clone())
            .contract_id(contract_id)
            .network_passphrase(TESTNET_PASSPHRASE.to_string())
            .build()
            .map_err(|err| UiError::Other(err.to_string()))
    }

    async fn refresh(&mut self, address: &Address) {
        self.policies = self.source.fetch_policies(address).await;
        self.stats = self.source.fetch_stats(address).await;
    }

    fn record(&mut self, outcome: Result<(), UiError>) {
        match outcome {
            Ok(()) => self.last_error = None,
            Err(err) => {
                tracing::warn!(%err, "action failed");
                self.last_error = Some(err);
            }
        }
    }

    fn begin(&mut self) -> bool {
        if self.busy {
            tracing::debug!("duplicate action dropped, another is in flight");
            return false;
        }
        self.busy = true;
        true
    }

    fn finish(&mut self) {
        self.busy = false;
    }
}
