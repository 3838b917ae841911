use crate::error::{HorizonError, Result};
use async_trait::async_trait;
use microvault_types::{Address, FRIENDBOT_URL, HORIZON_URL};
use serde::{Deserialize, Serialize};

/// The ledger query/submit seam the wallet and session layers consume.
/// Production uses [`HorizonClient`]; tests hand-roll implementations.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn load_account(&self, address: &Address) -> Result<AccountRecord>;
    async fn submit(&self, envelope: &str) -> Result<SubmitReceipt>;
}

/// Subset of the ledger's account resource the client cares about.
/// Field names match the wire form, so no renames.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    pub account_id: String,
    pub sequence: String,
    #[serde(default)]
    pub balances: Vec<BalanceLine>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceLine {
    pub balance: String,
    #[serde(default)]
    pub asset_type: String,
}

impl AccountRecord {
    /// First balance line, or "0" when the account holds nothing yet.
    pub fn native_balance(&self) -> &str {
        self.balances
            .first()
            .map(|line| line.balance.as_str())
            .unwrap_or("0")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubmitReceipt {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub hash: String,
}

/// REST client for the ledger endpoint.
///
/// Base URL comes from the `HORIZON_URL` environment variable, falling back
/// to the public testnet endpoint.
#[derive(Clone, Debug)]
pub struct HorizonClient {
    base_url: String,
    http: reqwest::Client,
}

impl Default for HorizonClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HorizonClient {
    pub fn new() -> Self {
        let base_url = std::env::var("HORIZON_URL").unwrap_or_else(|_| HORIZON_URL.to_string());
        Self::with_base_url(&base_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check for non-2xx HTTP status and return [`HorizonError::Api`].
    pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status().as_u16();
        if (200..300).contains(&status) {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(HorizonError::Api { status, body })
        }
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, address: &Address) -> Result<AccountRecord> {
        let url = self.url(&format!("accounts/{address}"));
        tracing::debug!(%url, "loading account");
        let resp = self.http.get(&url).send().await?;
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn submit(&self, envelope: &str) -> Result<SubmitReceipt> {
        let url = self.url("transactions");
        tracing::debug!(%url, "submitting transaction envelope");
        let resp = self
            .http
            .post(&url)
            .form(&[("tx", envelope)])
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Ask the testnet faucet to fund a new account. Returns the raw response
/// body; callers decide whether a failure is fatal.
pub async fn fund_account(address: &Address) -> Result<String> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client");
    let url = format!("{FRIENDBOT_URL}?addr={address}");
    tracing::debug!(%url, "requesting faucet funding");
    let resp = http.get(&url).send().await?;
    let resp = HorizonClient::check_status(resp).await?;
    Ok(resp.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_resource() {
        let body = r#"{
            "account_id": "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR",
            "sequence": "1099511627776",
            "balances": [
                { "balance": "100.0000000", "asset_type": "native" }
            ]
        }"#;
        let record: AccountRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.sequence, "1099511627776");
        assert_eq!(record.native_balance(), "100.0000000");
    }

    #[test]
    fn fresh_account_has_zero_native_balance() {
        let record = AccountRecord {
            sequence: "0".to_string(),
            ..Default::default()
        };
        assert_eq!(record.native_balance(), "0");
    }

    #[test]
    fn joins_urls_without_doubled_slashes() {
        let client = HorizonClient::with_base_url("https://horizon-testnet.stellar.org/");
        assert_eq!(
            client.url("/accounts/GABC"),
            "https://horizon-testnet.stellar.org/accounts/GABC"
        );
        assert_eq!(
            client.url("transactions"),
            "https://horizon-testnet.stellar.org/transactions"
        );
    }
}
