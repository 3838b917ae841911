use crate::provider::{ProviderError, WalletProvider};
use crate::tx::{InvocationArg, InvocationPayloadBuilder, SignedEnvelope, TxError};
use derive_builder::Builder;
use microvault_horizon::{LedgerClient, SubmitReceipt};
use microvault_types::{stroops, Address, ContractId, PolicyType, TX_TIMEOUT_SECS};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub type WalletResult<T> = Result<T, TxError>;

/// Builds, signs, and submits contract invocations for a connected account.
///
/// Signing stays inside the wallet extension; this type never sees a key.
/// Nothing is applied locally before the network reports success, so callers
/// refetch authoritative state after a receipt comes back.
#[derive(Builder, Clone)]
pub struct Wallet<L>
where
    L: LedgerClient + Clone,
{
    provider: Arc<dyn WalletProvider>,
    ledger: L,
    address: Address,
    contract_id: ContractId,
    network_passphrase: String,
}

impl<L: LedgerClient + Clone> Wallet<L> {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }

    /// Build an invocation against the current account sequence, have the
    /// provider sign it, and submit. Submission failures are reported once
    /// and never retried.
    pub async fn build_and_submit(
        &self,
        function: &str,
        args: Vec<InvocationArg>,
    ) -> WalletResult<SubmitReceipt> {
        let record = self.ledger.load_account(&self.address).await?;
        let expires_at = unix_now() + TX_TIMEOUT_SECS;

        let payload = InvocationPayloadBuilder::default()
            .source_account(self.address.to_string())
            .sequence(record.sequence)
            .contract_id(self.contract_id.to_string())
            .function(function.to_string())
            .args(args)
            .network_passphrase(self.network_passphrase.clone())
            .expires_at(expires_at)
            .build()
            .map_err(|err| TxError::Codec(err.to_string()))?;

        let unsigned = payload.encode()?;
        tracing::debug!(function, expires_at, "requesting signature from wallet");
        let signed = match self
            .provider
            .sign_envelope(unsigned.as_str(), &self.network_passphrase)
            .await
        {
            Ok(envelope) => SignedEnvelope::new(envelope),
            Err(ProviderError::Unsupported(_)) => return Err(TxError::SigningUnavailable),
            Err(err) => return Err(TxError::Submission(format!("signing failed: {err}"))),
        };

        let receipt = self
            .ledger
            .submit(signed.as_str())
            .await
            .map_err(|err| TxError::Submission(err.to_string()))?;
        tracing::info!(id = %receipt.id, function, "transaction accepted");
        Ok(receipt)
    }

    /// Purchase a policy: amounts are scaled to stroops exactly and the
    /// policy type travels as its contract symbol.
    pub async fn buy_insurance(
        &self,
        premium: &str,
        coverage: &str,
        policy_type: PolicyType,
    ) -> WalletResult<SubmitReceipt> {
        let premium_stroops = stroops::to_stroops(premium)?;
        let coverage_stroops = stroops::to_stroops(coverage)?;
        self.build_and_submit(
            "buy_insurance",
            vec![
                InvocationArg::I128(premium_stroops),
                InvocationArg::I128(coverage_stroops),
                InvocationArg::Sym(policy_type.as_symbol().to_string()),
            ],
        )
        .await
    }

    /// File a claim against an existing policy.
    pub async fn claim_insurance(&self, policy_id: u64) -> WalletResult<SubmitReceipt> {
        self.build_and_submit("trigger_payout", vec![InvocationArg::U64(policy_id)])
            .await
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
