use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("wallet cannot sign transactions")]
    SigningUnavailable,
    #[error("transaction submission failed: {0}")]
    Submission(String),
    #[error("envelope codec error: {0}")]
    Codec(String),
    #[error("ledger error: {0}")]
    Ledger(String),
    #[error("invalid amount: {0}")]
    Amount(#[from] microvault_types::AmountError),
}

impl From<microvault_horizon::HorizonError> for TxError {
    fn from(err: microvault_horizon::HorizonError) -> Self {
        TxError::Ledger(err.to_string())
    }
}

/// A positional argument of a contract invocation. Numeric amounts arrive
/// already scaled to stroops.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvocationArg {
    I128(i64),
    Sym(String),
    U64(u64),
}

/// Everything a contract invocation needs before signing: who calls, the
/// account sequence, the target contract and function, the arguments, the
/// network binding, and an absolute expiry.
#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationPayload {
    source_account: String,
    sequence: String,
    contract_id: String,
    function: String,
    args: Vec<InvocationArg>,
    network_passphrase: String,
    expires_at: u64,
}

impl InvocationPayload {
    pub fn source_account(&self) -> &str {
        &self.source_account
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[InvocationArg] {
        &self.args
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Serialize into the unsigned hex envelope handed to the provider.
    pub fn encode(&self) -> Result<UnsignedEnvelope, TxError> {
        let bytes = bincode::serialize(self).map_err(|err| TxError::Codec(err.to_string()))?;
        Ok(UnsignedEnvelope(hex::encode(bytes)))
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(envelope: &str) -> Result<Self, TxError> {
        let bytes = hex::decode(envelope).map_err(|err| TxError::Codec(err.to_string()))?;
        bincode::deserialize(&bytes).map_err(|err| TxError::Codec(err.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedEnvelope(String);

impl UnsignedEnvelope {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UnsignedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEnvelope(String);

impl SignedEnvelope {
    pub fn new(envelope: String) -> Self {
        Self(envelope)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SignedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
