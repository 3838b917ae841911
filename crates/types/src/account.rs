use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid account id {0:?}: expected 56 base32 characters starting with 'G'")]
    InvalidAccountId(String),
    #[error("invalid contract id {0:?}: expected 56 base32 characters starting with 'C'")]
    InvalidContractId(String),
}

fn is_strkey(s: &str, prefix: char) -> bool {
    s.len() == 56
        && s.starts_with(prefix)
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
}

/// A ledger account id, the `G...` strkey form handed back by wallet
/// extensions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_strkey(s, 'G') {
            Ok(Self(s.to_string()))
        } else {
            Err(AddressError::InvalidAccountId(s.to_string()))
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deployed contract id, the `C...` strkey form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContractId {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_strkey(s, 'C') {
            Ok(Self(s.to_string()))
        } else {
            Err(AddressError::InvalidContractId(s.to_string()))
        }
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The connected wallet as the UI sees it. Built once on a successful
/// connection and replaced wholesale on reconnect, never mutated field-wise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub address: Address,
    pub balance: String,
}
