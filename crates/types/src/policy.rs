use crate::stroops::{self, AmountError, STROOPS_PER_UNIT};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown policy type: {0:?}")]
    UnknownPolicyType(String),
    #[error("premium must be at least 0.10")]
    PremiumTooLow,
    #[error("coverage must be at least 1")]
    CoverageTooLow,
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// The products the deployed contract understands. The wire form is the
/// contract symbol, e.g. `crop_failure`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    CropFailure,
    FloodProtection,
    Accident,
    Device,
}

impl PolicyType {
    pub fn as_symbol(&self) -> &'static str {
        match self {
            PolicyType::CropFailure => "crop_failure",
            PolicyType::FloodProtection => "flood_protection",
            PolicyType::Accident => "accident",
            PolicyType::Device => "device",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PolicyType::CropFailure => "Crop Failure",
            PolicyType::FloodProtection => "Flood Protection",
            PolicyType::Accident => "Accident",
            PolicyType::Device => "Device",
        }
    }
}

impl Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

impl FromStr for PolicyType {
    type Err = PolicyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crop_failure" => Ok(PolicyType::CropFailure),
            "flood_protection" => Ok(PolicyType::FloodProtection),
            "accident" => Ok(PolicyType::Accident),
            "device" => Ok(PolicyType::Device),
            other => Err(PolicyError::UnknownPolicyType(other.to_string())),
        }
    }
}

/// The transient purchase form: amounts stay as the user typed them until
/// the wallet scales them for the invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequest {
    pub policy_type: PolicyType,
    pub premium: String,
    pub coverage: String,
}

impl PolicyRequest {
    /// Minimums enforced before anything reaches the network: premium of
    /// 0.10 and coverage of 1 whole unit.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if stroops::to_stroops(&self.premium)? < STROOPS_PER_UNIT / 10 {
            return Err(PolicyError::PremiumTooLow);
        }
        if stroops::to_stroops(&self.coverage)? < STROOPS_PER_UNIT {
            return Err(PolicyError::CoverageTooLow);
        }
        Ok(())
    }
}

/// A purchased policy as rendered in the policy list. Display-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: u64,
    pub label: String,
    pub premium: f64,
    pub coverage: f64,
    pub active: bool,
    pub claimed: bool,
    pub timestamp: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_policies: u32,
    pub total_premiums: f64,
    pub active_claims: u32,
}
