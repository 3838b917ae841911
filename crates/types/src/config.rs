use crate::network::NETWORK_NAME;
use serde::{Deserialize, Serialize};

/// Deploy output persisted as `contract-config.json` next to the contract
/// directory, and read back by invoke when no key is given explicitly.
/// Last write wins; there is no reconciliation across deploys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    pub contract_id: String,
    pub public_key: String,
    pub network: String,
}

impl DeployConfig {
    pub fn testnet(contract_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            public_key: public_key.into(),
            network: NETWORK_NAME.to_string(),
        }
    }
}
