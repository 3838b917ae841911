use async_trait::async_trait;
use microvault_types::{Address, DashboardStats, Policy};
use std::time::{SystemTime, UNIX_EPOCH};

/// Where the policy list and dashboard figures come from. The deployed
/// contract has no query surface yet, so the production wiring points this
/// at [`MockPolicySource`] for now.
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn fetch_policies(&self, address: &Address) -> Vec<Policy>;
    async fn fetch_stats(&self, address: &Address) -> DashboardStats;
}

/// Fixed demo data shown to every connected account.
pub struct MockPolicySource;

const SECS_PER_DAY: u64 = 86_400;

#[async_trait]
impl PolicySource for MockPolicySource {
    async fn fetch_policies(&self, _address: &Address) -> Vec<Policy> {
        let now = unix_now();
        vec![
            Policy {
                id: 1,
                label: "Crop Failure".to_string(),
                premium: 0.5,
                coverage: 5.0,
                active: true,
                claimed: false,
                timestamp: now,
            },
            Policy {
                id: 2,
                label: "Flood Protection".to_string(),
                premium: 1.0,
                coverage: 10.0,
                active: true,
                claimed: false,
                timestamp: now.saturating_sub(SECS_PER_DAY),
            },
        ]
    }

    async fn fetch_stats(&self, _address: &Address) -> DashboardStats {
        DashboardStats {
            total_policies: 2,
            total_premiums: 1.5,
            active_claims: 0,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
