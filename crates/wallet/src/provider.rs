use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("wallet does not support {0}")]
    Unsupported(&'static str),
    #[error("wallet call failed: {0}")]
    Call(String),
}

/// The narrow capability surface of an injected wallet extension.
///
/// Every method except `name` is optional: the default implementations
/// answer [`ProviderError::Unsupported`], so an adapter only overrides what
/// the underlying extension actually exposes.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Ask the extension to surface its UI so the user can approve access.
    async fn show_wallet(&self) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported("show_wallet"))
    }

    async fn get_address(&self) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported("get_address"))
    }

    async fn get_public_key(&self) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported("get_public_key"))
    }

    async fn request_public_key(&self) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported("request_public_key"))
    }

    /// Sign a hex envelope against the given network passphrase, returning
    /// the signed envelope.
    async fn sign_envelope(
        &self,
        envelope: &str,
        network_passphrase: &str,
    ) -> Result<String, ProviderError> {
        let _ = (envelope, network_passphrase);
        Err(ProviderError::Unsupported("sign_envelope"))
    }
}

/// The single point of access to the global injection surface. Nothing else
/// in the workspace reads the environment for providers.
pub trait ProviderHost: Send + Sync {
    fn lookup(&self) -> Option<Arc<dyn WalletProvider>>;
}

impl<T: ProviderHost + ?Sized> ProviderHost for Arc<T> {
    fn lookup(&self) -> Option<Arc<dyn WalletProvider>> {
        (**self).lookup()
    }
}

/// Injection keys in lookup order. Newer extensions register the api object
/// first, older ones only the bare names.
pub const PROVIDER_PRIORITY: [&str; 3] = ["freighterApi", "stellar", "freighter"];

/// In-process provider registry. Extensions (and tests) inject under one of
/// the well-known keys; `lookup` returns the highest-priority entry.
#[derive(Default)]
pub struct ProviderRegistry {
    inner: Mutex<HashMap<String, Arc<dyn WalletProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, key: &str, provider: Arc<dyn WalletProvider>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.insert(key.to_string(), provider);
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.remove(key);
        }
    }
}

impl ProviderHost for ProviderRegistry {
    fn lookup(&self) -> Option<Arc<dyn WalletProvider>> {
        let inner = self.inner.lock().ok()?;
        PROVIDER_PRIORITY
            .iter()
            .find_map(|key| inner.get(*key).cloned())
    }
}
