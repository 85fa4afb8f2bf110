//! Token metadata catalog
//!
//! The catalog is fetched from its HTTP collaborator at most once per
//! process and cached indefinitely. A failed fetch leaves the cache
//! unpopulated so the next lookup retries.

use crate::types::TokenInfo;
use async_trait::async_trait;
use parking_lot::RwLock;
use solvault_core::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of the static token catalog (HTTP fetch lives behind this seam)
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the complete mint -> metadata catalog
    async fn fetch_catalog(&self) -> Result<HashMap<String, TokenInfo>>;
}

/// Process-wide token metadata cache
pub struct TokenCatalog {
    source: Arc<dyn MetadataSource>,
    cache: RwLock<Option<HashMap<String, TokenInfo>>>,
}

impl TokenCatalog {
    /// Create over a catalog source
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Metadata for a mint, if the catalog knows it
    pub async fn metadata(&self, mint: &str) -> Option<TokenInfo> {
        if self.cache.read().is_none() {
            match self.source.fetch_catalog().await {
                Ok(catalog) => {
                    debug!(entries = catalog.len(), "Token catalog loaded");
                    *self.cache.write() = Some(catalog);
                }
                Err(e) => {
                    warn!("Token catalog fetch failed: {}", e);
                    return None;
                }
            }
        }
        self.cache
            .read()
            .as_ref()
            .and_then(|catalog| catalog.get(mint).cloned())
    }
}

/// Fixed in-memory catalog source
pub struct StaticMetadataSource {
    catalog: HashMap<String, TokenInfo>,
    fetches: std::sync::atomic::AtomicU32,
}

impl StaticMetadataSource {
    /// Create from a fixed catalog
    pub fn new(catalog: HashMap<String, TokenInfo>) -> Self {
        Self {
            catalog,
            fetches: std::sync::atomic::AtomicU32::new(0),
        }
    }

    /// Number of fetches performed
    pub fn fetches(&self) -> u32 {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for StaticMetadataSource {
    async fn fetch_catalog(&self) -> Result<HashMap<String, TokenInfo>> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.catalog.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> TokenInfo {
        TokenInfo {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            logo_uri: None,
            decimals: 6,
        }
    }

    #[tokio::test]
    async fn test_catalog_fetched_once_and_cached() {
        let mut entries = HashMap::new();
        entries.insert("mint-usdc".to_string(), usdc());
        let source = Arc::new(StaticMetadataSource::new(entries));
        let catalog = TokenCatalog::new(source.clone());

        assert_eq!(catalog.metadata("mint-usdc").await, Some(usdc()));
        assert_eq!(catalog.metadata("mint-usdc").await, Some(usdc()));
        assert_eq!(catalog.metadata("unknown-mint").await, None);
        assert_eq!(source.fetches(), 1);
    }

    struct FailingSource;

    #[async_trait]
    impl MetadataSource for FailingSource {
        async fn fetch_catalog(&self) -> Result<HashMap<String, TokenInfo>> {
            Err(solvault_core::Error::Rpc("catalog unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_empty() {
        let catalog = TokenCatalog::new(Arc::new(FailingSource));
        assert_eq!(catalog.metadata("mint-usdc").await, None);
        // Cache stays unpopulated so a later lookup retries the fetch
        assert!(catalog.cache.read().is_none());
    }
}
