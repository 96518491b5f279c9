use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::error::SourceError;
use crate::models::{BestYield, MarketsView, PoolRecord};
use crate::sources::YieldSource;
use super::aggregator::aggregate;
use super::cache::{Freshness, YieldCache};

lazy_static! {
    /// Shown on the markets view when the live source is unreachable
    pub static ref FALLBACK_MARKETS: Vec<PoolRecord> = vec![
        PoolRecord {
            apy_base: Some(3.82),
            ..PoolRecord::new("superlend-usdc", "Etherlink", "superlend", "USDC", 12_400_000.0, 3.82)
        },
        PoolRecord {
            apy_base: Some(3.56),
            ..PoolRecord::new("superlend-usdt", "Etherlink", "superlend", "USDT", 8_700_000.0, 3.56)
        },
        PoolRecord {
            apy_base: Some(2.41),
            ..PoolRecord::new("superlend-xtz", "Etherlink", "superlend", "XTZ", 4_100_000.0, 2.41)
        },
    ];
}

/// Cached access to the yield source plus the derived views
pub struct YieldService {
    source: Arc<dyn YieldSource>,
    cache: Arc<YieldCache>,
    target_symbol: String,
    refresh: Mutex<()>,
}

impl YieldService {
    pub fn new(source: Arc<dyn YieldSource>, cache: Arc<YieldCache>, target_symbol: &str) -> Self {
        Self {
            source,
            cache,
            target_symbol: target_symbol.to_string(),
            refresh: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &YieldCache {
        &self.cache
    }

    /// Current pool set. Fresh entries are served as-is; stale ones trigger a
    /// refetch and are served only if that refetch fails. No retries.
    pub async fn pools(&self) -> Result<Arc<Vec<PoolRecord>>, SourceError> {
        if let Some((pools, Freshness::Fresh)) = self.cache.get() {
            return Ok(pools);
        }

        let _guard = self.refresh.lock().await;
        let cached = self.cache.get();
        if let Some((pools, Freshness::Fresh)) = &cached {
            return Ok(pools.clone());
        }

        match self.source.fetch_pools().await {
            Ok(pools) => {
                tracing::info!("✓ {} returned {} pools", self.source.name(), pools.len());
                Ok(self.cache.insert(pools))
            }
            Err(e) => match cached {
                Some((pools, _)) => {
                    tracing::warn!("{} refetch failed, serving stale snapshot: {}", self.source.name(), e);
                    Ok(pools)
                }
                None => {
                    tracing::warn!("{} fetch failed: {}", self.source.name(), e);
                    Err(e)
                }
            },
        }
    }

    /// Live pools, or the static fallback list when the source fails
    pub async fn markets(&self) -> MarketsView {
        match self.pools().await {
            Ok(pools) => MarketsView { live: true, pools: pools.as_ref().clone() },
            Err(_) => MarketsView { live: false, pools: FALLBACK_MARKETS.clone() },
        }
    }

    /// Recommendation from live data only; a failed fetch yields the default
    pub async fn best_yield(&self) -> BestYield {
        match self.pools().await {
            Ok(pools) => aggregate(&pools, &self.target_symbol),
            Err(_) => aggregate(&[], &self.target_symbol),
        }
    }
}
