use serde::{Deserialize, Serialize};

/// One yield-bearing market snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub pool_id: String,
    pub chain: String,
    pub project: String,
    pub symbol: String,
    pub tvl_usd: f64,
    /// Percent per year, `3.82` means 3.82%
    pub apy: f64,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
}

impl PoolRecord {
    pub fn new(pool_id: &str, chain: &str, project: &str, symbol: &str, tvl_usd: f64, apy: f64) -> Self {
        Self {
            pool_id: pool_id.to_string(),
            chain: chain.to_string(),
            project: project.to_string(),
            symbol: symbol.to_string(),
            tvl_usd,
            apy,
            apy_base: None,
            apy_reward: None,
        }
    }
}

/// Single recommended yield for one asset, derived from a pool set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestYield {
    pub best_apy: Option<f64>,
    pub best_source: Option<String>,
    pub total_tvl_usd: Option<f64>,
    pub display_apy: String,
    pub ranked_pools: Vec<PoolRecord>,
}

/// Markets list plus whether it came from the live source
#[derive(Debug, Clone, Serialize)]
pub struct MarketsView {
    pub live: bool,
    pub pools: Vec<PoolRecord>,
}
