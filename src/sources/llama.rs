use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use crate::config::YieldsConfig;
use crate::error::SourceError;
use crate::models::PoolRecord;
use super::YieldSource;

/// DefiLlama yields API, filtered to one chain and a protocol allow-list
pub struct DefiLlamaSource {
    client: Client,
    endpoint: String,
    chain: String,
    projects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LlamaResponse {
    #[allow(dead_code)]
    status: Option<String>,
    data: Vec<LlamaPool>,
}

#[derive(Debug, Deserialize)]
struct LlamaPool {
    pool: String,
    chain: String,
    project: String,
    symbol: String,
    #[serde(rename = "tvlUsd")]
    tvl_usd: Option<f64>,
    apy: Option<f64>,
    #[serde(rename = "apyBase")]
    apy_base: Option<f64>,
    #[serde(rename = "apyReward")]
    apy_reward: Option<f64>,
}

impl DefiLlamaSource {
    pub fn new(config: &YieldsConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            chain: config.chain.clone(),
            projects: config.projects.clone(),
        })
    }

    fn accepts(&self, pool: &LlamaPool) -> bool {
        pool.chain == self.chain && self.projects.iter().any(|p| *p == pool.project)
    }
}

#[async_trait]
impl YieldSource for DefiLlamaSource {
    fn name(&self) -> &'static str {
        "DefiLlama"
    }

    async fn fetch_pools(&self) -> Result<Vec<PoolRecord>, SourceError> {
        let resp = self.client.get(&self.endpoint)
            .header("Accept", "application/json")
            .send()
            .await?;

        if resp.status() == 429 {
            return Err(SourceError::RateLimit);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status().as_u16()));
        }

        let body: LlamaResponse = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let total = body.data.len();

        let pools: Vec<PoolRecord> = body.data.into_iter()
            .filter(|p| self.accepts(p))
            .filter_map(|p| {
                let apy = p.apy.or_else(|| match (p.apy_base, p.apy_reward) {
                    (None, None) => None,
                    (base, reward) => Some(base.unwrap_or(0.0) + reward.unwrap_or(0.0)),
                });
                let Some(apy) = apy else {
                    tracing::trace!("skipping {} ({}): no APY", p.pool, p.project);
                    return None;
                };
                Some(PoolRecord {
                    pool_id: p.pool,
                    chain: p.chain,
                    project: p.project,
                    symbol: p.symbol,
                    tvl_usd: p.tvl_usd.unwrap_or(0.0).max(0.0),
                    apy,
                    apy_base: p.apy_base,
                    apy_reward: p.apy_reward,
                })
            })
            .collect();

        tracing::debug!("{}: kept {} of {} pools on {}", self.name(), pools.len(), total, self.chain);
        Ok(pools)
    }
}
