use alloy_primitives::Bytes;
use alloy_sol_types::SolCall;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use crate::error::SourceError;
use crate::models::Address;

/// Read-only JSON-RPC client; only `eth_call` is needed
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Bytes>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Encodes `call`, runs it against `to` and decodes the typed return
    pub async fn call<C: SolCall>(&self, to: &Address, call: &C) -> Result<C::Return, SourceError> {
        let out = self.eth_call(to, call.abi_encode()).await?;
        Ok(C::abi_decode_returns(&out, true)?)
    }

    async fn eth_call(&self, to: &Address, data: Vec<u8>) -> Result<Bytes, SourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [
                { "to": to, "data": Bytes::from(data) },
                "latest"
            ],
        });

        let resp = self.client.post(&self.url)
            .json(&body)
            .send()
            .await?;

        if resp.status() == 429 {
            return Err(SourceError::RateLimit);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status().as_u16()));
        }

        let rpc: RpcResponse = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if let Some(err) = rpc.error {
            return Err(SourceError::Rpc { code: err.code, message: err.message });
        }

        rpc.result
            .ok_or_else(|| SourceError::Parse("response has neither result nor error".to_string()))
    }
}
