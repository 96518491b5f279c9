//! In-process fakes for the HTTP collaborators used by unit tests

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use alloy_primitives::Bytes;
use alloy_sol_types::SolCall;
use serde::Deserialize;
use crate::models::text::encode_text;
use crate::models::{Address, U256};
use crate::sources::abi::IEscrow;

pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn serve_json(body: Value) -> String {
    let router = Router::new().route(
        "/pools",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    format!("{}/pools", serve(router).await)
}

pub async fn serve_status(code: u16) -> String {
    let router = Router::new().route(
        "/pools",
        get(move || async move { StatusCode::from_u16(code).unwrap() }),
    );
    format!("{}/pools", serve(router).await)
}

/// JSON-RPC node answering `eth_call` from a fixed (to, calldata) table.
/// Unknown calls revert.
#[derive(Default)]
pub struct FakeChain {
    responses: HashMap<(Address, Bytes), Bytes>,
}

#[derive(Deserialize)]
struct CallParams {
    to: Address,
    data: Bytes,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, to: Address, calldata: Vec<u8>, ret: Vec<u8>) -> Self {
        self.responses.insert((to, Bytes::from(calldata)), Bytes::from(ret));
        self
    }

    pub async fn serve(self) -> String {
        let router = Router::new()
            .route("/", post(rpc_handler))
            .with_state(Arc::new(self.responses));
        serve(router).await
    }
}

async fn rpc_handler(
    State(responses): State<Arc<HashMap<(Address, Bytes), Bytes>>>,
    Json(req): Json<Value>,
) -> Json<Value> {
    let id = req["id"].clone();
    let ret = serde_json::from_value::<CallParams>(req["params"][0].clone())
        .ok()
        .and_then(|p| responses.get(&(p.to, p.data)).cloned());
    match ret {
        Some(ret) => Json(json!({ "jsonrpc": "2.0", "id": id, "result": ret })),
        None => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": 3, "message": "execution reverted" }
        })),
    }
}

/// ABI-encoded single `uint256` return
pub fn uint_return(value: u64) -> Vec<u8> {
    U256::from(value).to_be_bytes::<32>().to_vec()
}

/// ABI-encoded return of `deposits(uint256)`
pub fn deposit_return(depositor: Address, amount: u64, payee: &str, method: &str, accepting: bool) -> Vec<u8> {
    let amount = U256::from(amount);
    IEscrow::depositsCall::abi_encode_returns(&(
        depositor,
        amount,
        amount,
        encode_text(payee).unwrap(),
        encode_text(method).unwrap(),
        accepting,
    ))
}
