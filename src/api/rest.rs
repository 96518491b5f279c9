use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use crate::error::{SourceError, ValidationError};
use alloy_primitives::Bytes;
use crate::models::address;
use crate::models::usdc::format_usdc;
use crate::models::{AccountSummary, Address, DepositDetail, OfferList, OfferView, Recipient, U256};
use crate::services::validation::{validate_buy_amount, validate_recipient, validate_amount};
use crate::services::{OfferCollector, RecipientStore, YieldService};
use crate::sources::abi::{ContractKind, WriteCall};
use crate::sources::escrow::EscrowContract;
use crate::sources::token::TokenContracts;
use super::websocket::ws_handler;

pub struct AppState {
    pub yields: Arc<YieldService>,
    pub offers: Arc<OfferCollector>,
    pub escrow: Arc<EscrowContract>,
    pub tokens: Arc<TokenContracts>,
    pub recipients: Arc<RecipientStore>,
    pub usdc_address: Option<Address>,
}

pub enum ApiError {
    Validation { field: &'static str, error: ValidationError },
    Source(SourceError),
    NotFound(String),
}

impl ApiError {
    fn field(field: &'static str) -> impl FnOnce(ValidationError) -> ApiError {
        move |error| ApiError::Validation { field, error }
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        ApiError::Source(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { field, error } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "error": error.to_string(), "field": field }),
            ),
            ApiError::Source(e @ SourceError::NotConfigured(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "error": e.to_string() }),
            ),
            ApiError::Source(e) => {
                tracing::warn!("upstream failure: {}", e);
                (StatusCode::BAD_GATEWAY, serde_json::json!({ "error": e.to_string() }))
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": format!("{} not found", what) }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

/// GET /yields/markets - live pools, or the static list when the source is down
async fn yield_markets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.yields.markets().await)
}

/// GET /yields/best
async fn best_yield(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.yields.best_yield().await)
}

/// GET /offers - whatever has loaded so far
async fn offers(State(state): State<Arc<AppState>>) -> Json<OfferList> {
    Json(state.offers.offer_list())
}

/// POST /offers/refresh
async fn refresh_offers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let result = state.offers.refresh(true).await?;
    Ok(Json(result))
}

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    address::parse_address(raw).map_err(ApiError::field("address"))
}

/// GET /deposits/:id
async fn deposit_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<DepositDetail>, ApiError> {
    let deposit = state.offers.deposit(id).await?;
    if deposit.depositor.is_zero() {
        return Err(ApiError::NotFound(format!("deposit {}", id)));
    }
    let (current_value, yield_earned) =
        tokio::try_join!(state.escrow.deposit_value(id), state.escrow.deposit_yield(id))?;
    Ok(Json(DepositDetail {
        offer: deposit.view(),
        current_value,
        current_value_display: format_usdc(current_value),
        yield_earned,
        yield_earned_display: format_usdc(yield_earned),
    }))
}

/// POST /deposits/:id/refresh - after a confirmed write to this deposit
async fn refresh_deposit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<OfferView>, ApiError> {
    let deposit = state.offers.reload(id).await?;
    Ok(Json(deposit.view()))
}

/// GET /accounts/:address
async fn account_summary(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<AccountSummary>, ApiError> {
    let address = parse_address(&raw)?;
    let vault = state.tokens.vault_address().ok_or(SourceError::NotConfigured("vault"))?;
    let escrow = state.escrow.address().ok_or(SourceError::NotConfigured("escrow"))?;

    let (usdc_balance, vault_shares, vault_allowance, escrow_allowance, deposit_ids) = tokio::try_join!(
        state.tokens.usdc_balance(&address),
        state.tokens.vault_shares(&address),
        state.tokens.usdc_allowance(&address, &vault),
        state.tokens.usdc_allowance(&address, &escrow),
        state.escrow.account_deposits(&address),
    )?;
    let vault_assets = if vault_shares.is_zero() {
        U256::ZERO
    } else {
        state.tokens.convert_to_assets(vault_shares).await?
    };

    Ok(Json(AccountSummary {
        address,
        usdc_balance,
        usdc_balance_display: format_usdc(usdc_balance),
        vault_shares,
        vault_assets,
        vault_assets_display: format_usdc(vault_assets),
        vault_allowance,
        escrow_allowance,
        deposit_ids,
    }))
}

/// GET /vault
async fn vault_overview(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let total_assets = state.tokens.total_assets().await?;
    Ok(Json(serde_json::json!({
        "address": state.tokens.vault_address(),
        "total_assets": total_assets.to_string(),
        "total_assets_display": format_usdc(total_assets),
    })))
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    sender: String,
    recipient: String,
    amount: String,
}

#[derive(Debug, Serialize)]
struct ValidAmount {
    amount: u64,
    amount_display: String,
}

/// POST /validate/send - recipient is checked before any balance read
async fn validate_send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<ValidAmount>, ApiError> {
    let sender = parse_address(&req.sender)?;
    validate_recipient(&req.recipient, Some(&sender)).map_err(ApiError::field("recipient"))?;
    let balance = state.tokens.usdc_balance(&sender).await?;
    let amount = validate_amount(&req.amount, balance).map_err(ApiError::field("amount"))?;
    Ok(Json(ValidAmount { amount, amount_display: format_usdc(amount) }))
}

#[derive(Debug, Deserialize)]
struct BuyRequest {
    deposit_id: u64,
    amount: String,
}

/// POST /validate/buy
async fn validate_buy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BuyRequest>,
) -> Result<Json<ValidAmount>, ApiError> {
    let deposit = state.offers.deposit(req.deposit_id).await?;
    if !deposit.is_active() {
        return Err(ApiError::NotFound(format!("offer {}", req.deposit_id)));
    }
    let amount = validate_buy_amount(&req.amount, &deposit).map_err(ApiError::field("amount"))?;
    Ok(Json(ValidAmount { amount, amount_display: format_usdc(amount) }))
}

/// GET /recipients
async fn list_recipients(State(state): State<Arc<AppState>>) -> Json<Vec<Recipient>> {
    Json(state.recipients.list())
}

#[derive(Debug, Deserialize)]
struct RecordRecipient {
    address: String,
    label: Option<String>,
}

/// POST /recipients - after a confirmed send
async fn record_recipient(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordRecipient>,
) -> Result<Json<Vec<Recipient>>, ApiError> {
    parse_address(&req.address)?;
    Ok(Json(state.recipients.record(&req.address, req.label.as_deref()).await))
}

/// DELETE /recipients/:address
async fn remove_recipient(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.recipients.remove(&address).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("recipient {}", address)))
    }
}

#[derive(Debug, Serialize)]
struct TxRequest {
    to: Address,
    data: Bytes,
}

/// POST /tx - calldata for the wallet to sign; nothing is submitted here
async fn build_tx(
    State(state): State<Arc<AppState>>,
    Json(call): Json<WriteCall>,
) -> Result<Json<TxRequest>, ApiError> {
    let to = match call.target() {
        ContractKind::Usdc => state.usdc_address.ok_or(SourceError::NotConfigured("usdc"))?,
        ContractKind::Vault => state.tokens.vault_address().ok_or(SourceError::NotConfigured("vault"))?,
        ContractKind::Escrow => state.escrow.address().ok_or(SourceError::NotConfigured("escrow"))?,
    };
    let data = call.calldata().map_err(ApiError::field("call"))?;
    Ok(Json(TxRequest { to, data: Bytes::from(data) }))
}

/// GET /stats
async fn stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let collector = state.offers.stats();
    Json(serde_json::json!({
        "cached_pools": state.yields.cache().len(),
        "tracked_deposits": state.offers.tracked(),
        "pending_deposits": state.offers.pending(),
        "active_offers": state.offers.offer_list().offers.len(),
        "refreshes": collector.refreshes.load(Ordering::Relaxed),
        "deposits_loaded": collector.loaded.load(Ordering::Relaxed),
        "deposit_failures": collector.failed.load(Ordering::Relaxed),
        "recipients": state.recipients.list().len(),
    }))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/yields/markets", get(yield_markets))
        .route("/yields/best", get(best_yield))
        .route("/offers", get(offers))
        .route("/offers/refresh", post(refresh_offers))
        .route("/deposits/:id", get(deposit_detail))
        .route("/deposits/:id/refresh", post(refresh_deposit))
        .route("/accounts/:address", get(account_summary))
        .route("/vault", get(vault_overview))
        .route("/validate/send", post(validate_send))
        .route("/validate/buy", post(validate_buy))
        .route("/recipients", get(list_recipients).post(record_recipient))
        .route("/recipients/:address", delete(remove_recipient))
        .route("/tx", post(build_tx))
        .route("/stats", get(stats))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode as Status;
    use serde_json::{json, Value};
    use std::time::Duration;
    use crate::config::EscrowConfig;
    use crate::models::PoolRecord;
    use crate::services::{DepositCache, YieldCache};
    use crate::sources::abi::{IEscrow, IUsdc, IVault};
    use alloy_primitives::hex;
    use alloy_sol_types::SolCall;
    use crate::sources::rpc::RpcClient;
    use crate::sources::{DepositReader, YieldSource};
    use crate::testing::{deposit_return, serve, uint_return, FakeChain};

    const USDC: Address = Address::repeat_byte(0x11);
    const VAULT: Address = Address::repeat_byte(0x22);
    const ESCROW: Address = Address::repeat_byte(0x33);
    const ME: &str = "0x5c8e1a3d7b9f2e4a6d0c8f1b3a5e7c9d2f4b6a83";
    const FRIEND: &str = "0x2d7f4b6a8e1c3a5e9c0d2f4b6a8d0e3c5f7b9a24";

    struct FixedPools;

    #[async_trait]
    impl YieldSource for FixedPools {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_pools(&self) -> Result<Vec<PoolRecord>, SourceError> {
            Ok(vec![
                PoolRecord::new("a", "Etherlink", "superlend", "USDC", 1_000_000.0, 3.2),
                PoolRecord::new("b", "Etherlink", "gearbox", "USDC", 500_000.0, 5.1),
            ])
        }
    }

    async fn app(chain: FakeChain, usdc: Option<Address>) -> String {
        let rpc = Arc::new(RpcClient::new(&chain.serve().await, Duration::from_secs(5)).unwrap());
        let escrow = Arc::new(EscrowContract::new(rpc.clone(), Some(ESCROW)));
        let reader: Arc<dyn DepositReader> = escrow.clone();
        let offers = Arc::new(OfferCollector::new(
            reader,
            Arc::new(DepositCache::new()),
            &EscrowConfig::default(),
        ));
        let cache = Arc::new(YieldCache::new(Duration::from_secs(300), Duration::from_secs(600)));
        let state = Arc::new(AppState {
            yields: Arc::new(YieldService::new(Arc::new(FixedPools), cache, "USDC")),
            offers,
            escrow,
            tokens: Arc::new(TokenContracts::new(rpc, usdc, Some(VAULT))),
            recipients: Arc::new(RecipientStore::in_memory(10)),
            usdc_address: usdc,
        });
        serve(create_router(state)).await
    }

    fn me() -> Address {
        address::parse_address(ME).unwrap()
    }

    fn as_address(value: &Value) -> Address {
        address::parse_address(value.as_str().unwrap()).unwrap()
    }

    /// Every read `/accounts/:address` makes, with the allowance to the escrow configurable
    fn account_chain(escrow_allowance: Vec<u8>) -> FakeChain {
        let ids = IEscrow::getAccountDepositsCall::abi_encode_returns(&(vec![U256::from(4u64), U256::from(7u64)],));
        FakeChain::new()
            .respond(USDC, IUsdc::balanceOfCall { account: me() }.abi_encode(), uint_return(2_500_000))
            .respond(VAULT, IVault::balanceOfCall { account: me() }.abi_encode(), uint_return(0))
            .respond(
                USDC,
                IUsdc::allowanceCall { owner: me(), spender: VAULT }.abi_encode(),
                uint_return(0),
            )
            .respond(
                USDC,
                IUsdc::allowanceCall { owner: me(), spender: ESCROW }.abi_encode(),
                escrow_allowance,
            )
            .respond(ESCROW, IEscrow::getAccountDepositsCall { account: me() }.abi_encode(), ids)
    }

    #[tokio::test]
    async fn best_yield_endpoint() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        let body: Value = reqwest::get(format!("{}/yields/best", base)).await.unwrap().json().await.unwrap();
        assert_eq!(body["bestApy"], json!(5.1));
        assert_eq!(body["bestSource"], json!("Gearbox"));
        assert_eq!(body["displayApy"], json!("~5.1%"));
        assert_eq!(body["totalTvlUsd"], json!(1_500_000.0));
    }

    #[tokio::test]
    async fn offers_after_refresh() {
        let chain = FakeChain::new()
            .respond(ESCROW, IEscrow::depositCounterCall {}.abi_encode(), uint_return(2))
            .respond(
                ESCROW,
                IEscrow::depositsCall { depositId: U256::from(1u64) }.abi_encode(),
                deposit_return(me(), 5_000_000, "@me", "Wise", true),
            )
            .respond(
                ESCROW,
                IEscrow::depositsCall { depositId: U256::from(2u64) }.abi_encode(),
                deposit_return(me(), 9_000_000, "@me", "Revolut", false),
            );
        let base = app(chain, Some(USDC)).await;
        let client = reqwest::Client::new();

        let refreshed: Value = client.post(format!("{}/offers/refresh", base)).send().await.unwrap().json().await.unwrap();
        assert_eq!(refreshed["counter"], json!(2));
        assert_eq!(refreshed["loaded"], json!(2));

        let list: Value = client.get(format!("{}/offers", base)).send().await.unwrap().json().await.unwrap();
        assert_eq!(list["source"], json!("live"));
        let offers = list["offers"].as_array().unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0]["id"], json!(1));
        assert_eq!(offers[0]["payment_method"], json!("Wise"));
        assert_eq!(offers[0]["amount"], json!("5000000"));
        assert_eq!(offers[0]["amount_display"], json!("5.00"));
        assert_eq!(as_address(&offers[0]["depositor"]), me());
    }

    #[tokio::test]
    async fn self_send_rejected_before_balance_read() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/validate/send", base))
            .json(&json!({ "sender": ME, "recipient": ME.to_uppercase().replacen("0X", "0x", 1), "amount": "1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), Status::UNPROCESSABLE_ENTITY);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], json!("Cannot send to yourself"));
        assert_eq!(body["field"], json!("recipient"));
    }

    #[tokio::test]
    async fn send_checks_balance() {
        let chain = FakeChain::new().respond(
            USDC,
            IUsdc::balanceOfCall { account: me() }.abi_encode(),
            uint_return(100_000_000),
        );
        let base = app(chain, Some(USDC)).await;
        let client = reqwest::Client::new();
        let url = format!("{}/validate/send", base);

        let resp = client
            .post(&url)
            .json(&json!({ "sender": ME, "recipient": FRIEND, "amount": "150.00" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), Status::UNPROCESSABLE_ENTITY);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], json!("Insufficient balance (100.00 USDC)"));

        let ok: Value = client
            .post(&url)
            .json(&json!({ "sender": ME, "recipient": FRIEND, "amount": "40.5" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ok["amount"], json!(40_500_000));
    }

    #[tokio::test]
    async fn account_summary_reads_all_balances() {
        let base = app(account_chain(uint_return(1_000_000)), Some(USDC)).await;

        let body: Value = reqwest::get(format!("{}/accounts/{}", base, ME)).await.unwrap().json().await.unwrap();
        assert_eq!(body["usdc_balance"], json!("2500000"));
        assert_eq!(body["usdc_balance_display"], json!("2.50"));
        assert_eq!(body["vault_assets"], json!("0"));
        assert_eq!(body["escrow_allowance"], json!("1000000"));
        assert_eq!(body["deposit_ids"], json!([4, 7]));
    }

    #[tokio::test]
    async fn unlimited_allowance_is_reported_not_rejected() {
        let base = app(account_chain(vec![0xff; 32]), Some(USDC)).await;

        let resp = reqwest::get(format!("{}/accounts/{}", base, ME)).await.unwrap();
        assert_eq!(resp.status(), Status::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["escrow_allowance"], json!(U256::MAX.to_string()));
        assert_eq!(
            body["escrow_allowance"],
            json!("115792089237316195423570985008687907853269984665640564039457584007913129639935")
        );
    }

    #[tokio::test]
    async fn bad_checksum_account_address() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        // valid digits, one letter in the wrong case
        let resp = reqwest::get(format!("{}/accounts/0x5C8E1A3D7B9F2E4a6D0c8F1B3A5E7c9d2f4B6A83", base))
            .await
            .unwrap();
        assert_eq!(resp.status(), Status::UNPROCESSABLE_ENTITY);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["field"], json!("address"));
    }

    #[tokio::test]
    async fn vault_overview_reports_total_assets() {
        let chain = FakeChain::new().respond(
            VAULT,
            IVault::totalAssetsCall {}.abi_encode(),
            uint_return(1_234_567_890_000),
        );
        let base = app(chain, Some(USDC)).await;
        let body: Value = reqwest::get(format!("{}/vault", base)).await.unwrap().json().await.unwrap();
        assert_eq!(as_address(&body["address"]), VAULT);
        assert_eq!(body["total_assets"], json!("1234567890000"));
        assert_eq!(body["total_assets_display"], json!("1,234,567.89"));
    }

    #[tokio::test]
    async fn malformed_account_address() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        let resp = reqwest::get(format!("{}/accounts/alice.eth", base)).await.unwrap();
        assert_eq!(resp.status(), Status::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn reverted_read_is_bad_gateway() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        let resp = reqwest::get(format!("{}/deposits/3", base)).await.unwrap();
        assert_eq!(resp.status(), Status::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn tx_builds_calldata_for_configured_contract() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        let body: Value = reqwest::Client::new()
            .post(format!("{}/tx", base))
            .json(&json!({
                "function": "createDeposit",
                "amount": 10_000_000u64,
                "payee_details": "",
                "payment_method": "GCash"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(as_address(&body["to"]), ESCROW);
        let data = body["data"].as_str().unwrap();
        assert!(data.starts_with("0xc578878a"));
        assert!(data.contains(&hex::encode("contact-seller")));
    }

    #[tokio::test]
    async fn tx_without_token_address_is_unavailable() {
        let base = app(FakeChain::new(), None).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/tx", base))
            .json(&json!({ "function": "transfer", "to": FRIEND, "amount": 1u64 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), Status::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn recipient_history_round_trip() {
        let base = app(FakeChain::new(), Some(USDC)).await;
        let client = reqwest::Client::new();
        let url = format!("{}/recipients", base);

        client.post(&url).json(&json!({ "address": FRIEND, "label": "Sis" })).send().await.unwrap();
        client.post(&url).json(&json!({ "address": ME })).send().await.unwrap();
        let list: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(list[0]["label"], json!("0x5c8e1a"));
        assert_eq!(list[1]["label"], json!("Sis"));

        let resp = client.delete(format!("{}/{}", url, FRIEND)).send().await.unwrap();
        assert_eq!(resp.status(), Status::NO_CONTENT);
        let resp = client.delete(format!("{}/{}", url, FRIEND)).send().await.unwrap();
        assert_eq!(resp.status(), Status::NOT_FOUND);

        let bad = client.post(&url).json(&json!({ "address": "nope" })).send().await.unwrap();
        assert_eq!(bad.status(), Status::UNPROCESSABLE_ENTITY);
    }
}
