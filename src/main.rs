use std::path::Path;
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tokio::time::{interval, Duration};

use asialink_core::api::{create_router, AppState};
use asialink_core::config::Config;
use asialink_core::models::usdc::format_tvl;
use asialink_core::services::offers::candidate_ids;
use asialink_core::services::{DepositCache, OfferCollector, RecipientStore, YieldCache, YieldService};
use asialink_core::sources::escrow::EscrowContract;
use asialink_core::sources::llama::DefiLlamaSource;
use asialink_core::sources::rpc::RpcClient;
use asialink_core::sources::token::TokenContracts;
use asialink_core::sources::{DepositReader, YieldSource};

/// One-shot: print the markets table and the best USDC yield
async fn print_yields(yields: &YieldService) {
    let markets = yields.markets().await;
    if !markets.live {
        println!("⚠️  Live yields unavailable, showing fallback markets\n");
    }
    println!("   {:12} {:8} {:>8} {:>10}", "project", "symbol", "APY", "TVL");
    println!("   ──────────── ──────── ──────── ──────────");
    for pool in &markets.pools {
        println!("   {:12} {:8} {:>7.2}% {:>10}",
            pool.project, pool.symbol, pool.apy, format_tvl(pool.tvl_usd));
    }

    let best = yields.best_yield().await;
    match (&best.best_source, best.total_tvl_usd) {
        (Some(source), Some(tvl)) => println!("\n💰 Best USDC yield: {} via {} ({} TVL)",
            best.display_apy, source, format_tvl(tvl)),
        _ => println!("\n💰 Best USDC yield: {} (no live market)", best.display_apy),
    }
}

/// One-shot: load the current offers with a progress bar
async fn print_offers(
    reader: Arc<dyn DepositReader>,
    collector: &OfferCollector,
    max_offers: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let counter = reader.deposit_counter().await?;
    let pb = ProgressBar::new(candidate_ids(counter, max_offers).len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "  {spinner} [{bar:30}] {pos}/{len} deposits ({elapsed})",
    )?);

    let result = collector.refresh_with(false, |_| pb.inc(1)).await?;
    pb.finish_and_clear();

    let list = collector.offer_list();
    println!("✓ {} offers from {}/{} deposits ({} failed, source: {:?})\n",
        list.offers.len(), result.loaded, result.requested, result.failed, list.source);
    for offer in &list.offers {
        println!("   #{:<4} {:>14} USDC  {:10} {:16} {}",
            offer.id, offer.amount_display, offer.payment_method, offer.payee_details, offer.depositor_short);
    }
    Ok(())
}

#[tokio::main(worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,asialink_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = args.iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or("config.toml");
    let config = Config::load(config_path)?;
    tracing::info!("✓ Configuration loaded from {}", config_path);

    let timeout = Duration::from_secs(config.yields.timeout_secs);

    // Yield side
    let source: Arc<dyn YieldSource> = Arc::new(DefiLlamaSource::new(&config.yields)?);
    let yield_cache = Arc::new(YieldCache::new(
        Duration::from_secs(config.yields.fresh_secs),
        Duration::from_secs(config.yields.retain_secs),
    ));
    let yields = Arc::new(YieldService::new(source, yield_cache.clone(), &config.yields.target_symbol));

    // Chain side
    let rpc = Arc::new(RpcClient::new(&config.escrow.rpc_url, timeout)?);
    let escrow = Arc::new(EscrowContract::new(rpc.clone(), config.escrow.escrow_address));
    let tokens = Arc::new(TokenContracts::new(
        rpc,
        config.escrow.usdc_address,
        config.escrow.vault_address,
    ));
    let reader: Arc<dyn DepositReader> = escrow.clone();
    let offers = Arc::new(OfferCollector::new(reader.clone(), Arc::new(DepositCache::new()), &config.escrow));

    if args.contains(&"--yields".to_string()) || args.contains(&"-y".to_string()) {
        println!("\n📈 Etherlink yields\n");
        print_yields(&yields).await;
        return Ok(());
    }

    if args.contains(&"--offers".to_string()) || args.contains(&"-o".to_string()) {
        println!("\n📥 Loading escrow offers...\n");
        print_offers(reader, &offers, config.escrow.max_offers).await?;
        return Ok(());
    }

    println!("\n🚀 AsiaLink core starting...\n");

    if config.escrow.escrow_address.is_none() {
        tracing::warn!("escrow address not configured, offer refresh disabled");
    }

    let recipients = if config.storage.enabled {
        Arc::new(RecipientStore::open(Path::new(&config.storage.data_dir), config.storage.max_recipients))
    } else {
        Arc::new(RecipientStore::in_memory(config.storage.max_recipients))
    };
    tracing::info!("✓ {} recent recipients loaded", recipients.list().len());

    // Background: offer refresh
    if config.escrow.escrow_address.is_some() {
        let offers_clone = offers.clone();
        let every = Duration::from_secs(config.escrow.refresh_interval.max(1));
        println!("📥 Starting offer refresh ({}s cycle)...\n", every.as_secs());
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                match offers_clone.refresh(true).await {
                    Ok(result) => tracing::info!(
                        "✓ Offer cycle: {}/{} deposits loaded, {} active",
                        result.loaded,
                        result.requested,
                        offers_clone.offer_list().offers.len()
                    ),
                    Err(e) => tracing::warn!("offer refresh failed: {}", e),
                }
            }
        });
    }

    // Background: Cache cleanup
    let cache_clone = yield_cache.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            cache_clone.cleanup_if_needed();
        }
    });

    // Application state
    let state = Arc::new(AppState {
        yields,
        offers,
        escrow,
        tokens,
        recipients,
        usdc_address: config.escrow.usdc_address,
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!("\n✓ Server ready on http://{}\n", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
