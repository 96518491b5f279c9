use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::config::EscrowConfig;
use crate::error::SourceError;
use crate::models::{DepositOffer, OfferList};
use crate::sources::DepositReader;
use super::cache::DepositCache;
use super::offers::{candidate_ids, OfferBook};

#[derive(Debug, Default)]
pub struct CollectorStats {
    pub refreshes: AtomicU64,
    pub loaded: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshResult {
    pub counter: u64,
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// Loads escrow deposits by ID in parallel and keeps the offer book current.
/// Every single arrival republishes the offer list.
pub struct OfferCollector {
    reader: Arc<dyn DepositReader>,
    cache: Arc<DepositCache>,
    book: RwLock<OfferBook>,
    updates: broadcast::Sender<OfferList>,
    max_offers: u64,
    concurrency: usize,
    demo_offers: bool,
    stats: CollectorStats,
}

impl OfferCollector {
    pub fn new(reader: Arc<dyn DepositReader>, cache: Arc<DepositCache>, config: &EscrowConfig) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            reader,
            cache,
            book: RwLock::new(OfferBook::new()),
            updates,
            max_offers: config.max_offers,
            concurrency: config.concurrency.max(1),
            demo_offers: config.demo_offers,
            stats: CollectorStats::default(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OfferList> {
        self.updates.subscribe()
    }

    pub fn offer_list(&self) -> OfferList {
        self.book.read().offer_list(self.demo_offers)
    }

    pub fn stats(&self) -> &CollectorStats {
        &self.stats
    }

    pub fn tracked(&self) -> usize {
        self.book.read().tracked()
    }

    pub fn pending(&self) -> usize {
        self.book.read().pending()
    }

    pub async fn refresh(&self, force: bool) -> Result<RefreshResult, SourceError> {
        self.refresh_with(force, |_| {}).await
    }

    /// Reads the deposit counter, then every candidate ID. `force` drops
    /// cached records first. `on_arrival` sees each completed ID.
    pub async fn refresh_with<F>(&self, force: bool, on_arrival: F) -> Result<RefreshResult, SourceError>
    where
        F: Fn(u64),
    {
        self.stats.refreshes.fetch_add(1, Ordering::Relaxed);
        let counter = self.reader.deposit_counter().await?;
        let ids = candidate_ids(counter, self.max_offers);
        if force {
            self.cache.invalidate_all();
        }
        self.book.write().track(&ids);

        let mut result = RefreshResult { counter, requested: ids.len(), loaded: 0, failed: 0 };
        let mut arrivals = stream::iter(ids)
            .map(|id| async move { (id, self.load(id).await) })
            .buffer_unordered(self.concurrency);

        while let Some((id, outcome)) = arrivals.next().await {
            match outcome {
                Ok(deposit) => {
                    result.loaded += 1;
                    self.book.write().record(deposit);
                    self.publish();
                }
                Err(e) => {
                    result.failed += 1;
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("deposit {} read failed: {}", id, e);
                }
            }
            on_arrival(id);
        }

        tracing::debug!(
            "offer refresh: counter={} loaded={}/{} failed={}",
            result.counter, result.loaded, result.requested, result.failed
        );
        Ok(result)
    }

    /// Cached record for `id`, reading it if absent
    pub async fn deposit(&self, id: u64) -> Result<Arc<DepositOffer>, SourceError> {
        self.load(id).await
    }

    /// Drops and re-reads one deposit. Call only after the write that
    /// changed it is confirmed.
    pub async fn reload(&self, id: u64) -> Result<Arc<DepositOffer>, SourceError> {
        self.cache.invalidate(id);
        self.book.write().mark_pending(id);
        let deposit = self.load(id).await?;
        self.book.write().record(deposit.clone());
        self.publish();
        Ok(deposit)
    }

    async fn load(&self, id: u64) -> Result<Arc<DepositOffer>, SourceError> {
        if let Some(deposit) = self.cache.get(id) {
            return Ok(deposit);
        }
        let deposit = self.reader.deposit(id).await?;
        self.stats.loaded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("deposit {} loaded (active={})", id, deposit.is_active());
        Ok(self.cache.insert(deposit))
    }

    fn publish(&self) {
        // no subscribers is fine
        let _ = self.updates.send(self.offer_list());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use crate::models::text::encode_text;
    use crate::models::{Address, OfferSource, B256, U256};

    struct MemoryEscrow {
        deposits: Mutex<HashMap<u64, DepositOffer>>,
        reads: AtomicUsize,
        broken: Vec<u64>,
    }

    impl MemoryEscrow {
        fn new(deposits: Vec<DepositOffer>, broken: Vec<u64>) -> Arc<Self> {
            Arc::new(Self {
                deposits: Mutex::new(deposits.into_iter().map(|d| (d.id, d)).collect()),
                reads: AtomicUsize::new(0),
                broken,
            })
        }
    }

    #[async_trait]
    impl DepositReader for MemoryEscrow {
        async fn deposit_counter(&self) -> Result<u64, SourceError> {
            Ok(self.deposits.lock().unwrap().keys().max().copied().unwrap_or(0))
        }

        async fn deposit(&self, id: u64) -> Result<DepositOffer, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&id) {
                return Err(SourceError::Rpc { code: -32000, message: "header not found".to_string() });
            }
            Ok(self.deposits.lock().unwrap().get(&id).cloned().unwrap_or(DepositOffer {
                id,
                depositor: Address::ZERO,
                amount: U256::ZERO,
                shares_in_vault: U256::ZERO,
                payee_details: B256::ZERO,
                payment_method: B256::ZERO,
                accepting_intents: false,
            }))
        }
    }

    fn deposit(id: u64, accepting: bool) -> DepositOffer {
        DepositOffer {
            id,
            depositor: Address::repeat_byte(id as u8),
            amount: U256::from(1_000_000 * id),
            shares_in_vault: U256::from(1_000_000 * id),
            payee_details: encode_text("@me").unwrap(),
            payment_method: encode_text("Revolut").unwrap(),
            accepting_intents: accepting,
        }
    }

    fn collector(reader: Arc<MemoryEscrow>, max_offers: u64, demo: bool) -> OfferCollector {
        let config = EscrowConfig { max_offers, demo_offers: demo, ..EscrowConfig::default() };
        OfferCollector::new(reader, Arc::new(DepositCache::new()), &config)
    }

    #[tokio::test]
    async fn refresh_builds_active_list() {
        let escrow = MemoryEscrow::new(vec![deposit(1, true), deposit(2, false), deposit(3, true)], vec![]);
        let collector = collector(escrow, 20, false);

        let result = collector.refresh(false).await.unwrap();
        assert_eq!(result, RefreshResult { counter: 3, requested: 3, loaded: 3, failed: 0 });

        let list = collector.offer_list();
        assert_eq!(list.source, OfferSource::Live);
        let ids: Vec<u64> = list.offers.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn only_most_recent_ids_are_read() {
        let escrow = MemoryEscrow::new((1..=30).map(|id| deposit(id, true)).collect(), vec![]);
        let collector = collector(escrow.clone(), 20, false);
        collector.refresh(false).await.unwrap();
        assert_eq!(escrow.reads.load(Ordering::SeqCst), 20);
        let list = collector.offer_list();
        assert_eq!(list.offers.first().map(|o| o.id), Some(30));
        assert_eq!(list.offers.last().map(|o| o.id), Some(11));
    }

    #[tokio::test]
    async fn failed_reads_do_not_block_others() {
        let escrow = MemoryEscrow::new(vec![deposit(1, true), deposit(2, true)], vec![2]);
        let collector = collector(escrow, 20, false);
        let result = collector.refresh(false).await.unwrap();
        assert_eq!(result.failed, 1);
        assert_eq!(collector.pending(), 1);
        assert_eq!(collector.offer_list().offers.len(), 1);
    }

    #[tokio::test]
    async fn every_arrival_is_published() {
        let escrow = MemoryEscrow::new(vec![deposit(1, true), deposit(2, true)], vec![]);
        let collector = collector(escrow, 20, false);
        let mut rx = collector.subscribe();
        collector.refresh(false).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.offers.len(), 1);
        assert_eq!(second.offers.len(), 2);
    }

    #[tokio::test]
    async fn cached_records_skip_reads_until_forced() {
        let escrow = MemoryEscrow::new(vec![deposit(1, true)], vec![]);
        let collector = collector(escrow.clone(), 20, false);
        collector.refresh(false).await.unwrap();
        collector.refresh(false).await.unwrap();
        assert_eq!(escrow.reads.load(Ordering::SeqCst), 1);
        collector.refresh(true).await.unwrap();
        assert_eq!(escrow.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reload_sees_confirmed_write() {
        let escrow = MemoryEscrow::new(vec![deposit(1, true)], vec![]);
        let collector = collector(escrow.clone(), 20, false);
        collector.refresh(false).await.unwrap();
        assert_eq!(collector.offer_list().offers.len(), 1);

        // setAcceptingIntents(1, false) confirmed on chain
        escrow.deposits.lock().unwrap().insert(1, deposit(1, false));
        assert_eq!(collector.offer_list().offers.len(), 1);

        let reloaded = collector.reload(1).await.unwrap();
        assert!(!reloaded.accepting_intents);
        assert!(collector.offer_list().offers.is_empty());
    }

    #[tokio::test]
    async fn demo_fallback_only_when_enabled() {
        let escrow = MemoryEscrow::new(vec![], vec![]);
        let plain = collector(escrow.clone(), 20, false);
        plain.refresh(false).await.unwrap();
        assert_eq!(plain.offer_list().source, OfferSource::Live);
        assert!(plain.offer_list().offers.is_empty());

        let demo = collector(escrow, 20, true);
        demo.refresh(false).await.unwrap();
        assert_eq!(demo.offer_list().source, OfferSource::Demo);
    }
}
