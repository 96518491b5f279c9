use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use crate::models::{DepositOffer, PoolRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Past the fresh window but inside retention; serve and refetch
    Stale,
}

struct Entry {
    pools: Arc<Vec<PoolRecord>>,
    fetched_at: Instant,
}

/// Holds the latest pool snapshot. A new fetch replaces the whole set.
pub struct YieldCache {
    entry: RwLock<Option<Entry>>,
    fresh_for: Duration,
    retain_for: Duration,
}

impl YieldCache {
    /// Both windows count from the fetch time: fresh while `age < fresh_for`,
    /// stale while `age < retain_for`, gone after.
    pub fn new(fresh_for: Duration, retain_for: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            fresh_for,
            retain_for,
        }
    }

    pub fn get(&self) -> Option<(Arc<Vec<PoolRecord>>, Freshness)> {
        self.get_at(Instant::now())
    }

    pub(crate) fn get_at(&self, now: Instant) -> Option<(Arc<Vec<PoolRecord>>, Freshness)> {
        let entry = self.entry.read();
        let entry = entry.as_ref()?;
        let age = now.saturating_duration_since(entry.fetched_at);
        if age < self.fresh_for {
            Some((entry.pools.clone(), Freshness::Fresh))
        } else if age < self.retain_for {
            Some((entry.pools.clone(), Freshness::Stale))
        } else {
            None
        }
    }

    pub fn insert(&self, pools: Vec<PoolRecord>) -> Arc<Vec<PoolRecord>> {
        self.insert_at(pools, Instant::now())
    }

    pub(crate) fn insert_at(&self, pools: Vec<PoolRecord>, now: Instant) -> Arc<Vec<PoolRecord>> {
        let pools = Arc::new(pools);
        *self.entry.write() = Some(Entry {
            pools: pools.clone(),
            fetched_at: now,
        });
        pools
    }

    /// Drops an entry past its retention window
    pub fn cleanup_if_needed(&self) {
        self.cleanup_at(Instant::now());
    }

    pub(crate) fn cleanup_at(&self, now: Instant) {
        let mut entry = self.entry.write();
        let expired = entry
            .as_ref()
            .map(|e| now.saturating_duration_since(e.fetched_at) >= self.retain_for)
            .unwrap_or(false);
        if expired {
            *entry = None;
            tracing::info!("🧹 Evicted expired yield snapshot");
        }
    }

    pub fn len(&self) -> usize {
        self.entry.read().as_ref().map(|e| e.pools.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-ID deposit records. A missing key means "not loaded yet".
#[derive(Default)]
pub struct DepositCache {
    records: DashMap<u64, Arc<DepositOffer>>,
}

impl DepositCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> Option<Arc<DepositOffer>> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    pub fn insert(&self, deposit: DepositOffer) -> Arc<DepositOffer> {
        let deposit = Arc::new(deposit);
        self.records.insert(deposit.id, deposit.clone());
        deposit
    }

    /// Call after a confirmed write touching `id`
    pub fn invalidate(&self, id: u64) {
        self.records.remove(&id);
    }

    pub fn invalidate_all(&self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
