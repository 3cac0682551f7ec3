//! In-process read-through cache over any price provider.
//!
//! Keyed by `(symbol, start, end)`. Reads take a shared lock; a miss fetches
//! outside the lock and inserts with `entry().or_insert`, so the first writer
//! wins and a racing duplicate fetch is discarded without touching the stored
//! series. Only successful fetches are cached.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use super::provider::{DataError, PriceProvider};
use crate::domain::PriceSeries;

type CacheKey = (String, NaiveDate, NaiveDate);

/// Memoising wrapper around a [`PriceProvider`].
pub struct CachedProvider<P> {
    inner: P,
    entries: RwLock<HashMap<CacheKey, Arc<PriceSeries>>>,
    fetches: AtomicUsize,
}

impl<P: PriceProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of calls forwarded to the wrapped provider.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of cached series.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<PriceSeries>> {
        match self.entries.read() {
            Ok(map) => map.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn store(&self, key: CacheKey, series: PriceSeries) -> Arc<PriceSeries> {
        let mut map = match self.entries.write() {
            Ok(map) => map,
            Err(poisoned) => {
                warn!("price cache lock was poisoned; continuing with existing entries");
                poisoned.into_inner()
            }
        };
        map.entry(key).or_insert_with(|| Arc::new(series)).clone()
    }
}

impl<P: PriceProvider> PriceProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let key = (symbol.to_string(), start, end);
        if let Some(hit) = self.lookup(&key) {
            return Ok((*hit).clone());
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(symbol, %start, %end, provider = self.inner.name(), "cache miss");
        let series = self.inner.fetch(symbol, start, end)?;
        Ok((*self.store(key, series)).clone())
    }
}
