use crate::model::DepreciationReport;
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 10;

/// The inputs that affect a report. The cutoff date is part of the key, so
/// new data landing in the store changes the key and stale entries are never
/// served again; they age out through the capacity bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub cutoff: NaiveDate,
    pub window_months: u32,
    pub brand_id: Option<i64>,
}

struct CacheInner {
    entries: HashMap<ReportKey, Arc<DepreciationReport>>,
    // Front = least recently used.
    recency: VecDeque<ReportKey>,
}

/// Bounded LRU memoization of depreciation reports. The lock covers only
/// lookup and insert; report computation happens outside it, so a hit on one
/// key never waits for a miss on another. Two concurrent misses on the same
/// key may both compute — the calculator is pure, so the overwrite is equal.
pub struct AnalysisCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                recency: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &ReportKey) -> Option<Arc<DepreciationReport>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let report = inner.entries.get(key).cloned()?;
        Self::touch(&mut inner.recency, key);
        Some(report)
    }

    pub fn insert(&self, key: ReportKey, report: Arc<DepreciationReport>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.entries.insert(key.clone(), report).is_some() {
            // Duplicate compute on the same key: refresh recency only.
            Self::touch(&mut inner.recency, &key);
            return;
        }
        inner.recency.push_back(key);
        while inner.entries.len() > self.capacity {
            let Some(evicted) = inner.recency.pop_front() else {
                break;
            };
            debug!(
                "Evicting LRU report: cutoff={}, window={}m, brand={:?}",
                evicted.cutoff, evicted.window_months, evicted.brand_id
            );
            inner.entries.remove(&evicted);
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(recency: &mut VecDeque<ReportKey>, key: &ReportKey) {
        if let Some(pos) = recency.iter().position(|k| k == key) {
            recency.remove(pos);
        }
        recency.push_back(key.clone());
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}
