use crate::domain::errors::CoreError;
use crate::domain::ids::ScoreId;
use crate::domain::score::Score;
use crate::ports::score_store::ScoreStore;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Mutex-guarded, byte-budget-bounded LRU cache of ingested scores. The
/// critical section covers only map lookup/insert/eviction bookkeeping,
/// never raster work, per the concurrency model: raster pages are the
/// dominant cost and are never recomputed while they sit in the cache.
pub struct InMemoryScoreStore {
    inner: Mutex<Inner>,
    byte_budget: usize,
}

struct Inner {
    cache: LruCache<ScoreId, Arc<Score>>,
    cached_bytes: usize,
}

impl InMemoryScoreStore {
    pub fn new(byte_budget: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                // Capacity is effectively unbounded by count; eviction is
                // driven by `byte_budget` in `insert`, not by this cap.
                cache: LruCache::new(NonZeroUsize::new(usize::MAX).unwrap()),
                cached_bytes: 0,
            }),
            byte_budget,
        }
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn insert(&self, score: Score) -> Result<ScoreId, CoreError> {
        let requested = score.total_raster_bytes();
        if requested > self.byte_budget {
            return Err(CoreError::CacheExhausted {
                requested_bytes: requested,
            });
        }
        let id = score.id;
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CoreError::Internal("score cache mutex poisoned".into()))?;

        while inner.cached_bytes + requested > self.byte_budget {
            match inner.cache.pop_lru() {
                Some((_, evicted)) => {
                    inner.cached_bytes = inner.cached_bytes.saturating_sub(evicted.total_raster_bytes());
                }
                None => break,
            }
        }

        inner.cached_bytes += requested;
        inner.cache.put(id, Arc::new(score));
        Ok(id)
    }

    fn get(&self, id: ScoreId) -> Result<Arc<Score>, CoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CoreError::Internal("score cache mutex poisoned".into()))?;
        inner
            .cache
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownScoreId(id.to_string()))
    }

    fn remove(&self, id: ScoreId) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(evicted) = inner.cache.pop(&id) {
                inner.cached_bytes = inner.cached_bytes.saturating_sub(evicted.total_raster_bytes());
            }
        }
    }
}
