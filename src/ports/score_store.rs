use crate::domain::errors::CoreError;
use crate::domain::ids::ScoreId;
use crate::domain::score::Score;
use std::sync::Arc;

/// Port for the process-wide score cache (spec'd concurrency model: a
/// single mutex guarding lookup/insert, LRU-evicted on total raster bytes).
/// Takes `&self` rather than `&mut self` so it can live behind a plain
/// `Arc<dyn ScoreStore>` — interior mutability is the adapter's concern.
pub trait ScoreStore: Send + Sync {
    fn insert(&self, score: Score) -> Result<ScoreId, CoreError>;
    fn get(&self, id: ScoreId) -> Result<Arc<Score>, CoreError>;
    fn remove(&self, id: ScoreId);
}
