//! In-process vector index with exact cosine search.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ragpipe_core::error::StoreError;
use ragpipe_core::traits::VectorIndex;
use ragpipe_core::types::{IndexedPoint, PointId, RetrievedResult};

#[derive(Default)]
pub struct MemoryIndex {
    dim: OnceLock<usize>,
    points: RwLock<BTreeMap<PointId, IndexedPoint>>,
}

impl MemoryIndex {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.points.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.points.read().await.is_empty() }

    pub async fn get(&self, id: PointId) -> Option<IndexedPoint> {
        self.points.read().await.get(&id).cloned()
    }

    fn ready_dim(&self) -> Result<usize, StoreError> {
        self.dim.get().copied().ok_or(StoreError::NotReady)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_ready(&self, dimension: usize) -> Result<(), StoreError> {
        let current = *self.dim.get_or_init(|| dimension);
        if current != dimension {
            return Err(StoreError::DimensionMismatch { expected: current, actual: dimension });
        }
        Ok(())
    }

    async fn upsert(&self, points: &[IndexedPoint]) -> Result<(), StoreError> {
        let dim = self.ready_dim()?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != dim) {
            return Err(StoreError::DimensionMismatch { expected: dim, actual: bad.vector.len() });
        }
        let mut guard = self.points.write().await;
        for point in points {
            guard.insert(point.id, point.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedResult>, StoreError> {
        let dim = self.ready_dim()?;
        if vector.len() != dim {
            return Err(StoreError::DimensionMismatch { expected: dim, actual: vector.len() });
        }
        let guard = self.points.read().await;
        let mut scored: Vec<(f32, PointId, &IndexedPoint)> =
            guard.values().map(|p| (cosine_similarity(vector, &p.vector), p.id, p)).collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1))
        });
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, _, p)| RetrievedResult::new(p.payload.text.clone(), score))
            .collect())
    }
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
