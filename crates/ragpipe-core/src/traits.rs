//! Capability traits consumed by the pipeline.
//!
//! Every external collaborator is injected as a trait object so production
//! backends and in-memory doubles are interchangeable.

use async_trait::async_trait;

use crate::error::{ProviderError, StoreError};
use crate::types::{IndexedPoint, RetrievedResult};

/// Splits raw text into ordered segment strings.
pub trait TextChunker: Send + Sync {
    fn chunk_text(&self, text: &str) -> Vec<String>;
}

/// Maps text to a dense vector of fixed length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-large`).
    fn model_id(&self) -> &str;
    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Produces a natural-language answer grounded in a context blob.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, context: &str, question: &str) -> Result<String, ProviderError>;
}

/// Persists points and answers nearest-neighbour queries.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Make sure the collection exists for vectors of `dimension` length.
    async fn ensure_ready(&self, dimension: usize) -> Result<(), StoreError>;
    /// Write all points as one batch; same ids overwrite.
    async fn upsert(&self, points: &[IndexedPoint]) -> Result<(), StoreError>;
    /// Return up to `limit` neighbours, best first.
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedResult>, StoreError>;
}
