//! ragpipe-pipeline
//!
//! Orchestrates chunking, embedding, indexing and retrieval over injected
//! capabilities. Ingest is all-or-nothing: points are written in a single
//! batch only after every segment has been embedded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use ragpipe_core::chunker::Chunker;
use ragpipe_core::config::RagSettings;
use ragpipe_core::error::{EmbedTarget, PipelineError, ProviderError, StoreError};
use ragpipe_core::traits::{AnswerGenerator, EmbeddingProvider, TextChunker, VectorIndex};
use ragpipe_core::types::{IndexedPoint, PointId, PointPayload, RetrievedResult, Segment};

pub mod bootstrap;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub search_limit: usize,
    pub vector_dimensionality: usize,
    /// Upper bound for every single external call; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self { Self::from(&RagSettings::default()) }
}

impl From<&RagSettings> for PipelineConfig {
    fn from(rag: &RagSettings) -> Self {
        Self {
            chunk_size: rag.chunk_size,
            chunk_overlap: rag.chunk_overlap,
            search_limit: rag.search_limit,
            vector_dimensionality: rag.vector_dimensionality,
            call_timeout: rag.call_timeout(),
        }
    }
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub doc_id: String,
    pub chunks: usize,
    pub point_ids: Vec<PointId>,
}

/// Generated answer together with the context it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<RetrievedResult>,
}

pub struct Pipeline {
    config: PipelineConfig,
    chunker: Arc<dyn TextChunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    answerer: Arc<dyn AnswerGenerator>,
}

impl Pipeline {
    /// Provisions the index for `config.vector_dimensionality` before returning.
    pub async fn new(
        config: PipelineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        answerer: Arc<dyn AnswerGenerator>,
    ) -> Result<Self> {
        let dimension = config.vector_dimensionality;
        if embedder.dimension() != dimension {
            return Err(PipelineError::Provisioning(StoreError::DimensionMismatch {
                expected: dimension,
                actual: embedder.dimension(),
            }));
        }
        timed(config.call_timeout, index.ensure_ready(dimension), StoreError::Timeout)
            .await
            .map_err(PipelineError::Provisioning)?;
        info!(dimension, model = embedder.model_id(), "pipeline ready");
        let chunker = Arc::new(Chunker::new(config.chunk_size, config.chunk_overlap));
        Ok(Self { config, chunker, embedder, index, answerer })
    }

    /// Replace the default word chunker.
    #[must_use]
    pub fn with_chunker(mut self, chunker: Arc<dyn TextChunker>) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn config(&self) -> &PipelineConfig { &self.config }

    pub async fn ingest(&self, text: &str, doc_id: &str) -> Result<IngestReport> {
        let segments = Segment::sequence(self.chunker.chunk_text(text), doc_id);
        if segments.is_empty() {
            return Err(PipelineError::NoContent);
        }
        debug!(doc_id, chunks = segments.len(), "chunked document");

        let nonce = doc_id.is_empty().then(rand::random::<u64>);
        let mut points = Vec::with_capacity(segments.len());
        for segment in segments {
            let target = EmbedTarget::Segment(segment.index);
            let vector = self.embed(&segment.text, target).await?;
            let id = match nonce {
                Some(nonce) => anonymous_point_id(nonce, segment.index),
                None => point_id(doc_id, segment.index),
            };
            points.push(IndexedPoint {
                id,
                vector,
                payload: PointPayload {
                    text: segment.text,
                    doc_id: segment.source_doc_id,
                    chunk_index: segment.index,
                },
            });
        }

        timed(self.config.call_timeout, self.index.upsert(&points), StoreError::Timeout)
            .await
            .map_err(|e| {
                warn!(doc_id, error = %e, "upsert failed");
                PipelineError::IndexWriteFailed(e)
            })?;

        let point_ids: Vec<PointId> = points.iter().map(|p| p.id).collect();
        info!(doc_id, chunks = point_ids.len(), "ingested document");
        Ok(IngestReport { doc_id: doc_id.to_string(), chunks: point_ids.len(), point_ids })
    }

    /// Top `search_limit` neighbours of `query`, best first.
    pub async fn search(&self, query: &str) -> Result<Vec<RetrievedResult>> {
        let vector = self.embed(query, EmbedTarget::Query).await?;
        let search = self.index.search(&vector, self.config.search_limit);
        let results = timed(self.config.call_timeout, search, StoreError::Timeout)
            .await
            .map_err(|e| {
                warn!(error = %e, "search failed");
                PipelineError::SearchFailed(e)
            })?;
        if results.is_empty() {
            return Err(PipelineError::NoResults);
        }
        debug!(hits = results.len(), "retrieved context");
        Ok(results)
    }

    pub async fn retrieve(&self, query: &str) -> Result<String> {
        let results = self.search(query).await?;
        Ok(render_context(&results))
    }

    /// Retrieve context for `query` and hand it to the answer generator.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let context = self.search(query).await?;
        let blob = render_context(&context);
        let generate = self.answerer.answer(&blob, query);
        let answer = timed(self.config.call_timeout, generate, ProviderError::Timeout)
            .await
            .map_err(|e| {
                warn!(error = %e, "answer generation failed");
                PipelineError::AnswerFailed(e)
            })?;
        Ok(Answer { answer, context })
    }

    async fn embed(&self, text: &str, target: EmbedTarget) -> Result<Vec<f32>> {
        let expected = self.config.vector_dimensionality;
        let embedding = self.embedder.embed(text);
        let result = timed(self.config.call_timeout, embedding, ProviderError::Timeout)
            .await
            .and_then(|v| {
                if v.len() == expected {
                    Ok(v)
                } else {
                    Err(ProviderError::DimensionMismatch { expected, actual: v.len() })
                }
            });
        result.map_err(|source| {
            warn!(%target, error = %source, "embedding failed");
            PipelineError::EmbeddingFailed { target, source }
        })
    }
}

/// Ranked context blob: `[Document N, Score: S]` header then text, best first.
pub fn render_context(results: &[RetrievedResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let header = format!("[Document {}, Score: {:.4}]", i + 1, result.score);
        out.push_str(&format!("{header}\n{}\n\n", result.text));
    }
    out.trim().to_string()
}

/// Stable id for chunk `chunk_index` of `doc_id`.
pub fn point_id(doc_id: &str, chunk_index: usize) -> PointId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"doc\0");
    hasher.update(doc_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(&(chunk_index as u64).to_le_bytes());
    first_u64(hasher.finalize())
}

fn anonymous_point_id(nonce: u64, chunk_index: usize) -> PointId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"anon\0");
    hasher.update(&nonce.to_le_bytes());
    hasher.update(&(chunk_index as u64).to_le_bytes());
    first_u64(hasher.finalize())
}

fn first_u64(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

async fn timed<T, E, F>(
    limit: Option<Duration>,
    fut: F,
    on_timeout: fn(Duration) -> E,
) -> std::result::Result<T, E>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    match limit {
        Some(limit) => {
            tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| Err(on_timeout(limit)))
        }
        None => fut.await,
    }
}
