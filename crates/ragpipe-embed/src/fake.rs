//! Deterministic offline backends for development and tests.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use twox_hash::XxHash64;

use ragpipe_core::error::ProviderError;
use ragpipe_core::traits::{AnswerGenerator, EmbeddingProvider};

/// Hashes whitespace tokens into a fixed number of buckets and L2-normalizes.
///
/// Texts sharing words end up with a positive cosine similarity, which is
/// enough to exercise retrieval end to end without a model.
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("fake:xxhash64:d{dim}") }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 {
            return v;
        }
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn model_id(&self) -> &str { &self.id }

    fn dimension(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embed_sync(text))
    }
}

/// Answers by returning the highest ranked context entry verbatim.
#[derive(Default)]
pub struct ContextEchoGenerator;

#[async_trait]
impl AnswerGenerator for ContextEchoGenerator {
    async fn answer(&self, context: &str, _question: &str) -> Result<String, ProviderError> {
        let first = context.split("\n\n[Document ").next().unwrap_or_default();
        let best = match first.split_once('\n') {
            Some((header, body)) if header.starts_with("[Document ") => body.trim(),
            _ => first.trim(),
        };
        if best.is_empty() {
            return Err(ProviderError::EmptyResponse("no context to answer from".to_string()));
        }
        Ok(best.to_string())
    }
}
