//! ragpipe-embed
//!
//! Embedding and answer-generation backends: an OpenAI-compatible HTTP client
//! and deterministic offline doubles. `get_default_providers` picks one from
//! the loaded settings; `APP_USE_FAKE_EMBEDDINGS=1` forces the offline pair.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ragpipe_core::config::{EmbeddingBackend, Settings};
use ragpipe_core::traits::{AnswerGenerator, EmbeddingProvider};

pub mod fake;
pub mod openai;
pub mod prompts;

pub use fake::{ContextEchoGenerator, FakeEmbedder};
pub use openai::OpenAiClient;
pub use prompts::PromptSet;

/// The embedding and answer capabilities handed to the pipeline.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub answerer: Arc<dyn AnswerGenerator>,
}

pub fn get_default_providers(settings: &Settings) -> Result<Providers> {
    let dim = settings.rag.vector_dimensionality;
    match settings.embedding.provider {
        EmbeddingBackend::Fake => {
            info!(dim, "using fake embeddings");
            Ok(Providers {
                embedder: Arc::new(FakeEmbedder::new(dim)),
                answerer: Arc::new(ContextEchoGenerator),
            })
        }
        EmbeddingBackend::OpenAi => {
            let prompts = PromptSet::load(&settings.prompts.dir);
            let client = Arc::new(OpenAiClient::new(&settings.openai, dim, prompts)?);
            info!(
                model = %settings.openai.model,
                embed_model = %settings.openai.embed_model,
                "initialized OpenAI client"
            );
            Ok(Providers { embedder: client.clone(), answerer: client })
        }
    }
}
