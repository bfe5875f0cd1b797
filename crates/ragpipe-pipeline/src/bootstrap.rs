//! Wiring from loaded settings to a ready [`Pipeline`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use ragpipe_core::config::Settings;
use ragpipe_embed::get_default_providers;
use ragpipe_vector::LanceIndex;

use crate::{Pipeline, PipelineConfig};

/// Build the production pipeline: providers per `embedding.provider`, LanceDB at `store.uri`.
pub async fn from_settings(settings: &Settings) -> Result<Pipeline> {
    let providers = get_default_providers(settings)?;
    let index = LanceIndex::connect(&settings.store.uri, &settings.store.table)
        .await
        .with_context(|| format!("opening vector store at {}", settings.store.uri))?;
    info!(uri = %settings.store.uri, table = %settings.store.table, "opened vector store");
    let config = PipelineConfig::from(&settings.rag);
    let pipeline = Pipeline::new(config, providers.embedder, Arc::new(index), providers.answerer)
        .await
        .context("initializing pipeline")?;
    Ok(pipeline)
}
