use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ragpipe_core::config::Config;
use ragpipe_core::documents::DocumentLoader;
use ragpipe_pipeline::bootstrap::from_settings;
use ragpipe_pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "ragpipe", about = "Ingest text files and ask questions over them")]
struct Cli {
    /// Directory holding config.toml and the config.<env>.toml overlays.
    #[arg(long, global = true, env = "RAGPIPE_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Override rag.search_limit.
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Use offline hash embeddings and the context-echo answerer.
    #[arg(long, global = true)]
    fake: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every matching file under a directory; doc id = file name
    Ingest {
        dir: PathBuf,
        /// Only ingest the first N files (sorted by path)
        #[arg(long)]
        max_files: Option<usize>,
        #[arg(long, default_value = "txt")]
        extension: String,
    },
    /// Answer a question from the indexed documents
    Query { question: String },
    /// Print the ranked context blob for a question
    Retrieve { question: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load_from(&cli.config_dir).context("loading configuration")?;
    if let Some(limit) = cli.limit {
        config = config.with_override("rag.search_limit", limit);
    }
    if cli.fake {
        config = config.with_override("embedding.provider", "fake");
    }
    let settings = config.settings()?;
    let pipeline = from_settings(&settings).await?;

    match cli.command {
        Commands::Ingest { dir, max_files, extension } => {
            ingest_dir(&pipeline, &dir, max_files, &extension).await
        }
        Commands::Query { question } => {
            let answer = pipeline.answer(&question).await?;
            println!("{}", answer.answer);
            println!("\n📚 Sources:");
            for (i, hit) in answer.context.iter().enumerate() {
                println!("  {}. [{:.4}] {}", i + 1, hit.score, preview(&hit.text, 80));
            }
            Ok(())
        }
        Commands::Retrieve { question } => {
            println!("{}", pipeline.retrieve(&question).await?);
            Ok(())
        }
    }
}

async fn ingest_dir(
    pipeline: &Pipeline,
    dir: &Path,
    max_files: Option<usize>,
    extension: &str,
) -> Result<()> {
    let mut loader = DocumentLoader::new().with_extension(extension);
    if let Some(n) = max_files {
        loader = loader.with_limit(n);
    }
    let documents = loader.load_directory(dir)?;
    if documents.is_empty() {
        bail!("no .{extension} files found in {}", dir.display());
    }
    println!("Ingesting {} files from {}", documents.len(), dir.display());

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            )?
            .progress_chars("#>-"),
    );
    let (mut ok, mut failed, mut chunks) = (0usize, 0usize, 0usize);
    for doc in &documents {
        pb.set_message(doc.doc_id.clone());
        match pipeline.ingest(&doc.text, &doc.doc_id).await {
            Ok(report) => {
                ok += 1;
                chunks += report.chunks;
            }
            Err(e) => {
                failed += 1;
                warn!(file = %doc.path.display(), error = %e, "failed to ingest file");
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("✅ Ingested {ok} files ({chunks} chunks), {failed} failed");
    if ok == 0 {
        bail!("no files were ingested");
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}…")
}
