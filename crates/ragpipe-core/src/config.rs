//! Configuration loader and typed settings.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`,
//! `APP_*` env vars (nested keys split on `__`) and `OPENAI_API_KEY`.
//! Relative paths in the settings are resolved against the directory the
//! configuration was loaded from.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load `config.toml` and the `RUST_ENV` overlay from `base_dir`.
    pub fn load_from(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(base_dir, &env_name)
    }

    pub fn load_for_env(base_dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        let overlay = match env_name {
            "dev" | "development" => Some("config.dev.toml"),
            "prod" | "production" => Some("config.prod.toml"),
            "test" | "testing" => Some("config.test.toml"),
            _ => None,
        };
        if let Some(file) = overlay {
            figment = figment.merge(Toml::file(base_dir.join(file)));
        }
        figment = figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "openai.api_key".into()));
        if use_fake_embeddings() {
            figment =
                figment.merge(Serialized::default("embedding.provider", EmbeddingBackend::Fake));
        }

        let config = Self {
            figment,
            base_dir: base_dir.to_path_buf(),
            env_name: env_name.to_string(),
        };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment; paths resolve against the working directory.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment, base_dir: PathBuf::from("."), env_name: "custom".to_string() }
    }

    /// Layer a single value on top of every other source (used for CLI flags).
    #[must_use]
    pub fn with_override<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.figment = self.figment.merge(Serialized::default(key, value));
        self
    }

    pub fn env_name(&self) -> &str { &self.env_name }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract, validate and path-resolve the typed settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse settings: {}", e))?;
        settings.validate()?;
        if !settings.store.uri.contains("://") {
            settings.store.uri = resolve_with_base(&self.base_dir, &settings.store.uri)
                .to_string_lossy()
                .to_string();
        }
        settings.prompts.dir =
            resolve_with_base(&self.base_dir, settings.prompts.dir.to_string_lossy());
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if matches!(env, "prod" | "production") {
            let provider: EmbeddingBackend = self.get("embedding.provider")?;
            if provider == EmbeddingBackend::Fake {
                anyhow::bail!(Error::InvalidConfig(
                    "fake embeddings are not allowed in production".to_string()
                ));
            }
        }
        Ok(())
    }
}

fn use_fake_embeddings() -> bool {
    env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub openai: OpenAiSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        let needs_key = self.embedding.provider == EmbeddingBackend::OpenAi;
        if needs_key && self.openai.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "openai.api_key is required (set OPENAI_API_KEY or APP_OPENAI__API_KEY)"
                    .to_string(),
            ));
        }
        if self.rag.chunk_size == 0 {
            return Err(Error::InvalidConfig("rag.chunk_size must be at least 1".to_string()));
        }
        if self.rag.search_limit == 0 {
            return Err(Error::InvalidConfig("rag.search_limit must be at least 1".to_string()));
        }
        if self.rag.vector_dimensionality == 0 {
            return Err(Error::InvalidConfig(
                "rag.vector_dimensionality must be at least 1".to_string(),
            ));
        }
        if self.store.table.trim().is_empty() {
            return Err(Error::InvalidConfig("store.table must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embed_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            embed_model: "text-embedding-3-large".to_string(),
            temperature: 0.7,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAi,
    Fake,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { uri: "data/lancedb".to_string(), table: "docs".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub search_limit: usize,
    pub vector_dimensionality: usize,
    pub call_timeout_secs: Option<u64>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            search_limit: 3,
            vector_dimensionality: 3072,
            call_timeout_secs: None,
        }
    }
}

impl RagSettings {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub dir: PathBuf,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("prompts") }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
