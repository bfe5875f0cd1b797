use std::fs;
use std::time::Duration;

use figment::{providers::Serialized, Figment};
use ragpipe_core::config::{resolve_with_base, Config, EmbeddingBackend, Settings};
use tempfile::TempDir;

fn fake_settings() -> Settings {
    let mut settings = Settings::default();
    settings.embedding.provider = EmbeddingBackend::Fake;
    settings
}

#[test]
fn defaults_match_documented_configuration() {
    let s = Settings::default();
    assert_eq!(s.rag.chunk_size, 1000);
    assert_eq!(s.rag.chunk_overlap, 200);
    assert_eq!(s.rag.search_limit, 3);
    assert_eq!(s.rag.vector_dimensionality, 3072);
    assert_eq!(s.rag.call_timeout(), None);
    assert_eq!(s.openai.embed_model, "text-embedding-3-large");
    assert_eq!(s.server.bind_addr(), "127.0.0.1:8080");
}

#[test]
fn openai_backend_requires_an_api_key() {
    let err = Settings::default().validate().unwrap_err();
    assert!(err.to_string().contains("openai.api_key"));
    assert!(fake_settings().validate().is_ok());
}

#[test]
fn zero_search_limit_is_rejected() {
    let mut s = fake_settings();
    s.rag.search_limit = 0;
    assert!(s.validate().is_err());
}

#[test]
fn toml_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        r#"
[embedding]
provider = "fake"

[rag]
chunk_size = 64
chunk_overlap = 4
search_limit = 5
vector_dimensionality = 16
call_timeout_secs = 7

[store]
uri = "indexes/lance"
table = "handbook"
"#,
    )
    .unwrap();

    let config = Config::load_for_env(tmp.path(), "custom").expect("load");
    let s = config.settings().expect("settings");
    assert_eq!(s.embedding.provider, EmbeddingBackend::Fake);
    assert_eq!(s.rag.chunk_size, 64);
    assert_eq!(s.rag.chunk_overlap, 4);
    assert_eq!(s.rag.search_limit, 5);
    assert_eq!(s.rag.vector_dimensionality, 16);
    assert_eq!(s.rag.call_timeout(), Some(Duration::from_secs(7)));
    assert_eq!(s.store.table, "handbook");
    assert_eq!(s.store.uri, tmp.path().join("indexes/lance").to_string_lossy());
    assert_eq!(s.prompts.dir, tmp.path().join("prompts"));
    assert_eq!(config.get::<usize>("rag.search_limit").unwrap(), 5);
}

#[test]
fn env_overlay_file_wins_over_base_file() {
    let tmp = TempDir::new().unwrap();
    let base = "[embedding]\nprovider = \"fake\"\n[rag]\nsearch_limit = 2\n";
    fs::write(tmp.path().join("config.toml"), base).unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[rag]\nsearch_limit = 9\n").unwrap();

    let s = Config::load_for_env(tmp.path(), "test").unwrap().settings().unwrap();
    assert_eq!(s.rag.search_limit, 9);
}

#[test]
fn overrides_are_applied_last() {
    let figment = Figment::from(Serialized::defaults(fake_settings()));
    let s = Config::from_figment(figment)
        .with_override("server.port", 9191)
        .with_override("rag.chunk_overlap", 0)
        .settings()
        .unwrap();
    assert_eq!(s.server.port, 9191);
    assert_eq!(s.rag.chunk_overlap, 0);
}

#[test]
fn remote_store_uris_are_left_alone() {
    let mut settings = fake_settings();
    settings.store.uri = "s3://bucket/lance".to_string();
    let s = Config::from_figment(Figment::from(Serialized::defaults(settings))).settings().unwrap();
    assert_eq!(s.store.uri, "s3://bucket/lance");
}

#[test]
fn absolute_paths_are_not_rebased() {
    let tmp = TempDir::new().unwrap();
    let abs = tmp.path().join("prompts");
    assert_eq!(resolve_with_base(std::path::Path::new("/elsewhere"), abs.to_string_lossy()), abs);
    assert_eq!(
        resolve_with_base(std::path::Path::new("/base"), "rel"),
        std::path::PathBuf::from("/base/rel")
    );
}
