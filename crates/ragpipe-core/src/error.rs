use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by an embedding or answer-generation backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("empty response: {0}")]
    EmptyResponse(String),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures reported by a vector index backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("index not provisioned: call ensure_ready first")]
    NotReady,

    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("write failed: {0}")]
    Write(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// What an embedding request was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTarget {
    Segment(usize),
    Query,
}

impl fmt::Display for EmbedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedTarget::Segment(index) => write!(f, "chunk {index}"),
            EmbedTarget::Query => f.write_str("query"),
        }
    }
}

/// Caller-visible failures of the ingest / retrieve flows.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no chunks created from text")]
    NoContent,

    #[error("failed to generate embedding for {target}: {source}")]
    EmbeddingFailed {
        target: EmbedTarget,
        #[source]
        source: ProviderError,
    },

    #[error("failed to upsert points: {0}")]
    IndexWriteFailed(#[source] StoreError),

    #[error("failed to search: {0}")]
    SearchFailed(#[source] StoreError),

    #[error("no relevant documents found")]
    NoResults,

    #[error("failed to generate answer: {0}")]
    AnswerFailed(#[source] ProviderError),

    #[error("failed to ensure collection: {0}")]
    Provisioning(#[source] StoreError),
}

/// Stable discriminant used by boundaries to pick a client-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoContent,
    EmbeddingFailed,
    IndexWriteFailed,
    SearchFailed,
    NoResults,
    AnswerFailed,
    Provisioning,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NoContent => "no_content",
            ErrorKind::EmbeddingFailed => "embedding_failed",
            ErrorKind::IndexWriteFailed => "index_write_failed",
            ErrorKind::SearchFailed => "search_failed",
            ErrorKind::NoResults => "no_results",
            ErrorKind::AnswerFailed => "answer_failed",
            ErrorKind::Provisioning => "provisioning",
        }
    }

    /// Malformed input as opposed to a downstream failure.
    pub fn is_client_error(self) -> bool {
        matches!(self, ErrorKind::NoContent)
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NoContent => ErrorKind::NoContent,
            PipelineError::EmbeddingFailed { .. } => ErrorKind::EmbeddingFailed,
            PipelineError::IndexWriteFailed(_) => ErrorKind::IndexWriteFailed,
            PipelineError::SearchFailed(_) => ErrorKind::SearchFailed,
            PipelineError::NoResults => ErrorKind::NoResults,
            PipelineError::AnswerFailed(_) => ErrorKind::AnswerFailed,
            PipelineError::Provisioning(_) => ErrorKind::Provisioning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_failure_names_the_segment() {
        let err = PipelineError::EmbeddingFailed {
            target: EmbedTarget::Segment(3),
            source: ProviderError::Request("connection reset".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "failed to generate embedding for chunk 3: request failed: connection reset"
        );
        assert_eq!(err.kind(), ErrorKind::EmbeddingFailed);
    }

    #[test]
    fn query_embedding_failure_names_the_query() {
        let err = PipelineError::EmbeddingFailed {
            target: EmbedTarget::Query,
            source: ProviderError::Timeout(Duration::from_secs(2)),
        };
        assert_eq!(err.to_string(), "failed to generate embedding for query: timed out after 2s");
    }

    #[test]
    fn store_errors_keep_their_source() {
        use std::error::Error as _;
        let err = PipelineError::IndexWriteFailed(StoreError::Write("disk full".to_string()));
        assert_eq!(err.to_string(), "failed to upsert points: write failed: disk full");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("write failed: disk full"));
    }

    #[test]
    fn only_no_content_is_a_client_error() {
        let all = [
            ErrorKind::NoContent,
            ErrorKind::EmbeddingFailed,
            ErrorKind::IndexWriteFailed,
            ErrorKind::SearchFailed,
            ErrorKind::NoResults,
            ErrorKind::AnswerFailed,
            ErrorKind::Provisioning,
        ];
        let client: Vec<_> = all.iter().filter(|k| k.is_client_error()).collect();
        assert_eq!(client, vec![&ErrorKind::NoContent]);
        let names: std::collections::HashSet<_> = all.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), all.len(), "kind names are distinct");
    }

    #[test]
    fn config_error_display() {
        let err = Error::InvalidConfig("openai.api_key is required".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: openai.api_key is required");
    }
}
