//! ragpipe-core
//!
//! Domain types, capability traits, error taxonomy, configuration and the
//! word-boundary chunker shared by every other crate in the workspace.

pub mod chunker;
pub mod config;
pub mod documents;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{calculate_size, Chunker};
pub use error::{EmbedTarget, ErrorKind, PipelineError, ProviderError, StoreError};
pub use traits::{AnswerGenerator, EmbeddingProvider, TextChunker, VectorIndex};
pub use types::{IndexedPoint, PointId, PointPayload, RetrievedResult, Segment};
