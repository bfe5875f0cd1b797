//! Domain types shared by the chunker, the pipeline and the index backends.

use serde::{Deserialize, Serialize};

pub type PointId = u64;

/// One piece of a source document produced by chunking.
///
/// - `index`: zero-based position within the document's segment sequence
/// - `text`: the rendered segment, never empty
/// - `source_doc_id`: caller supplied document id; empty means unattributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub text: String,
    pub source_doc_id: String,
}

impl Segment {
    /// Number the chunker output in order and attribute it to `doc_id`.
    pub fn sequence(chunks: Vec<String>, doc_id: &str) -> Vec<Segment> {
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| Segment { index, text, source_doc_id: doc_id.to_string() })
            .collect()
    }
}

/// Payload stored next to every vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPayload {
    pub text: String,
    pub doc_id: String,
    pub chunk_index: usize,
}

/// The unit persisted in a vector index.
///
/// `vector.len()` always equals the dimensionality the index was provisioned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPoint {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// A nearest neighbour returned by a similarity search.
///
/// `score` is backend specific; higher is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedResult {
    pub text: String,
    pub score: f32,
}

impl RetrievedResult {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self { text: text.into(), score }
    }
}
