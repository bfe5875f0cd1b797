//! ragpipe-vector
//!
//! [`VectorIndex`](ragpipe_core::traits::VectorIndex) backends: a persistent
//! LanceDB table and an in-memory map for tests and the offline profile.

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceIndex;
pub use memory::{cosine_similarity, MemoryIndex};
