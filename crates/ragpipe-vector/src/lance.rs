//! LanceDB-backed [`VectorIndex`].
//!
//! One table per collection; rows are keyed by the `u64` point id and written
//! with `merge_insert` so re-ingesting a document overwrites its points.

use std::sync::{Arc, OnceLock};

use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt64Array,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use tracing::{debug, info};

use ragpipe_core::error::StoreError;
use ragpipe_core::traits::VectorIndex;
use ragpipe_core::types::{IndexedPoint, RetrievedResult};

use crate::schema::{build_points_schema, TEXT_COLUMN};
use crate::table::{ensure_table, open_db, table_vector_dim};

pub struct LanceIndex {
    conn: Connection,
    table_name: String,
    dim: OnceLock<usize>,
}

impl LanceIndex {
    pub async fn connect(uri: &str, table_name: &str) -> Result<Self, StoreError> {
        let conn = open_db(uri).await?;
        Ok(Self::with_connection(conn, table_name))
    }

    pub fn with_connection(conn: Connection, table_name: &str) -> Self {
        Self { conn, table_name: table_name.to_string(), dim: OnceLock::new() }
    }

    pub fn table_name(&self) -> &str { &self.table_name }

    pub async fn count(&self) -> Result<usize, StoreError> {
        self.ready_dim()?;
        self.open()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    fn ready_dim(&self) -> Result<usize, StoreError> {
        self.dim.get().copied().ok_or(StoreError::NotReady)
    }

    async fn open(&self) -> Result<Table, StoreError> {
        self.conn
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| {
                StoreError::Connection(format!("failed to open table {}: {e}", self.table_name))
            })
    }
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn ensure_ready(&self, dimension: usize) -> Result<(), StoreError> {
        let schema = build_points_schema(dimension);
        let created = ensure_table(&self.conn, &self.table_name, schema).await?;
        let existing = if created {
            dimension
        } else {
            table_vector_dim(&self.conn, &self.table_name).await?
        };
        if existing != dimension {
            return Err(StoreError::DimensionMismatch { expected: existing, actual: dimension });
        }
        let current = *self.dim.get_or_init(|| dimension);
        if current != dimension {
            return Err(StoreError::DimensionMismatch { expected: current, actual: dimension });
        }
        if created {
            info!(table = %self.table_name, dimension, "created points table");
        }
        Ok(())
    }

    async fn upsert(&self, points: &[IndexedPoint]) -> Result<(), StoreError> {
        let dim = self.ready_dim()?;
        if points.is_empty() {
            return Ok(());
        }
        let batch = points_to_record_batch(points, dim)?;
        let schema = batch.schema();
        let reader =
            Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.open().await?;
        // Upsert behavior via merge_insert: id is unique
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await.map_err(|e| StoreError::Write(e.to_string()))?;
        debug!(table = %self.table_name, points = points.len(), "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedResult>, StoreError> {
        let dim = self.ready_dim()?;
        if vector.len() != dim {
            return Err(StoreError::DimensionMismatch { expected: dim, actual: vector.len() });
        }
        let table = self.open().await?;
        let mut stream = table
            .vector_search(vector.to_vec())
            .map_err(|e| StoreError::Query(e.to_string()))?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mut hits = Vec::new();
        while let Some(batch) =
            stream.try_next().await.map_err(|e| StoreError::Query(e.to_string()))?
        {
            hits.extend(batch_to_results(&batch)?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }
}

fn points_to_record_batch(
    points: &[IndexedPoint],
    dim: usize,
) -> Result<RecordBatch, StoreError> {
    if let Some(bad) = points.iter().find(|p| p.vector.len() != dim) {
        return Err(StoreError::DimensionMismatch { expected: dim, actual: bad.vector.len() });
    }
    let ids: Vec<u64> = points.iter().map(|p| p.id).collect();
    let doc_ids: Vec<&str> = points.iter().map(|p| p.payload.doc_id.as_str()).collect();
    let texts: Vec<&str> = points.iter().map(|p| p.payload.text.as_str()).collect();
    let chunk_indices = points
        .iter()
        .map(|p| {
            let index = p.payload.chunk_index;
            i32::try_from(index)
                .map_err(|_| StoreError::Write(format!("chunk index {index} out of range")))
        })
        .collect::<Result<Vec<i32>, _>>()?;
    let vectors =
        points.iter().map(|p| Some(p.vector.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
    RecordBatch::try_new(
        build_points_schema(dim),
        vec![
            Arc::new(UInt64Array::from(ids)),
            Arc::new(StringArray::from(doc_ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(Int32Array::from(chunk_indices)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                vectors,
                dim as i32,
            )),
        ],
    )
    .map_err(|e| StoreError::Write(e.to_string()))
}

/// Cosine distance is in [0, 2]; report similarity so higher is better.
fn batch_to_results(batch: &RecordBatch) -> Result<Vec<RetrievedResult>, StoreError> {
    let texts = batch
        .column_by_name(TEXT_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| {
            StoreError::Query(format!("{TEXT_COLUMN} column missing from search results"))
        })?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| {
            StoreError::Query("_distance column missing from search results".to_string())
        })?;
    Ok((0..batch.num_rows())
        .filter(|&i| texts.is_valid(i))
        .map(|i| RetrievedResult::new(texts.value(i), 1.0 - distances.value(i)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragpipe_core::types::PointPayload;

    fn point(id: u64, vector: Vec<f32>) -> IndexedPoint {
        let payload = PointPayload {
            text: format!("t{id}"),
            doc_id: "d".to_string(),
            chunk_index: id as usize,
        };
        IndexedPoint { id, vector, payload }
    }

    #[test]
    fn record_batch_has_one_row_per_point() {
        let points = [point(1, vec![1.0, 0.0]), point(2, vec![0.0, 1.0])];
        let batch = points_to_record_batch(&points, 2).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);
    }

    #[test]
    fn record_batch_rejects_wrong_length_vectors() {
        let err = points_to_record_batch(&[point(1, vec![1.0, 0.0, 0.0])], 2).unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 3 }));
    }
}
