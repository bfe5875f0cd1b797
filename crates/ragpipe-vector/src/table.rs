//! LanceDB connection and table helpers.
use std::sync::Arc;

use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::{connect, Connection};

use ragpipe_core::error::StoreError;

use crate::schema::vector_dim;

pub async fn open_db(uri: &str) -> Result<Connection, StoreError> {
    connect(uri).execute().await.map_err(|e| StoreError::Connection(format!("{uri}: {e}")))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    Ok(names.iter().any(|n| n == name))
}

/// Create `name` with `schema` when missing. Returns true if it was created.
pub async fn ensure_table(
    conn: &Connection,
    name: &str,
    schema: Arc<Schema>,
) -> Result<bool, StoreError> {
    if table_exists(conn, name).await? {
        return Ok(false);
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter))
        .execute()
        .await
        .map_err(|e| StoreError::Schema(format!("failed to create table {name}: {e}")))?;
    Ok(true)
}

/// Vector length of an existing table.
pub async fn table_vector_dim(conn: &Connection, name: &str) -> Result<usize, StoreError> {
    let table = conn
        .open_table(name)
        .execute()
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    let schema = table.schema().await.map_err(|e| StoreError::Schema(e.to_string()))?;
    vector_dim(&schema).ok_or_else(|| {
        StoreError::Schema(format!("table {name} has no fixed-size vector column"))
    })
}
