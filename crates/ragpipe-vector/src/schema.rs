//! Arrow schema of the points table.
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const DOC_ID_COLUMN: &str = "doc_id";
pub const TEXT_COLUMN: &str = "text";
pub const CHUNK_INDEX_COLUMN: &str = "chunk_index";
pub const VECTOR_COLUMN: &str = "vector";

pub fn build_points_schema(dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::UInt64, false),
        Field::new(DOC_ID_COLUMN, DataType::Utf8, false),
        Field::new(TEXT_COLUMN, DataType::Utf8, false),
        Field::new(CHUNK_INDEX_COLUMN, DataType::Int32, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dim as i32,
            ),
            true,
        ),
    ]))
}

/// Length of the fixed-size `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_reports_its_dimension() {
        let schema = build_points_schema(3072);
        assert_eq!(vector_dim(&schema), Some(3072));
        assert_eq!(schema.fields().len(), 5);
    }

    #[test]
    fn schema_without_vector_has_no_dimension() {
        let schema = Schema::new(vec![Field::new("id", DataType::UInt64, false)]);
        assert_eq!(vector_dim(&schema), None);
    }
}
