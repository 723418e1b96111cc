//! CSV encoding of dataframes.
//!
//! A dataframe is an Arrow [`RecordBatch`]. Datasets travel to the server as CSV with a
//! header row, which is what the server parses back into a table.

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

/// Semantic type the server assigns to a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Category,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Category => "category",
            ColumnType::Text => "text",
        }
    }
}

impl std::str::FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "numeric" => Ok(ColumnType::Numeric),
            "category" => Ok(ColumnType::Category),
            "text" => Ok(ColumnType::Text),
            _ => Err(format!(
                "unknown column type '{}' (expected numeric, category or text)",
                s
            )),
        }
    }
}

/// Declared column types, keyed by column name.
pub type ColumnTypes = BTreeMap<String, ColumnType>;

#[derive(Debug, thiserror::Error)]
pub enum DataframeError {
    #[error("CSV encoding failed: {0}")]
    Encode(ArrowError),
    #[error("CSV decoding failed: {0}")]
    Decode(ArrowError),
    #[error("no data found in the input")]
    EmptyData,
}

/// Write `df` as CSV with a header row.
///
/// Nulls and empty strings are both written as an empty field, and an empty field
/// reads back as null. A dataframe holding empty strings therefore does not round-trip
/// exactly: reading it with its own non-nullable schema fails, and a nullable schema
/// yields nulls in their place.
pub fn to_csv(df: &RecordBatch) -> Result<Vec<u8>, DataframeError> {
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(Vec::with_capacity(df.get_array_memory_size()));
    writer.write(df).map_err(DataframeError::Encode)?;
    Ok(writer.into_inner())
}

/// Read CSV with a header row into a single batch of the given schema.
pub fn from_csv(data: &[u8], schema: SchemaRef) -> Result<RecordBatch, DataframeError> {
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(Cursor::new(data))
        .map_err(DataframeError::Decode)?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(DataframeError::Decode)?;

    concat_batches(&schema, &batches).map_err(DataframeError::Decode)
}

/// Read CSV with a header row, inferring column types from the data.
pub fn from_csv_infer(data: &[u8]) -> Result<RecordBatch, DataframeError> {
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DataframeError::EmptyData);
    }

    let (schema, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(data), None)
        .map_err(DataframeError::Decode)?;

    from_csv(data, Arc::new(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::DataType;

    fn patients() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "age",
                Arc::new(Int64Array::from(vec![59, 48, 72])) as ArrayRef,
            ),
            (
                "sex",
                Arc::new(StringArray::from(vec!["male", "female", "male"])) as ArrayRef,
            ),
            (
                "bmi",
                Arc::new(Float64Array::from(vec![32.1, 21.6, 30.5])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_type_names() {
        assert_eq!("category".parse::<ColumnType>(), Ok(ColumnType::Category));
        assert!("test".parse::<ColumnType>().is_err());
        assert_eq!(
            serde_json::to_string(&ColumnType::Numeric).unwrap(),
            "\"numeric\""
        );
    }

    #[test]
    fn test_csv_has_header_row() {
        let csv = String::from_utf8(to_csv(&patients()).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("age,sex,bmi"));
        assert_eq!(lines.next(), Some("59,male,32.1"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_from_csv_with_schema() {
        let df = patients();
        let csv = to_csv(&df).unwrap();
        let loaded = from_csv(&csv, df.schema()).unwrap();
        assert_eq!(loaded, df);
    }

    #[test]
    fn test_from_csv_infers_types() {
        let loaded = from_csv_infer(b"age,sex,bmi\n59,male,32.1\n48,female,21.6\n").unwrap();
        let schema = loaded.schema();
        assert_eq!(loaded.num_rows(), 2);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
    }

    #[test]
    fn test_from_csv_infer_empty_input() {
        assert!(matches!(
            from_csv_infer(b"  \n"),
            Err(DataframeError::EmptyData)
        ));
    }

    #[test]
    fn test_empty_string_reads_back_as_null() {
        let df = RecordBatch::try_from_iter(vec![
            ("age", Arc::new(Int64Array::from(vec![59, 48])) as ArrayRef),
            (
                "sex",
                Arc::new(StringArray::from(vec!["male", ""])) as ArrayRef,
            ),
        ])
        .unwrap();
        let csv = to_csv(&df).unwrap();

        assert!(matches!(
            from_csv(&csv, df.schema()),
            Err(DataframeError::Decode(_))
        ));

        let loaded = from_csv_infer(&csv).unwrap();
        assert_eq!(loaded.num_rows(), 2);
        assert!(loaded.column(1).is_valid(0));
        assert!(loaded.column(1).is_null(1));
    }
}
