//! Index columns recorded in the `pandas` schema metadata.
//!
//! A DataFrame written with a non-default index stores that index as extra
//! columns (`__index_level_0__`, or the index name) and lists them under
//! `index_columns`. A range index is stored as a description object instead
//! of a column and needs no handling.

use arrow::datatypes::Schema;
use serde::Deserialize;
use tracing::warn;

const PANDAS_METADATA_KEY: &str = "pandas";

#[derive(Debug, Deserialize)]
struct PandasMetadata {
    #[serde(default)]
    index_columns: Vec<serde_json::Value>,
}

/// Names of the columns pandas stored as the DataFrame index
pub fn index_columns(schema: &Schema) -> Vec<String> {
    let Some(raw) = schema.metadata().get(PANDAS_METADATA_KEY) else {
        return Vec::new();
    };

    match serde_json::from_str::<PandasMetadata>(raw) {
        Ok(metadata) => metadata
            .index_columns
            .into_iter()
            .filter_map(|column| match column {
                serde_json::Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        Err(e) => {
            warn!("Ignoring unreadable pandas metadata: {}", e);
            Vec::new()
        }
    }
}
