use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Encodes a document body as JSON text.
pub(crate) fn encode_document<T: Serialize + ?Sized>(
    name: &str,
    value: &T,
) -> Result<String, StorageError> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("{name}: {e}")))
}

/// Decodes the `body` column of a `documents` row.
pub(crate) fn decode_document<T: DeserializeOwned>(
    name: &str,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<T, StorageError> {
    let body: String = row.try_get("body").map_err(ser)?;
    serde_json::from_str(&body).map_err(|e| StorageError::Serialization(format!("{name}: {e}")))
}
