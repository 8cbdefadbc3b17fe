//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::ExtractionError;
use learn_core::model::CourseError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the generation clients and `CourseGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("content generation is not configured")]
    Disabled,
    #[error("course topic cannot be empty")]
    EmptyTopic,
    #[error("invalid generator base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("no videos found for `{0}`")]
    NoVideos(String),
    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("failed to update progress")]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error("failed to update courses")]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
