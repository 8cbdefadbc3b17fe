use async_trait::async_trait;
use learn_core::model::{Course, UserProgress};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Name of the document holding the full course collection.
pub const COURSES_DOCUMENT: &str = "courses";

/// Name of the document holding the single user progress record.
pub const USER_PROGRESS_DOCUMENT: &str = "userProgress";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the course collection.
///
/// The collection is read and written as a whole; callers read, modify, and commit.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Read every stored course, in insertion order.
    ///
    /// Returns an empty list when nothing has been committed yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read or decoded.
    async fn read_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Replace the full course collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be encoded or stored.
    async fn commit_courses(&self, courses: &[Course]) -> Result<(), StorageError>;
}

/// Repository contract for the single user progress record.
#[async_trait]
pub trait UserProgressRepository: Send + Sync {
    /// Read the stored record, if one has been committed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read or decoded.
    async fn read_user_progress(&self) -> Result<Option<UserProgress>, StorageError>;

    /// Replace the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or stored.
    async fn commit_user_progress(&self, progress: &UserProgress) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<Vec<Course>>>,
    user_progress: Arc<Mutex<Option<UserProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            courses: Arc::new(Mutex::new(Vec::new())),
            user_progress: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn read_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn commit_courses(&self, courses: &[Course]) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = courses.to_vec();
        Ok(())
    }
}

#[async_trait]
impl UserProgressRepository for InMemoryRepository {
    async fn read_user_progress(&self) -> Result<Option<UserProgress>, StorageError> {
        let guard = self
            .user_progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn commit_user_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let mut guard = self
            .user_progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(progress.clone());
        Ok(())
    }
}

/// Aggregates the course and progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub user_progress: Arc<dyn UserProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let user_progress: Arc<dyn UserProgressRepository> = Arc::new(repo);
        Self {
            courses,
            user_progress,
        }
    }
}
