use async_trait::async_trait;
use chrono::Utc;
use learn_core::model::{Course, UserProgress};

use super::SqliteRepository;
use super::mapping::{conn, decode_document, encode_document};
use crate::repository::{
    COURSES_DOCUMENT, CourseRepository, StorageError, USER_PROGRESS_DOCUMENT,
    UserProgressRepository,
};

impl SqliteRepository {
    async fn fetch_document(
        &self,
        name: &str,
    ) -> Result<Option<sqlx::sqlite::SqliteRow>, StorageError> {
        sqlx::query("SELECT body FROM documents WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)
    }

    async fn store_document(&self, name: &str, body: String) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO documents (name, body, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(name) DO UPDATE SET
                    body = excluded.body,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(name)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for SqliteRepository {
    async fn read_courses(&self) -> Result<Vec<Course>, StorageError> {
        match self.fetch_document(COURSES_DOCUMENT).await? {
            Some(row) => decode_document(COURSES_DOCUMENT, &row),
            None => Ok(Vec::new()),
        }
    }

    async fn commit_courses(&self, courses: &[Course]) -> Result<(), StorageError> {
        let body = encode_document(COURSES_DOCUMENT, courses)?;
        self.store_document(COURSES_DOCUMENT, body).await?;
        tracing::debug!(count = courses.len(), "committed course collection");
        Ok(())
    }
}

#[async_trait]
impl UserProgressRepository for SqliteRepository {
    async fn read_user_progress(&self) -> Result<Option<UserProgress>, StorageError> {
        self.fetch_document(USER_PROGRESS_DOCUMENT)
            .await?
            .map(|row| decode_document(USER_PROGRESS_DOCUMENT, &row))
            .transpose()
    }

    async fn commit_user_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let body = encode_document(USER_PROGRESS_DOCUMENT, progress)?;
        self.store_document(USER_PROGRESS_DOCUMENT, body).await
    }
}
