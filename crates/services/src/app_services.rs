use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::generation::{CourseGenerator, GeminiClient, TextGenerator, VideoSearch, YouTubeClient};
use crate::progress_service::ProgressService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    courses: Arc<CourseService>,
    progress: Arc<ProgressService>,
    generator: Arc<CourseGenerator>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with generation configured from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let text: Arc<dyn TextGenerator> = Arc::new(GeminiClient::from_env());
        let videos: Arc<dyn VideoSearch> = Arc::new(YouTubeClient::from_env());
        Ok(Self::from_storage(&storage, clock, text, videos))
    }

    /// Build services over an existing storage handle and generation backends.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        text: Arc<dyn TextGenerator>,
        videos: Arc<dyn VideoSearch>,
    ) -> Self {
        let courses = Arc::new(CourseService::new(clock, Arc::clone(&storage.courses)));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.user_progress),
        ));
        let generator = Arc::new(CourseGenerator::new(text, videos));
        Self {
            courses,
            progress,
            generator,
        }
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn generator(&self) -> Arc<CourseGenerator> {
        Arc::clone(&self.generator)
    }
}
