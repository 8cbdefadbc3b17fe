use std::sync::Arc;

use learn_core::model::{
    Course, CourseId, FlashcardSession, FlashcardStats, LearningTime, ModuleCompletion, ModuleId,
    UserProgress,
};
use learn_core::{LearningStats, compute_stats};
use storage::repository::{CourseRepository, UserProgressRepository};
use tracing::{info, warn};

use crate::Clock;
use crate::error::ProgressServiceError;

/// Records learning activity against the local course and progress documents.
///
/// Every operation reads the whole document, changes it, and commits it back.
/// There is no locking; a single writer is assumed.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    user_progress: Arc<dyn UserProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        user_progress: Arc<dyn UserProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            user_progress,
        }
    }

    /// The stored progress record, or a fresh one when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the record cannot be read.
    pub async fn user_progress(&self) -> Result<UserProgress, ProgressServiceError> {
        let now = self.clock.now();
        Ok(self
            .user_progress
            .read_user_progress()
            .await?
            .unwrap_or_else(|| UserProgress::new(now)))
    }

    /// Aggregate statistics as of now.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if either document cannot be read.
    pub async fn learning_stats(&self) -> Result<LearningStats, ProgressServiceError> {
        let courses = self.courses.read_courses().await?;
        let progress = self.user_progress().await?;
        Ok(compute_stats(&courses, &progress, self.clock.now()))
    }

    /// Marks the module at `module_index` of a course as completed.
    ///
    /// Returns the course as stored afterwards. Completing a module twice returns the
    /// unchanged course and does not touch the global counters. Returns `Ok(None)` when
    /// the course does not exist or has no module at that index.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if either document cannot be read or
    /// committed.
    pub async fn record_module_completion(
        &self,
        course_id: &CourseId,
        module_index: usize,
    ) -> Result<Option<Course>, ProgressServiceError> {
        let now = self.clock.now();
        let mut courses = self.courses.read_courses().await?;
        let Some(course) = courses.iter_mut().find(|c| c.id() == course_id) else {
            warn!(%course_id, "module completion for unknown course");
            return Ok(None);
        };

        let course_completed = match course.complete_module(module_index, now) {
            ModuleCompletion::Recorded { course_completed } => course_completed,
            ModuleCompletion::AlreadyCompleted => return Ok(Some(course.clone())),
            ModuleCompletion::OutOfRange => {
                warn!(%course_id, module_index, "module completion outside module list");
                return Ok(None);
            }
        };
        let updated = course.clone();
        self.courses.commit_courses(&courses).await?;

        let mut progress = self.user_progress().await?;
        progress.record_module_completion(course_completed, now);
        self.user_progress.commit_user_progress(&progress).await?;

        info!(
            %course_id,
            module_index,
            overall_progress = updated.progress().overall_progress,
            course_completed,
            "module completed"
        );
        Ok(Some(updated))
    }

    /// Appends a quiz score dated now.
    ///
    /// Scores are stored as given, without range checks. Returns `Ok(false)` when the
    /// course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if either document cannot be read or
    /// committed.
    pub async fn record_quiz_completion(
        &self,
        course_id: &CourseId,
        module_id: ModuleId,
        score: f64,
    ) -> Result<bool, ProgressServiceError> {
        let courses = self.courses.read_courses().await?;
        if !courses.iter().any(|c| c.id() == course_id) {
            warn!(%course_id, "quiz completion for unknown course");
            return Ok(false);
        }

        let now = self.clock.now();
        let mut progress = self.user_progress().await?;
        progress.record_quiz(course_id.clone(), module_id, score, now);
        self.user_progress.commit_user_progress(&progress).await?;
        info!(%course_id, score, "quiz completed");
        Ok(true)
    }

    /// Folds one flashcard study session into the per-module and global statistics.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the record cannot be read or committed.
    pub async fn record_flashcard_session(
        &self,
        module_id: ModuleId,
        session: FlashcardSession,
    ) -> Result<FlashcardStats, ProgressServiceError> {
        let now = self.clock.now();
        let mut progress = self.user_progress().await?;
        let stats = progress
            .record_flashcard_session(&module_id, &session, now)
            .clone();
        self.user_progress.commit_user_progress(&progress).await?;
        info!(
            %module_id,
            reviewed = session.total_reviewed,
            mastery_rate = stats.mastery_rate(),
            "flashcard session recorded"
        );
        Ok(stats)
    }

    /// Adds study minutes and updates the daily streak.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the record cannot be read or committed.
    pub async fn record_learning_time(
        &self,
        minutes: u64,
    ) -> Result<LearningTime, ProgressServiceError> {
        let now = self.clock.now();
        let mut progress = self.user_progress().await?;
        let time = progress.record_learning_time(minutes, now);
        self.user_progress.commit_user_progress(&progress).await?;
        info!(minutes, streak_days = time.streak_days, "learning time recorded");
        Ok(time)
    }
}
