use std::sync::Arc;

use learn_core::model::{Course, CourseDraft, CourseId, CourseUpdate, Flashcard, ModuleId, QuizQuestion};
use storage::repository::{CourseRepository, StorageError};
use tracing::{info, warn};

use crate::Clock;
use crate::error::CourseServiceError;

/// Orchestrates course creation and persistence.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>) -> Self {
        Self { clock, courses }
    }

    /// Stores a new course with a fresh id and zeroed progress.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn save_course(&self, draft: CourseDraft) -> Result<Course, CourseServiceError> {
        let course = Course::new(CourseId::generate(), draft, self.clock.now())?;
        let mut courses = self.courses.read_courses().await?;
        courses.push(course.clone());
        self.courses.commit_courses(&courses).await?;
        info!(course_id = %course.id(), modules = course.modules().len(), "course saved");
        Ok(course)
    }

    /// Fetch a course by id.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, CourseServiceError> {
        let courses = self.courses.read_courses().await?;
        Ok(courses.into_iter().find(|c| c.id() == id))
    }

    /// All stored courses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.read_courses().await?)
    }

    /// Merges `update` into a stored course. The id is preserved.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` with `StorageError::NotFound` for an unknown id.
    /// Returns `CourseServiceError::Course` if the update is invalid.
    pub async fn update_course(
        &self,
        id: &CourseId,
        update: CourseUpdate,
    ) -> Result<Course, CourseServiceError> {
        let mut courses = self.courses.read_courses().await?;
        let course = courses
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(StorageError::NotFound)?;
        course.apply_update(update)?;
        let updated = course.clone();
        self.courses.commit_courses(&courses).await?;
        Ok(updated)
    }

    /// Appends generated quiz questions and flashcards to one module of a course.
    ///
    /// Returns `Ok(None)` when the course or module does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn attach_study_material(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
        quizzes: Vec<QuizQuestion>,
        flashcards: Vec<Flashcard>,
    ) -> Result<Option<Course>, CourseServiceError> {
        let mut courses = self.courses.read_courses().await?;
        let Some(course) = courses.iter_mut().find(|c| c.id() == course_id) else {
            return Ok(None);
        };
        let Some(module) = course.module_mut(module_id) else {
            warn!(%course_id, %module_id, "study material for unknown module");
            return Ok(None);
        };
        module.add_quizzes(quizzes);
        module.add_flashcards(flashcards);
        let updated = course.clone();
        self.courses.commit_courses(&courses).await?;
        Ok(Some(updated))
    }

    /// Removes a course. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn delete_course(&self, id: &CourseId) -> Result<bool, CourseServiceError> {
        let mut courses = self.courses.read_courses().await?;
        let before = courses.len();
        courses.retain(|c| c.id() != id);
        if courses.len() == before {
            return Ok(false);
        }
        self.courses.commit_courses(&courses).await?;
        info!(course_id = %id, "course deleted");
        Ok(true)
    }
}
