use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId};
use crate::model::progress::CourseProgress;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("module {index} has an empty title")]
    EmptyModuleTitle { index: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid difficulty level `{0}`; expected beginner, intermediate, or advanced")]
pub struct DifficultyError(pub String);

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Target audience level requested when generating a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(DifficultyError(other.to_string())),
        }
    }
}

//
// ─── STUDY MATERIAL ────────────────────────────────────────────────────────────
//

/// A video suggested alongside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    pub title: String,
    pub url: String,
}

/// Kind of quiz question as emitted by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    TrueFalse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default, rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Returns true if `answer` matches the correct answer, ignoring surrounding whitespace.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer.trim() == answer.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// Unvalidated module input, as produced by generation or callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDraft {
    pub id: Option<ModuleId>,
    pub title: String,
    pub content: String,
    pub quizzes: Vec<QuizQuestion>,
    pub flashcards: Vec<Flashcard>,
}

impl ModuleDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// One unit of a course. Only quizzes and flashcards grow after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    id: ModuleId,
    title: String,
    #[serde(default, alias = "briefDescription")]
    content: String,
    #[serde(default)]
    quizzes: Vec<QuizQuestion>,
    #[serde(default)]
    flashcards: Vec<Flashcard>,
}

impl Module {
    fn from_draft(index: usize, draft: ModuleDraft) -> Result<Self, CourseError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CourseError::EmptyModuleTitle { index });
        }
        Ok(Self {
            id: draft.id.unwrap_or_else(ModuleId::generate),
            title: title.to_owned(),
            content: draft.content.trim().to_owned(),
            quizzes: draft.quizzes,
            flashcards: draft.flashcards,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn quizzes(&self) -> &[QuizQuestion] {
        &self.quizzes
    }

    #[must_use]
    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn add_quizzes(&mut self, quizzes: impl IntoIterator<Item = QuizQuestion>) {
        self.quizzes.extend(quizzes);
    }

    pub fn add_flashcards(&mut self, flashcards: impl IntoIterator<Item = Flashcard>) {
        self.flashcards.extend(flashcards);
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Unvalidated course input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub difficulty_level: Option<Difficulty>,
    pub modules: Vec<ModuleDraft>,
    pub recommended_videos: Vec<VideoLink>,
}

/// Partial replacement applied by `Course::apply_update`. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub modules: Option<Vec<Module>>,
    pub progress: Option<CourseProgress>,
}

/// Result of marking a module as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleCompletion {
    /// Newly recorded; `course_completed` is true when this completion finished the course.
    Recorded { course_completed: bool },
    /// The module was already in the completed list; nothing changed.
    AlreadyCompleted,
    /// No module exists at that index.
    OutOfRange,
}

/// A persisted unit of generated learning content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(alias = "_id")]
    id: CourseId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty_level: Option<Difficulty>,
    #[serde(default)]
    modules: Vec<Module>,
    #[serde(default)]
    recommended_videos: Vec<VideoLink>,
    created_at: DateTime<Utc>,
    progress: CourseProgress,
}

impl Course {
    /// Creates a new course with zeroed progress.
    ///
    /// Modules without an id receive a generated one.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank, or
    /// `CourseError::EmptyModuleTitle` if any module title is blank.
    pub fn new(id: CourseId, draft: CourseDraft, now: DateTime<Utc>) -> Result<Self, CourseError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        let modules = draft
            .modules
            .into_iter()
            .enumerate()
            .map(|(index, module)| Module::from_draft(index, module))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            title: title.to_owned(),
            description: draft.description.trim().to_owned(),
            difficulty_level: draft.difficulty_level,
            modules,
            recommended_videos: draft.recommended_videos,
            created_at: now,
            progress: CourseProgress::new(now),
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn difficulty_level(&self) -> Option<Difficulty> {
        self.difficulty_level
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn recommended_videos(&self) -> &[VideoLink] {
        &self.recommended_videos
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn progress(&self) -> &CourseProgress {
        &self.progress
    }

    /// Looks up a module by id.
    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    pub fn module_mut(&mut self, id: &ModuleId) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id() == id)
    }

    /// Marks the module at `index` as completed and recomputes overall progress.
    ///
    /// Idempotent: completing an already completed module changes nothing.
    pub fn complete_module(&mut self, index: usize, now: DateTime<Utc>) -> ModuleCompletion {
        if index >= self.modules.len() {
            return ModuleCompletion::OutOfRange;
        }
        let was_completed = self.progress.completed;
        if !self.progress.record_module(index, self.modules.len(), now) {
            return ModuleCompletion::AlreadyCompleted;
        }
        ModuleCompletion::Recorded {
            course_completed: self.progress.completed && !was_completed,
        }
    }

    /// Shallow-merges `update` into this course. The id never changes.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the new title is blank.
    pub fn apply_update(&mut self, update: CourseUpdate) -> Result<(), CourseError> {
        if let Some(title) = update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CourseError::EmptyTitle);
            }
            self.title = title.to_owned();
        }
        if let Some(description) = update.description {
            self.description = description.trim().to_owned();
        }
        if let Some(modules) = update.modules {
            self.modules = modules;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(modules: usize) -> CourseDraft {
        CourseDraft {
            title: "  Rust Basics ".into(),
            description: " Ownership and borrowing ".into(),
            difficulty_level: Some(Difficulty::Beginner),
            modules: (0..modules)
                .map(|i| ModuleDraft::new(format!("Module {i}"), "content"))
                .collect(),
            recommended_videos: Vec::new(),
        }
    }

    #[test]
    fn course_new_rejects_empty_title() {
        let mut d = draft(1);
        d.title = "   ".into();
        let err = Course::new(CourseId::new("c1"), d, fixed_now()).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);
    }

    #[test]
    fn course_new_rejects_empty_module_title() {
        let mut d = draft(2);
        d.modules[1].title = String::new();
        let err = Course::new(CourseId::new("c1"), d, fixed_now()).unwrap_err();
        assert_eq!(err, CourseError::EmptyModuleTitle { index: 1 });
    }

    #[test]
    fn course_new_trims_and_assigns_module_ids() {
        let mut d = draft(2);
        d.modules[0].id = Some(ModuleId::new("keep-me"));
        let course = Course::new(CourseId::new("c1"), d, fixed_now()).unwrap();

        assert_eq!(course.title(), "Rust Basics");
        assert_eq!(course.description(), "Ownership and borrowing");
        assert_eq!(course.modules()[0].id(), &ModuleId::new("keep-me"));
        assert!(!course.modules()[1].id().as_str().is_empty());
        assert_eq!(course.progress().overall_progress, 0);
        assert!(!course.progress().completed);
    }

    #[test]
    fn completing_four_modules_reports_course_completion_once() {
        let mut course = Course::new(CourseId::new("c1"), draft(4), fixed_now()).unwrap();
        let mut seen = Vec::new();
        for index in 0..4 {
            let outcome = course.complete_module(index, fixed_now());
            seen.push((course.progress().overall_progress, outcome));
        }
        assert_eq!(
            seen,
            vec![
                (25, ModuleCompletion::Recorded { course_completed: false }),
                (50, ModuleCompletion::Recorded { course_completed: false }),
                (75, ModuleCompletion::Recorded { course_completed: false }),
                (100, ModuleCompletion::Recorded { course_completed: true }),
            ]
        );
        assert!(course.progress().completed);
    }

    #[test]
    fn completing_same_module_twice_is_a_no_op() {
        let mut course = Course::new(CourseId::new("c1"), draft(3), fixed_now()).unwrap();
        course.complete_module(1, fixed_now());
        let before = course.clone();
        assert_eq!(
            course.complete_module(1, fixed_now()),
            ModuleCompletion::AlreadyCompleted
        );
        assert_eq!(course, before);
    }

    #[test]
    fn completing_unknown_index_is_out_of_range() {
        let mut course = Course::new(CourseId::new("c1"), draft(2), fixed_now()).unwrap();
        assert_eq!(course.complete_module(2, fixed_now()), ModuleCompletion::OutOfRange);
        assert!(course.progress().completed_modules.is_empty());
    }

    #[test]
    fn apply_update_keeps_id_and_rejects_blank_title() {
        let mut course = Course::new(CourseId::new("c1"), draft(1), fixed_now()).unwrap();
        course
            .apply_update(CourseUpdate {
                title: Some("Advanced Rust".into()),
                ..CourseUpdate::default()
            })
            .unwrap();
        assert_eq!(course.title(), "Advanced Rust");
        assert_eq!(course.id(), &CourseId::new("c1"));

        let err = course
            .apply_update(CourseUpdate {
                title: Some(" ".into()),
                ..CourseUpdate::default()
            })
            .unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);
    }

    #[test]
    fn difficulty_parses_strictly() {
        assert_eq!("advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert!("Expert".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Intermediate.to_string(), "intermediate");
    }

    #[test]
    fn course_reads_legacy_document_shape() {
        let json = r#"{
            "_id": "lx1abc",
            "title": "Python",
            "description": "Intro",
            "difficultyLevel": "beginner",
            "modules": [
                {"id": "m1", "title": "Syntax", "briefDescription": "Basics"}
            ],
            "createdAt": "2023-11-14T22:13:20Z",
            "progress": {
                "completed": false,
                "completedModules": [0],
                "lastAccessed": "2023-11-14T22:13:20Z",
                "overallProgress": 100
            }
        }"#;
        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.id(), &CourseId::new("lx1abc"));
        assert_eq!(course.modules()[0].content(), "Basics");
        assert_eq!(course.progress().completed_modules, vec![0]);
    }

    #[test]
    fn quiz_question_accepts_generator_shape() {
        let json = r#"{
            "question": "Is Rust memory safe?",
            "type": "true-false",
            "options": ["True", "False"],
            "correctAnswer": "True",
            "explanation": "The borrow checker."
        }"#;
        let q: QuizQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind, QuestionKind::TrueFalse);
        assert!(q.is_correct(" True"));
        assert!(!q.is_correct("False"));
    }
}
