mod course;
mod ids;
mod progress;

pub use ids::{CourseId, ModuleId, ParseIdError};

pub use course::{
    Course, CourseDraft, CourseError, CourseUpdate, Difficulty, DifficultyError, Flashcard,
    Module, ModuleCompletion, ModuleDraft, QuestionKind, QuizQuestion, VideoLink,
};
pub use progress::{
    CourseProgress, FlashcardSession, FlashcardStats, LearningGoals, LearningTime,
    ModuleFlashcardStats, QuizScore, UserProgress,
};
