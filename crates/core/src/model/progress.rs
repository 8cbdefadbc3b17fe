use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{CourseId, ModuleId};
use crate::time::calendar_days_between;

//
// ─── COURSE PROGRESS ───────────────────────────────────────────────────────────
//

/// Completion state attached to a single course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    #[serde(default)]
    pub completed: bool,
    /// Indices into the course's module list, in completion order.
    #[serde(default)]
    pub completed_modules: Vec<usize>,
    pub last_accessed: DateTime<Utc>,
    /// Percentage in `0..=100`.
    #[serde(default)]
    pub overall_progress: u8,
}

impl CourseProgress {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            completed: false,
            completed_modules: Vec::new(),
            last_accessed: now,
            overall_progress: 0,
        }
    }

    /// Records module `index` as done out of `total_modules`.
    ///
    /// Returns false (and leaves everything untouched) if it was already recorded.
    pub fn record_module(&mut self, index: usize, total_modules: usize, now: DateTime<Utc>) -> bool {
        if self.completed_modules.contains(&index) {
            return false;
        }
        self.completed_modules.push(index);
        self.overall_progress = rounded_percent(self.completed_modules.len(), total_modules);
        self.completed = self.overall_progress == 100;
        self.last_accessed = now;
        true
    }
}

/// `round(done / total * 100)` with halves rounded up, capped at 100.
fn rounded_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (done.saturating_mul(200) + total) / (2 * total);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

/// Counters reported at the end of a flashcard study session.
///
/// `known_count` and `review_count` are a snapshot of the deck's current
/// classification; `total_reviewed` counts cards flipped in this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSession {
    pub total_reviewed: u32,
    pub known_count: u32,
    pub review_count: u32,
    pub streak_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleFlashcardStats {
    pub total_reviewed: u32,
    pub known_count: u32,
    pub review_count: u32,
    pub highest_streak: u32,
    pub last_studied: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlashcardStats {
    pub total_reviewed: u32,
    pub known_count: u32,
    pub review_count: u32,
    pub longest_streak: u32,
    pub last_studied: Option<DateTime<Utc>>,
    pub module_stats: BTreeMap<ModuleId, ModuleFlashcardStats>,
}

impl FlashcardStats {
    /// Share of classified cards marked known, as a percentage.
    ///
    /// Returns 0 when nothing has been classified.
    #[must_use]
    pub fn mastery_rate(&self) -> f64 {
        if self.known_count == 0 && self.review_count == 0 {
            return 0.0;
        }
        let classified = f64::from(self.known_count) + f64::from(self.review_count);
        f64::from(self.known_count) / classified * 100.0
    }

    /// Folds a finished session for `module_id` into the per-module and global counters.
    ///
    /// `total_reviewed` accumulates. Known/review counts are replaced for the module, and
    /// the global known/review counts are recomputed as sums over every module snapshot.
    pub fn record_session(
        &mut self,
        module_id: &ModuleId,
        session: &FlashcardSession,
        now: DateTime<Utc>,
    ) {
        let module = self.module_stats.entry(module_id.clone()).or_default();
        module.total_reviewed = module.total_reviewed.saturating_add(session.total_reviewed);
        module.known_count = session.known_count;
        module.review_count = session.review_count;
        module.highest_streak = module.highest_streak.max(session.streak_count);
        module.last_studied = Some(now);

        self.total_reviewed = self.total_reviewed.saturating_add(session.total_reviewed);
        self.known_count = self
            .module_stats
            .values()
            .fold(0_u32, |sum, m| sum.saturating_add(m.known_count));
        self.review_count = self
            .module_stats
            .values()
            .fold(0_u32, |sum, m| sum.saturating_add(m.review_count));
        self.longest_streak = self.longest_streak.max(session.streak_count);
        self.last_studied = Some(now);
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// One recorded quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub course_id: CourseId,
    pub module_id: ModuleId,
    /// Not range checked.
    pub score: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningGoals {
    /// Minutes per day.
    pub daily_target: u32,
    /// Courses per week.
    pub weekly_target: u32,
}

impl Default for LearningGoals {
    fn default() -> Self {
        Self {
            daily_target: 30,
            weekly_target: 3,
        }
    }
}

/// Returned by `UserProgress::record_learning_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningTime {
    pub total_time_spent: u64,
    pub streak_days: u32,
}

/// Learner-wide counters. A single instance exists per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    /// Minutes.
    #[serde(default)]
    pub total_time_spent: u64,
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub completed_courses: u32,
    #[serde(default)]
    pub completed_modules: u32,
    #[serde(default)]
    pub completed_quizzes: u32,
    #[serde(default)]
    pub quiz_scores: Vec<QuizScore>,
    #[serde(default)]
    pub flashcards: FlashcardStats,
    #[serde(default)]
    pub learning_goals: LearningGoals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl UserProgress {
    /// Fresh progress for a learner first seen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            total_time_spent: 0,
            last_login: now,
            streak_days: 0,
            completed_courses: 0,
            completed_modules: 0,
            completed_quizzes: 0,
            quiz_scores: Vec::new(),
            flashcards: FlashcardStats::default(),
            learning_goals: LearningGoals::default(),
            last_updated: None,
        }
    }

    pub fn record_module_completion(&mut self, course_completed: bool, now: DateTime<Utc>) {
        self.completed_modules = self.completed_modules.saturating_add(1);
        if course_completed {
            self.completed_courses = self.completed_courses.saturating_add(1);
        }
        self.last_updated = Some(now);
    }

    pub fn record_quiz(
        &mut self,
        course_id: CourseId,
        module_id: ModuleId,
        score: f64,
        now: DateTime<Utc>,
    ) {
        self.quiz_scores.push(QuizScore {
            course_id,
            module_id,
            score,
            date: now,
        });
        self.completed_quizzes = self.completed_quizzes.saturating_add(1);
        self.last_updated = Some(now);
    }

    pub fn record_flashcard_session(
        &mut self,
        module_id: &ModuleId,
        session: &FlashcardSession,
        now: DateTime<Utc>,
    ) -> &FlashcardStats {
        self.flashcards.record_session(module_id, session, now);
        self.last_updated = Some(now);
        &self.flashcards
    }

    /// Adds study minutes and advances the daily streak.
    ///
    /// Same calendar day as the last login keeps the streak, the following day extends it,
    /// any later day restarts it at 1. A last login in the future leaves it unchanged.
    pub fn record_learning_time(&mut self, minutes: u64, now: DateTime<Utc>) -> LearningTime {
        self.total_time_spent = self.total_time_spent.saturating_add(minutes);
        match calendar_days_between(self.last_login, now) {
            1 => self.streak_days = self.streak_days.saturating_add(1),
            gap if gap > 1 => self.streak_days = 1,
            _ => {}
        }
        self.last_login = now;
        self.last_updated = Some(now);
        LearningTime {
            total_time_spent: self.total_time_spent,
            streak_days: self.streak_days,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn rounded_percent_matches_half_up_rounding() {
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(3, 3), 100);
        assert_eq!(rounded_percent(0, 0), 0);
    }

    #[test]
    fn record_module_is_idempotent() {
        let mut progress = CourseProgress::new(fixed_now());
        assert!(progress.record_module(0, 3, fixed_now()));
        let once = progress.clone();
        assert!(!progress.record_module(0, 3, fixed_now() + Duration::hours(1)));
        assert_eq!(progress, once);
        assert_eq!(progress.overall_progress, 33);
    }

    #[test]
    fn mastery_rate_is_known_over_classified() {
        let stats = FlashcardStats {
            known_count: 3,
            review_count: 1,
            ..FlashcardStats::default()
        };
        assert!((stats.mastery_rate() - 75.0).abs() < f64::EPSILON);
        assert!(FlashcardStats::default().mastery_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn flashcard_session_replaces_snapshot_and_adds_reviews() {
        let mut stats = FlashcardStats::default();
        let m1 = ModuleId::new("m1");
        let m2 = ModuleId::new("m2");
        let now = fixed_now();

        stats.record_session(
            &m1,
            &FlashcardSession {
                total_reviewed: 10,
                known_count: 6,
                review_count: 4,
                streak_count: 5,
            },
            now,
        );
        stats.record_session(
            &m2,
            &FlashcardSession {
                total_reviewed: 4,
                known_count: 1,
                review_count: 3,
                streak_count: 2,
            },
            now,
        );
        stats.record_session(
            &m1,
            &FlashcardSession {
                total_reviewed: 8,
                known_count: 8,
                review_count: 2,
                streak_count: 3,
            },
            now,
        );

        let module = &stats.module_stats[&m1];
        assert_eq!(module.total_reviewed, 18);
        assert_eq!(module.known_count, 8);
        assert_eq!(module.review_count, 2);
        assert_eq!(module.highest_streak, 5);

        assert_eq!(stats.total_reviewed, 22);
        assert_eq!(stats.known_count, 9);
        assert_eq!(stats.review_count, 5);
        assert_eq!(stats.longest_streak, 5);
        assert_eq!(stats.last_studied, Some(now));
    }

    #[test]
    fn streak_unchanged_on_same_day() {
        let now = fixed_now();
        let mut progress = UserProgress::new(now - Duration::hours(3));
        progress.streak_days = 4;
        let out = progress.record_learning_time(15, now);
        assert_eq!(out.streak_days, 4);
        assert_eq!(out.total_time_spent, 15);
    }

    #[test]
    fn streak_extends_after_yesterday() {
        let now = fixed_now();
        let mut progress = UserProgress::new(now - Duration::days(1));
        progress.streak_days = 4;
        assert_eq!(progress.record_learning_time(5, now).streak_days, 5);
        assert_eq!(progress.last_login, now);
    }

    #[test]
    fn streak_resets_after_gap() {
        let now = fixed_now();
        let mut progress = UserProgress::new(now - Duration::days(3));
        progress.streak_days = 9;
        assert_eq!(progress.record_learning_time(5, now).streak_days, 1);
    }

    #[test]
    fn quiz_and_module_counters_accumulate() {
        let now = fixed_now();
        let mut progress = UserProgress::new(now);
        progress.record_quiz(CourseId::new("c"), ModuleId::new("m"), 140.0, now);
        progress.record_module_completion(false, now);
        progress.record_module_completion(true, now);

        assert_eq!(progress.completed_quizzes, 1);
        assert!((progress.quiz_scores[0].score - 140.0).abs() < f64::EPSILON);
        assert_eq!(progress.completed_modules, 2);
        assert_eq!(progress.completed_courses, 1);
        assert_eq!(progress.last_updated, Some(now));
    }

    #[test]
    fn user_progress_reads_sparse_document() {
        let json = r#"{"lastLogin": "2023-11-14T22:13:20Z", "streakDays": 2}"#;
        let progress: UserProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.streak_days, 2);
        assert_eq!(progress.learning_goals, LearningGoals::default());
        assert!(progress.flashcards.module_stats.is_empty());
    }
}
