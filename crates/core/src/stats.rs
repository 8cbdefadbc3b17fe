//! Read-only learning statistics derived from courses and the user progress record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Course, LearningGoals, UserProgress};
use crate::time::calendar_day;

/// Flashcard counters plus values derived for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSummary {
    pub total_reviewed: u32,
    pub known_count: u32,
    pub review_count: u32,
    pub longest_streak: u32,
    pub last_studied: Option<DateTime<Utc>>,
    pub studied_today: bool,
    pub mastery_rate: f64,
}

/// Snapshot of the learner's overall progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total_courses: u32,
    pub completed_courses: u32,
    pub in_progress_courses: u32,
    pub course_completion_rate: f64,
    pub total_modules: u32,
    pub completed_modules: u32,
    pub module_completion_rate: f64,
    pub total_quizzes: u32,
    pub average_quiz_score: f64,
    pub quizzes_today: u32,
    pub streak_days: u32,
    pub total_time_spent: u64,
    pub flashcards: FlashcardSummary,
    pub learning_goals: LearningGoals,
}

/// Derives statistics as of `now`. Pure; neither input is modified.
///
/// Rates are percentages and are 0 whenever their denominator is 0. "Today" means the
/// calendar day of `now`.
#[must_use]
pub fn compute_stats(
    courses: &[Course],
    progress: &UserProgress,
    now: DateTime<Utc>,
) -> LearningStats {
    let today = calendar_day(now);

    let total_courses = count(courses.len());
    let completed_courses = count(courses.iter().filter(|c| c.progress().completed).count());
    let in_progress_courses = count(
        courses
            .iter()
            .filter(|c| c.progress().overall_progress > 0 && !c.progress().completed)
            .count(),
    );
    let total_modules = courses
        .iter()
        .fold(0_u32, |sum, c| sum.saturating_add(count(c.modules().len())));

    let average_quiz_score = if progress.quiz_scores.is_empty() {
        0.0
    } else {
        let sum: f64 = progress.quiz_scores.iter().map(|q| q.score).sum();
        sum / f64::from(count(progress.quiz_scores.len()))
    };
    let quizzes_today = count(
        progress
            .quiz_scores
            .iter()
            .filter(|q| calendar_day(q.date) == today)
            .count(),
    );

    let cards = &progress.flashcards;
    let flashcards = FlashcardSummary {
        total_reviewed: cards.total_reviewed,
        known_count: cards.known_count,
        review_count: cards.review_count,
        longest_streak: cards.longest_streak,
        last_studied: cards.last_studied,
        studied_today: cards
            .last_studied
            .is_some_and(|at| calendar_day(at) == today),
        mastery_rate: cards.mastery_rate(),
    };

    LearningStats {
        total_courses,
        completed_courses,
        in_progress_courses,
        course_completion_rate: percent(completed_courses, total_courses),
        total_modules,
        completed_modules: progress.completed_modules,
        module_completion_rate: percent(progress.completed_modules, total_modules),
        total_quizzes: progress.completed_quizzes,
        average_quiz_score,
        quizzes_today,
        streak_days: progress.streak_days,
        total_time_spent: progress.total_time_spent,
        flashcards,
        learning_goals: progress.learning_goals,
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseDraft, CourseId, FlashcardSession, ModuleDraft, ModuleId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn course(id: &str, modules: usize) -> Course {
        Course::new(
            CourseId::new(id),
            CourseDraft {
                title: format!("Course {id}"),
                modules: (0..modules)
                    .map(|i| ModuleDraft::new(format!("M{i}"), ""))
                    .collect(),
                ..CourseDraft::default()
            },
            fixed_now(),
        )
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_inputs_produce_zero_rates() {
        let stats = compute_stats(&[], &UserProgress::new(fixed_now()), fixed_now());
        assert_eq!(stats.total_courses, 0);
        assert!(approx(stats.course_completion_rate, 0.0));
        assert!(approx(stats.module_completion_rate, 0.0));
        assert!(approx(stats.average_quiz_score, 0.0));
        assert!(approx(stats.flashcards.mastery_rate, 0.0));
        assert!(!stats.flashcards.studied_today);
        assert_eq!(stats.learning_goals, LearningGoals::default());
    }

    #[test]
    fn course_counts_split_completed_and_in_progress() {
        let now = fixed_now();
        let mut done = course("a", 1);
        done.complete_module(0, now);
        let mut started = course("b", 4);
        started.complete_module(0, now);
        let untouched = course("c", 3);

        let mut progress = UserProgress::new(now);
        progress.completed_modules = 2;

        let stats = compute_stats(&[done, started, untouched], &progress, now);
        assert_eq!(stats.total_courses, 3);
        assert_eq!(stats.completed_courses, 1);
        assert_eq!(stats.in_progress_courses, 1);
        assert!(approx(stats.course_completion_rate, 100.0 / 3.0));
        assert_eq!(stats.total_modules, 8);
        assert!(approx(stats.module_completion_rate, 25.0));
    }

    #[test]
    fn quiz_average_and_today_count() {
        let now = fixed_now();
        let mut progress = UserProgress::new(now);
        progress.record_quiz(CourseId::new("a"), ModuleId::new("m"), 80.0, now - Duration::days(2));
        progress.record_quiz(CourseId::new("a"), ModuleId::new("m"), 90.0, now);
        progress.record_quiz(CourseId::new("a"), ModuleId::new("n"), 70.0, now - Duration::hours(1));

        let stats = compute_stats(&[], &progress, now);
        assert!(approx(stats.average_quiz_score, 80.0));
        assert_eq!(stats.quizzes_today, 2);
        assert_eq!(stats.total_quizzes, 3);
    }

    #[test]
    fn flashcard_mastery_and_studied_today() {
        let now = fixed_now();
        let mut progress = UserProgress::new(now);
        progress.record_flashcard_session(
            &ModuleId::new("m"),
            &FlashcardSession {
                total_reviewed: 4,
                known_count: 3,
                review_count: 1,
                streak_count: 3,
            },
            now,
        );

        let stats = compute_stats(&[], &progress, now);
        assert!(approx(stats.flashcards.mastery_rate, 75.0));
        assert!(stats.flashcards.studied_today);

        let tomorrow = compute_stats(&[], &progress, now + Duration::days(1));
        assert!(!tomorrow.flashcards.studied_today);
    }
}
