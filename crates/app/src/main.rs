use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use learn_core::model::{CourseId, Difficulty, FlashcardSession, ModuleId};
use serde::Serialize;
use services::{AppServices, Clock};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "learnpath")]
#[command(about = "Generate courses and track study progress locally", long_about = None)]
struct Cli {
    /// `SQLite` database URL or file path.
    #[arg(long, env = "LEARN_DB_URL", default_value = "sqlite://learnpath.sqlite3")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a course outline for a topic and store it.
    Generate {
        topic: String,
        #[arg(default_value = "beginner")]
        difficulty: Difficulty,
    },
    /// List stored courses.
    List,
    /// Print one course.
    Show { course_id: CourseId },
    /// Delete one course.
    Delete { course_id: CourseId },
    /// Generate the full lesson for a module title.
    Lesson { module_title: String },
    /// Generate a quiz and flashcards for a stored module and attach them.
    Study {
        course_id: CourseId,
        module_id: ModuleId,
    },
    /// Mark the module at an index as completed.
    CompleteModule { course_id: CourseId, index: usize },
    /// Record a quiz score.
    Quiz {
        course_id: CourseId,
        module_id: ModuleId,
        score: f64,
    },
    /// Record a flashcard study session.
    Flashcards {
        module_id: ModuleId,
        #[arg(long, default_value_t = 0)]
        reviewed: u32,
        #[arg(long, default_value_t = 0)]
        known: u32,
        #[arg(long, default_value_t = 0)]
        review: u32,
        #[arg(long, default_value_t = 0)]
        streak: u32,
    },
    /// Add study minutes and update the daily streak.
    Time { minutes: u64 },
    /// Print learning statistics.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEARN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;
    tracing::debug!(%db_url, "opening database");
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock())
        .await
        .with_context(|| format!("failed to open {db_url}"))?;
    let courses = app.courses();
    let progress = app.progress();

    match cli.command {
        Command::Generate { topic, difficulty } => {
            let draft = app
                .generator()
                .generate_course(&topic, difficulty)
                .await
                .with_context(|| format!("failed to generate a course on `{topic}`"))?;
            print_json(&courses.save_course(draft).await?)
        }
        Command::List => print_json(&courses.list_courses().await?),
        Command::Show { course_id } => match courses.get_course(&course_id).await? {
            Some(course) => print_json(&course),
            None => bail!("course {course_id} not found"),
        },
        Command::Delete { course_id } => {
            if !courses.delete_course(&course_id).await? {
                bail!("course {course_id} not found");
            }
            Ok(())
        }
        Command::Lesson { module_title } => {
            print_json(&app.generator().module_details(&module_title).await)
        }
        Command::Study {
            course_id,
            module_id,
        } => {
            let course = courses
                .get_course(&course_id)
                .await?
                .with_context(|| format!("course {course_id} not found"))?;
            let module = course
                .module(&module_id)
                .with_context(|| format!("module {module_id} not found in course {course_id}"))?;
            let difficulty = course.difficulty_level().unwrap_or(Difficulty::Intermediate);

            let generator = app.generator();
            let quiz = generator
                .generate_quiz(module.title(), module.content(), difficulty)
                .await
                .context("failed to generate quiz")?;
            let cards = generator
                .generate_flashcards(module.title(), module.content())
                .await
                .context("failed to generate flashcards")?;
            let updated = courses
                .attach_study_material(&course_id, &module_id, quiz.questions, cards)
                .await?
                .with_context(|| format!("course {course_id} changed while generating"))?;
            print_json(&updated)
        }
        Command::CompleteModule { course_id, index } => {
            match progress.record_module_completion(&course_id, index).await? {
                Some(course) => print_json(course.progress()),
                None => bail!("course {course_id} has no module {index}"),
            }
        }
        Command::Quiz {
            course_id,
            module_id,
            score,
        } => {
            if !progress
                .record_quiz_completion(&course_id, module_id, score)
                .await?
            {
                bail!("course {course_id} not found");
            }
            Ok(())
        }
        Command::Flashcards {
            module_id,
            reviewed,
            known,
            review,
            streak,
        } => {
            let session = FlashcardSession {
                total_reviewed: reviewed,
                known_count: known,
                review_count: review,
                streak_count: streak,
            };
            print_json(&progress.record_flashcard_session(module_id, session).await?)
        }
        Command::Time { minutes } => print_json(&progress.record_learning_time(minutes).await?),
        Command::Stats => print_json(&progress.learning_stats().await?),
    }
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run(Cli::parse()).await
}
