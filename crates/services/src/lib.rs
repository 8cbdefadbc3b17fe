#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod error;
pub mod generation;
pub mod progress_service;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use course_service::CourseService;
pub use error::{AppServicesError, CourseServiceError, GenerationError, ProgressServiceError};
pub use generation::{
    CourseGenerator, GeminiClient, GeneratorConfig, ModuleDetail, QuizPayload, TextGenerator,
    VideoSearch, YouTubeClient,
};
pub use progress_service::ProgressService;
