//! Course content generation on top of a text model and a video search.

pub mod client;
pub mod generator;
pub mod payload;
pub mod prompts;
pub mod videos;

pub use client::{GeminiClient, GeneratorConfig, TextGenerator};
pub use generator::CourseGenerator;
pub use payload::{CourseOutline, Exercise, ModuleDetail, QuizPayload, Resource};
pub use videos::{VideoSearch, YouTubeClient, fallback_videos};
