#![forbid(unsafe_code)]

pub mod extract;
pub mod model;
pub mod stats;
pub mod time;

pub use extract::{ExtractionError, extract, extract_as};
pub use stats::{LearningStats, compute_stats};
pub use time::Clock;
