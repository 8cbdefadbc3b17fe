//! Shapes the generator is asked to return.

use learn_core::model::{CourseDraft, Difficulty, ModuleDraft, ModuleId, QuizQuestion, VideoLink};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Course outline as produced by the generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modules: Vec<OutlineModule>,
    #[serde(default)]
    pub video_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineModule {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, alias = "content")]
    pub brief_description: String,
}

impl CourseOutline {
    /// Converts the outline into a draft at the requested difficulty.
    ///
    /// A blank course title falls back to `topic`; modules with blank titles are dropped.
    #[must_use]
    pub fn into_draft(
        self,
        topic: &str,
        difficulty: Difficulty,
        recommended_videos: Vec<VideoLink>,
    ) -> CourseDraft {
        let title = if self.title.trim().is_empty() {
            topic.to_owned()
        } else {
            self.title
        };
        let modules = self
            .modules
            .into_iter()
            .filter(|m| {
                let keep = !m.title.trim().is_empty();
                if !keep {
                    warn!(topic, "dropping untitled module from generated outline");
                }
                keep
            })
            .map(|m| ModuleDraft {
                id: m.id.filter(|id| !id.trim().is_empty()).map(ModuleId::new),
                ..ModuleDraft::new(m.title, m.brief_description)
            })
            .collect();

        CourseDraft {
            title,
            description: self.description,
            difficulty_level: Some(difficulty),
            modules,
            recommended_videos,
        }
    }

    /// Minimal three-module outline used when the generator yields nothing usable.
    #[must_use]
    pub fn stub(topic: &str, difficulty: Difficulty) -> Self {
        let module = |title: String, brief: &str| OutlineModule {
            id: None,
            title,
            brief_description: brief.to_owned(),
        };
        Self {
            title: topic.to_owned(),
            description: format!("A {difficulty} level course on {topic}"),
            modules: vec![
                module(
                    format!("Introduction to {topic}"),
                    "An overview of the course content and objectives.",
                ),
                module("Core Concepts".into(), "Fundamental principles and key ideas."),
                module(
                    "Advanced Topics".into(),
                    "More complex subjects and in-depth analysis.",
                ),
            ],
            video_topics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

/// Full lesson body for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetail {
    pub title: String,
    pub detailed_content: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ModuleDetail {
    /// Placeholder lesson used when generation fails.
    #[must_use]
    pub fn fallback(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            detailed_content: format!(
                "<h2>Introduction to {title}</h2><p>This module covers the key concepts and principles of {title}.</p>"
            ),
            exercises: vec![Exercise {
                title: "Practice Exercise".into(),
                description: "Apply the concepts learned in this module to solve a real-world problem."
                    .into(),
            }],
            resources: vec![Resource {
                title: "Additional Reading".into(),
                url: "https://example.com/resources".into(),
            }],
        }
    }
}

/// Generated quiz for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuizQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outline_accepts_generator_field_names() {
        let outline: CourseOutline = serde_json::from_value(json!({
            "title": "Rust in Depth",
            "description": "Systems programming",
            "difficultyLevel": "expert",
            "modules": [
                { "title": "Ownership", "briefDescription": "Moves" },
                { "title": "  ", "briefDescription": "dropped" },
                { "id": "m-3", "title": "Traits" }
            ]
        }))
        .unwrap();
        assert!(outline.video_topics.is_empty());

        let draft = outline.into_draft("Rust", Difficulty::Advanced, Vec::new());
        assert_eq!(draft.title, "Rust in Depth");
        assert_eq!(draft.difficulty_level, Some(Difficulty::Advanced));
        assert_eq!(draft.modules.len(), 2);
        assert_eq!(draft.modules[0].content, "Moves");
        assert_eq!(draft.modules[1].id, Some(ModuleId::new("m-3")));
    }

    #[test]
    fn stub_has_three_modules() {
        let draft = CourseOutline::stub("Go", Difficulty::Beginner).into_draft(
            "Go",
            Difficulty::Beginner,
            Vec::new(),
        );
        let titles: Vec<_> = draft.modules.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Introduction to Go", "Core Concepts", "Advanced Topics"]);
        assert_eq!(draft.description, "A beginner level course on Go");
    }

    #[test]
    fn fallback_detail_mentions_title() {
        let detail = ModuleDetail::fallback("Lifetimes");
        assert!(detail.detailed_content.starts_with("<h2>Introduction to Lifetimes</h2>"));
        assert_eq!(detail.exercises[0].title, "Practice Exercise");
        assert_eq!(detail.resources[0].url, "https://example.com/resources");
    }
}
