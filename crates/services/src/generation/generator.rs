use std::sync::Arc;

use learn_core::extract_as;
use learn_core::model::{CourseDraft, Difficulty, Flashcard, VideoLink};
use tracing::{info, warn};

use super::client::TextGenerator;
use super::payload::{CourseOutline, ModuleDetail, QuizPayload};
use super::prompts;
use super::videos::{VideoSearch, fallback_videos};
use crate::error::GenerationError;

const MAX_RECOMMENDED_VIDEOS: usize = 3;
const MODULE_VIDEO_RESULTS: u32 = 3;

/// Produces course outlines, lessons, quizzes and flashcards from a text generator.
///
/// Course outlines and lessons degrade to placeholder content when the generator output
/// cannot be parsed. Quizzes and flashcards report the failure instead.
#[derive(Clone)]
pub struct CourseGenerator {
    generator: Arc<dyn TextGenerator>,
    videos: Arc<dyn VideoSearch>,
}

impl CourseGenerator {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, videos: Arc<dyn VideoSearch>) -> Self {
        Self { generator, videos }
    }

    /// Generates a course draft for `topic`.
    ///
    /// Tries the full outline prompt first. If that request or its parsing fails, a
    /// shorter prompt is tried; if that output cannot be parsed either, a three-module
    /// stub is returned. Both fallback paths attach the fallback video list.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyTopic` for a blank topic, or the request error of
    /// the fallback prompt when the generator cannot be reached at all.
    pub async fn generate_course(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<CourseDraft, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::EmptyTopic);
        }

        let prompt = prompts::course_outline(topic, difficulty);
        let outline = match self.request::<CourseOutline>(&prompt).await {
            Ok(outline) => outline,
            Err(err) => {
                warn!(topic, error = %err, "course outline failed, retrying with fallback prompt");
                return self.fallback_course(topic, difficulty).await;
            }
        };

        let topics = if outline.video_topics.is_empty() {
            default_video_topics(topic, difficulty)
        } else {
            outline.video_topics.clone()
        };
        let videos = self.recommended_videos(topic, &topics).await;
        let draft = outline.into_draft(topic, difficulty, videos);
        info!(topic, modules = draft.modules.len(), "course outline generated");
        Ok(draft)
    }

    async fn fallback_course(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<CourseDraft, GenerationError> {
        let text = self
            .generator
            .generate(&prompts::fallback_outline(topic, difficulty))
            .await?;
        let outline = extract_as::<CourseOutline>(&text).unwrap_or_else(|err| {
            warn!(topic, error = %err, "fallback outline unparseable, using stub course");
            CourseOutline::stub(topic, difficulty)
        });
        Ok(outline.into_draft(topic, difficulty, fallback_videos()))
    }

    /// First search hit per topic, at most three in total. Any failed search replaces the
    /// whole list with the fallback videos.
    async fn recommended_videos(&self, topic: &str, topics: &[String]) -> Vec<VideoLink> {
        let mut found = Vec::new();
        for video_topic in topics {
            match self.videos.search(&format!("{topic} {video_topic}"), 1).await {
                Ok(videos) => found.extend(videos),
                Err(err) => {
                    warn!(topic, error = %err, "video search failed, using fallback videos");
                    return fallback_videos();
                }
            }
        }
        found.truncate(MAX_RECOMMENDED_VIDEOS);
        found
    }

    /// Videos for a single module, or the fallback videos if the search fails.
    pub async fn module_videos(&self, module_title: &str) -> Vec<VideoLink> {
        self.videos
            .search(&format!("{module_title} tutorial"), MODULE_VIDEO_RESULTS)
            .await
            .unwrap_or_else(|err| {
                warn!(module_title, error = %err, "module video search failed");
                fallback_videos()
            })
    }

    /// Full lesson for a module. Never fails; unusable output yields a placeholder lesson.
    pub async fn module_details(&self, module_title: &str) -> ModuleDetail {
        match self.request::<ModuleDetail>(&prompts::module_details(module_title)).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(module_title, error = %err, "module details failed, using placeholder");
                ModuleDetail::fallback(module_title)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `GenerationError` if the request fails or no quiz can be parsed.
    pub async fn generate_quiz(
        &self,
        module_title: &str,
        module_description: &str,
        difficulty: Difficulty,
    ) -> Result<QuizPayload, GenerationError> {
        self.request(&prompts::quiz(module_title, module_description, difficulty))
            .await
    }

    /// # Errors
    ///
    /// Returns `GenerationError` if the request fails or no flashcards can be parsed.
    pub async fn generate_flashcards(
        &self,
        module_title: &str,
        module_description: &str,
    ) -> Result<Vec<Flashcard>, GenerationError> {
        self.request(&prompts::flashcards(module_title, module_description))
            .await
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<T, GenerationError> {
        let text = self.generator.generate(prompt).await?;
        Ok(extract_as(&text)?)
    }
}

fn default_video_topics(topic: &str, difficulty: Difficulty) -> Vec<String> {
    vec![
        format!("{topic} tutorial"),
        format!("{topic} for {difficulty}s"),
        format!("learn {topic}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records the prompts it saw.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::EmptyResponse))
        }
    }

    /// Answers every query with one video named after it, or fails when `fail` is set.
    #[derive(Default)]
    struct EchoSearch {
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoSearch for EchoSearch {
        async fn search(
            &self,
            query: &str,
            _max_results: u32,
        ) -> Result<Vec<VideoLink>, GenerationError> {
            self.queries.lock().unwrap().push(query.to_owned());
            if self.fail {
                return Err(GenerationError::NoVideos(query.to_owned()));
            }
            Ok(vec![VideoLink {
                title: query.to_owned(),
                url: format!("https://youtube.com/watch?v={}", query.len()),
            }])
        }
    }

    fn ok(text: &str) -> Result<String, GenerationError> {
        Ok(text.to_owned())
    }

    const OUTLINE: &str = r#"Here you go:
```json
{"title": "Rust Programming", "description": "Safe systems code",
 "modules": [{"title": "Ownership", "briefDescription": "Moves and borrows"},
             {"title": "Traits", "briefDescription": "Shared behavior"}],
 "videoTopics": ["ownership", "traits", "async", "macros"]}
```"#;

    #[tokio::test]
    async fn outline_with_topics_searches_each_and_caps_videos() {
        let generator = ScriptedGenerator::new(vec![ok(OUTLINE)]);
        let search = Arc::new(EchoSearch::default());
        let service = CourseGenerator::new(generator.clone(), search.clone());

        let draft = service
            .generate_course("Rust", Difficulty::Intermediate)
            .await
            .unwrap();
        assert_eq!(draft.title, "Rust Programming");
        assert_eq!(draft.modules.len(), 2);
        assert_eq!(draft.modules[0].content, "Moves and borrows");
        assert_eq!(draft.difficulty_level, Some(Difficulty::Intermediate));
        assert_eq!(draft.recommended_videos.len(), 3);
        assert_eq!(draft.recommended_videos[0].title, "Rust ownership");
        assert_eq!(search.queries.lock().unwrap().len(), 4);
        assert_eq!(generator.prompt_count(), 1);
    }

    #[tokio::test]
    async fn missing_video_topics_use_defaults() {
        let generator = ScriptedGenerator::new(vec![ok(
            r#"{"title": "Go", "modules": [{"title": "Intro"}]}"#,
        )]);
        let search = Arc::new(EchoSearch::default());
        let service = CourseGenerator::new(generator, search.clone());

        service
            .generate_course("Go", Difficulty::Beginner)
            .await
            .unwrap();
        assert_eq!(
            *search.queries.lock().unwrap(),
            ["Go Go tutorial", "Go Go for beginners", "Go learn Go"]
        );
    }

    #[tokio::test]
    async fn failed_search_uses_fallback_videos() {
        let generator = ScriptedGenerator::new(vec![ok(OUTLINE)]);
        let search = Arc::new(EchoSearch {
            fail: true,
            ..EchoSearch::default()
        });
        let service = CourseGenerator::new(generator, search);

        let draft = service
            .generate_course("Rust", Difficulty::Advanced)
            .await
            .unwrap();
        assert_eq!(draft.recommended_videos, fallback_videos());
    }

    #[tokio::test]
    async fn unparseable_outline_retries_with_fallback_prompt() {
        let generator = ScriptedGenerator::new(vec![
            ok("I cannot help with that."),
            ok(r#"{"title": "SQL Basics", "modules": [{"title": "Select"}]}"#),
        ]);
        let service = CourseGenerator::new(generator.clone(), Arc::new(EchoSearch::default()));

        let draft = service
            .generate_course("SQL", Difficulty::Beginner)
            .await
            .unwrap();
        assert_eq!(draft.title, "SQL Basics");
        assert_eq!(draft.recommended_videos, fallback_videos());
        assert_eq!(generator.prompt_count(), 2);
    }

    #[tokio::test]
    async fn no_json_anywhere_yields_stub_course() {
        let generator = ScriptedGenerator::new(vec![ok("nope"), ok("still nope")]);
        let service = CourseGenerator::new(generator, Arc::new(EchoSearch::default()));

        let draft = service
            .generate_course("Chess", Difficulty::Beginner)
            .await
            .unwrap();
        assert_eq!(draft.title, "Chess");
        let titles: Vec<_> = draft.modules.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Introduction to Chess", "Core Concepts", "Advanced Topics"]);
        assert_eq!(draft.recommended_videos, fallback_videos());
    }

    #[tokio::test]
    async fn unreachable_generator_propagates_from_fallback() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationError::Disabled),
            Err(GenerationError::Disabled),
        ]);
        let service = CourseGenerator::new(generator, Arc::new(EchoSearch::default()));

        let err = service
            .generate_course("Chess", Difficulty::Beginner)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Disabled));
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_before_generation() {
        let generator = ScriptedGenerator::new(Vec::new());
        let service = CourseGenerator::new(generator.clone(), Arc::new(EchoSearch::default()));

        let err = service
            .generate_course("   ", Difficulty::Beginner)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyTopic));
        assert_eq!(generator.prompt_count(), 0);
    }

    #[tokio::test]
    async fn module_details_recover_from_raw_newlines_or_fall_back() {
        let generator = ScriptedGenerator::new(vec![
            ok("{\"title\": \"Borrowing\", \"detailedContent\": \"<h2>Borrowing</h2>\n<p>Refs</p>\"}"),
            ok("no lesson today"),
        ]);
        let service = CourseGenerator::new(generator, Arc::new(EchoSearch::default()));

        let detail = service.module_details("Borrowing").await;
        assert_eq!(detail.title, "Borrowing");
        assert_eq!(detail.detailed_content, "<h2>Borrowing</h2>\n<p>Refs</p>");
        assert!(detail.exercises.is_empty());

        let fallback = service.module_details("Lifetimes").await;
        assert_eq!(fallback, ModuleDetail::fallback("Lifetimes"));
    }

    #[tokio::test]
    async fn quiz_and_flashcard_failures_propagate() {
        let generator = ScriptedGenerator::new(vec![
            ok(r#"Quiz: {"title": "Q", "questions": [{"question": "2+2?", "type": "multiple-choice", "options": ["3", "4"], "correctAnswer": "4"}]}"#),
            ok("Cards:\n[{\"front\": \"borrow\", \"back\": \"reference\"}]"),
            ok("sorry"),
        ]);
        let service = CourseGenerator::new(generator, Arc::new(EchoSearch::default()));

        let quiz = service
            .generate_quiz("Math", "Addition", Difficulty::Beginner)
            .await
            .unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert!(quiz.questions[0].is_correct("4"));

        let cards = service.generate_flashcards("Rust", "Borrowing").await.unwrap();
        assert_eq!(cards[0].front, "borrow");

        let err = service.generate_flashcards("Rust", "Again").await.unwrap_err();
        assert!(matches!(err, GenerationError::Extraction(_)));
    }

    #[tokio::test]
    async fn module_videos_fall_back_on_search_failure() {
        let failing = CourseGenerator::new(
            ScriptedGenerator::new(Vec::new()),
            Arc::new(EchoSearch {
                fail: true,
                ..EchoSearch::default()
            }),
        );
        assert_eq!(failing.module_videos("Traits").await, fallback_videos());

        let working = CourseGenerator::new(
            ScriptedGenerator::new(Vec::new()),
            Arc::new(EchoSearch::default()),
        );
        assert_eq!(working.module_videos("Traits").await[0].title, "Traits tutorial");
    }
}
