//! Prompt templates sent to the text generator.

use learn_core::model::Difficulty;

const OUTLINE_SHAPE: &str = r#"{
  "title": "Full course title",
  "description": "Brief course description",
  "difficultyLevel": "<level>",
  "modules": [
    { "title": "Module title", "briefDescription": "What this module covers" }
  ]"#;

/// Full outline request, including search topics for recommended videos.
#[must_use]
pub fn course_outline(topic: &str, difficulty: Difficulty) -> String {
    format!(
        r#"Design a complete course outline for "{topic}" aimed at the {difficulty} level.

Reply with a single JSON object shaped like this:
{shape},
  "videoTopics": ["search query 1", "search query 2", "search query 3"]
}}

Include 5 to 8 modules that together cover the subject.
For "videoTopics" give 3 precise search queries that would surface good educational videos for this course."#,
        shape = OUTLINE_SHAPE.replace("<level>", difficulty.as_str()),
    )
}

/// Shorter outline request used after the full one could not be parsed.
#[must_use]
pub fn fallback_outline(topic: &str, difficulty: Difficulty) -> String {
    format!(
        r#"Design a complete course outline for "{topic}" aimed at the {difficulty} level.

Reply with a single JSON object shaped like this:
{shape}
}}

Include 5 to 8 modules that together cover the subject."#,
        shape = OUTLINE_SHAPE.replace("<level>", difficulty.as_str()),
    )
}

#[must_use]
pub fn module_details(title: &str) -> String {
    format!(
        r#"Write the full lesson for the module "{title}".

Reply with a single JSON object shaped like this:
{{
  "title": "{title}",
  "detailedContent": "The lesson as HTML",
  "exercises": [{{ "title": "Exercise title", "description": "What to do" }}],
  "resources": [{{ "title": "Resource name", "url": "https://example.com/resource" }}]
}}

The "detailedContent" HTML should use h2/h3 headings, paragraphs, lists where they help,
<pre><code> blocks for code, and bold or italic text for key terms. Describe diagrams in words.
Add 2 or 3 practical exercises and 3 to 5 further resources with working URLs."#
    )
}

#[must_use]
pub fn quiz(title: &str, description: &str, difficulty: Difficulty) -> String {
    format!(
        r#"Write a quiz about "{title}".

It should test this material:
{description}

Reply with a single JSON object shaped like this:
{{
  "title": "Quiz title",
  "description": "What the quiz covers",
  "questions": [
    {{
      "question": "Question text?",
      "type": "multiple-choice",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": "Option A",
      "explanation": "Why this answer is correct"
    }}
  ]
}}

Write 10 questions: 7 of type "multiple-choice" with 4 options each and 3 of type
"true-false" with the options ["True", "False"]. Cover different parts of the topic at
the {difficulty} level and keep every question factually accurate."#
    )
}

#[must_use]
pub fn flashcards(title: &str, description: &str) -> String {
    format!(
        r#"Write 10 flashcards for studying "{title}".

They should cover the key ideas of this material:
{description}

Reply with a JSON array shaped like this:
[
  {{ "front": "Term or question", "back": "Definition or answer" }}
]

Keep each card short and accurate, mix definitions with concepts, and vary the difficulty."#
    )
}
