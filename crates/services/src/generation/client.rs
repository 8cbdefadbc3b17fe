use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GenerationError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Turns a prompt into model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the generator is disabled, the request fails,
    /// or the response is empty.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    base_url: Url,
    api_key: String,
    model: String,
}

impl GeneratorConfig {
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidBaseUrl` if `base_url` is not an absolute http(s) URL.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let parsed = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| GenerationError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GenerationError::InvalidBaseUrl(base_url.to_owned()));
        }
        Ok(Self {
            base_url: parsed,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Reads `LEARN_AI_API_KEY`, `LEARN_AI_BASE_URL` and `LEARN_AI_MODEL`.
    ///
    /// Returns `None` when no API key is set or the base URL is invalid.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("LEARN_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("LEARN_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("LEARN_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        match Self::new(&base_url, api_key, model) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring generator configuration");
                None
            }
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }
}

/// `TextGenerator` backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl GeminiClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let payload = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.7 },
        };

        tracing::debug!(model = %config.model, "sending generation request");
        let response = self
            .client
            .post(config.endpoint())
            .header("x-goog-api-key", &config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(text.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
