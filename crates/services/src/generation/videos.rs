use std::env;

use async_trait::async_trait;
use learn_core::model::VideoLink;
use reqwest::Client;
use serde::Deserialize;

use crate::error::GenerationError;

const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const PUBLISHED_AFTER: &str = "2022-01-01T00:00:00Z";

/// Finds videos matching a search query.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Up to `max_results` videos for `query`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the search is disabled, fails, or finds nothing.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoLink>, GenerationError>;
}

/// Known-good videos used whenever a search cannot be completed.
#[must_use]
pub fn fallback_videos() -> Vec<VideoLink> {
    [
        ("Introduction to Programming - Full Course", "zOjov-2OZ0E"),
        ("Learn Data Science Tutorial - Full Course for Beginners", "ua-CiDNNj30"),
        ("Machine Learning for Everybody – Full Course", "i_LwzRVP7bg"),
    ]
    .into_iter()
    .map(|(title, id)| VideoLink {
        title: title.into(),
        url: watch_url(id),
    })
    .collect()
}

fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

/// `VideoSearch` backed by the YouTube Data API.
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: Option<String>,
}

impl YouTubeClient {
    /// Reads the API key from `LEARN_YOUTUBE_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = env::var("LEARN_YOUTUBE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::new(api_key)
    }

    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoLink>, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::Disabled)?;
        let max_results = max_results.to_string();

        let response = self
            .client
            .get(YOUTUBE_SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", api_key),
                ("type", "video"),
                ("videoDefinition", "high"),
                ("relevanceLanguage", "en"),
                ("publishedAfter", PUBLISHED_AFTER),
                ("order", "relevance"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: SearchResponse = response.json().await?;
        let videos: Vec<VideoLink> = body
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                Some(VideoLink {
                    title: item.snippet.title,
                    url: watch_url(&id),
                })
            })
            .collect();

        if videos.is_empty() {
            return Err(GenerationError::NoVideos(query.to_owned()));
        }
        Ok(videos)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}
