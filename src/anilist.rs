use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const API_BASE: &str = "https://graphql.anilist.co";

const MEDIA_TITLE_QUERY: &str =
    "query ($id: Int) { Media (id: $id, type: ANIME) { title { english romaji } } }";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("anilist request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("anilist rejected the query: {0}")]
    Validation(String),

    #[error("anilist returned status code {0}")]
    Status(StatusCode),

    #[error("anilist response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no anime found with id {0}")]
    NotFound(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaTitle {
    pub english: Option<String>,
    pub romaji: Option<String>,
}

impl MediaTitle {
    pub fn display(&self) -> &str {
        self.romaji
            .as_deref()
            .or(self.english.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    title: MediaTitle,
}

#[derive(Debug, Clone)]
pub struct AniList {
    api_base: String,
    client: Client,
}

impl AniList {
    pub fn with_api_base(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            client,
        }
    }

    pub async fn get_media_title(&self, id: i64) -> Result<MediaTitle, MetadataError> {
        let response = self
            .client
            .post(&self.api_base)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({
                "query": MEDIA_TITLE_QUERY,
                "variables": { "id": id },
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(MetadataError::Validation(response.text().await?));
        }
        if !status.is_success() {
            return Err(MetadataError::Status(status));
        }

        let body = response.bytes().await?;
        let data: ApiResponse<MediaData> = serde_json::from_slice(&body)?;
        let media = data.data.media.ok_or(MetadataError::NotFound(id))?;
        tracing::debug!(
            id,
            english = media.title.english.as_deref().unwrap_or_default(),
            romaji = media.title.romaji.as_deref().unwrap_or_default(),
            "anilist media"
        );
        Ok(media.title)
    }
}

pub fn media_id_from_url(url: &str) -> Option<i64> {
    let url = Url::parse(url).ok()?;
    url.path_segments()?.nth(1)?.parse().ok()
}
