use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ai::MetadataSource;
use crate::error::{AppError, Result};

use super::duration::parse_duration;

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// One playlistItems page is capped at 50 by the API; the rich path never
/// paginates past it so prompt size and latency stay bounded.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Playlist-level facts gathered for one generation run. Discarded once the
/// prompt has been built.
#[derive(Debug, Clone)]
pub struct PlaylistMeta {
    pub yt_id: String,
    pub title: String,
    pub description: String,
    pub total_videos: i64,
    pub thumbnail_url: Option<String>,
}

/// Per-video facts for one generation run. `transcript` starts empty and is
/// filled in by the rich strategy when caption scraping succeeds.
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub yt_id: String,
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub like_count: i64,
    pub transcript: Option<String>,
}

/// Fully paginated listing for the public-playlist analyzer.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPlaylist {
    pub yt_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_count: i64,
    pub total_duration: i64,
    /// First 50 videos only; the full count still feeds `total_duration`.
    #[serde(skip)]
    pub videos: Vec<PublicVideo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicVideo {
    pub title: String,
    pub duration: i64,
    pub view_count: i64,
}

// Wire types for the Data API v3. Counts come back as JSON strings.

#[derive(Debug, Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistResource>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: PlaylistContentDetails,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

impl Thumbnails {
    /// Prefer the high-resolution thumbnail, fall back to the default one,
    /// accept having neither.
    fn best_url(&self) -> Option<String> {
        self.high
            .as_ref()
            .or(self.fallback.as_ref())
            .map(|t| t.url.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistContentDetails {
    #[serde(rename = "itemCount")]
    item_count: i64,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: ItemContentDetails,
}

#[derive(Debug, Deserialize)]
struct ItemContentDetails {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
    #[serde(rename = "contentDetails")]
    content_details: VideoContentDetails,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct VideoDetails {
    duration: i64,
    like_count: i64,
    view_count: i64,
}

pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("playlist-digest/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client, api_key }
    }

    /// Fetches playlist metadata. `None` means the API answered but knows no
    /// such playlist; transport and non-2xx failures are errors.
    pub async fn fetch_playlist(&self, playlist_yt_id: &str) -> Result<Option<PlaylistMeta>> {
        let response: PlaylistListResponse = self
            .get_json(
                "playlists",
                &[("part", "snippet,contentDetails"), ("id", playlist_yt_id)],
            )
            .await?;

        let Some(playlist) = response.items.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(PlaylistMeta {
            yt_id: playlist_yt_id.to_string(),
            title: playlist.snippet.title,
            description: playlist.snippet.description,
            total_videos: playlist.content_details.item_count,
            thumbnail_url: playlist.snippet.thumbnails.best_url(),
        }))
    }

    /// Fetches up to `max` playlist entries (single page, capped at 50) and
    /// batches one detail lookup for durations and like counts instead of one
    /// request per video.
    pub async fn fetch_playlist_videos(
        &self,
        playlist_yt_id: &str,
        max: u32,
    ) -> Result<Vec<VideoMeta>> {
        let max_results = max.min(PLAYLIST_PAGE_SIZE).to_string();
        let response: PlaylistItemsResponse = self
            .get_json(
                "playlistItems",
                &[
                    ("part", "snippet,contentDetails"),
                    ("playlistId", playlist_yt_id),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        let ids: Vec<String> = response
            .items
            .iter()
            .map(|item| item.content_details.video_id.clone())
            .collect();
        let details = self.fetch_video_details(&ids).await?;

        let videos = response
            .items
            .into_iter()
            .map(|item| {
                let detail = details.get(&item.content_details.video_id).copied();
                VideoMeta {
                    yt_id: item.content_details.video_id,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    duration: detail.map(|d| d.duration).unwrap_or(0),
                    like_count: detail.map(|d| d.like_count).unwrap_or(0),
                    transcript: None,
                }
            })
            .collect();

        Ok(videos)
    }

    /// Walks every playlistItems page for the public analyzer, accumulating
    /// the full duration while keeping only the first page-worth of videos
    /// for the prompt.
    pub async fn collect_playlist(&self, playlist_yt_id: &str) -> Result<PublicPlaylist> {
        let meta = self
            .fetch_playlist(playlist_yt_id)
            .await?
            .ok_or_else(|| AppError::PlaylistNotFound(playlist_yt_id.to_string()))?;

        let mut videos = Vec::new();
        let mut total_duration = 0;
        let mut page_token: Option<String> = None;

        loop {
            let max_results = PLAYLIST_PAGE_SIZE.to_string();
            let mut query = vec![
                ("part", "snippet,contentDetails".to_string()),
                ("playlistId", playlist_yt_id.to_string()),
                ("maxResults", max_results),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;

            let ids: Vec<String> = page
                .items
                .iter()
                .map(|item| item.content_details.video_id.clone())
                .collect();
            let details = self.fetch_video_details(&ids).await?;

            for item in page.items {
                let detail = details.get(&item.content_details.video_id).copied();
                let duration = detail.map(|d| d.duration).unwrap_or(0);
                total_duration += duration;
                videos.push(PublicVideo {
                    title: item.snippet.title,
                    duration,
                    view_count: detail.map(|d| d.view_count).unwrap_or(0),
                });
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        let video_count = videos.len() as i64;
        videos.truncate(PLAYLIST_PAGE_SIZE as usize);

        Ok(PublicPlaylist {
            yt_id: meta.yt_id,
            title: meta.title,
            description: meta.description,
            thumbnail_url: meta.thumbnail_url,
            video_count,
            total_duration,
            videos,
        })
    }

    /// One batched `videos` lookup for the comma-joined id list.
    async fn fetch_video_details(&self, ids: &[String]) -> Result<HashMap<String, VideoDetails>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.join(",");
        let response: VideoListResponse = self
            .get_json(
                "videos",
                &[("part", "contentDetails,statistics"), ("id", &joined)],
            )
            .await?;

        let details = response
            .items
            .into_iter()
            .map(|video| {
                let parse_count =
                    |count: Option<String>| count.and_then(|c| c.parse().ok()).unwrap_or(0);
                (
                    video.id,
                    VideoDetails {
                        duration: parse_duration(&video.content_details.duration),
                        like_count: parse_count(video.statistics.like_count),
                        view_count: parse_count(video.statistics.view_count),
                    },
                )
            })
            .collect();

        Ok(details)
    }

    async fn get_json<T, Q>(&self, resource: &str, query: &[Q]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        Q: serde::Serialize,
    {
        let response = self
            .client
            .get(format!("{YOUTUBE_API_URL}/{resource}"))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            tracing::warn!("YouTube API {} request failed: {}", resource, status);
            return Err(AppError::YouTubeApi {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MetadataSource for YouTubeClient {
    async fn playlist_meta(&self, playlist_yt_id: &str) -> Result<Option<PlaylistMeta>> {
        self.fetch_playlist(playlist_yt_id).await
    }

    async fn playlist_videos(&self, playlist_yt_id: &str, max: u32) -> Result<Vec<VideoMeta>> {
        self.fetch_playlist_videos(playlist_yt_id, max).await
    }
}
