use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub yt_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub video_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub yt_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub video_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub playlist_id: i64,
    pub yt_id: String,
    pub title: String,
    pub position: i64,
    /// Duration in seconds.
    pub duration: i64,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub yt_id: String,
    pub title: String,
    pub position: i64,
    pub duration: i64,
}
