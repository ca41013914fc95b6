use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A persisted summary row. Exactly one of `video_id` / `playlist_id` is set:
/// a playlist summary aggregates across the playlist's videos, a video summary
/// covers a single video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSummary {
    pub id: i64,
    pub video_id: Option<i64>,
    pub playlist_id: Option<i64>,
    pub title: String,
    pub summary_text: String,
    pub key_points: Vec<String>,
    /// Free-form tag blob. Playlist summaries store a [`PlaylistStats`] here;
    /// video summaries store a plain list of tag strings.
    pub tags: serde_json::Value,
    /// Heuristic 0-98 reliability estimate, not a statistical guarantee.
    pub confidence: i64,
    pub is_bookmarked: bool,
    pub generated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Structured fields carried in the `tags` blob of a playlist summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistStats {
    pub total_videos: i64,
    pub total_time: String,
    pub estimated_total_likes: String,
    pub target_audience: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<String>,
}

/// Fields assigned onto a summary row by one generation run. The upserter
/// writes the whole struct in a single transaction, whether the row is new or
/// being regenerated.
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub video_id: Option<i64>,
    pub playlist_id: Option<i64>,
    pub title: String,
    pub summary_text: String,
    pub key_points: Vec<String>,
    pub tags: serde_json::Value,
    pub confidence: i64,
}

impl NewSummary {
    /// A summary must reference a video or a playlist, never both and never
    /// neither. The schema carries a matching CHECK constraint; validating
    /// here surfaces a readable message before the write is attempted.
    pub fn validate(&self) -> Result<()> {
        match (self.video_id, self.playlist_id) {
            (None, None) => Err(AppError::Validation(
                "summary must reference a video or a playlist".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "summary cannot reference both a video and a playlist".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
