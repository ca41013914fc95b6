use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{AiSummary, NewPlaylist, NewSummary, NewVideo, Playlist, Video};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            // WAL so readers never block the single writer; a busy timeout so
            // a second writer waits for the immediate transaction below
            // instead of failing with SQLITE_BUSY.
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Playlist operations

    /// Looks up a playlist by its YouTube id, inserting it if missing.
    /// Returns the row and whether it was newly created, so re-importing an
    /// existing playlist can be reported instead of treated as an error.
    pub async fn find_or_create_playlist(&self, playlist: NewPlaylist) -> Result<(Playlist, bool)> {
        let (playlist, created) = self
            .conn
            .call(move |conn| {
                let existing = conn
                    .query_row(
                        "SELECT id, yt_id, title, thumbnail_url, video_count, created_at, updated_at
                         FROM playlists WHERE yt_id = ?1",
                        params![playlist.yt_id],
                        |row| Ok(playlist_from_row(row)),
                    )
                    .optional()?;

                if let Some(existing) = existing {
                    return Ok((existing, false));
                }

                conn.execute(
                    "INSERT INTO playlists (yt_id, title, thumbnail_url, video_count)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        playlist.yt_id,
                        playlist.title,
                        playlist.thumbnail_url,
                        playlist.video_count
                    ],
                )?;
                let id = conn.last_insert_rowid();

                let inserted = conn.query_row(
                    "SELECT id, yt_id, title, thumbnail_url, video_count, created_at, updated_at
                     FROM playlists WHERE id = ?1",
                    params![id],
                    |row| Ok(playlist_from_row(row)),
                )?;
                Ok((inserted, true))
            })
            .await?;
        Ok((playlist, created))
    }

    pub async fn get_playlist(&self, id: i64) -> Result<Option<Playlist>> {
        let playlist = self
            .conn
            .call(move |conn| {
                let playlist = conn
                    .query_row(
                        "SELECT id, yt_id, title, thumbnail_url, video_count, created_at, updated_at
                         FROM playlists WHERE id = ?1",
                        params![id],
                        |row| Ok(playlist_from_row(row)),
                    )
                    .optional()?;
                Ok(playlist)
            })
            .await?;
        Ok(playlist)
    }

    pub async fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        let playlists = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, yt_id, title, thumbnail_url, video_count, created_at, updated_at
                     FROM playlists ORDER BY title",
                )?;
                let playlists = stmt
                    .query_map([], |row| Ok(playlist_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(playlists)
            })
            .await?;
        Ok(playlists)
    }

    /// Replaces the playlist's videos with a fresh import in one transaction
    /// so old and new listings never mix, and keeps `video_count` in step.
    pub async fn replace_videos(&self, playlist_id: i64, videos: Vec<NewVideo>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM videos WHERE playlist_id = ?1",
                    params![playlist_id],
                )?;

                for video in &videos {
                    tx.execute(
                        "INSERT INTO videos (playlist_id, yt_id, title, position, duration)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![playlist_id, video.yt_id, video.title, video.position, video.duration],
                    )?;
                }

                tx.execute(
                    "UPDATE playlists SET video_count = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![videos.len() as i64, playlist_id],
                )?;

                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_videos(&self, playlist_id: i64) -> Result<Vec<Video>> {
        let videos = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, playlist_id, yt_id, title, position, duration
                     FROM videos WHERE playlist_id = ?1 ORDER BY position",
                )?;
                let videos = stmt
                    .query_map(params![playlist_id], |row| Ok(video_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(videos)
            })
            .await?;
        Ok(videos)
    }

    // Summary operations

    pub async fn get_summary(&self, id: i64) -> Result<Option<AiSummary>> {
        let summary = self
            .conn
            .call(move |conn| {
                let summary = conn
                    .query_row(
                        &format!("{SUMMARY_SELECT} WHERE id = ?1"),
                        params![id],
                        |row| Ok(summary_from_row(row)),
                    )
                    .optional()?;
                Ok(summary)
            })
            .await?;
        Ok(summary)
    }

    pub async fn get_playlist_summary(&self, playlist_id: i64) -> Result<Option<AiSummary>> {
        let summary = self
            .conn
            .call(move |conn| {
                let summary = conn
                    .query_row(
                        &format!("{SUMMARY_SELECT} WHERE playlist_id = ?1"),
                        params![playlist_id],
                        |row| Ok(summary_from_row(row)),
                    )
                    .optional()?;
                Ok(summary)
            })
            .await?;
        Ok(summary)
    }

    pub async fn list_summaries(&self, playlist_id: Option<i64>) -> Result<Vec<AiSummary>> {
        let summaries = self
            .conn
            .call(move |conn| {
                let summaries = match playlist_id {
                    Some(playlist_id) => {
                        let mut stmt = conn.prepare(&format!(
                            "{SUMMARY_SELECT} WHERE playlist_id = ?1 ORDER BY created_at DESC"
                        ))?;
                        let rows = stmt
                            .query_map(params![playlist_id], |row| Ok(summary_from_row(row)))?
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        rows
                    }
                    None => {
                        let mut stmt =
                            conn.prepare(&format!("{SUMMARY_SELECT} ORDER BY created_at DESC"))?;
                        let rows = stmt
                            .query_map([], |row| Ok(summary_from_row(row)))?
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        rows
                    }
                };
                Ok(summaries)
            })
            .await?;
        Ok(summaries)
    }

    /// Plain insert for externally supplied summary rows. Fails if a summary
    /// already exists for the target; generation flows use the upserts below.
    #[allow(dead_code)]
    pub async fn create_summary(&self, summary: NewSummary) -> Result<AiSummary> {
        summary.validate()?;
        let key_points = serde_json::to_string(&summary.key_points)?;
        let tags = serde_json::to_string(&summary.tags)?;

        let created = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO ai_summaries
                         (video_id, playlist_id, title, summary_text, key_points, tags, confidence)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        summary.video_id,
                        summary.playlist_id,
                        summary.title,
                        summary.summary_text,
                        key_points,
                        tags,
                        summary.confidence
                    ],
                )?;
                let id = conn.last_insert_rowid();
                let row = conn.query_row(
                    &format!("{SUMMARY_SELECT} WHERE id = ?1"),
                    params![id],
                    |row| Ok(summary_from_row(row)),
                )?;
                Ok(row)
            })
            .await?;
        Ok(created)
    }

    /// Find-or-initialize the single summary row for a playlist and assign the
    /// whole generation result onto it. The immediate transaction takes the
    /// write lock before the existence check, so two concurrent generations
    /// serialize here and the table never gains a second row for the playlist
    /// (the partial unique index backs this at the constraint level).
    pub async fn upsert_playlist_summary(&self, summary: NewSummary) -> Result<AiSummary> {
        summary.validate()?;
        let playlist_id = summary
            .playlist_id
            .ok_or_else(|| AppError::Validation("playlist summary requires a playlist".to_string()))?;
        self.upsert_summary("playlist_id", playlist_id, summary).await
    }

    /// Same contract as [`Self::upsert_playlist_summary`], keyed by video.
    #[allow(dead_code)]
    pub async fn upsert_video_summary(&self, summary: NewSummary) -> Result<AiSummary> {
        summary.validate()?;
        let video_id = summary
            .video_id
            .ok_or_else(|| AppError::Validation("video summary requires a video".to_string()))?;
        self.upsert_summary("video_id", video_id, summary).await
    }

    async fn upsert_summary(
        &self,
        key_column: &'static str,
        key: i64,
        summary: NewSummary,
    ) -> Result<AiSummary> {
        let key_points = serde_json::to_string(&summary.key_points)?;
        let tags = serde_json::to_string(&summary.tags)?;

        let row = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                let existing: Option<i64> = tx
                    .query_row(
                        &format!("SELECT id FROM ai_summaries WHERE {key_column} = ?1"),
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?;

                let id = match existing {
                    Some(id) => {
                        tx.execute(
                            "UPDATE ai_summaries SET
                                 title = ?1,
                                 summary_text = ?2,
                                 key_points = ?3,
                                 tags = ?4,
                                 confidence = ?5,
                                 generated_at = datetime('now'),
                                 updated_at = datetime('now')
                             WHERE id = ?6",
                            params![
                                summary.title,
                                summary.summary_text,
                                key_points,
                                tags,
                                summary.confidence,
                                id
                            ],
                        )?;
                        id
                    }
                    None => {
                        tx.execute(
                            &format!(
                                "INSERT INTO ai_summaries
                                     ({key_column}, title, summary_text, key_points, tags, confidence)
                                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                            ),
                            params![
                                key,
                                summary.title,
                                summary.summary_text,
                                key_points,
                                tags,
                                summary.confidence
                            ],
                        )?;
                        tx.last_insert_rowid()
                    }
                };

                let row = tx.query_row(
                    &format!("{SUMMARY_SELECT} WHERE id = ?1"),
                    params![id],
                    |row| Ok(summary_from_row(row)),
                )?;

                tx.commit()?;
                Ok(row)
            })
            .await?;
        Ok(row)
    }

    pub async fn delete_summary(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM ai_summaries WHERE id = ?1", params![id])?;
                Ok(changed > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn toggle_summary_bookmarked(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE ai_summaries SET is_bookmarked = NOT is_bookmarked,
                         updated_at = datetime('now')
                     WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

const SUMMARY_SELECT: &str = "SELECT id, video_id, playlist_id, title, summary_text, key_points,
       tags, confidence, is_bookmarked, generated_at, created_at, updated_at
FROM ai_summaries";

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn datetime_column(row: &Row, idx: usize) -> DateTime<Utc> {
    row.get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now)
}

fn playlist_from_row(row: &Row) -> Playlist {
    Playlist {
        id: row.get(0).unwrap(),
        yt_id: row.get(1).unwrap(),
        title: row.get(2).unwrap(),
        thumbnail_url: row.get(3).unwrap(),
        video_count: row.get(4).unwrap(),
        created_at: datetime_column(row, 5),
        updated_at: datetime_column(row, 6),
    }
}

fn video_from_row(row: &Row) -> Video {
    Video {
        id: row.get(0).unwrap(),
        playlist_id: row.get(1).unwrap(),
        yt_id: row.get(2).unwrap(),
        title: row.get(3).unwrap(),
        position: row.get(4).unwrap(),
        duration: row.get(5).unwrap(),
    }
}

fn summary_from_row(row: &Row) -> AiSummary {
    let key_points: Vec<String> = row
        .get::<_, String>(5)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();
    let tags: serde_json::Value = row
        .get::<_, String>(6)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(serde_json::Value::Null);

    AiSummary {
        id: row.get(0).unwrap(),
        video_id: row.get(1).unwrap(),
        playlist_id: row.get(2).unwrap(),
        title: row.get(3).unwrap(),
        summary_text: row.get(4).unwrap(),
        key_points,
        tags,
        confidence: row.get(7).unwrap(),
        is_bookmarked: row.get::<_, i64>(8).unwrap() != 0,
        generated_at: datetime_column(row, 9),
        created_at: datetime_column(row, 10),
        updated_at: datetime_column(row, 11),
    }
}
