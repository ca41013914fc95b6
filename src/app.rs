use std::sync::Arc;

use crate::ai::{
    GeminiClient, PlaylistAnalysis, PlaylistAnalyzer, PlaylistReport, PlaylistSummarizer,
    TranscriptSource,
};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{AiSummary, NewPlaylist, NewSummary, NewVideo, Playlist, PlaylistStats};
use crate::services::{NoTranscripts, TranscriptFetcher};
use crate::youtube::{extract_playlist_id, PublicPlaylist, YouTubeClient, PLAYLIST_PAGE_SIZE};

pub struct App {
    pub repository: Repository,
    youtube: Option<Arc<YouTubeClient>>,
    summarizer: Option<PlaylistSummarizer>,
    analyzer: Option<PlaylistAnalyzer>,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;

        let youtube = config
            .youtube_api_key
            .as_ref()
            .map(|key| Arc::new(YouTubeClient::new(key.clone())));
        let gemini = config.gemini_api_key.as_ref().map(|key| {
            Arc::new(GeminiClient::new(key.clone(), config.gemini_model.clone()))
        });

        let summarizer = match (&youtube, &gemini) {
            (Some(youtube), Some(gemini)) => {
                let transcripts: Arc<dyn TranscriptSource> = if config.transcripts_enabled {
                    Arc::new(TranscriptFetcher::new())
                } else {
                    Arc::new(NoTranscripts)
                };
                Some(PlaylistSummarizer::new(
                    youtube.clone(),
                    transcripts,
                    gemini.clone(),
                ))
            }
            _ => None,
        };
        let analyzer = gemini
            .as_ref()
            .map(|gemini| PlaylistAnalyzer::new(gemini.clone()));

        Ok(Self {
            repository,
            youtube,
            summarizer,
            analyzer,
        })
    }

    fn youtube(&self) -> Result<&Arc<YouTubeClient>> {
        self.youtube
            .as_ref()
            .ok_or_else(|| AppError::Config("youtube_api_key is not set".to_string()))
    }

    /// Imports a playlist and its videos into the local library. Importing a
    /// playlist that is already present keeps the existing row and reports it.
    pub async fn import_playlist(&self, url_or_id: &str) -> Result<(Playlist, bool)> {
        let yt_id = extract_playlist_id(url_or_id).ok_or_else(|| {
            AppError::Validation(format!("not a YouTube playlist URL or id: {url_or_id}"))
        })?;

        let youtube = self.youtube()?;
        let meta = youtube
            .fetch_playlist(&yt_id)
            .await?
            .ok_or_else(|| AppError::PlaylistNotFound(yt_id.clone()))?;
        let videos = youtube
            .fetch_playlist_videos(&yt_id, PLAYLIST_PAGE_SIZE)
            .await?;

        let (playlist, created) = self
            .repository
            .find_or_create_playlist(NewPlaylist {
                yt_id: meta.yt_id,
                title: meta.title,
                thumbnail_url: meta.thumbnail_url,
                video_count: meta.total_videos,
            })
            .await?;

        let rows = videos
            .into_iter()
            .enumerate()
            .map(|(i, video)| NewVideo {
                yt_id: video.yt_id,
                title: video.title,
                position: i as i64,
                duration: video.duration,
            })
            .collect();
        self.repository.replace_videos(playlist.id, rows).await?;

        tracing::info!("Imported playlist \"{}\" (new: {})", playlist.title, created);
        Ok((playlist, created))
    }

    /// Generates (or regenerates) the AI summary for an imported playlist.
    /// Repeated and concurrent calls update the single summary row in place.
    pub async fn summarize_playlist(&self, playlist_id: i64) -> Result<AiSummary> {
        let playlist = self
            .repository
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::PlaylistNotFound(playlist_id.to_string()))?;

        let summarizer = self.summarizer.as_ref().ok_or_else(|| {
            AppError::Config("youtube_api_key and gemini_api_key must both be set".to_string())
        })?;

        let analysis = summarizer.summarize(&playlist.yt_id).await?;
        let row = self
            .repository
            .upsert_playlist_summary(summary_draft(playlist.id, &analysis))
            .await?;

        tracing::info!(
            "Stored summary {} for playlist \"{}\"",
            row.id,
            playlist.title
        );
        Ok(row)
    }

    /// One-shot analytical report for any public playlist URL; nothing is
    /// written to the library.
    pub async fn analyze_public_playlist(
        &self,
        url: &str,
    ) -> Result<(PublicPlaylist, PlaylistReport)> {
        let yt_id = extract_playlist_id(url).ok_or_else(|| {
            AppError::Validation(format!("not a YouTube playlist URL or id: {url}"))
        })?;

        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or_else(|| AppError::Config("gemini_api_key is not set".to_string()))?;

        let playlist = self.youtube()?.collect_playlist(&yt_id).await?;
        let report = analyzer.analyze(&playlist).await?;
        Ok((playlist, report))
    }
}

/// Maps one generation result onto the fields of the playlist's summary row.
/// The title comes from the freshly fetched snapshot so regeneration picks up
/// upstream renames.
pub(crate) fn summary_draft(playlist_id: i64, analysis: &PlaylistAnalysis) -> NewSummary {
    let result = &analysis.result;
    let stats = PlaylistStats {
        total_videos: result.total_videos,
        total_time: result.total_time.clone(),
        estimated_total_likes: result.estimated_total_likes.clone(),
        target_audience: result.target_audience.clone(),
        difficulty_level: result.difficulty_level.clone(),
    };

    NewSummary {
        video_id: None,
        playlist_id: Some(playlist_id),
        title: format!("{} - Playlist Summary", analysis.playlist.title),
        summary_text: result.summary.clone(),
        key_points: result.key_topics.clone(),
        tags: serde_json::to_value(&stats).unwrap_or(serde_json::Value::Null),
        confidence: result.confidence,
    }
}
