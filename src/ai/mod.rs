mod analyzer;
mod extract;
mod gemini;
mod summarizer;

pub use analyzer::{PlaylistAnalyzer, PlaylistReport};
pub use gemini::{GeminiClient, GenerationConfig};
pub use summarizer::{GenerationResult, PlaylistAnalysis, PlaylistSummarizer};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::youtube::{PlaylistMeta, VideoMeta};

/// Playlist/video metadata lookup, abstracted so the summarization pipeline
/// can be exercised without the network.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn playlist_meta(&self, playlist_yt_id: &str) -> Result<Option<PlaylistMeta>>;
    async fn playlist_videos(&self, playlist_yt_id: &str, max: u32) -> Result<Vec<VideoMeta>>;
}

/// Best-effort captions. Implementations swallow their failures and return
/// `None`; a missing transcript is normal, never an error.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_yt_id: &str) -> Option<String>;
}

/// A text-generation endpoint: prompt in, raw model text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: Option<&GenerationConfig>,
        timeout: Duration,
    ) -> Result<String>;
}
