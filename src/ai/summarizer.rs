use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::youtube::{format_count, format_duration, PlaylistMeta, VideoMeta, PLAYLIST_PAGE_SIZE};

use super::extract::{extract_json, int_field, string_field, string_list_field};
use super::{GenerationConfig, MetadataSource, TextGenerator, TranscriptSource};

/// Playlists below this size get the rich per-video treatment; transcript
/// scraping is one page fetch per video and only affordable for small lists.
const RICH_PLAYLIST_LIMIT: i64 = 20;

/// Sample size for the metadata-only path on large playlists.
const METADATA_SAMPLE: u32 = 10;

/// Transcript excerpt length embedded per video in the rich prompt.
const TRANSCRIPT_EXCERPT_CHARS: usize = 500;

/// Order-preserving bounded concurrency for transcript scraping.
const TRANSCRIPT_CONCURRENCY: usize = 4;

/// Transcript-heavy prompts take noticeably longer to answer.
const RICH_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);
const METADATA_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Knocked off the confidence score when the reply carried no parseable JSON
/// and the raw text had to stand in for the summary.
const JSON_FALLBACK_PENALTY: i64 = 10;

const DEFAULT_AUDIENCE: &str = "General learners";

/// What one generation run produced, mapped 1:1 onto a summary row at write
/// time.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub summary: String,
    pub key_topics: Vec<String>,
    pub target_audience: String,
    pub difficulty_level: Option<String>,
    pub total_videos: i64,
    pub total_time: String,
    pub estimated_total_likes: String,
    pub confidence: i64,
}

#[derive(Debug, Clone)]
pub struct PlaylistAnalysis {
    pub playlist: PlaylistMeta,
    pub result: GenerationResult,
}

/// Orchestrates one summary generation: pick a strategy from playlist size,
/// gather metadata (plus transcripts when rich), prompt the model, extract
/// its JSON and score the outcome. Every stage feeds the next, so the run is
/// strictly sequential apart from the per-video transcript fetches.
pub struct PlaylistSummarizer {
    metadata: Arc<dyn MetadataSource>,
    transcripts: Arc<dyn TranscriptSource>,
    generator: Arc<dyn TextGenerator>,
}

impl PlaylistSummarizer {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        transcripts: Arc<dyn TranscriptSource>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            metadata,
            transcripts,
            generator,
        }
    }

    pub async fn summarize(&self, playlist_yt_id: &str) -> Result<PlaylistAnalysis> {
        tracing::info!("Generating summary for playlist {}", playlist_yt_id);

        let meta = self
            .metadata
            .playlist_meta(playlist_yt_id)
            .await?
            .ok_or_else(|| AppError::PlaylistNotFound(playlist_yt_id.to_string()))?;

        let rich = meta.total_videos < RICH_PLAYLIST_LIMIT;
        let mut videos = if rich {
            let cap = (meta.total_videos.max(0) as u32).min(PLAYLIST_PAGE_SIZE);
            self.metadata.playlist_videos(playlist_yt_id, cap).await?
        } else {
            self.metadata
                .playlist_videos(playlist_yt_id, METADATA_SAMPLE)
                .await?
        };
        tracing::debug!(
            "Fetched {} of {} videos (rich: {})",
            videos.len(),
            meta.total_videos,
            rich
        );

        if rich {
            self.attach_transcripts(&mut videos).await;
        }

        let (prompt, timeout) = if rich {
            (build_rich_prompt(&meta, &videos), RICH_GENERATION_TIMEOUT)
        } else {
            (
                build_metadata_prompt(&meta, &videos),
                METADATA_GENERATION_TIMEOUT,
            )
        };

        let config = GenerationConfig::default();
        let text = self
            .generator
            .generate(&prompt, Some(&config), timeout)
            .await?;
        tracing::debug!("Model replied with {} chars", text.len());

        let transcripts_found = videos.iter().filter(|v| v.transcript.is_some()).count();
        let confidence = confidence_score(videos.len(), meta.total_videos, rich, transcripts_found);
        let computed = computed_defaults(&meta, &videos);
        let result = extract_result(&text, computed, confidence);

        tracing::info!(
            confidence = result.confidence,
            "Summary generated for \"{}\"",
            meta.title
        );
        Ok(PlaylistAnalysis {
            playlist: meta,
            result,
        })
    }

    /// Fetches transcripts a few at a time, keeping playlist order. A `None`
    /// per video is fine; the scorer just sees a lower hit rate.
    async fn attach_transcripts(&self, videos: &mut [VideoMeta]) {
        let ids: Vec<String> = videos.iter().map(|v| v.yt_id.clone()).collect();
        let transcripts: Vec<Option<String>> = stream::iter(ids)
            .map(|id| {
                let source = Arc::clone(&self.transcripts);
                async move { source.fetch(&id).await }
            })
            .buffered(TRANSCRIPT_CONCURRENCY)
            .collect()
            .await;

        for (video, transcript) in videos.iter_mut().zip(transcripts) {
            video.transcript = transcript;
        }
    }
}

/// Authoritative statistics computed from fetched metadata. The model echoes
/// some of these back; when it invents its own they lose (§ merge rules in
/// [`extract_result`]).
struct ComputedDefaults {
    total_videos: i64,
    total_time: String,
    estimated_total_likes: String,
}

fn computed_defaults(meta: &PlaylistMeta, videos: &[VideoMeta]) -> ComputedDefaults {
    let total_seconds: i64 = videos.iter().map(|v| v.duration).sum();

    // Average of the sampled non-zero like counts scaled to the whole
    // playlist reads better than a raw sum over a partial sample.
    let like_counts: Vec<i64> = videos
        .iter()
        .map(|v| v.like_count)
        .filter(|count| *count > 0)
        .collect();
    let avg_likes = if like_counts.is_empty() {
        0
    } else {
        like_counts.iter().sum::<i64>() / like_counts.len() as i64
    };

    ComputedDefaults {
        total_videos: meta.total_videos,
        total_time: format_duration(total_seconds),
        estimated_total_likes: format_count(avg_likes * meta.total_videos),
    }
}

/// Heuristic 0-98 reliability estimate. Base depends on whether transcripts
/// were attempted; coverage and transcript hit rate add small bonuses. Capped
/// below 100 so the score never reads as certainty.
fn confidence_score(
    videos_sampled: usize,
    total_videos: i64,
    transcripts_attempted: bool,
    transcripts_found: usize,
) -> i64 {
    let coverage_ratio = if total_videos > 0 {
        (videos_sampled as f64 / total_videos as f64).min(1.0)
    } else {
        0.0
    };
    let transcript_success_rate = if videos_sampled > 0 {
        transcripts_found as f64 / videos_sampled as f64
    } else {
        0.0
    };

    let base = if transcripts_attempted { 90 } else { 70 };
    let coverage_bonus = (coverage_ratio * 10.0).round() as i64;
    let transcript_bonus = if transcripts_attempted {
        (transcript_success_rate * 5.0).round() as i64
    } else {
        0
    };

    (base + coverage_bonus + transcript_bonus).min(98)
}

/// Merges the model's JSON over the computed defaults, or degrades to the raw
/// reply (with a confidence penalty) when no JSON parses. The request itself
/// never fails on malformed model output.
fn extract_result(text: &str, computed: ComputedDefaults, confidence: i64) -> GenerationResult {
    let Some(parsed) = extract_json(text) else {
        return GenerationResult {
            summary: text.trim().to_string(),
            key_topics: Vec::new(),
            target_audience: DEFAULT_AUDIENCE.to_string(),
            difficulty_level: None,
            total_videos: computed.total_videos,
            total_time: computed.total_time,
            estimated_total_likes: computed.estimated_total_likes,
            confidence: confidence - JSON_FALLBACK_PENALTY,
        };
    };

    GenerationResult {
        summary: string_field(&parsed, "summary").unwrap_or_else(|| text.trim().to_string()),
        key_topics: string_list_field(&parsed, "key_topics"),
        target_audience: string_field(&parsed, "target_audience")
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
        difficulty_level: string_field(&parsed, "difficulty_level"),
        total_videos: int_field(&parsed, "total_videos").unwrap_or(computed.total_videos),
        total_time: string_field(&parsed, "total_time").unwrap_or(computed.total_time),
        estimated_total_likes: string_field(&parsed, "estimated_total_likes")
            .unwrap_or(computed.estimated_total_likes),
        confidence,
    }
}

fn build_rich_prompt(meta: &PlaylistMeta, videos: &[VideoMeta]) -> String {
    let mut video_content = String::new();
    for (i, video) in videos.iter().enumerate() {
        let _ = writeln!(video_content, "{}. {}", i + 1, video.title);
        if !video.description.is_empty() {
            let _ = writeln!(video_content, "   Description: {}", video.description);
        }
        if let Some(transcript) = &video.transcript {
            let excerpt: String = transcript.chars().take(TRANSCRIPT_EXCERPT_CHARS).collect();
            let _ = writeln!(video_content, "   Transcript: {}...", excerpt);
        }
        video_content.push('\n');
    }

    format!(
        "Analyze this YouTube playlist using the provided video transcripts and metadata.\n\
         \n\
         Playlist: {title}\n\
         Description: {description}\n\
         Total Videos: {total_videos}\n\
         \n\
         Videos:\n\
         {video_content}\
         Provide a JSON response with this structure:\n\
         {{\n\
           \"summary\": \"A comprehensive 200-word summary based on the actual content from transcripts.\",\n\
           \"key_topics\": [\"Topic 1\", \"Topic 2\", \"Topic 3\", \"Topic 4\"],\n\
           \"target_audience\": \"Who is this for?\",\n\
           \"difficulty_level\": \"Beginner/Intermediate/Advanced\",\n\
           \"total_videos\": {total_videos},\n\
           \"estimated_total_likes\": \"Based on data\"\n\
         }}\n\
         \n\
         IMPORTANT: Respond ONLY with valid JSON.",
        title = meta.title,
        description = meta.description,
        total_videos = meta.total_videos,
        video_content = video_content,
    )
}

fn build_metadata_prompt(meta: &PlaylistMeta, videos: &[VideoMeta]) -> String {
    let titles = videos
        .iter()
        .enumerate()
        .map(|(i, video)| format!("{}. {}", i + 1, video.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this YouTube playlist metadata and provide a concise summary.\n\
         \n\
         Playlist: {title}\n\
         Description: {description}\n\
         Total Videos: {total_videos}\n\
         \n\
         First {sampled} Videos:\n\
         {titles}\n\
         \n\
         Provide a JSON response with this structure:\n\
         {{\n\
           \"summary\": \"A concise 150-word summary of what this playlist teaches and who it is for.\",\n\
           \"key_topics\": [\"Topic 1\", \"Topic 2\", \"Topic 3\"],\n\
           \"target_audience\": \"Who is this for?\",\n\
           \"difficulty_level\": \"Beginner/Intermediate/Advanced\",\n\
           \"total_videos\": {total_videos},\n\
           \"estimated_total_likes\": \"Based on data\"\n\
         }}\n\
         \n\
         IMPORTANT: Respond ONLY with valid JSON.",
        title = meta.title,
        description = meta.description,
        total_videos = meta.total_videos,
        sampled = videos.len(),
        titles = titles,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FakeMetadata {
        meta: PlaylistMeta,
        videos: Vec<VideoMeta>,
        requested_max: Mutex<Option<u32>>,
    }

    #[async_trait]
    impl MetadataSource for FakeMetadata {
        async fn playlist_meta(&self, _yt_id: &str) -> crate::error::Result<Option<PlaylistMeta>> {
            Ok(Some(self.meta.clone()))
        }

        async fn playlist_videos(
            &self,
            _yt_id: &str,
            max: u32,
        ) -> crate::error::Result<Vec<VideoMeta>> {
            *self.requested_max.lock().unwrap() = Some(max);
            Ok(self.videos.iter().take(max as usize).cloned().collect())
        }
    }

    struct FakeTranscripts {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranscriptSource for FakeTranscripts {
        async fn fetch(&self, _video_yt_id: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    struct FakeGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _config: Option<&GenerationConfig>,
            _timeout: Duration,
        ) -> crate::error::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn meta(total_videos: i64) -> PlaylistMeta {
        PlaylistMeta {
            yt_id: "PLfake".to_string(),
            title: "Intro to Databases".to_string(),
            description: "Storage engines from scratch".to_string(),
            total_videos,
            thumbnail_url: None,
        }
    }

    fn video(n: usize) -> VideoMeta {
        VideoMeta {
            yt_id: format!("vid{n}"),
            title: format!("Lesson {n}"),
            description: String::new(),
            duration: 300,
            like_count: 100,
            transcript: None,
        }
    }

    fn harness(
        total_videos: i64,
        reply: &str,
    ) -> (
        Arc<FakeMetadata>,
        Arc<FakeTranscripts>,
        Arc<FakeGenerator>,
        PlaylistSummarizer,
    ) {
        let metadata = Arc::new(FakeMetadata {
            meta: meta(total_videos),
            videos: (0..total_videos as usize).map(video).collect(),
            requested_max: Mutex::new(None),
        });
        let transcripts = Arc::new(FakeTranscripts {
            calls: AtomicUsize::new(0),
        });
        let generator = Arc::new(FakeGenerator {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let summarizer = PlaylistSummarizer::new(
            metadata.clone(),
            transcripts.clone(),
            generator.clone(),
        );
        (metadata, transcripts, generator, summarizer)
    }

    const VALID_REPLY: &str =
        r#"{"summary": "S", "key_topics": ["t"], "target_audience": "devs"}"#;

    #[tokio::test]
    async fn nineteen_videos_take_the_rich_path() {
        let (metadata, transcripts, generator, summarizer) = harness(19, VALID_REPLY);

        summarizer.summarize("PLfake").await.unwrap();

        assert_eq!(*metadata.requested_max.lock().unwrap(), Some(19));
        assert_eq!(transcripts.calls.load(Ordering::SeqCst), 19);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("using the provided video transcripts"));
    }

    #[tokio::test]
    async fn twenty_videos_take_the_metadata_path() {
        let (metadata, transcripts, generator, summarizer) = harness(20, VALID_REPLY);

        summarizer.summarize("PLfake").await.unwrap();

        assert_eq!(*metadata.requested_max.lock().unwrap(), Some(10));
        assert_eq!(transcripts.calls.load(Ordering::SeqCst), 0);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("metadata and provide a concise summary"));
        assert!(prompts[0].contains("First 10 Videos:"));
    }

    #[tokio::test]
    async fn unknown_playlist_is_not_found() {
        struct EmptyMetadata;

        #[async_trait]
        impl MetadataSource for EmptyMetadata {
            async fn playlist_meta(
                &self,
                _yt_id: &str,
            ) -> crate::error::Result<Option<PlaylistMeta>> {
                Ok(None)
            }

            async fn playlist_videos(
                &self,
                _yt_id: &str,
                _max: u32,
            ) -> crate::error::Result<Vec<VideoMeta>> {
                Ok(Vec::new())
            }
        }

        let summarizer = PlaylistSummarizer::new(
            Arc::new(EmptyMetadata),
            Arc::new(FakeTranscripts {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(FakeGenerator {
                reply: String::new(),
                prompts: Mutex::new(Vec::new()),
            }),
        );

        assert!(matches!(
            summarizer.summarize("PLmissing").await,
            Err(AppError::PlaylistNotFound(_))
        ));
    }

    #[test]
    fn confidence_without_transcripts_at_full_coverage_is_80() {
        assert_eq!(confidence_score(10, 10, false, 0), 80);
    }

    #[test]
    fn confidence_is_capped_at_98() {
        // 90 + 10 + 5 would be 105 without the cap
        assert_eq!(confidence_score(10, 10, true, 10), 98);
        // 90 + 10 + 0 = 100 also hits the cap
        assert_eq!(confidence_score(5, 5, true, 0), 98);
    }

    #[test]
    fn confidence_scales_with_partial_coverage() {
        // 70 + round(0.5 * 10) = 75
        assert_eq!(confidence_score(10, 20, false, 0), 75);
        // empty playlist never panics
        assert_eq!(confidence_score(0, 0, false, 0), 70);
    }

    #[test]
    fn fallback_keeps_raw_text_and_docks_ten_points() {
        let computed = ComputedDefaults {
            total_videos: 4,
            total_time: "1h 0m".to_string(),
            estimated_total_likes: "1.2K".to_string(),
        };

        let result = extract_result("  no json here at all  ", computed, 80);

        assert_eq!(result.summary, "no json here at all");
        assert!(result.key_topics.is_empty());
        assert_eq!(result.target_audience, DEFAULT_AUDIENCE);
        assert_eq!(result.total_videos, 4);
        assert_eq!(result.total_time, "1h 0m");
        assert_eq!(result.confidence, 70);
    }

    #[test]
    fn model_fields_override_defaults_only_when_well_typed() {
        let computed = ComputedDefaults {
            total_videos: 4,
            total_time: "1h 0m".to_string(),
            estimated_total_likes: "1.2K".to_string(),
        };

        // total_videos is a string here, so the computed value must win
        let text = r#"{"summary": "S", "total_videos": "lots", "total_time": "9h 9m"}"#;
        let result = extract_result(text, computed, 85);

        assert_eq!(result.summary, "S");
        assert_eq!(result.total_videos, 4);
        assert_eq!(result.total_time, "9h 9m");
        assert_eq!(result.estimated_total_likes, "1.2K");
        assert_eq!(result.confidence, 85);
    }

    #[tokio::test]
    async fn end_to_end_scenario_persists_a_98_confidence_row() {
        use crate::db::Repository;
        use crate::models::NewPlaylist;

        let titles = ["A", "B", "C", "D", "E"];
        let metadata = Arc::new(FakeMetadata {
            meta: PlaylistMeta {
                yt_id: "PLe2e".to_string(),
                title: "Scenario".to_string(),
                description: String::new(),
                total_videos: 5,
                thumbnail_url: None,
            },
            videos: titles
                .iter()
                .enumerate()
                .map(|(i, title)| VideoMeta {
                    yt_id: format!("v{i}"),
                    title: title.to_string(),
                    description: String::new(),
                    duration: 60,
                    like_count: 0,
                    transcript: None,
                })
                .collect(),
            requested_max: Mutex::new(None),
        });
        let summarizer = PlaylistSummarizer::new(
            metadata,
            Arc::new(FakeTranscripts {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(FakeGenerator {
                reply: r#"{"summary": "X", "key_topics": ["t1", "t2"], "target_audience": "beginners"}"#
                    .to_string(),
                prompts: Mutex::new(Vec::new()),
            }),
        );

        let analysis = summarizer.summarize("PLe2e").await.unwrap();
        // 90 base + 10 coverage + 0 transcript bonus, capped to 98
        assert_eq!(analysis.result.confidence, 98);
        assert_eq!(analysis.result.summary, "X");
        assert_eq!(analysis.result.target_audience, "beginners");

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("e2e.db");
        let repo = Repository::new(db_path.to_str().unwrap()).await.unwrap();
        let (playlist, _) = repo
            .find_or_create_playlist(NewPlaylist {
                yt_id: "PLe2e".to_string(),
                title: "Scenario".to_string(),
                thumbnail_url: None,
                video_count: 5,
            })
            .await
            .unwrap();

        let row = repo
            .upsert_playlist_summary(crate::app::summary_draft(playlist.id, &analysis))
            .await
            .unwrap();

        assert_eq!(row.summary_text, "X");
        assert_eq!(row.key_points, vec!["t1", "t2"]);
        assert_eq!(row.confidence, 98);
        assert_eq!(row.playlist_id, Some(playlist.id));
        assert_eq!(row.video_id, None);
        assert_eq!(row.tags["target_audience"], "beginners");
        assert_eq!(row.tags["total_videos"], 5);
    }
}
