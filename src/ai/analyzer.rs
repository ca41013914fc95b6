use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::youtube::{format_duration, PublicPlaylist};

use super::extract::{extract_json, string_field, string_list_field};
use super::TextGenerator;

/// The analytical prompt covers a whole playlist listing and gets the longest
/// deadline in the system.
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(90);

const DESCRIPTION_EXCERPT_CHARS: usize = 500;

/// Pre-watch assessment of a playlist the user has not imported: what it
/// covers, what it assumes, whether it is worth the time. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistReport {
    pub overview: String,
    pub key_insights: Vec<String>,
    pub learning_path: String,
    pub time_investment: String,
    pub prerequisites: String,
    pub best_for: String,
    pub considerations: Vec<String>,
    pub estimated_completion_time: String,
    pub difficulty_level: String,
    pub topics_covered: Vec<String>,
}

pub struct PlaylistAnalyzer {
    generator: Arc<dyn TextGenerator>,
}

impl PlaylistAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn analyze(&self, playlist: &PublicPlaylist) -> Result<PlaylistReport> {
        tracing::info!(
            "Analyzing public playlist \"{}\" ({} videos)",
            playlist.title,
            playlist.video_count
        );

        let prompt = build_analysis_prompt(playlist);
        let text = self.generator.generate(&prompt, None, ANALYSIS_TIMEOUT).await?;

        Ok(report_from_reply(&text, playlist))
    }
}

fn build_analysis_prompt(playlist: &PublicPlaylist) -> String {
    let mut video_list = String::new();
    for (i, video) in playlist.videos.iter().enumerate() {
        let _ = writeln!(
            video_list,
            "{}. {} ({})",
            i + 1,
            video.title,
            format_duration(video.duration)
        );
    }

    let description: String = playlist
        .description
        .chars()
        .take(DESCRIPTION_EXCERPT_CHARS)
        .collect();

    format!(
        "You are an educational content analyst. Analyze this YouTube playlist and provide a \
         comprehensive analytical summary that helps someone decide if this playlist is worth \
         their time BEFORE starting it.\n\
         \n\
         PLAYLIST INFORMATION:\n\
         Title: {title}\n\
         Total Videos: {video_count}\n\
         Total Duration: {total_duration}\n\
         Description: {description}\n\
         \n\
         VIDEO LIST (first {listed} videos):\n\
         {video_list}\
         \n\
         Provide a detailed analytical summary in JSON format with this structure:\n\
         {{\n\
           \"overview\": \"2-3 sentences summarizing what this playlist covers and who it's for\",\n\
           \"key_insights\": [\"Important insight 1\", \"Important insight 2\"],\n\
           \"learning_path\": \"Describe the progression/learning path through the videos\",\n\
           \"time_investment\": \"Analysis of time commitment required and value proposition\",\n\
           \"prerequisites\": \"What background knowledge or prerequisites are needed\",\n\
           \"best_for\": \"Who would benefit most from this playlist\",\n\
           \"considerations\": [\"Important consideration 1\", \"Consideration 2\"],\n\
           \"estimated_completion_time\": \"Realistic time estimate including breaks\",\n\
           \"difficulty_level\": \"Beginner/Intermediate/Advanced\",\n\
           \"topics_covered\": [\"Topic 1\", \"Topic 2\"]\n\
         }}\n\
         \n\
         Be analytical, honest, and helpful. Focus on information someone would need to know \
         BEFORE committing time to watch this playlist.\n\
         \n\
         IMPORTANT: Respond ONLY with valid JSON.",
        title = playlist.title,
        video_count = playlist.video_count,
        total_duration = format_duration(playlist.total_duration),
        description = description,
        listed = playlist.videos.len(),
        video_list = video_list,
    )
}

/// Builds the report from whatever JSON the model managed to produce, filling
/// each missing or mistyped field with a named fallback derived from the
/// playlist itself.
fn report_from_reply(text: &str, playlist: &PublicPlaylist) -> PlaylistReport {
    let parsed = extract_json(text).unwrap_or(serde_json::Value::Null);
    let duration = format_duration(playlist.total_duration);

    let overview = string_field(&parsed, "overview").unwrap_or_else(|| {
        text.trim().chars().take(500).collect()
    });
    let key_insights = some_or(string_list_field(&parsed, "key_insights"), || {
        vec![format!("Covers {} videos over {}", playlist.video_count, duration)]
    });
    let considerations = some_or(string_list_field(&parsed, "considerations"), || {
        vec![format!("Playlist contains {} videos", playlist.video_count)]
    });
    let topics_covered = some_or(string_list_field(&parsed, "topics_covered"), || {
        vec!["See video titles above".to_string()]
    });

    PlaylistReport {
        overview,
        key_insights,
        learning_path: string_field(&parsed, "learning_path").unwrap_or_else(|| {
            "Review the video list to understand the progression".to_string()
        }),
        time_investment: string_field(&parsed, "time_investment")
            .unwrap_or_else(|| format!("Total duration: {}", duration)),
        prerequisites: string_field(&parsed, "prerequisites")
            .unwrap_or_else(|| "Review the playlist description for prerequisites".to_string()),
        best_for: string_field(&parsed, "best_for")
            .unwrap_or_else(|| format!("Anyone interested in {}", playlist.title)),
        considerations,
        estimated_completion_time: string_field(&parsed, "estimated_completion_time")
            .unwrap_or(duration),
        difficulty_level: string_field(&parsed, "difficulty_level")
            .unwrap_or_else(|| "Mixed".to_string()),
        topics_covered,
    }
}

fn some_or(list: Vec<String>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if list.is_empty() {
        fallback()
    } else {
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::PublicVideo;

    fn playlist() -> PublicPlaylist {
        PublicPlaylist {
            yt_id: "PLpub".to_string(),
            title: "Compilers".to_string(),
            description: "Front to back".to_string(),
            thumbnail_url: None,
            video_count: 2,
            total_duration: 3900,
            videos: vec![
                PublicVideo {
                    title: "Lexing".to_string(),
                    duration: 1800,
                    view_count: 100,
                },
                PublicVideo {
                    title: "Parsing".to_string(),
                    duration: 2100,
                    view_count: 90,
                },
            ],
        }
    }

    #[test]
    fn parsed_reply_fills_the_report() {
        let reply = r#"{
            "overview": "Two-part compiler course.",
            "key_insights": ["Hands-on"],
            "learning_path": "Lexing then parsing",
            "time_investment": "About an hour",
            "prerequisites": "Basic programming",
            "best_for": "Language nerds",
            "considerations": ["Short"],
            "estimated_completion_time": "2 evenings",
            "difficulty_level": "Intermediate",
            "topics_covered": ["Lexing", "Parsing"]
        }"#;

        let report = report_from_reply(reply, &playlist());
        assert_eq!(report.overview, "Two-part compiler course.");
        assert_eq!(report.difficulty_level, "Intermediate");
        assert_eq!(report.topics_covered, vec!["Lexing", "Parsing"]);
    }

    #[test]
    fn unparseable_reply_falls_back_field_by_field() {
        let report = report_from_reply("the model rambled instead", &playlist());

        assert_eq!(report.overview, "the model rambled instead");
        assert_eq!(report.time_investment, "Total duration: 1h 5m");
        assert_eq!(report.estimated_completion_time, "1h 5m");
        assert_eq!(report.difficulty_level, "Mixed");
        assert_eq!(report.best_for, "Anyone interested in Compilers");
    }

    #[test]
    fn partially_valid_reply_keeps_good_fields_only() {
        let reply = r#"{"overview": "Good overview", "difficulty_level": 3}"#;
        let report = report_from_reply(reply, &playlist());

        assert_eq!(report.overview, "Good overview");
        assert_eq!(report.difficulty_level, "Mixed");
    }

    #[test]
    fn prompt_lists_videos_with_durations() {
        let prompt = build_analysis_prompt(&playlist());
        assert!(prompt.contains("1. Lexing (30m)"));
        assert!(prompt.contains("2. Parsing (35m)"));
        assert!(prompt.contains("Total Duration: 1h 5m"));
    }
}
