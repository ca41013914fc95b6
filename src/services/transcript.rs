use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::ai::TranscriptSource;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Hard cap on transcript length so a wordy video cannot blow up the prompt.
const MAX_TRANSCRIPT_CHARS: usize = 3000;

static CAPTION_TRACK_RE: OnceLock<Regex> = OnceLock::new();
static CAPTION_TEXT_RE: OnceLock<Regex> = OnceLock::new();

/// Scrapes the caption track of a public video. The watch page embeds a
/// caption-track URL in a script blob; none of this is a documented API, so
/// every failure mode collapses to `None` and the summarization pipeline
/// carries on without the transcript.
pub struct TranscriptFetcher {
    client: Client,
}

impl TranscriptFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_STRING)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    pub async fn fetch_transcript(&self, video_yt_id: &str) -> Option<String> {
        let page = self
            .get_text(&format!("{WATCH_URL}?v={video_yt_id}"))
            .await?;

        let track_re = CAPTION_TRACK_RE.get_or_init(|| {
            Regex::new(r#""captionTracks":\[\{"baseUrl":"([^"]+)""#).unwrap()
        });
        let caption_url = match track_re.captures(&page).and_then(|caps| caps.get(1)) {
            Some(m) => m.as_str().replace("\\u0026", "&"),
            None => {
                tracing::debug!("No caption track found for video {}", video_yt_id);
                return None;
            }
        };

        let caption_xml = self.get_text(&caption_url).await?;

        let text_re = CAPTION_TEXT_RE
            .get_or_init(|| Regex::new(r"<text[^>]*>([^<]+)</text>").unwrap());
        let joined = text_re
            .captures_iter(&caption_xml)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            tracing::debug!("Caption document for video {} had no text", video_yt_id);
            return None;
        }

        let text = unescape_html(&joined);
        Some(text.chars().take(MAX_TRANSCRIPT_CHARS).collect())
    }

    async fn get_text(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Transcript fetch failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Transcript fetch for {} returned {}", url, response.status());
            return None;
        }

        response.text().await.ok()
    }
}

impl Default for TranscriptFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for TranscriptFetcher {
    async fn fetch(&self, video_yt_id: &str) -> Option<String> {
        self.fetch_transcript(video_yt_id).await
    }
}

/// Stand-in source used when caption scraping is switched off in the config.
pub struct NoTranscripts;

#[async_trait]
impl TranscriptSource for NoTranscripts {
    async fn fetch(&self, _video_yt_id: &str) -> Option<String> {
        None
    }
}

/// Decodes the handful of entities caption documents actually contain.
/// `&amp;` goes last so already-decoded entities are not decoded twice.
fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::unescape_html;

    #[test]
    fn decodes_common_entities() {
        assert_eq!(
            unescape_html("it&#39;s &quot;fine&quot; &amp; &lt;ok&gt;"),
            "it's \"fine\" & <ok>"
        );
    }

    #[test]
    fn double_encoded_ampersand_decodes_once() {
        assert_eq!(unescape_html("a &amp;lt; b"), "a &lt; b");
    }
}
