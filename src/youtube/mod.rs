mod client;
mod duration;

pub use client::{
    PlaylistMeta, PublicPlaylist, PublicVideo, VideoMeta, YouTubeClient, PLAYLIST_PAGE_SIZE,
};
pub use duration::{format_count, format_duration, parse_duration};

/// Pulls the playlist id out of the common YouTube URL shapes
/// (`…/playlist?list=PL…`, `…/watch?v=…&list=PL…`) or accepts a bare id.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    if let Ok(parsed) = url::Url::parse(input) {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "list")
            .map(|(_, value)| value.to_string());
    }

    let looks_like_id = !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    looks_like_id.then(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::extract_playlist_id;

    #[test]
    fn extracts_from_playlist_url() {
        assert_eq!(
            extract_playlist_id("https://www.youtube.com/playlist?list=PLabc_123-xyz").as_deref(),
            Some("PLabc_123-xyz")
        );
    }

    #[test]
    fn extracts_from_watch_url() {
        assert_eq!(
            extract_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL99").as_deref(),
            Some("PL99")
        );
    }

    #[test]
    fn accepts_bare_id() {
        assert_eq!(extract_playlist_id("PLabc").as_deref(), Some("PLabc"));
    }

    #[test]
    fn rejects_urls_without_a_list() {
        assert_eq!(extract_playlist_id("https://www.youtube.com/watch?v=abc"), None);
        assert_eq!(extract_playlist_id(""), None);
        assert_eq!(extract_playlist_id("not a playlist"), None);
    }
}
