use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database error: {0}")]
    AsyncDatabase(#[from] tokio_rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("YouTube API error ({status}): {message}")]
    YouTubeApi { status: u16, message: String },

    #[error("Gemini API error ({status}): {message}")]
    GeminiApi { status: u16, message: String },

    #[error("Empty or unexpected response format from Gemini")]
    EmptyGeneration,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
