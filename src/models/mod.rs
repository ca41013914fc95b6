mod playlist;
mod summary;

pub use playlist::{NewPlaylist, NewVideo, Playlist, Video};
pub use summary::{AiSummary, NewSummary, PlaylistStats};
