pub const SCHEMA: &str = r#"
-- playlists table
CREATE TABLE IF NOT EXISTS playlists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    yt_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    thumbnail_url TEXT,
    video_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_playlists_yt_id ON playlists(yt_id);

-- videos table
CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
    yt_id TEXT NOT NULL,
    title TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    duration INTEGER NOT NULL DEFAULT 0,
    UNIQUE(playlist_id, yt_id)
);

CREATE INDEX IF NOT EXISTS idx_videos_playlist_id ON videos(playlist_id);
CREATE INDEX IF NOT EXISTS idx_videos_playlist_position ON videos(playlist_id, position);

-- ai_summaries table
-- key_points and tags are JSON text blobs, not native JSON columns.
-- The CHECK enforces the exactly-one-reference rule; the partial unique
-- indexes back the one-row-per-target upsert performed in the repository.
CREATE TABLE IF NOT EXISTS ai_summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id INTEGER REFERENCES videos(id) ON DELETE CASCADE,
    playlist_id INTEGER REFERENCES playlists(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    summary_text TEXT NOT NULL,
    key_points TEXT NOT NULL DEFAULT '[]',
    tags TEXT NOT NULL DEFAULT 'null',
    confidence INTEGER NOT NULL DEFAULT 0,
    is_bookmarked INTEGER NOT NULL DEFAULT 0,
    generated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((video_id IS NULL) <> (playlist_id IS NULL))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_ai_summaries_playlist_id
    ON ai_summaries(playlist_id) WHERE playlist_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_ai_summaries_video_id
    ON ai_summaries(video_id) WHERE video_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_ai_summaries_created_at ON ai_summaries(created_at);
"#;
