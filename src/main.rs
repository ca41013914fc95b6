mod ai;
mod app;
mod config;
mod db;
mod error;
mod models;
mod services;
mod youtube;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::AiSummary;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Initialize app
    let app = App::new(&config).await?;

    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("--import"), Some(url)) => {
            let (playlist, created) = app.import_playlist(url).await?;
            if created {
                println!(
                    "Imported \"{}\" ({} videos, id {})",
                    playlist.title, playlist.video_count, playlist.id
                );
            } else {
                println!(
                    "Playlist \"{}\" already exists in your library (id {})",
                    playlist.title, playlist.id
                );
            }
        }

        (Some("--summarize"), Some(id)) => {
            let playlist_id = parse_id(id)?;
            let summary = app.summarize_playlist(playlist_id).await?;
            print_summary(&summary);
        }

        (Some("--analyze"), Some(url)) => {
            let (playlist, report) = app.analyze_public_playlist(url).await?;
            let body = serde_json::json!({
                "playlist_info": playlist,
                "analysis": report,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        (Some("--show"), Some(id)) => {
            let summary_id = parse_id(id)?;
            match app.repository.get_summary(summary_id).await? {
                Some(summary) => print_summary(&summary),
                None => println!("No summary with id {}", summary_id),
            }
        }

        (Some("--delete"), Some(id)) => {
            let summary_id = parse_id(id)?;
            if app.repository.delete_summary(summary_id).await? {
                println!("Deleted summary {}", summary_id);
            } else {
                println!("No summary with id {}", summary_id);
            }
        }

        (Some("--bookmark"), Some(id)) => {
            let summary_id = parse_id(id)?;
            app.repository.toggle_summary_bookmarked(summary_id).await?;
            println!("Toggled bookmark on summary {}", summary_id);
        }

        (Some("--videos"), Some(id)) => {
            let playlist_id = parse_id(id)?;
            let videos = app.repository.get_videos(playlist_id).await?;
            if videos.is_empty() {
                println!("No videos for playlist {}", playlist_id);
            }
            for video in videos {
                println!(
                    "{:>3}. {} ({})",
                    video.position + 1,
                    video.title,
                    youtube::format_duration(video.duration)
                );
            }
        }

        (Some("--list"), _) => {
            let playlists = app.repository.get_all_playlists().await?;
            if playlists.is_empty() {
                println!("No playlists imported yet. Try --import <playlist-url>");
            }
            for playlist in playlists {
                let summary = app.repository.get_playlist_summary(playlist.id).await?;
                let status = match summary {
                    Some(s) => format!("summarized (confidence {})", s.confidence),
                    None => "no summary".to_string(),
                };
                println!(
                    "{:>4}  {} - {} videos [{}]",
                    playlist.id, playlist.title, playlist.video_count, status
                );
            }
        }

        _ => {
            println!("playlist-digest - AI summaries for YouTube playlists");
            println!();
            println!("Usage:");
            println!("  playlist-digest --import <playlist-url>    Import a playlist");
            println!("  playlist-digest --summarize <playlist-id>  Generate/refresh its summary");
            println!("  playlist-digest --analyze <playlist-url>   Analyze a public playlist");
            println!("  playlist-digest --list                     List playlists and summaries");
            println!("  playlist-digest --videos <playlist-id>     List an imported playlist's videos");
            println!("  playlist-digest --show <summary-id>        Show a stored summary");
            println!("  playlist-digest --bookmark <summary-id>    Toggle a summary bookmark");
            println!("  playlist-digest --delete <summary-id>      Delete a stored summary");
            println!();
            println!("Configuration: {}", Config::config_path().display());
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("not a numeric id: {raw}")))
}

fn print_summary(summary: &AiSummary) {
    println!("{}", summary.title);
    println!(
        "confidence {} | generated {}{}",
        summary.confidence,
        summary.generated_at.format("%Y-%m-%d %H:%M UTC"),
        if summary.is_bookmarked { " | bookmarked" } else { "" }
    );
    println!();
    println!("{}", summary.summary_text);

    if !summary.key_points.is_empty() {
        println!();
        println!("Key points:");
        for point in &summary.key_points {
            println!("  - {}", point);
        }
    }

    if let Some(stats) = summary.tags.as_object() {
        println!();
        for (key, value) in stats {
            if let Some(text) = value.as_str() {
                println!("{}: {}", key, text);
            } else {
                println!("{}: {}", key, value);
            }
        }
    }
}
