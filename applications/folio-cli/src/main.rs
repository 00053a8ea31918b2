/// Folio CLI - drives the playback engine without a browser
mod config;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_content::ContentCache;
use folio_playback::{PlaylistDocument, PlaylistFormat};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::simulate::SimulationOptions;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(about = "Headless host for the Folio music player engine", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./folio.toml if present)
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a playlist through against a simulated audio element
    Simulate {
        /// Playlist document (TOML or JSON)
        #[arg(short, long)]
        playlist: Option<PathBuf>,
        /// Attempt playback without a user gesture
        #[arg(long)]
        autoplay: bool,
        /// Make the simulated platform refuse autoplay
        #[arg(long)]
        block_autoplay: bool,
        /// Track index to start on
        #[arg(long)]
        start: Option<usize>,
        /// Initial volume (0.0-1.0)
        #[arg(long)]
        volume: Option<f64>,
        /// Track id whose source fails to load (repeatable)
        #[arg(long = "fail", value_name = "TRACK_ID")]
        fail: Vec<String>,
        /// Seconds of playback per step
        #[arg(long, default_value_t = 15.0)]
        tick: f64,
        /// Stop after this many steps
        #[arg(long, default_value_t = 500)]
        max_steps: usize,
    },
    /// Print the tracks of a playlist document
    Inspect {
        /// Playlist document (TOML or JSON)
        #[arg(short, long)]
        playlist: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = AppConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| app_config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cache = ContentCache::new(app_config.cache_capacity);

    match cli.command {
        Commands::Simulate {
            playlist,
            autoplay,
            block_autoplay,
            start,
            volume,
            fail,
            tick,
            max_steps,
        } => {
            let path = playlist_path(playlist, &app_config)?;
            let document = load_playlist(&cache, &path)?;

            let mut player_config = app_config.player.clone();
            player_config.auto_play |= autoplay;
            if let Some(start) = start {
                player_config.initial_index = start;
            }
            if let Some(volume) = volume {
                player_config.volume = volume;
            }
            player_config.validate()?;

            let options = SimulationOptions {
                block_autoplay,
                failing_tracks: fail,
                tick_seconds: tick,
                max_steps,
            };

            tracing::info!("Simulating {} ({} tracks)", path.display(), document.tracks.len());
            let mut stdout = std::io::stdout().lock();
            let report =
                simulate::run(document.into_tracks(), player_config, &options, &mut stdout)
                    .await?;

            tracing::info!(
                "Done after {} steps: {} finished, {} failed, {} autoplay blocks",
                report.steps,
                report.finished.len(),
                report.failed.len(),
                report.autoplay_blocks
            );
        }
        Commands::Inspect { playlist } => {
            let path = playlist_path(playlist, &app_config)?;
            let document = load_playlist(&cache, &path)?;
            print_playlist(&document);
        }
    }

    Ok(())
}

fn playlist_path(flag: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    flag.or_else(|| config.playlist.clone())
        .context("No playlist given (use --playlist or set `playlist` in folio.toml)")
}

fn load_playlist(cache: &ContentCache, path: &Path) -> Result<PlaylistDocument> {
    let text = cache.load_file(path)?;
    PlaylistDocument::parse(&text, PlaylistFormat::from_path(path))
        .with_context(|| format!("Failed to parse playlist {}", path.display()))
}

fn print_playlist(document: &PlaylistDocument) {
    println!("{}", document.name.as_deref().unwrap_or("(untitled)"));
    if document.tracks.is_empty() {
        println!("  (no tracks)");
        return;
    }
    for (index, track) in document.tracks.iter().enumerate() {
        println!(
            "  {:>2}. [{}] {} - {}  ({})",
            index + 1,
            track.id,
            track.artist,
            track.title,
            track.source_uri
        );
    }
    println!("  {} tracks", document.tracks.len());
}
