//! Headless playback run
//!
//! Plays a playlist against the simulated media resource, standing in for a
//! listener: it reports sources ready, presses play when the engine is
//! paused, skips broken tracks and lets the clock run.

use anyhow::Result;
use folio_playback::{
    format_time, sim::SimulatedMedia, PlaybackEvent, PlaybackSnapshot, PlaybackStatus, Player,
    PlayerConfig, Track,
};
use std::collections::HashSet;
use std::io::Write;
use tracing::{info, warn};

/// Knobs for a simulated run
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Refuse `play()` until the simulated user presses play
    pub block_autoplay: bool,
    /// Track ids whose sources fail to load
    pub failing_tracks: Vec<String>,
    /// Seconds of playback per step
    pub tick_seconds: f64,
    /// Upper bound on steps
    pub max_steps: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            block_autoplay: false,
            failing_tracks: Vec::new(),
            tick_seconds: 15.0,
            max_steps: 500,
        }
    }
}

/// What happened during a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimulationReport {
    pub steps: usize,
    /// Tracks that played to their end, in order
    pub finished: Vec<String>,
    /// Tracks that failed to load
    pub failed: Vec<String>,
    pub autoplay_blocks: usize,
}

/// Render one status line for `snapshot`
pub fn render_line(snapshot: &PlaybackSnapshot) -> String {
    let Some(track) = &snapshot.current_track else {
        return format!("[{:>7}] (no tracks)", snapshot.status);
    };
    let index = snapshot.current_index.unwrap_or(0);

    format!(
        "[{:>7}] {}/{} {} - {}  {} / {}  {:>3.0}%",
        snapshot.status,
        index + 1,
        snapshot.total_tracks,
        track.artist,
        track.title,
        format_time(snapshot.position_seconds),
        format_time(snapshot.duration_seconds.unwrap_or(0.0)),
        snapshot.progress_fraction * 100.0
    )
}

/// Play `tracks` once through, writing a line per step to `out`
///
/// Stops once every track has either finished or failed, or after
/// `options.max_steps` steps.
pub async fn run<W: Write>(
    tracks: Vec<Track>,
    config: PlayerConfig,
    options: &SimulationOptions,
    out: &mut W,
) -> Result<SimulationReport> {
    let media = SimulatedMedia::new();
    media.block_autoplay(options.block_autoplay);
    for track in &tracks {
        if options.failing_tracks.contains(&track.id) {
            media.fail_source(&track.source_uri);
        }
    }

    let total = tracks.len();
    let player = Player::new(media, tracks, config);
    player.mount().await;

    let mut report = SimulationReport::default();
    let mut settled: HashSet<String> = HashSet::new();

    while report.steps < options.max_steps && settled.len() < total {
        let snapshot = player.snapshot();
        match snapshot.status {
            PlaybackStatus::Idle => break,
            PlaybackStatus::Error => player.next().await,
            // Nothing loaded yet: let the source finish loading
            _ if snapshot.duration_seconds.is_none() => player.media().finish_loading(),
            PlaybackStatus::Loading => player.media().finish_loading(),
            PlaybackStatus::Paused => {
                player.media().activate();
                player.toggle_play_pause().await;
            }
            PlaybackStatus::Playing => {
                player.media().advance(options.tick_seconds);
            }
        }

        player.dispatch_pending().await;
        report.steps += 1;

        for event in player.drain_events() {
            match event {
                PlaybackEvent::TrackFinished { track_id } => {
                    info!("Finished {}", track_id);
                    settled.insert(track_id.clone());
                    report.finished.push(track_id);
                }
                PlaybackEvent::Error {
                    track_id: Some(track_id),
                    message,
                } => {
                    warn!("Skipping {}: {}", track_id, message);
                    settled.insert(track_id.clone());
                    report.failed.push(track_id);
                }
                PlaybackEvent::AutoplayBlocked { track_id, .. } => {
                    info!("Autoplay blocked on {}, pressing play", track_id);
                    report.autoplay_blocks += 1;
                }
                _ => {}
            }
        }

        writeln!(out, "{}", render_line(&player.snapshot()))?;
    }

    player.teardown();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter()
            .map(|id| Track::new(*id, format!("Song {}", id), "Band", format!("/music/{}.m4a", id)))
            .collect()
    }

    fn options(tick_seconds: f64) -> SimulationOptions {
        SimulationOptions {
            tick_seconds,
            ..SimulationOptions::default()
        }
    }

    #[tokio::test]
    async fn plays_every_track_once() {
        let mut out = Vec::new();
        let report = run(
            tracks(&["a", "b", "c"]),
            PlayerConfig::default(),
            &options(60.0),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(report.finished, vec!["a", "b", "c"]);
        assert!(report.failed.is_empty());
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), report.steps);
    }

    #[tokio::test]
    async fn skips_failing_tracks() {
        let mut out = Vec::new();
        let report = run(
            tracks(&["a", "b", "c"]),
            PlayerConfig::default(),
            &SimulationOptions {
                failing_tracks: vec!["b".to_string()],
                ..options(90.0)
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(report.finished, vec!["a", "c"]);
        assert_eq!(report.failed, vec!["b"]);
    }

    #[tokio::test]
    async fn recovers_from_blocked_autoplay() {
        let config = PlayerConfig {
            auto_play: true,
            ..PlayerConfig::default()
        };
        let mut out = Vec::new();
        let report = run(
            tracks(&["a", "b"]),
            config,
            &SimulationOptions {
                block_autoplay: true,
                ..options(90.0)
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(report.autoplay_blocks, 1);
        assert_eq!(report.finished, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn empty_playlist_stops_immediately() {
        let mut out = Vec::new();
        let report = run(Vec::new(), PlayerConfig::default(), &options(15.0), &mut out)
            .await
            .unwrap();

        assert_eq!(report.steps, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn step_limit_bounds_the_run() {
        let mut out = Vec::new();
        let report = run(
            tracks(&["a"]),
            PlayerConfig::default(),
            &SimulationOptions {
                max_steps: 3,
                ..options(1.0)
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(report.steps, 3);
        assert!(report.finished.is_empty());
    }

    #[test]
    fn renders_status_line() {
        let snapshot = PlaybackSnapshot {
            status: PlaybackStatus::Playing,
            current_track: Some(Track::new("1", "Kataware Doki", "Radwimps", "/k.m4a")),
            current_index: Some(0),
            total_tracks: 3,
            position_seconds: 65.0,
            duration_seconds: Some(260.0),
            volume: 0.7,
            muted: false,
            progress_fraction: 0.25,
            user_paused: false,
            is_loading: false,
        };

        assert_eq!(
            render_line(&snapshot),
            "[playing] 1/3 Radwimps - Kataware Doki  1:05 / 4:20   25%"
        );
    }
}
