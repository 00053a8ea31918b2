//! Application configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `FOLIO_` environment variables (`FOLIO_PLAYER__AUTO_PLAY=true`).
//! Command-line flags are applied on top by the caller.

use anyhow::{Context, Result};
use folio_playback::PlayerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine settings
    pub player: PlayerConfig,

    /// Playlist document used when no `--playlist` is given
    pub playlist: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Number of documents kept by the content cache
    pub cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            playlist: None,
            log_filter: "folio_cli=info,folio_playback=info".to_string(),
            cache_capacity: 16,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with FOLIO_)
        settings = settings.add_source(
            config::Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.player.validate()?;
        Ok(config)
    }
}
