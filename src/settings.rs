//! Settings infrastructure for the text engine.
//!
//! Hosts drop a `settings.toml` next to (or above) their workspace to pick
//! the LSP position encoding and the tracking-range overlap policy:
//!
//! ```toml
//! [positions]
//! encoding = "utf-16"
//!
//! [tracking]
//! overlap = "truncate"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::document::TrackingPolicy;
use crate::lsp::PositionEncoding;

/// Root settings structure loaded from settings.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Position conversion configuration.
    pub positions: Option<PositionSettings>,
    /// Tracking range configuration.
    pub tracking: Option<TrackingSettings>,
}

/// Settings for LSP position conversion.
#[derive(Debug, Default, Deserialize)]
pub struct PositionSettings {
    /// Column encoding: "utf-8" or "utf-16".
    pub encoding: Option<PositionEncoding>,
}

/// Settings for tracking range behavior.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingSettings {
    /// Partial-overlap policy: "truncate" or "invalidate".
    pub overlap: Option<TrackingPolicy>,
}

impl Settings {
    /// The configured position encoding, defaulting to UTF-16.
    pub fn position_encoding(&self) -> PositionEncoding {
        self.positions
            .as_ref()
            .and_then(|p| p.encoding)
            .unwrap_or_default()
    }

    /// The configured tracking overlap policy, defaulting to truncation.
    pub fn tracking_policy(&self) -> TrackingPolicy {
        self.tracking
            .as_ref()
            .and_then(|t| t.overlap)
            .unwrap_or_default()
    }
}

/// Load settings from a settings.toml file.
///
/// Missing or malformed files fall back to defaults; a broken settings file
/// should degrade the host to default behavior, not stop it.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Warning: failed to parse settings.toml: {}", e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover settings.toml by walking up the directory tree from `start_dir`.
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found settings.toml. If none is found, returns
/// `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join("settings.toml");
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }
    (Settings::default(), start_dir.to_path_buf())
}
