//! User preference persistence
//!
//! Transport preferences (volume, mute, shuffle, repeat, karaoke
//! enablement) survive playlist replacement and process restarts; queue and
//! lyric state never persist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Repeat mode, cycled `none -> all -> one -> none`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Play through the queue once, stop at the end
    #[default]
    None,
    /// Wrap back to the start of the queue
    All,
    /// Restart the current track on natural end
    One,
}

impl RepeatMode {
    /// Next mode in cycle order
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RepeatMode::None => "repeat off",
            RepeatMode::All => "repeat all",
            RepeatMode::One => "repeat one",
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Persisted transport preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Volume level (0.0 to 1.0)
    pub volume: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default = "default_true")]
    pub karaoke_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
            shuffle: false,
            repeat_mode: RepeatMode::None,
            karaoke_enabled: true,
        }
    }
}

impl Preferences {
    /// Preferences file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "encore", "Encore")
            .map(|dirs| dirs.config_dir().join("preferences.json"))
    }

    /// Load preferences from the default file, or defaults if not found
    pub fn load() -> Self {
        Self::file_path()
            .and_then(|path| Self::load_from_file(&path).ok())
            .unwrap_or_default()
    }

    /// Load preferences from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save preferences to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(path) = Self::file_path() {
            self.save_to_file(&path)
        } else {
            Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Save preferences to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Errors that can occur with preference files
#[derive(Debug, Clone)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}
