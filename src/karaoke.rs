//! Karaoke disclosure-level state machine
//!
//! Four levels of lyric UI: closed, footer line, theater sheet, hero
//! screen. Transitions are user-driven; the only automatic rule is the
//! entry gate: lyrics can only open when karaoke is enabled and the
//! current track actually has parsed lyrics. A failed open flips the
//! enablement toggle instead of being a silent no-op.

use serde::{Deserialize, Serialize};

/// Lyric UI disclosure level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KaraokeLevel {
    /// No lyric UI
    #[default]
    Closed,
    /// Single line inline in the mini player
    Footer,
    /// Bottom sheet with a context window
    Theater,
    /// Full-screen large type
    Hero,
}

impl KaraokeLevel {
    fn up(self) -> Self {
        match self {
            KaraokeLevel::Closed => KaraokeLevel::Footer,
            KaraokeLevel::Footer => KaraokeLevel::Theater,
            KaraokeLevel::Theater | KaraokeLevel::Hero => KaraokeLevel::Hero,
        }
    }

    fn down(self) -> Self {
        match self {
            KaraokeLevel::Hero => KaraokeLevel::Theater,
            KaraokeLevel::Theater => KaraokeLevel::Footer,
            KaraokeLevel::Footer | KaraokeLevel::Closed => KaraokeLevel::Closed,
        }
    }
}

/// Karaoke UI state: enablement plus current level
///
/// Invariant: `level > Closed` implies `enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KaraokeState {
    enabled: bool,
    level: KaraokeLevel,
}

impl Default for KaraokeState {
    fn default() -> Self {
        Self {
            enabled: true,
            level: KaraokeLevel::Closed,
        }
    }
}

impl KaraokeState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            level: KaraokeLevel::Closed,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn level(&self) -> KaraokeLevel {
        self.level
    }

    /// Tap to expand one level
    ///
    /// Blocked expansion (karaoke disabled, or no lyrics on the current
    /// track) reinterprets the tap as an enablement toggle.
    pub fn expand(&mut self, has_lyrics: bool) {
        if !self.enabled || !has_lyrics {
            self.enabled = !self.enabled;
            if !self.enabled {
                self.level = KaraokeLevel::Closed;
            }
            tracing::debug!(enabled = self.enabled, "karaoke expand reinterpreted as toggle");
            return;
        }
        self.level = self.level.up();
        tracing::debug!(level = ?self.level, "karaoke level expanded");
    }

    /// Tap or swipe to collapse one level
    pub fn collapse(&mut self) {
        self.level = self.level.down();
        tracing::debug!(level = ?self.level, "karaoke level collapsed");
    }

    /// Close the lyric UI entirely, leaving enablement untouched
    pub fn close(&mut self) {
        self.level = KaraokeLevel::Closed;
    }

    /// Jump to a requested level, subject to the same entry gate as `expand`
    pub fn request_level(&mut self, level: KaraokeLevel, has_lyrics: bool) {
        if level == KaraokeLevel::Closed {
            self.level = KaraokeLevel::Closed;
            return;
        }
        if !self.enabled || !has_lyrics {
            // Same degradation as a blocked tap
            self.enabled = true;
            return;
        }
        self.level = level;
    }
}

/// Deep-link request read once at session start
///
/// The two values arrive as plain optional strings (the host app owns URL
/// parsing); this adapter is consumed by value so it cannot re-trigger on
/// later renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeepLink {
    pub level: Option<KaraokeLevel>,
    pub track_index: Option<usize>,
}

impl DeepLink {
    /// Interpret the `karaoke=<theater|hero>` / `track=<index>` pair
    pub fn from_query(karaoke: Option<&str>, track: Option<&str>) -> Self {
        let level = match karaoke {
            Some("theater") => Some(KaraokeLevel::Theater),
            Some("hero") => Some(KaraokeLevel::Hero),
            Some(other) => {
                tracing::warn!(value = other, "ignoring unknown karaoke deep-link level");
                None
            }
            None => None,
        };
        let track_index = track.and_then(|raw| raw.parse().ok());
        Self { level, track_index }
    }

    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.track_index.is_none()
    }
}
