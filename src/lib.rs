//! Encore - synchronized audio playback and karaoke lyrics for event apps
//!
//! One shared playback session per client: an event playlist plays through
//! a single owned media element while timestamped lyrics are resolved
//! against the playback clock and rendered at the user's chosen disclosure
//! level. Hosts inject their media backend behind [`player::MediaElement`]
//! and drive the store with platform events; everything above that line is
//! pure, synchronous state.

pub mod calibration;
pub mod karaoke;
pub mod lyrics;
pub mod model;
pub mod platform;
pub mod player;
pub mod settings;

pub use calibration::{CalibratorRole, OffsetCalibration, SaveOutcome};
pub use karaoke::{DeepLink, KaraokeLevel, KaraokeState};
pub use lyrics::{LyricFrame, ParsedLyrics};
pub use model::{Playlist, Track};
pub use player::{MediaElement, MediaEvent, PlaybackSession, TransportState};
pub use settings::{Preferences, RepeatMode};

use std::sync::Arc;

use anyhow::Context;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

/// The process-wide playback session
///
/// The engine's core rule is one session per client; hosts that want the
/// same guarantee process-wide initialize it here once and share the handle
/// across their UI and media-session glue.
static SESSION: OnceCell<Arc<Mutex<PlaybackSession>>> = OnceCell::new();

/// Initialize (or fetch) the shared session
///
/// The element is consumed only on first call; persisted preferences are
/// applied at creation, falling back to defaults when the settings file is
/// missing or unreadable.
pub fn init_session(element: Box<dyn MediaElement>) -> Arc<Mutex<PlaybackSession>> {
    SESSION
        .get_or_init(|| {
            let prefs = Preferences::load();
            Arc::new(Mutex::new(PlaybackSession::with_preferences(
                element, &prefs,
            )))
        })
        .clone()
}

/// The shared session, if one has been initialized
pub fn session() -> Option<Arc<Mutex<PlaybackSession>>> {
    SESSION.get().cloned()
}

/// Persist the session's current transport preferences
pub fn save_preferences(session: &PlaybackSession) -> anyhow::Result<()> {
    session
        .preferences()
        .save()
        .context("failed to save playback preferences")
}
