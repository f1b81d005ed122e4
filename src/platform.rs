//! Platform integration
//!
//! - `media_session`: system media-session surface (lock screen /
//!   notification transport controls and now-playing metadata)

pub mod media_session;

pub use media_session::{
    MediaCommand, MediaCommandReceiver, MediaCommandSender, MediaMetadata, MediaPlaybackStatus,
    MediaSessionState, media_command_channel, route_command, session_state,
};
