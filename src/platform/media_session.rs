//! System media-session surface
//!
//! Maps the playback session onto the platform's media-session surface:
//! transport commands arriving from hardware keys or the lock screen are
//! routed into the store, and now-playing metadata is snapshotted from it.
//! The host owns the actual platform binding (MPRIS, SMTC, the browser
//! Media Session API); this module provides the command/metadata types and
//! the routing so every binding behaves identically.

use tokio::sync::mpsc;

use crate::player::PlaybackSession;
use crate::player::TransportState;

/// Transport commands a platform media session can emit
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    /// Absolute seek in seconds
    SeekTo(f64),
}

/// Now-playing metadata published to the platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Event name, shown where players normally show the album
    pub album: Option<String>,
    pub art_url: Option<String>,
    pub duration_s: Option<f64>,
}

/// Playback status as platforms model it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaPlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// Full snapshot pushed to a platform binding after each state change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaSessionState {
    pub status: MediaPlaybackStatus,
    pub metadata: MediaMetadata,
    pub position_s: f64,
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

pub type MediaCommandSender = mpsc::UnboundedSender<MediaCommand>;
pub type MediaCommandReceiver = mpsc::UnboundedReceiver<MediaCommand>;

/// Channel a platform binding pushes commands into
pub fn media_command_channel() -> (MediaCommandSender, MediaCommandReceiver) {
    mpsc::unbounded_channel()
}

/// Route a platform transport command into the session store
pub fn route_command(session: &mut PlaybackSession, command: MediaCommand) {
    tracing::debug!(?command, "media session command");
    match command {
        MediaCommand::Play => session.play(),
        MediaCommand::Pause => session.pause(),
        MediaCommand::PlayPause => session.toggle_play(),
        MediaCommand::Stop => session.close(),
        MediaCommand::Next => session.next(),
        MediaCommand::Previous => session.previous(),
        MediaCommand::SeekTo(position_s) => session.seek(position_s),
    }
}

/// Snapshot the session for the platform's now-playing surface
pub fn session_state(session: &PlaybackSession) -> MediaSessionState {
    // A buffering track only counts as playing if playback is actually
    // requested; a non-autoplay load shows as paused.
    let status = match session.transport() {
        TransportState::Playing => MediaPlaybackStatus::Playing,
        TransportState::Loading if session.is_play_intended() => MediaPlaybackStatus::Playing,
        TransportState::Loading | TransportState::Paused => MediaPlaybackStatus::Paused,
        TransportState::Idle => MediaPlaybackStatus::Stopped,
    };

    let metadata = match session.current_track() {
        Some(track) => MediaMetadata {
            title: Some(track.title.clone()),
            artist: Some(track.artist.clone()),
            album: session
                .playlist()
                .map(|playlist| playlist.event_title.clone()),
            art_url: track
                .thumbnail_url
                .clone()
                .or_else(|| session.playlist().and_then(|p| p.event_image_url.clone())),
            duration_s: (session.duration_s() > 0.0).then(|| session.duration_s()),
        },
        None => MediaMetadata::default(),
    };

    MediaSessionState {
        status,
        metadata,
        position_s: session.current_time_s(),
        can_go_next: session.track_count() > 1,
        can_go_previous: session.track_count() > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Playlist, Track};
    use crate::player::{MediaEvent, NullElement};

    fn session_with_tracks(n: usize) -> PlaybackSession {
        let tracks = (0..n as i64)
            .map(|i| Track {
                id: i + 1,
                file_url: format!("https://cdn.example.com/{}.mp3", i + 1),
                title: format!("Track {}", i + 1),
                artist: "The Locals".into(),
                thumbnail_url: None,
                lyrics_document: None,
                timing_offset_ms: 0,
            })
            .collect();
        let playlist = Playlist {
            event_id: 1,
            event_slug: "open-mic".into(),
            event_title: "Open Mic Night".into(),
            event_image_url: Some("https://cdn.example.com/event.jpg".into()),
            tracks,
        };
        let mut session = PlaybackSession::new(Box::new(NullElement));
        session.load(playlist, 0, false);
        session
    }

    #[test]
    fn test_commands_route_to_store() {
        let mut session = session_with_tracks(3);
        session.on_media_event(MediaEvent::LoadedMetadata { duration_s: 60.0 });
        session.on_media_event(MediaEvent::CanPlay);

        route_command(&mut session, MediaCommand::Next);
        assert_eq!(session.current_index(), 1);

        route_command(&mut session, MediaCommand::SeekTo(10.0));
        session.on_media_event(MediaEvent::LoadedMetadata { duration_s: 60.0 });
        assert_eq!(session.current_time_s(), 10.0);
    }

    #[test]
    fn test_state_snapshot() {
        let mut session = session_with_tracks(2);
        session.on_media_event(MediaEvent::LoadedMetadata { duration_s: 180.0 });
        session.on_media_event(MediaEvent::CanPlay);

        let state = session_state(&session);
        assert_eq!(state.status, MediaPlaybackStatus::Paused);
        assert_eq!(state.metadata.title.as_deref(), Some("Track 1"));
        assert_eq!(state.metadata.album.as_deref(), Some("Open Mic Night"));
        assert_eq!(
            state.metadata.art_url.as_deref(),
            Some("https://cdn.example.com/event.jpg")
        );
        assert_eq!(state.metadata.duration_s, Some(180.0));
        assert!(state.can_go_next);

        session.play();
        let state = session_state(&session);
        assert_eq!(state.status, MediaPlaybackStatus::Playing);
    }

    #[test]
    fn test_loading_status_follows_play_intent() {
        // Non-autoplay load: still buffering, but nothing will play
        let session = session_with_tracks(2);
        assert_eq!(session.transport(), TransportState::Loading);
        assert_eq!(session_state(&session).status, MediaPlaybackStatus::Paused);

        let mut session = session_with_tracks(2);
        session.play();
        assert_eq!(session.transport(), TransportState::Loading);
        assert_eq!(session_state(&session).status, MediaPlaybackStatus::Playing);
    }

    #[test]
    fn test_stopped_snapshot_when_idle() {
        let mut session = session_with_tracks(1);
        session.close();
        let state = session_state(&session);
        assert_eq!(state.status, MediaPlaybackStatus::Stopped);
        // Metadata stays while the queue does
        assert_eq!(state.metadata.title.as_deref(), Some("Track 1"));
    }
}
