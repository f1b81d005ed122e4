//! Playback session store
//!
//! The single source of truth for the shared playback session: queue,
//! transport state, volume, shuffle/repeat, karaoke disclosure and the one
//! owned media element. All mutations are synchronous, sequential state
//! transitions; platform media events enter through the named `on_*`
//! methods and no operation fails by exception across the store boundary.

use crate::calibration::OffsetCalibration;
use crate::karaoke::{DeepLink, KaraokeState};
use crate::lyrics::{LyricFrame, LyricsCache, resolve};
use crate::model::{Playlist, Track};
use crate::settings::{Preferences, RepeatMode};

use super::media::{MediaElement, MediaEvent};
use super::shuffle::{self, ShuffleState};

/// Pressing previous within this window moves to the prior track;
/// after it, previous restarts the current track.
const PREVIOUS_RESTART_THRESHOLD_S: f64 = 3.0;

/// Transport state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No active source (initial, closed, stopped at queue end, or errored)
    #[default]
    Idle,
    /// Source set, waiting for the element to become playable
    Loading,
    Playing,
    Paused,
}

/// The shared playback session
///
/// Created once per client session and kept across navigations; playlists
/// are replaced wholesale by `load`.
pub struct PlaybackSession {
    element: Box<dyn MediaElement>,

    playlist: Option<Playlist>,
    current_index: usize,
    transport: TransportState,
    current_time_s: f64,
    duration_s: f64,

    volume: f32,
    muted: bool,
    volume_before_mute: Option<f32>,

    shuffle: bool,
    repeat_mode: RepeatMode,
    shuffle_state: ShuffleState,

    karaoke: KaraokeState,
    lyrics_cache: LyricsCache,
    calibration: OffsetCalibration,

    /// Play intent consumed exactly once per track load; a pause issued
    /// while loading clears it so a stale autoplay never wins the race.
    pending_autoplay: bool,
    /// Seek requested while the media was not yet seekable
    pending_seek_s: Option<f64>,
    /// Play request rejected by platform autoplay policy; cleared by the
    /// next user-gesture play
    autoplay_blocked: bool,
    /// Last media failure, surfaced as renderable state
    error: Option<String>,
    /// Bumped per load so stale async completions can be recognized
    load_generation: u64,
}

impl PlaybackSession {
    pub fn new(element: Box<dyn MediaElement>) -> Self {
        Self {
            element,
            playlist: None,
            current_index: 0,
            transport: TransportState::Idle,
            current_time_s: 0.0,
            duration_s: 0.0,
            volume: 1.0,
            muted: false,
            volume_before_mute: None,
            shuffle: false,
            repeat_mode: RepeatMode::None,
            shuffle_state: ShuffleState::new(),
            karaoke: KaraokeState::default(),
            lyrics_cache: LyricsCache::new(),
            calibration: OffsetCalibration::new(),
            pending_autoplay: false,
            pending_seek_s: None,
            autoplay_blocked: false,
            error: None,
            load_generation: 0,
        }
    }

    pub fn with_preferences(element: Box<dyn MediaElement>, prefs: &Preferences) -> Self {
        let mut session = Self::new(element);
        session.apply_preferences(prefs);
        session
    }

    // ============ Queue loading ============

    /// Replace the queue with a new playlist
    ///
    /// User transport preferences (shuffle, repeat, volume, mute) persist
    /// across playlists; queue and lyric state do not. A `load` while a
    /// previous one is still settling simply preempts it: the element's
    /// source changes and stale events are ignored by state guards.
    pub fn load(&mut self, playlist: Playlist, start_index: usize, autoplay: bool) {
        self.load_generation += 1;
        tracing::info!(
            event = %playlist.event_slug,
            tracks = playlist.len(),
            start_index,
            autoplay,
            "loading playlist"
        );

        self.lyrics_cache.clear();
        self.shuffle_state.reset();
        self.karaoke.close();
        self.autoplay_blocked = false;
        self.error = None;
        self.pending_autoplay = false;
        self.pending_seek_s = None;
        self.current_time_s = 0.0;
        self.duration_s = 0.0;

        if playlist.is_empty() {
            self.playlist = Some(playlist);
            self.current_index = 0;
            self.transport = TransportState::Idle;
            self.element.detach();
            return;
        }

        let start = start_index.min(playlist.len() - 1);
        self.playlist = Some(playlist);
        self.begin_track(start, autoplay);
    }

    /// Point the element at a queue index and optionally request playback
    fn begin_track(&mut self, index: usize, autoplay: bool) {
        let Some(track) = self
            .playlist
            .as_ref()
            .and_then(|p| p.tracks.get(index))
        else {
            return;
        };

        tracing::info!(
            track_id = track.id,
            title = %track.title,
            autoplay,
            "switching to track"
        );

        let (id, offset, url) = (track.id, track.timing_offset_ms, track.file_url.clone());
        self.current_index = index;
        // Same-track restarts (repeat-one) keep the session offset; only a
        // different track resets the calibration baseline.
        if self.calibration.track_id() != Some(id) {
            self.calibration.begin_track(id, offset);
        }
        self.shuffle_state.mark_played(index);

        self.current_time_s = 0.0;
        self.duration_s = 0.0;
        self.pending_seek_s = None;
        self.pending_autoplay = autoplay;
        self.autoplay_blocked = false;
        self.error = None;
        self.transport = TransportState::Loading;
        self.element.set_source(&url);
    }

    // ============ Transport operations ============

    /// Request playback (a user gesture clears an autoplay block)
    pub fn play(&mut self) {
        self.autoplay_blocked = false;
        match self.transport {
            TransportState::Playing => {}
            TransportState::Loading => {
                self.pending_autoplay = true;
            }
            TransportState::Paused => {
                self.element.request_play();
                self.transport = TransportState::Playing;
            }
            TransportState::Idle => {
                if self.track_count() > 0 {
                    self.begin_track(self.current_index, true);
                }
            }
        }
    }

    pub fn pause(&mut self) {
        match self.transport {
            TransportState::Loading => {
                // Honor a pause issued during buffering over the stale
                // autoplay intent.
                self.pending_autoplay = false;
            }
            TransportState::Playing => {
                self.element.pause();
                self.transport = TransportState::Paused;
            }
            TransportState::Paused | TransportState::Idle => {}
        }
    }

    pub fn toggle_play(&mut self) {
        if self.is_play_intended() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Whether playback is active or requested
    pub fn is_play_intended(&self) -> bool {
        match self.transport {
            TransportState::Playing => true,
            TransportState::Loading => self.pending_autoplay,
            _ => false,
        }
    }

    /// Advance to the next track per shuffle/repeat resolution
    pub fn next(&mut self) {
        let len = self.track_count();
        if len == 0 {
            return;
        }
        let keep_playing = self.is_play_intended();
        match shuffle::manual_next(
            len,
            self.current_index,
            self.shuffle,
            self.repeat_mode,
            &mut self.shuffle_state,
        ) {
            Some(index) => self.begin_track(index, keep_playing),
            None => self.stop_at_queue_end(),
        }
    }

    /// Go to the prior track, or restart the current one
    ///
    /// Standard previous UX: within the first seconds of a track the call
    /// moves backward in the queue; later it restarts the track.
    pub fn previous(&mut self) {
        let len = self.track_count();
        if len == 0 {
            return;
        }
        if self.current_time_s > PREVIOUS_RESTART_THRESHOLD_S {
            self.seek(0.0);
            return;
        }
        let keep_playing = self.is_play_intended();
        match shuffle::manual_previous(
            len,
            self.current_index,
            self.shuffle,
            self.repeat_mode,
            &mut self.shuffle_state,
        ) {
            Some(index) => self.begin_track(index, keep_playing),
            None => self.seek(0.0),
        }
    }

    /// Seek, clamped to the track bounds
    ///
    /// Safe while loading: the request is parked and applied once the
    /// media reports its metadata.
    pub fn seek(&mut self, time_s: f64) {
        if self.playlist.is_none() {
            return;
        }
        let clamped = if self.duration_s > 0.0 {
            time_s.clamp(0.0, self.duration_s)
        } else {
            time_s.max(0.0)
        };

        if self.transport == TransportState::Loading || self.duration_s <= 0.0 {
            self.pending_seek_s = Some(clamped);
            return;
        }
        self.current_time_s = clamped;
        self.element.seek(clamped);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        self.element.set_volume(volume);
    }

    /// Toggle mute, preserving the last non-zero volume for restoration
    pub fn toggle_mute(&mut self) {
        if !self.muted {
            if self.volume > 0.0 {
                self.volume_before_mute = Some(self.volume);
            }
            self.muted = true;
            self.element.set_muted(true);
        } else {
            self.muted = false;
            self.element.set_muted(false);
            if self.volume <= 0.0 {
                if let Some(restored) = self.volume_before_mute.take() {
                    self.set_volume(restored);
                }
            }
        }
    }

    /// Toggle shuffle; takes effect on the next advance, never reorders
    /// the already-playing queue
    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        self.shuffle_state.reset();
        if self.shuffle && self.track_count() > 0 {
            self.shuffle_state.mark_played(self.current_index);
        }
        tracing::info!(shuffle = self.shuffle, "shuffle toggled");
    }

    /// Cycle repeat mode `none -> all -> one -> none`
    pub fn cycle_repeat(&mut self) {
        self.repeat_mode = self.repeat_mode.cycle();
        tracing::info!(mode = %self.repeat_mode, "repeat mode changed");
    }

    /// Stop playback and detach the element, keeping the queue until the
    /// next `load`
    pub fn close(&mut self) {
        self.element.pause();
        self.element.detach();
        self.transport = TransportState::Idle;
        self.pending_autoplay = false;
        self.pending_seek_s = None;
        self.current_time_s = 0.0;
        self.duration_s = 0.0;
        tracing::info!("playback session closed");
    }

    fn stop_at_queue_end(&mut self) {
        self.element.pause();
        self.transport = TransportState::Idle;
        self.pending_autoplay = false;
        tracing::info!(index = self.current_index, "queue finished");
    }

    // ============ Media event transitions ============

    /// Dispatch a platform media event to its named transition
    pub fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::LoadedMetadata { duration_s } => self.on_loaded_metadata(duration_s),
            MediaEvent::CanPlay => self.on_canplay(),
            MediaEvent::TimeUpdate { position_s } => self.on_time_update(position_s),
            MediaEvent::Play => self.on_play(),
            MediaEvent::Pause => self.on_pause(),
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Error { message } => self.on_error(message),
            MediaEvent::AutoplayRejected => self.on_autoplay_rejected(),
        }
    }

    pub fn on_loaded_metadata(&mut self, duration_s: f64) {
        if self.transport == TransportState::Idle {
            return;
        }
        self.duration_s = duration_s.max(0.0);
        if let Some(target) = self.pending_seek_s.take() {
            let clamped = if self.duration_s > 0.0 {
                target.clamp(0.0, self.duration_s)
            } else {
                target.max(0.0)
            };
            self.current_time_s = clamped;
            self.element.seek(clamped);
        }
    }

    pub fn on_canplay(&mut self) {
        if self.transport != TransportState::Loading {
            return;
        }
        if self.pending_autoplay {
            // Consume the intent exactly once
            self.pending_autoplay = false;
            self.element.request_play();
            self.transport = TransportState::Playing;
        } else {
            self.transport = TransportState::Paused;
        }
    }

    pub fn on_time_update(&mut self, position_s: f64) {
        self.current_time_s = if self.duration_s > 0.0 {
            position_s.clamp(0.0, self.duration_s)
        } else {
            position_s.max(0.0)
        };
    }

    pub fn on_play(&mut self) {
        if self.transport == TransportState::Paused {
            self.transport = TransportState::Playing;
        }
        self.autoplay_blocked = false;
    }

    pub fn on_pause(&mut self) {
        if self.transport == TransportState::Playing {
            self.transport = TransportState::Paused;
        }
    }

    /// Natural end of the current source
    pub fn on_ended(&mut self) {
        let len = self.track_count();
        if len == 0 {
            self.transport = TransportState::Idle;
            return;
        }

        if self.repeat_mode == RepeatMode::One {
            // Rebuild the source rather than seeking: a backend whose sink
            // drained at the natural end has nothing left to seek in.
            self.begin_track(self.current_index, true);
            return;
        }

        match shuffle::ended_next(
            len,
            self.current_index,
            self.shuffle,
            self.repeat_mode,
            &mut self.shuffle_state,
        ) {
            Some(index) => self.begin_track(index, true),
            None => self.stop_at_queue_end(),
        }
    }

    /// Media load/decode failure: halt transport, keep the queue so the
    /// listener can retry or skip
    pub fn on_error(&mut self, message: String) {
        tracing::error!(error = %message, "media playback error");
        self.error = Some(message);
        self.transport = TransportState::Idle;
        self.pending_autoplay = false;
        self.pending_seek_s = None;
    }

    /// Autoplay-policy rejection: a distinct state, not a normal pause
    pub fn on_autoplay_rejected(&mut self) {
        tracing::warn!("play request rejected by autoplay policy");
        self.autoplay_blocked = true;
        self.pending_autoplay = false;
        self.transport = TransportState::Paused;
    }

    // ============ Karaoke & lyrics ============

    pub fn karaoke(&self) -> &KaraokeState {
        &self.karaoke
    }

    /// Tap to expand the lyric UI one level
    pub fn karaoke_expand(&mut self) {
        let has_lyrics = self.current_track_has_lyrics();
        self.karaoke.expand(has_lyrics);
    }

    pub fn karaoke_collapse(&mut self) {
        self.karaoke.collapse();
    }

    /// Apply a deep-link request once, after the initial `load`
    ///
    /// Consumed by value: subsequent renders have nothing left to re-apply.
    pub fn apply_deep_link(&mut self, link: DeepLink) {
        if let Some(index) = link.track_index {
            if self.track_count() > 0 {
                let clamped = index.min(self.track_count() - 1);
                if clamped != self.current_index {
                    // Deep links never autoplay; that needs a user gesture.
                    self.begin_track(clamped, false);
                }
            }
        }
        if let Some(level) = link.level {
            let has_lyrics = self.current_track_has_lyrics();
            self.karaoke.request_level(level, has_lyrics);
        }
    }

    /// Whether the current track has a non-empty parsed lyric track
    pub fn current_track_has_lyrics(&mut self) -> bool {
        let Some(track) = self
            .playlist
            .as_ref()
            .and_then(|p| p.tracks.get(self.current_index))
        else {
            return false;
        };
        !self
            .lyrics_cache
            .get_or_parse(track.id, track.lyrics_document.as_deref())
            .is_empty()
    }

    /// Resolve the lyric frame for the current playback instant
    pub fn lyric_frame(&mut self, context_before: usize, context_after: usize) -> LyricFrame<'_> {
        let time = self.current_time_s;
        let offset = self.calibration.offset_ms();
        let Some(track) = self
            .playlist
            .as_ref()
            .and_then(|p| p.tracks.get(self.current_index))
        else {
            return LyricFrame {
                line_index: None,
                surrounding: Vec::new(),
                progress: 0.0,
                has_lyrics: false,
            };
        };
        let parsed = self
            .lyrics_cache
            .get_or_parse(track.id, track.lyrics_document.as_deref());
        resolve(parsed, time, offset, context_before, context_after)
    }

    pub fn calibration(&self) -> &OffsetCalibration {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut OffsetCalibration {
        &mut self.calibration
    }

    /// Session lyric offset in milliseconds
    pub fn lyrics_offset_ms(&self) -> i64 {
        self.calibration.offset_ms()
    }

    // ============ Preferences ============

    pub fn apply_preferences(&mut self, prefs: &Preferences) {
        self.set_volume(prefs.volume);
        if prefs.muted != self.muted {
            self.toggle_mute();
        }
        self.shuffle = prefs.shuffle;
        self.repeat_mode = prefs.repeat_mode;
        self.karaoke = KaraokeState::new(prefs.karaoke_enabled);
    }

    /// Snapshot of the persistable transport preferences
    pub fn preferences(&self) -> Preferences {
        Preferences {
            volume: self.volume,
            muted: self.muted,
            shuffle: self.shuffle,
            repeat_mode: self.repeat_mode,
            karaoke_enabled: self.karaoke.enabled(),
        }
    }

    // ============ Accessors ============

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn playlist(&self) -> Option<&Playlist> {
        self.playlist.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn track_count(&self) -> usize {
        self.playlist.as_ref().map(|p| p.len()).unwrap_or(0)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.playlist
            .as_ref()
            .and_then(|p| p.tracks.get(self.current_index))
    }

    /// Raw media URL of the current track (download passthrough)
    pub fn download_url(&self) -> Option<&str> {
        self.current_track().map(|t| t.file_url.as_str())
    }

    pub fn current_time_s(&self) -> f64 {
        self.current_time_s
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn autoplay_blocked(&self) -> bool {
        self.autoplay_blocked
    }

    /// Last media failure, if any ("can't play this track")
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }
}
