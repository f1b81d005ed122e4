//! Owned media element abstraction
//!
//! The session store is the single writer of exactly one media element.
//! The element is injected behind this trait so tests can substitute a
//! fake; real backends (a browser audio element bridge, or the rodio
//! backend behind the `rodio-backend` feature) report back through
//! `MediaEvent`s.
//!
//! ```text
//! Store --[MediaElement calls]--> backend
//! Store <--[MediaEvent]---------- backend (via channel or direct dispatch)
//! ```

/// Platform media events, fed into the store's named transitions
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Media metadata became available
    LoadedMetadata { duration_s: f64 },
    /// Enough data buffered to begin playback
    CanPlay,
    /// Playback position advanced
    TimeUpdate { position_s: f64 },
    /// The element started playing
    Play,
    /// The element paused
    Pause,
    /// The current source played to its natural end
    Ended,
    /// Network or decoding failure
    Error { message: String },
    /// A play request was rejected by platform autoplay policy
    AutoplayRejected,
}

/// The one audio element owned by the playback session
///
/// All methods are commands; results arrive asynchronously as
/// `MediaEvent`s. Commands never fail synchronously, matching the platform
/// element they model.
pub trait MediaElement: Send {
    /// Replace the media source; the platform abandons any previous fetch
    fn set_source(&mut self, url: &str);
    /// Request playback (may be rejected asynchronously by autoplay policy)
    fn request_play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position_s: f64);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    /// Release the current source without destroying the element
    fn detach(&mut self);
}

/// Sender for media events (held by the backend)
pub type MediaEventSender = tokio::sync::mpsc::UnboundedSender<MediaEvent>;

/// Receiver for media events (drained by the host app's event loop)
pub type MediaEventReceiver = tokio::sync::mpsc::UnboundedReceiver<MediaEvent>;

/// Create a new media event channel
pub fn media_event_channel() -> (MediaEventSender, MediaEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Media element that drops every command
///
/// Placeholder for hosts that wire a real element in later; the store's
/// state machine still runs, driven by externally injected events.
#[derive(Debug, Default)]
pub struct NullElement;

impl MediaElement for NullElement {
    fn set_source(&mut self, _url: &str) {}
    fn request_play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _position_s: f64) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn set_muted(&mut self, _muted: bool) {}
    fn detach(&mut self) {}
}
