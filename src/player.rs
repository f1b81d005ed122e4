//! Playback session module
//!
//! - `PlaybackSession`: the single shared session store (queue, transport,
//!   karaoke, calibration)
//! - `media`: the owned media element abstraction and its event type
//! - `shuffle`: next/previous index resolution
//! - `rodio_backend` (feature `rodio-backend`): a local-file element built
//!   on rodio for native hosts

pub mod media;
mod shuffle;
mod store;

#[cfg(feature = "rodio-backend")]
pub mod rodio_backend;

pub use media::{
    MediaElement, MediaEvent, MediaEventReceiver, MediaEventSender, NullElement,
    media_event_channel,
};
pub use shuffle::ShuffleState;
pub use store::{PlaybackSession, TransportState};
