//! Track and playlist records
//!
//! A `Playlist` is a read-only snapshot handed to the session at load time
//! by the catalog (an external collaborator). Tracks are immutable once
//! loaded; a changed catalog is reflected by loading a fresh playlist.

use serde::{Deserialize, Serialize};

/// One playable audio item with optional timestamped lyrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable catalog identifier
    pub id: i64,
    /// Raw media URL (also exposed as the download passthrough)
    pub file_url: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Raw timestamped lyric document, if the catalog has one
    #[serde(default)]
    pub lyrics_document: Option<String>,
    /// Persisted default lyric offset for this track, may be negative
    #[serde(default)]
    pub timing_offset_ms: i64,
}

impl Track {
    /// Whether this track carries a non-empty lyric document
    pub fn has_lyrics_document(&self) -> bool {
        self.lyrics_document
            .as_deref()
            .is_some_and(|doc| !doc.trim().is_empty())
    }
}

/// Ordered track queue bound to one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub event_id: i64,
    pub event_slug: String,
    pub event_title: String,
    #[serde(default)]
    pub event_image_url: Option<String>,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}
