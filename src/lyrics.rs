//! Karaoke lyric track: parsing, caching and playback-time resolution
//!
//! - `parser`: timestamped lyric documents -> `ParsedLyrics`
//! - `sync`: pure resolution of the active line for a playback instant
//! - `LyricsCache`: one parse per track, invalidated when the raw
//!   document changes

pub mod parser;
pub mod sync;

pub use sync::{ContextLine, LyricFrame, resolve};

use xxhash_rust::xxh3::xxh3_64;

/// One timed lyric line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub time_ms: u64,
    pub text: String,
}

impl LyricLine {
    pub fn time_s(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// Time-ordered lyric lines derived from a raw document
///
/// Guaranteed non-decreasing by `time_ms`; equal timestamps keep document
/// order. Empty means "no lyrics available", not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLyrics {
    lines: Vec<LyricLine>,
}

impl ParsedLyrics {
    pub(crate) fn from_lines(lines: Vec<LyricLine>) -> Self {
        debug_assert!(lines.windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
        Self { lines }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Per-track parse cache
///
/// Keyed by track id plus an xxh3 fingerprint of the raw document, so a
/// re-load of the same track reuses the parse and a changed document
/// invalidates it.
#[derive(Debug, Default)]
pub struct LyricsCache {
    track_id: Option<i64>,
    fingerprint: u64,
    parsed: ParsedLyrics,
}

impl LyricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed lyrics for a track, parsing only on id or document change
    pub fn get_or_parse(&mut self, track_id: i64, document: Option<&str>) -> &ParsedLyrics {
        let fingerprint = document.map(|doc| xxh3_64(doc.as_bytes())).unwrap_or(0);

        if self.track_id != Some(track_id) || self.fingerprint != fingerprint {
            self.parsed = match document {
                Some(doc) => parser::parse(doc),
                None => ParsedLyrics::default(),
            };
            self.track_id = Some(track_id);
            self.fingerprint = fingerprint;
            tracing::debug!(
                track_id,
                lines = self.parsed.len(),
                "parsed lyric document"
            );
        }

        &self.parsed
    }

    /// Drop the cached parse (e.g. when the queue is replaced)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
