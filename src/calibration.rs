//! Per-track lyric offset calibration
//!
//! Adjustments are session-local until an authorized user persists them.
//! Persistence is modeled as a request/completion pair so a save that
//! completes after a track change is discarded instead of being applied to
//! the wrong track.

/// Discrete adjustment step applied per calibration tap
pub const OFFSET_STEP_MS: i64 = 50;

/// Caller role for the privileged persist operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibratorRole {
    /// Regular listener: adjustments stay session-local
    Listener,
    /// Event organizer: may persist a new default offset
    Organizer,
}

/// Error reported by the offset persistence endpoint
#[derive(Debug, Clone)]
pub struct OffsetSaveError(pub String);

impl std::fmt::Display for OffsetSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "offset save failed: {}", self.0)
    }
}

impl std::error::Error for OffsetSaveError {}

/// External persistence endpoint for per-track default offsets
///
/// Success/failure is binary; the engine never retries (spec'd by the
/// calibration UI surfacing "unsaved" locally).
pub trait OffsetStore {
    fn save_offset(&mut self, track_id: i64, offset_ms: i64) -> Result<(), OffsetSaveError>;
}

/// An in-flight save, carrying enough context to detect staleness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub track_id: i64,
    pub offset_ms: i64,
}

/// Outcome of a persist attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NotAuthorized,
    Failed,
    /// Completed after the track changed; result discarded
    Stale,
}

/// Session-local offset state for the current track
#[derive(Debug, Clone, Default)]
pub struct OffsetCalibration {
    track_id: Option<i64>,
    offset_ms: i64,
    last_saved_ms: i64,
}

impl OffsetCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a new track's persisted default
    ///
    /// Any unsaved adjustment from the previous track is discarded; the new
    /// track's saved offset becomes the baseline.
    pub fn begin_track(&mut self, track_id: i64, saved_offset_ms: i64) {
        self.track_id = Some(track_id);
        self.offset_ms = saved_offset_ms;
        self.last_saved_ms = saved_offset_ms;
    }

    pub fn track_id(&self) -> Option<i64> {
        self.track_id
    }

    /// Current in-session offset in milliseconds
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    /// Whether the session offset diverges from the saved default
    pub fn is_dirty(&self) -> bool {
        self.offset_ms != self.last_saved_ms
    }

    /// Nudge the offset by whole steps (negative = lyrics earlier)
    pub fn adjust(&mut self, steps: i64) {
        self.offset_ms += steps * OFFSET_STEP_MS;
        tracing::debug!(offset_ms = self.offset_ms, "lyric offset adjusted");
    }

    /// Override the offset directly (slider input)
    pub fn set_offset_ms(&mut self, offset_ms: i64) {
        self.offset_ms = offset_ms;
    }

    /// Stage a persist of the current offset
    ///
    /// Returns `None` when the caller is not authorized or no track is
    /// current; unauthorized adjustments are never persisted.
    pub fn begin_save(&self, role: CalibratorRole) -> Option<SaveRequest> {
        if role != CalibratorRole::Organizer {
            return None;
        }
        let track_id = self.track_id?;
        Some(SaveRequest {
            track_id,
            offset_ms: self.offset_ms,
        })
    }

    /// Apply a completed save, discarding results for a stale track
    pub fn complete_save(
        &mut self,
        request: &SaveRequest,
        result: Result<(), OffsetSaveError>,
    ) -> SaveOutcome {
        if self.track_id != Some(request.track_id) {
            tracing::debug!(
                track_id = request.track_id,
                "discarding offset save that completed after a track change"
            );
            return SaveOutcome::Stale;
        }
        match result {
            Ok(()) => {
                self.last_saved_ms = request.offset_ms;
                tracing::info!(
                    track_id = request.track_id,
                    offset_ms = request.offset_ms,
                    "lyric offset saved"
                );
                SaveOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(track_id = request.track_id, error = %e, "offset save failed");
                SaveOutcome::Failed
            }
        }
    }

    /// Synchronous persist helper for in-process stores
    pub fn persist(&mut self, store: &mut dyn OffsetStore, role: CalibratorRole) -> SaveOutcome {
        let Some(request) = self.begin_save(role) else {
            return SaveOutcome::NotAuthorized;
        };
        let result = store.save_offset(request.track_id, request.offset_ms);
        self.complete_save(&request, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        saved: HashMap<i64, i64>,
        fail: bool,
    }

    impl OffsetStore for MemoryStore {
        fn save_offset(&mut self, track_id: i64, offset_ms: i64) -> Result<(), OffsetSaveError> {
            if self.fail {
                return Err(OffsetSaveError("backend unavailable".into()));
            }
            self.saved.insert(track_id, offset_ms);
            Ok(())
        }
    }

    #[test]
    fn test_adjust_steps() {
        let mut cal = OffsetCalibration::new();
        cal.begin_track(1, -100);
        cal.adjust(2);
        assert_eq!(cal.offset_ms(), 0);
        cal.adjust(-3);
        assert_eq!(cal.offset_ms(), -150);
        assert!(cal.is_dirty());
    }

    #[test]
    fn test_track_change_discards_unsaved_adjustment() {
        let mut cal = OffsetCalibration::new();
        cal.begin_track(1, 0);
        cal.adjust(4);
        cal.begin_track(2, 80);
        assert_eq!(cal.offset_ms(), 80);
        assert!(!cal.is_dirty());
    }

    #[test]
    fn test_unauthorized_save_is_refused() {
        let mut cal = OffsetCalibration::new();
        cal.begin_track(1, 0);
        cal.adjust(1);
        let mut store = MemoryStore::default();
        let outcome = cal.persist(&mut store, CalibratorRole::Listener);
        assert_eq!(outcome, SaveOutcome::NotAuthorized);
        assert!(store.saved.is_empty());
        assert!(cal.is_dirty());
    }

    #[test]
    fn test_authorized_save_updates_baseline() {
        let mut cal = OffsetCalibration::new();
        cal.begin_track(1, 0);
        cal.adjust(2);
        let mut store = MemoryStore::default();
        let outcome = cal.persist(&mut store, CalibratorRole::Organizer);
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(store.saved.get(&1), Some(&100));
        assert!(!cal.is_dirty());
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let mut cal = OffsetCalibration::new();
        cal.begin_track(1, 0);
        cal.adjust(1);
        let mut store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let outcome = cal.persist(&mut store, CalibratorRole::Organizer);
        assert_eq!(outcome, SaveOutcome::Failed);
        assert!(cal.is_dirty());
    }

    #[test]
    fn test_late_save_for_previous_track_is_discarded() {
        let mut cal = OffsetCalibration::new();
        cal.begin_track(1, 0);
        cal.adjust(1);
        let request = cal.begin_save(CalibratorRole::Organizer).unwrap();

        // Track changes while the save round-trip is in flight
        cal.begin_track(2, 30);
        let outcome = cal.complete_save(&request, Ok(()));
        assert_eq!(outcome, SaveOutcome::Stale);
        assert_eq!(cal.offset_ms(), 30);
        assert!(!cal.is_dirty());
    }
}
