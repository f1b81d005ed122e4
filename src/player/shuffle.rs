//! Queue advance resolution
//!
//! Single source of truth for next/previous index calculation. Shuffle
//! never reorders the track array (position indicators stay stable);
//! instead each advance draws a random unplayed index for the current
//! loop, so the just-played track never immediately repeats while other
//! tracks remain unheard.

use std::collections::HashSet;

use rand::Rng;

use crate::settings::RepeatMode;

/// Tracks which queue indices have played in the current shuffle loop
#[derive(Debug, Clone, Default)]
pub struct ShuffleState {
    played: HashSet<usize>,
}

impl ShuffleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a track as played in this loop
    pub fn mark_played(&mut self, index: usize) {
        self.played.insert(index);
    }

    /// Start a fresh loop (queue replaced or shuffle toggled)
    pub fn reset(&mut self) {
        self.played.clear();
    }

    /// Draw the next shuffle index
    ///
    /// Prefers unplayed indices other than `current`; once the loop is
    /// exhausted it resets and falls back to full random (a repeat of the
    /// just-played track is then possible, by design of the loop boundary).
    pub fn draw(&mut self, queue_len: usize, current: usize) -> usize {
        if queue_len <= 1 {
            return 0;
        }

        let mut rng = rand::rng();
        let candidates: Vec<usize> = (0..queue_len)
            .filter(|i| *i != current && !self.played.contains(i))
            .collect();

        if candidates.is_empty() {
            self.reset();
            let drawn = rng.random_range(0..queue_len);
            tracing::debug!(drawn, "shuffle loop exhausted, new loop");
            drawn
        } else {
            candidates[rng.random_range(0..candidates.len())]
        }
    }

    /// Whether every index of the queue has played this loop
    pub fn loop_exhausted(&self, queue_len: usize) -> bool {
        (0..queue_len).all(|i| self.played.contains(&i))
    }
}

/// Next index for a manual `next()` call
///
/// Repeat-one is an end-of-track policy, not a navigation mode: manual
/// navigation under it behaves like repeat-off.
pub fn manual_next(
    queue_len: usize,
    current: usize,
    shuffle: bool,
    repeat: RepeatMode,
    state: &mut ShuffleState,
) -> Option<usize> {
    if queue_len == 0 {
        return None;
    }
    if shuffle {
        return Some(state.draw(queue_len, current));
    }
    let next = current + 1;
    if next < queue_len {
        Some(next)
    } else if repeat == RepeatMode::All {
        Some(0)
    } else {
        None
    }
}

/// Previous index for a manual `previous()` call past the restart window
pub fn manual_previous(
    queue_len: usize,
    current: usize,
    shuffle: bool,
    repeat: RepeatMode,
    state: &mut ShuffleState,
) -> Option<usize> {
    if queue_len == 0 {
        return None;
    }
    if shuffle {
        return Some(state.draw(queue_len, current));
    }
    if current > 0 {
        Some(current - 1)
    } else if repeat == RepeatMode::All {
        Some(queue_len - 1)
    } else {
        None
    }
}

/// Next index when a track reaches its natural end
///
/// `None` means stop: the queue ran off the end and repeat-all is off.
/// Repeat-one is handled by the caller (restart, no advance).
pub fn ended_next(
    queue_len: usize,
    current: usize,
    shuffle: bool,
    repeat: RepeatMode,
    state: &mut ShuffleState,
) -> Option<usize> {
    if queue_len == 0 {
        return None;
    }
    if shuffle {
        // With repeat off, a fully played loop means stop rather than
        // starting another loop.
        if repeat != RepeatMode::All && state.loop_exhausted(queue_len) {
            return None;
        }
        return Some(state.draw(queue_len, current));
    }
    let next = current + 1;
    if next < queue_len {
        Some(next)
    } else if repeat == RepeatMode::All {
        Some(0)
    } else {
        None
    }
}
