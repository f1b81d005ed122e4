//! Lyric line resolution against playback time
//!
//! `resolve` is a pure function: it is re-invoked on every time-update tick
//! and must yield identical output for identical input. The user offset is
//! applied here only; it never mutates the parsed lyrics.

use super::ParsedLyrics;

/// One line of the context window around the active line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine<'a> {
    pub index: usize,
    pub text: &'a str,
    pub is_current: bool,
}

/// Resolved lyric state for one playback instant
#[derive(Debug, Clone, PartialEq)]
pub struct LyricFrame<'a> {
    /// Active line, or `None` while before the first line (intro)
    pub line_index: Option<usize>,
    /// Window of lines around the active one, clipped at track bounds
    pub surrounding: Vec<ContextLine<'a>>,
    /// Fraction of the way from the active line to the next (1.0 on the last)
    pub progress: f32,
    pub has_lyrics: bool,
}

impl LyricFrame<'_> {
    /// Text of the active line, if any
    pub fn current_text(&self) -> Option<&str> {
        self.line_index.map(|idx| {
            self.surrounding
                .iter()
                .find(|line| line.index == idx)
                .map(|line| line.text)
                .unwrap_or("")
        })
    }
}

/// Resolve the active lyric line for a playback position
///
/// Offset sign convention: positive `offset_ms` shows lyrics later relative
/// to audio, negative shows them earlier (compensating lyrics perceived as
/// late).
pub fn resolve<'a>(
    parsed: &'a ParsedLyrics,
    playback_time_s: f64,
    offset_ms: i64,
    context_before: usize,
    context_after: usize,
) -> LyricFrame<'a> {
    let lines = parsed.lines();
    if lines.is_empty() {
        return LyricFrame {
            line_index: None,
            surrounding: Vec::new(),
            progress: 0.0,
            has_lyrics: false,
        };
    }

    let effective_ms = playback_time_s * 1000.0 - offset_ms as f64;

    // Greatest index with time <= effective, O(log n) per tick
    let after_count = lines.partition_point(|line| line.time_ms as f64 <= effective_ms);
    let line_index = after_count.checked_sub(1);

    let progress = match line_index {
        None => 0.0,
        Some(idx) => match lines.get(idx + 1) {
            None => 1.0,
            Some(next) => {
                let current_ms = lines[idx].time_ms as f64;
                let span = next.time_ms as f64 - current_ms;
                if span <= 0.0 {
                    1.0
                } else {
                    (((effective_ms - current_ms) / span) as f32).clamp(0.0, 1.0)
                }
            }
        },
    };

    // Window bounds relative to the active line; before the first line the
    // window is the upcoming lines only.
    let window_start = match line_index {
        Some(idx) => idx.saturating_sub(context_before),
        None => 0,
    };
    let window_end = match line_index {
        Some(idx) => (idx + context_after + 1).min(lines.len()),
        None => context_after.min(lines.len()),
    };

    let surrounding = (window_start..window_end)
        .map(|index| ContextLine {
            index,
            text: lines[index].text.as_str(),
            is_current: Some(index) == line_index,
        })
        .collect();

    LyricFrame {
        line_index,
        surrounding,
        progress,
        has_lyrics: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::parser::parse;

    fn sample() -> ParsedLyrics {
        parse("[00:01.00]Hello\n[00:03.50]World")
    }

    #[test]
    fn test_resolve_mid_line() {
        let parsed = sample();
        let frame = resolve(&parsed, 2.0, 0, 1, 1);
        assert_eq!(frame.line_index, Some(0));
        assert_eq!(frame.current_text(), Some("Hello"));
        assert!(frame.has_lyrics);
        // 1.0s into the 2.5s span between 1.0 and 3.5
        assert!((frame.progress - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_before_first_line() {
        let parsed = sample();
        let frame = resolve(&parsed, 0.5, 0, 2, 2);
        assert_eq!(frame.line_index, None);
        assert!(frame.has_lyrics);
        assert_eq!(frame.progress, 0.0);
        // Intro: the window shows only the upcoming lines
        assert_eq!(frame.surrounding.len(), 2);
        assert!(frame.surrounding.iter().all(|line| !line.is_current));
    }

    #[test]
    fn test_resolve_last_line_progress_is_one() {
        let parsed = sample();
        let frame = resolve(&parsed, 10.0, 0, 1, 1);
        assert_eq!(frame.line_index, Some(1));
        assert_eq!(frame.progress, 1.0);
    }

    #[test]
    fn test_resolve_empty_lyrics() {
        let parsed = parse("");
        let frame = resolve(&parsed, 5.0, 0, 3, 3);
        assert!(!frame.has_lyrics);
        assert_eq!(frame.line_index, None);
        assert!(frame.surrounding.is_empty());
    }

    #[test]
    fn test_resolve_is_pure() {
        let parsed = sample();
        let a = resolve(&parsed, 2.345, -80, 2, 3);
        let b = resolve(&parsed, 2.345, -80, 2, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_line_index_monotone_in_time() {
        let parsed = parse("[00:01.00]a\n[00:02.00]b\n[00:04.00]c\n[00:08.00]d");
        let mut last = None;
        for tick in 0..100 {
            let t = tick as f64 * 0.1;
            let idx = resolve(&parsed, t, 0, 0, 0).line_index;
            assert!(idx >= last, "line_index regressed at t={t}");
            last = idx;
        }
    }

    #[test]
    fn test_offset_sign_convention() {
        let parsed = sample();
        // Positive offset shifts effective time backward: never a later line
        for t in [0.0, 1.0, 2.0, 3.5, 5.0] {
            let base = resolve(&parsed, t, 0, 0, 0).line_index;
            let delayed = resolve(&parsed, t, 600, 0, 0).line_index;
            assert!(delayed <= base, "offset +600ms advanced the line at t={t}");
        }
        // Negative offset shows lyrics earlier
        let early = resolve(&parsed, 0.6, -500, 0, 0);
        assert_eq!(early.line_index, Some(0));
    }

    #[test]
    fn test_window_clipped_at_bounds() {
        let parsed = parse("[00:01.00]a\n[00:02.00]b\n[00:03.00]c");
        let frame = resolve(&parsed, 1.5, 0, 5, 5);
        assert_eq!(frame.surrounding.len(), 3);
        let frame = resolve(&parsed, 9.0, 0, 1, 5);
        assert_eq!(frame.line_index, Some(2));
        assert_eq!(frame.surrounding.first().unwrap().index, 1);
    }

    #[test]
    fn test_duplicate_timestamp_progress() {
        let parsed = parse("[00:01.00]same\n[00:01.00]time");
        let frame = resolve(&parsed, 1.0, 0, 1, 1);
        // Zero-width span must not divide by zero
        assert_eq!(frame.progress, 1.0);
    }
}
