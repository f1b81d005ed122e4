//! Timestamped lyric document parser
//!
//! Supports the common [mm:ss.xx]text format with line-level
//! synchronization. Lyric sources are unreliable third-party text, so the
//! parser recovers from malformed lines by skipping them; an empty result
//! means "no lyrics available", never an error.

use super::{LyricLine, ParsedLyrics};

/// Parse a leading timestamp: [mm:ss], [mm:ss.xx], [mm:ss.xxx] or [mm:ss:xx]
///
/// Returns the number of bytes consumed and the time in milliseconds.
fn parse_time(src: &str) -> Option<(usize, u64)> {
    if !src.starts_with('[') {
        return None;
    }

    let end_bracket = src.find(']')?;
    let time_str = &src[1..end_bracket];

    // Skip metadata tags like [ar:Artist], [ti:Title]
    if time_str.contains(':') {
        if let Some(first_char) = time_str.chars().next() {
            if first_char.is_alphabetic() {
                return None;
            }
        }
    }

    let parts: Vec<&str> = time_str.split(|c| c == ':' || c == '.').collect();

    let time_ms = match parts.len() {
        2 => {
            // mm:ss
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            min * 60 * 1000 + sec * 1000
        }
        3 => {
            // mm:ss.xx or mm:ss:xx
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            let frac = parts[2];
            let mut ms: u64 = frac.parse().ok()?;

            // Fraction precision: x (deciseconds), xx (centiseconds), xxx (ms)
            match frac.len() {
                1 => ms *= 100,
                2 => ms *= 10,
                3 => {}
                _ => return None,
            }

            min * 60 * 1000 + sec * 1000 + ms
        }
        _ => return None,
    };

    Some((end_bracket + 1, time_ms))
}

/// Parse one document line, which may carry multiple timestamps
///
/// Each timestamp yields a separate entry sharing the same text. Lines with
/// no valid timestamp are untimed and dropped.
fn parse_line(line: &str) -> Vec<LyricLine> {
    let line = line.trim();
    let mut timestamps = Vec::new();
    let mut pos = 0;

    while pos < line.len() {
        if let Some((consumed, time_ms)) = parse_time(&line[pos..]) {
            timestamps.push(time_ms);
            pos += consumed;
        } else {
            break;
        }
    }

    if timestamps.is_empty() {
        return Vec::new();
    }

    let text = line[pos..].trim();

    timestamps
        .into_iter()
        .map(|time_ms| LyricLine {
            time_ms,
            text: text.to_string(),
        })
        .collect()
}

/// Parse a lyric document into time-ordered lines
///
/// Stable sort: entries with equal timestamps keep document order.
pub fn parse(document: &str) -> ParsedLyrics {
    let lines = document.lines();
    let mut result = Vec::with_capacity(lines.size_hint().1.unwrap_or(128).min(1024));

    for line in lines {
        result.extend(parse_line(line));
    }

    result.sort_by_key(|line| line.time_ms);

    ParsedLyrics::from_lines(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("[00:01.12]"), Some((10, 1120)));
        assert_eq!(parse_time("[00:10.254]"), Some((11, 10254)));
        assert_eq!(parse_time("[01:10.1]"), Some((9, 70100)));
        assert_eq!(parse_time("[00:00.00]"), Some((10, 0)));
        assert_eq!(parse_time("[02:30]"), Some((8, 150000)));
    }

    #[test]
    fn test_parse_time_rejects_metadata_and_garbage() {
        assert_eq!(parse_time("[ar:Some Artist]"), None);
        assert_eq!(parse_time("[ti:Title]"), None);
        assert_eq!(parse_time("no brackets"), None);
        assert_eq!(parse_time("[xx:yy.zz]"), None);
        assert_eq!(parse_time("[00:01.1234]"), None);
    }

    #[test]
    fn test_parse_line_single() {
        let lines = parse_line("[00:01.12] Hello there");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].time_ms, 1120);
        assert_eq!(lines[0].text, "Hello there");
    }

    #[test]
    fn test_parse_line_multiple_timestamps() {
        let lines = parse_line("[00:12.50][01:30.00]Repeated chorus");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].time_ms, 12500);
        assert_eq!(lines[1].time_ms, 90000);
        assert_eq!(lines[0].text, lines[1].text);
    }

    #[test]
    fn test_parse_drops_untimed_and_malformed() {
        let doc = "[ti:Test Song]\nJust some prose\n[00:05.00]Timed line\n[99:xx]broken\n";
        let parsed = parse(doc);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.lines()[0].text, "Timed line");
    }

    #[test]
    fn test_parse_sorted_nondecreasing() {
        let doc = "[00:30.00]Later\n[00:10.00]Earlier\n[00:20.00]Middle";
        let parsed = parse(doc);
        let times: Vec<u64> = parsed.lines().iter().map(|l| l.time_ms).collect();
        assert_eq!(times, vec![10000, 20000, 30000]);
    }

    #[test]
    fn test_parse_tie_keeps_document_order() {
        let doc = "[00:10.00]First in doc\n[00:10.00]Second in doc";
        let parsed = parse(doc);
        assert_eq!(parsed.lines()[0].text, "First in doc");
        assert_eq!(parsed.lines()[1].text, "Second in doc");
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("plain text only\nno timestamps here").is_empty());
    }
}
