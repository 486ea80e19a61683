//! Per-frame timing parser for Blender render output.
//!
//! While a frame renders, Blender prefixes every progress line with
//! `Fra:<n>`. When the frame is written it prints a save-completion line of
//! the form `Time: MM:SS.SS (Saving: MM:SS.SS)`. The parser tracks the
//! current frame from the `Fra:` prefix and emits one `FrameTiming` per
//! completion line; everything else is ignored. Parsing is a pure function
//! of the stream, so replaying identical output yields identical records.

/// A completed frame and how long it took, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub frame: i32,
    pub seconds: f64,
}


// ---------------------------------------------------------------------------
// TimingParser
// ---------------------------------------------------------------------------

/// Stream parser for one task's output. One parser per device stream.
#[derive(Debug, Default)]
pub struct TimingParser {
    /// Frame currently rendering, from the last `Fra:` prefix seen.
    current_frame: Option<i32>,
}

impl TimingParser {
    pub fn new() -> Self {
        TimingParser {
            current_frame: None,
        }
    }

    /// Feed one output line. Returns a timing record when the line reports a
    /// completed frame.
    pub fn feed(&mut self, line: &str) -> Option<FrameTiming> {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("Fra:") {
            self.current_frame = parse_leading_int(rest);
            return None;
        }

        // Save-completion line: `Time: MM:SS.SS (Saving: MM:SS.SS)`. The
        // mid-render progress lines also carry a Time: field but are handled
        // above by their Fra: prefix.
        if let Some(rest) = trimmed.strip_prefix("Time:") {
            if !trimmed.contains("(Saving:") {
                return None;
            }
            let stamp = rest.split('(').next().unwrap_or("").trim();
            let seconds = parse_timestamp(stamp)?;
            // take() so a duplicate completion line cannot double-count.
            let frame = self.current_frame.take()?;
            return Some(FrameTiming { frame, seconds });
        }

        None
    }
}


// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse `MM:SS.SS` (or `HH:MM:SS.SS` for frames past the hour) into
/// floating-point seconds.
pub fn parse_timestamp(stamp: &str) -> Option<f64> {
    let parts: Vec<&str> = stamp.split(':').collect();
    match parts.len() {
        2 => {
            let minutes: f64 = parts[0].trim().parse().ok()?;
            let seconds: f64 = parts[1].trim().parse().ok()?;
            Some(minutes * 60.0 + seconds)
        }
        3 => {
            let hours: f64 = parts[0].trim().parse().ok()?;
            let minutes: f64 = parts[1].trim().parse().ok()?;
            let seconds: f64 = parts[2].trim().parse().ok()?;
            Some(hours * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => None,
    }
}

/// Parse the leading (possibly negative) integer of a string slice.
fn parse_leading_int(s: &str) -> Option<i32> {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit() || (i == 0 && c == '-') {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    s[..end].parse().ok()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_STREAM: &[&str] = &[
        "Blender 3.6.0 (hash abcdef built 2023-06-27)",
        "Read blend: /work/scene.blend",
        "Fra:1 Mem:8.01M (Peak 8.01M) | Time:00:00.32 | Syncing Cube",
        "Fra:1 Mem:22.29M (Peak 22.29M) | Time:00:01.88 | Rendered 12/35 Tiles",
        "Saved: '/work/output/render_0001.png'",
        " Time: 00:02.55 (Saving: 00:00.11)",
        "Fra:2 Mem:8.01M (Peak 22.29M) | Time:00:00.30 | Syncing Cube",
        "Saved: '/work/output/render_0002.png'",
        " Time: 00:03.10 (Saving: 00:00.09)",
    ];

    fn parse_all(lines: &[&str]) -> Vec<FrameTiming> {
        let mut parser = TimingParser::new();
        lines.iter().filter_map(|l| parser.feed(l)).collect()
    }

    // -- parse_timestamp --

    #[test]
    fn timestamp_minutes_seconds() {
        assert_eq!(parse_timestamp("00:02.55"), Some(2.55));
        assert_eq!(parse_timestamp("01:30.00"), Some(90.0));
        assert_eq!(parse_timestamp("12:05.50"), Some(725.5));
    }

    #[test]
    fn timestamp_with_hours() {
        assert_eq!(parse_timestamp("01:00:00.00"), Some(3600.0));
        assert_eq!(parse_timestamp("02:15:30.50"), Some(8130.5));
    }

    #[test]
    fn timestamp_garbage_rejected() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp("1:2:3:4"), None);
        assert_eq!(parse_timestamp("xx:yy.zz"), None);
    }

    // -- feed --

    #[test]
    fn parses_completed_frames_from_stream() {
        let timings = parse_all(SAMPLE_STREAM);
        assert_eq!(
            timings,
            vec![
                FrameTiming { frame: 1, seconds: 2.55 },
                FrameTiming { frame: 2, seconds: 3.10 },
            ]
        );
    }

    #[test]
    fn mid_render_time_fields_are_ignored() {
        let mut parser = TimingParser::new();
        assert_eq!(
            parser.feed("Fra:7 Mem:22.29M | Time:00:01.88 | Rendered 12/35 Tiles"),
            None
        );
    }

    #[test]
    fn completion_without_frame_context_is_dropped() {
        let mut parser = TimingParser::new();
        assert_eq!(parser.feed(" Time: 00:02.55 (Saving: 00:00.11)"), None);
    }

    #[test]
    fn duplicate_completion_line_does_not_double_count() {
        let mut parser = TimingParser::new();
        parser.feed("Fra:3 Mem:8M | Time:00:00.30 | Syncing");
        let first = parser.feed(" Time: 00:04.00 (Saving: 00:00.10)");
        let second = parser.feed(" Time: 00:04.00 (Saving: 00:00.10)");
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn negative_frame_numbers_parse() {
        let mut parser = TimingParser::new();
        parser.feed("Fra:-5 Mem:8M | Time:00:00.30 | Syncing");
        let timing = parser.feed(" Time: 00:01.00 (Saving: 00:00.01)").unwrap();
        assert_eq!(timing.frame, -5);
    }

    #[test]
    fn unrelated_lines_ignored() {
        let mut parser = TimingParser::new();
        assert_eq!(parser.feed("Blender quit"), None);
        assert_eq!(parser.feed(""), None);
        assert_eq!(parser.feed("Saved: '/work/output/render_0001.png'"), None);
    }

    #[test]
    fn replay_yields_identical_records() {
        let first = parse_all(SAMPLE_STREAM);
        let second = parse_all(SAMPLE_STREAM);
        assert_eq!(first, second);
    }
}
