pub mod manifest;
pub mod splitter;

pub use manifest::{parse_chapter_file, parse_manifest, ManifestEntry};
pub use splitter::{CommandRunner, M4bSplitter, ProcessRunner};

use std::fmt;

/// A chapter of an audiobook, with timings in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub title: String,
    pub start: f64,
    pub end: f64,
    /// 1-based ordinal used as a file name prefix.
    pub num: Option<usize>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, start: f64, end: f64, num: Option<usize>) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            num,
        }
    }

    /// Build a chapter from millisecond timings, rounded to 3 decimal places.
    pub fn from_milliseconds(
        title: impl Into<String>,
        start_ms: u64,
        end_ms: u64,
        num: Option<usize>,
    ) -> Self {
        Self::new(
            title,
            round_millis(start_ms as f64 / 1000.0),
            round_millis(end_ms as f64 / 1000.0),
            num,
        )
    }

    /// Length of this chapter in seconds. Not validated against `start`.
    pub fn duration(&self) -> f64 {
        round_millis(self.end - self.start)
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Chapter Title=\"{}\", Start={}, End={}, Duration={}>",
            self.title,
            format_clock(self.start),
            format_clock(self.end),
            format_clock(self.duration())
        )
    }
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Render seconds as `H:MM:SS`, with `.ffffff` microseconds when non-zero.
///
/// Negative values (a chapter whose end precedes its start) get a leading `-`
/// on the absolute value, e.g. `-0:00:01.500000`, rather than a day-borrowing form.
fn format_clock(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total_us = (seconds.abs() * 1_000_000.0).round() as u64;

    let micros = total_us % 1_000_000;
    let total_secs = total_us / 1_000_000;
    let (hours, minutes, secs) = (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60);

    if micros == 0 {
        format!("{sign}{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{sign}{hours}:{minutes:02}:{secs:02}.{micros:06}")
    }
}
