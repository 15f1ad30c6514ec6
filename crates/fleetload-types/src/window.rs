//! Extraction windows and upstream timestamp formatting.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::WindowError;

/// Timestamp format expected by the upstream API and the backfill settings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A half-open `[start, end)` time window to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractionWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ExtractionWindow {
    /// Creates a new window, validating that end > start.
    ///
    /// # Errors
    ///
    /// Returns an error if the window would be empty.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if end <= start {
            return Err(WindowError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window of the given length starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is not positive.
    pub fn starting_at(start: DateTime<Utc>, length: TimeDelta) -> Result<Self, WindowError> {
        Self::new(start, start + length)
    }

    /// Parses a window from two `YYYY-MM-DD HH:MM:SS` UTC timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if either timestamp is malformed or the window is empty.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Window start (inclusive).
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Window end (exclusive).
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the window.
    #[must_use]
    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }
}

impl std::fmt::Display for ExtractionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp as UTC.
///
/// # Errors
///
/// Returns an error if the text does not match the format.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, WindowError> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| WindowError::Timestamp(text.to_string()))
}
