//! Fetch cadence definitions.

use chrono::TimeDelta;

/// How often an endpoint is fetched, and how large each window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// Fixed-size windows of the given length.
    Fixed(TimeDelta),
    /// A single window from the last extraction up to now.
    Unbounded,
}

impl Cadence {
    /// Fixed cadence of the given number of minutes.
    #[must_use]
    pub fn minutes(minutes: i64) -> Self {
        Self::Fixed(TimeDelta::minutes(minutes))
    }

    /// Fixed cadence of the given number of hours.
    #[must_use]
    pub fn hours(hours: i64) -> Self {
        Self::Fixed(TimeDelta::hours(hours))
    }

    /// Returns the window length, or None when unbounded.
    #[must_use]
    pub const fn length(&self) -> Option<TimeDelta> {
        match self {
            Self::Fixed(length) => Some(*length),
            Self::Unbounded => None,
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(length) if length.num_seconds() % 3600 == 0 => {
                write!(f, "{}h", length.num_hours())
            }
            Self::Fixed(length) if length.num_seconds() % 60 == 0 => {
                write!(f, "{}m", length.num_minutes())
            }
            Self::Fixed(length) => write!(f, "{}s", length.num_seconds()),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_length() {
        assert_eq!(Cadence::minutes(5).length(), Some(TimeDelta::seconds(300)));
        assert_eq!(Cadence::hours(1).length(), Some(TimeDelta::seconds(3600)));
        assert_eq!(Cadence::Unbounded.length(), None);
    }

    #[test]
    fn test_cadence_display() {
        assert_eq!(Cadence::minutes(5).to_string(), "5m");
        assert_eq!(Cadence::hours(1).to_string(), "1h");
        assert_eq!(Cadence::Fixed(TimeDelta::seconds(90)).to_string(), "90s");
        assert_eq!(Cadence::Unbounded.to_string(), "unbounded");
    }
}
