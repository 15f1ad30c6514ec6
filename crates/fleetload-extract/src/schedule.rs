//! Extraction window scheduling.

use chrono::{DateTime, Utc};
use fleetload_types::{Cadence, EndpointSpec, ExtractionWindow};

/// What to do with an endpoint in this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Extract this window.
    Due(ExtractionWindow),
    /// Nothing to extract yet.
    Skip {
        /// When the next window completes, if known.
        next_due: Option<DateTime<Utc>>,
    },
}

/// Computes extraction windows from endpoint cadences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scheduler {
    override_window: Option<ExtractionWindow>,
}

impl Scheduler {
    /// Creates a scheduler that follows each endpoint's cadence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            override_window: None,
        }
    }

    /// Uses `window` for every endpoint instead of the cadence, when set.
    #[must_use]
    pub const fn with_override(mut self, window: Option<ExtractionWindow>) -> Self {
        self.override_window = window;
        self
    }

    /// Returns the backfill window, if one is set.
    #[must_use]
    pub const fn override_window(&self) -> Option<ExtractionWindow> {
        self.override_window
    }

    /// Decides the window to extract for `spec` at `now`.
    ///
    /// The window starts at `last_extraction` (or `now` when there is none).
    /// A fixed cadence yields exactly one cadence-long window once it has
    /// fully elapsed; an unbounded cadence extends the window to `now`.
    #[must_use]
    pub fn compute_window(
        &self,
        spec: &EndpointSpec,
        last_extraction: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Schedule {
        if let Some(window) = self.override_window {
            return Schedule::Due(window);
        }

        let start = last_extraction.unwrap_or(now);
        match spec.cadence {
            Cadence::Fixed(length) if now - start >= length => {
                ExtractionWindow::starting_at(start, length)
                    .map_or(Schedule::Skip { next_due: None }, Schedule::Due)
            }
            Cadence::Fixed(length) => Schedule::Skip {
                next_due: Some(start + length),
            },
            Cadence::Unbounded => ExtractionWindow::new(start, now)
                .map_or(Schedule::Skip { next_due: None }, Schedule::Due),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use fleetload_types::Endpoint;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn minutes(n: i64) -> TimeDelta {
        TimeDelta::minutes(n)
    }

    #[test]
    fn test_cadence_not_elapsed_skips() {
        let spec = Endpoint::Iplan.spec();
        let last = now() - minutes(3);

        let schedule = Scheduler::new().compute_window(&spec, Some(last), now());

        assert_eq!(
            schedule,
            Schedule::Skip {
                next_due: Some(last + minutes(5))
            }
        );
    }

    #[test]
    fn test_elapsed_cadence_gives_one_window() {
        let spec = Endpoint::Iplan.spec();

        let schedule = Scheduler::new().compute_window(&spec, Some(now() - minutes(6)), now());

        let Schedule::Due(window) = schedule else {
            panic!("expected a window, got {schedule:?}");
        };
        assert_eq!(window.start(), now() - minutes(6));
        assert_eq!(window.end(), now() - minutes(1));
        assert_eq!(window.length(), minutes(5));
    }

    #[test]
    fn test_exact_cadence_is_due() {
        let spec = Endpoint::ViagensRetroativas.spec();
        let last = now() - TimeDelta::hours(1);

        let schedule = Scheduler::new().compute_window(&spec, Some(last), now());

        assert_eq!(
            schedule,
            Schedule::Due(ExtractionWindow::new(last, now()).unwrap())
        );
    }

    #[test]
    fn test_windows_are_cadence_long_whatever_the_lag() {
        let spec = Endpoint::ViagensConsolidadas.spec();
        for lag in [61, 90, 600, 10_000] {
            let schedule =
                Scheduler::new().compute_window(&spec, Some(now() - minutes(lag)), now());
            match schedule {
                Schedule::Due(window) => assert_eq!(window.length(), TimeDelta::hours(1)),
                Schedule::Skip { .. } => panic!("lag of {lag} minutes should be due"),
            }
        }
    }

    #[test]
    fn test_missing_last_extraction_starts_now() {
        let spec = Endpoint::Iplan.spec();
        let schedule = Scheduler::new().compute_window(&spec, None, now());
        assert_eq!(
            schedule,
            Schedule::Skip {
                next_due: Some(now() + minutes(5))
            }
        );
    }

    #[test]
    fn test_unbounded_cadence() {
        let spec = Endpoint::Iplan.spec().with_cadence(Cadence::Unbounded);
        let last = now() - minutes(42);

        let schedule = Scheduler::new().compute_window(&spec, Some(last), now());
        assert_eq!(
            schedule,
            Schedule::Due(ExtractionWindow::new(last, now()).unwrap())
        );

        let schedule = Scheduler::new().compute_window(&spec, None, now());
        assert_eq!(schedule, Schedule::Skip { next_due: None });
    }

    #[test]
    fn test_override_ignores_cadence_and_state() {
        let backfill = ExtractionWindow::parse("2024-01-01 00:00:00", "2024-01-31 00:00:00").unwrap();
        let scheduler = Scheduler::new().with_override(Some(backfill));

        for endpoint in Endpoint::all() {
            let spec = endpoint.spec();
            for last in [None, Some(now()), Some(now() - minutes(3))] {
                assert_eq!(
                    scheduler.compute_window(&spec, last, now()),
                    Schedule::Due(backfill)
                );
            }
        }
        assert_eq!(scheduler.override_window(), Some(backfill));
    }
}
