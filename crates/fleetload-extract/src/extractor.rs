//! The extraction cycle.

use chrono::{DateTime, Utc};
use fleetload_fetch::RecordSource;
use fleetload_format::{records_to_batch, stamp_extraction_time};
use fleetload_types::{ControlRecord, Endpoint, EndpointSpec, ExtractionStatus, Provider};
use fleetload_warehouse::{ControlTable, DEFAULT_BACKOFF_MINUTES, TableRef, Warehouse};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::{ExtractError, Result, Schedule, Scheduler};

/// What happened to one endpoint during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointOutcome {
    /// Records were appended to the endpoint's table.
    Loaded {
        /// Rows appended in this cycle.
        rows: u64,
        /// Rows in the table after the append, if they could be counted.
        total_rows: Option<u64>,
    },
    /// The endpoint's window has not completed yet.
    Skipped,
    /// The API returned nothing for the window.
    Empty,
    /// The extraction failed.
    Failed {
        /// Error description.
        reason: String,
    },
}

/// Outcome of every endpoint processed in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// `(endpoint name, outcome)` in processing order.
    pub outcomes: Vec<(String, EndpointOutcome)>,
}

impl CycleReport {
    /// Returns true if no endpoint was eligible.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of endpoints that loaded data.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, EndpointOutcome::Loaded { .. }))
    }

    /// Number of endpoints that failed or returned nothing.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                EndpointOutcome::Failed { .. } | EndpointOutcome::Empty
            )
        })
    }

    /// Returns the outcome recorded for `endpoint`.
    #[must_use]
    pub fn outcome(&self, endpoint: &str) -> Option<&EndpointOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == endpoint)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, predicate: impl Fn(&EndpointOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

/// Moves records from a [`RecordSource`] into a [`Warehouse`], one window per
/// due endpoint.
#[derive(Debug)]
pub struct Extractor<S, W> {
    provider: Provider,
    source: S,
    warehouse: W,
    control_table: TableRef,
    backoff_minutes: i64,
    scheduler: Scheduler,
    specs: HashMap<Endpoint, EndpointSpec>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: RecordSource, W: Warehouse> Extractor<S, W> {
    /// Creates an extractor using the default settings of the provider's
    /// endpoints.
    #[must_use]
    pub fn new(provider: Provider, source: S, warehouse: W, control_table: TableRef) -> Self {
        let specs = provider
            .endpoints()
            .iter()
            .map(|endpoint| (*endpoint, endpoint.spec()))
            .collect();

        Self {
            provider,
            source,
            warehouse,
            control_table,
            backoff_minutes: DEFAULT_BACKOFF_MINUTES,
            scheduler: Scheduler::new(),
            specs,
            clock: Utc::now,
        }
    }

    /// Sets the eligibility backoff.
    #[must_use]
    pub const fn with_backoff_minutes(mut self, minutes: i64) -> Self {
        self.backoff_minutes = minutes;
        self
    }

    /// Sets the window scheduler.
    #[must_use]
    pub const fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the settings of one endpoint.
    #[must_use]
    pub fn with_spec(mut self, spec: EndpointSpec) -> Self {
        self.specs.insert(spec.endpoint, spec);
        self
    }

    /// Sets the clock used for load and state timestamps.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the warehouse.
    #[must_use]
    pub const fn warehouse(&self) -> &W {
        &self.warehouse
    }

    /// Returns a handle on the control table.
    #[must_use]
    pub fn control(&self) -> ControlTable<'_, W> {
        ControlTable::new(&self.warehouse, self.control_table.clone())
            .with_backoff_minutes(self.backoff_minutes)
            .with_clock(self.clock)
    }

    /// Runs a cycle at the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::run_cycle`].
    pub async fn run(&self) -> Result<CycleReport> {
        self.run_cycle((self.clock)()).await
    }

    /// Runs one extraction cycle as of `now`.
    ///
    /// Endpoints are processed one at a time in stored order. A failing
    /// endpoint is marked `failed` with its previous extraction time and the
    /// cycle moves on.
    ///
    /// # Errors
    ///
    /// Returns an error only if the control table cannot be initialized or
    /// read.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let control = self.control();
        let api = self.provider.as_str();

        control.ensure_initialized(self.provider).await?;

        let eligible = control.eligible_endpoints(api, now).await?;
        if eligible.is_empty() {
            info!(api, "no eligible endpoints");
            return Ok(CycleReport::default());
        }

        let last_execution = control.last_execution(api).await?;
        info!(api, endpoints = eligible.len(), "starting extraction cycle");

        let mut report = CycleReport::default();
        for record in &eligible {
            let outcome = match self.process(&control, record, last_execution, now).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(endpoint = %record.endpoint, error = %e, "extraction failed");
                    self.mark_failed(&control, record).await;
                    EndpointOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.outcomes.push((record.endpoint.clone(), outcome));
        }

        info!(
            api,
            loaded = report.loaded(),
            failed = report.failed(),
            "extraction cycle finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        control: &ControlTable<'_, W>,
        record: &ControlRecord,
        last_execution: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<EndpointOutcome> {
        let endpoint: Endpoint = record.endpoint.parse()?;
        let spec = self.specs.get(&endpoint).ok_or_else(|| {
            ExtractError::Unexpected(format!(
                "{endpoint} is not served by provider {}",
                self.provider
            ))
        })?;

        let start = record.last_extraction.or(last_execution);
        let window = match self.scheduler.compute_window(spec, start, now) {
            Schedule::Due(window) => window,
            Schedule::Skip { next_due } => {
                info!(
                    endpoint = %endpoint,
                    next_due = ?next_due,
                    "window not complete, skipping"
                );
                return Ok(EndpointOutcome::Skipped);
            }
        };

        info!(endpoint = %endpoint, cadence = %spec.cadence, window = %window, "extracting");
        let result = self.source.fetch(endpoint, &window).await?;
        debug!(endpoint = %endpoint, records = result.count(), "fetched records");

        let batch = records_to_batch(&result.records)?;
        if batch.num_rows() == 0 || batch.num_columns() == 0 {
            warn!(endpoint = %endpoint, window = %window, "no records returned");
            control
                .upsert(
                    &record.api,
                    &record.endpoint,
                    ExtractionStatus::Failed,
                    record.last_extraction,
                )
                .await?;
            return Ok(EndpointOutcome::Empty);
        }

        let batch = stamp_extraction_time(&batch, (self.clock)())?;
        let table = self.control_table.sibling(spec.table.clone());
        let rows = self.warehouse.append(&table, &batch).await?;

        control
            .upsert(
                &record.api,
                &record.endpoint,
                ExtractionStatus::Success,
                Some((self.clock)()),
            )
            .await?;

        // The load is committed; a failed count must not mark it failed.
        let total_rows = match self.warehouse.count_rows(&table).await {
            Ok(total) => Some(total),
            Err(e) => {
                warn!(endpoint = %endpoint, table = %table, error = %e, "could not count rows");
                None
            }
        };
        info!(endpoint = %endpoint, table = %table, rows, total_rows = ?total_rows, "loaded records");

        Ok(EndpointOutcome::Loaded { rows, total_rows })
    }

    /// Marks an endpoint failed, keeping its last extraction time.
    async fn mark_failed(&self, control: &ControlTable<'_, W>, record: &ControlRecord) {
        if let Err(e) = control
            .upsert(
                &record.api,
                &record.endpoint,
                ExtractionStatus::Failed,
                record.last_extraction,
            )
            .await
        {
            error!(endpoint = %record.endpoint, error = %e, "could not record failure");
        }
    }
}
