//! Extraction control table.

use chrono::{DateTime, Utc};
use fleetload_types::{ControlRecord, ExtractionStatus, Provider};
use tracing::{debug, info};

use crate::{Result, TableRef, Warehouse};

/// Minutes that must pass after an extraction before an endpoint is tried
/// again.
pub const DEFAULT_BACKOFF_MINUTES: i64 = 5;

/// Per-endpoint extraction progress stored in a warehouse table.
///
/// Each `(api, endpoint)` pair has at most one row. Rows move between
/// `success` and `failed`; a row is never deleted.
#[derive(Debug)]
pub struct ControlTable<'w, W: ?Sized> {
    warehouse: &'w W,
    table: TableRef,
    backoff_minutes: i64,
    clock: fn() -> DateTime<Utc>,
}

impl<'w, W: Warehouse + ?Sized> ControlTable<'w, W> {
    /// Creates a control table handle.
    #[must_use]
    pub fn new(warehouse: &'w W, table: TableRef) -> Self {
        Self {
            warehouse,
            table,
            backoff_minutes: DEFAULT_BACKOFF_MINUTES,
            clock: Utc::now,
        }
    }

    /// Sets the eligibility backoff.
    #[must_use]
    pub const fn with_backoff_minutes(mut self, minutes: i64) -> Self {
        self.backoff_minutes = minutes;
        self
    }

    /// Sets the clock used for "now" when writing rows.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the table this handle reads and writes.
    #[must_use]
    pub const fn table(&self) -> &TableRef {
        &self.table
    }

    /// Returns the eligibility backoff in minutes.
    #[must_use]
    pub const fn backoff_minutes(&self) -> i64 {
        self.backoff_minutes
    }

    /// Creates the table if it is absent and, when it holds no rows for
    /// `provider`, seeds one `success` row per endpoint stamped with the
    /// current time.
    ///
    /// Returns true if rows were seeded by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the warehouse cannot create, read or fill the
    /// table.
    pub async fn ensure_initialized(&self, provider: Provider) -> Result<bool> {
        let created = self.warehouse.create_control_table(&self.table).await?;
        if !self.records(provider.as_str()).await?.is_empty() {
            return Ok(false);
        }

        let now = (self.clock)();
        let seed: Vec<_> = provider
            .endpoints()
            .iter()
            .map(|endpoint| {
                ControlRecord::new(
                    provider.as_str(),
                    endpoint.as_str(),
                    Some(now),
                    ExtractionStatus::Success,
                )
            })
            .collect();
        self.warehouse
            .insert_control_records(&self.table, &seed)
            .await?;

        info!(table = %self.table, created, rows = seed.len(), "seeded control table");
        Ok(true)
    }

    /// Returns true if `record` may be extracted at `now`.
    ///
    /// Only whole minutes count, and the elapsed time must exceed the
    /// backoff. Rows without a last extraction are never eligible.
    #[must_use]
    pub fn is_eligible(&self, record: &ControlRecord, now: DateTime<Utc>) -> bool {
        record
            .elapsed(now)
            .is_some_and(|elapsed| elapsed.num_minutes() > self.backoff_minutes)
    }

    /// Returns the rows of `api` that are due at `now`, in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be read.
    pub async fn eligible_endpoints(
        &self,
        api: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ControlRecord>> {
        let rows = self.records(api).await?;
        debug!(api, rows = rows.len(), "read control rows");

        Ok(rows
            .into_iter()
            .filter(|row| self.is_eligible(row, now))
            .collect())
    }

    /// Returns the most recent extraction time among the rows of `api`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be read.
    pub async fn last_execution(&self, api: &str) -> Result<Option<DateTime<Utc>>> {
        let rows = self.records(api).await?;
        Ok(rows.iter().filter_map(|row| row.last_extraction).max())
    }

    /// Writes the state of one endpoint, replacing any existing row.
    ///
    /// `None` for `last_extraction` stamps the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub async fn upsert(
        &self,
        api: &str,
        endpoint: &str,
        status: ExtractionStatus,
        last_extraction: Option<DateTime<Utc>>,
    ) -> Result<ControlRecord> {
        let at = last_extraction.unwrap_or_else(self.clock);
        let record = ControlRecord::new(api, endpoint, Some(at), status);

        self.warehouse
            .merge_control_record(&self.table, &record)
            .await?;
        debug!(api, endpoint, status = %status, last_extraction = %at, "updated control row");

        Ok(record)
    }

    /// Returns every row of `api`, in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read.
    pub async fn records(&self, api: &str) -> Result<Vec<ControlRecord>> {
        self.warehouse
            .select_control_records(&self.table, api)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalWarehouse;
    use chrono::{TimeDelta, TimeZone};
    use fleetload_types::Endpoint;
    use tempfile::TempDir;

    fn seeded_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn setup() -> (TempDir, LocalWarehouse) {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = LocalWarehouse::new(temp_dir.path().to_path_buf(), "rj-smtr").unwrap();
        (temp_dir, warehouse)
    }

    fn control(warehouse: &LocalWarehouse) -> ControlTable<'_, LocalWarehouse> {
        ControlTable::new(warehouse, TableRef::new("mobilidade", "control_table"))
            .with_clock(seeded_at)
    }

    #[tokio::test]
    async fn test_initialization_seeds_existing_empty_table() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);

        // Table left empty by an interrupted seed.
        assert!(warehouse.create_control_table(control.table()).await.unwrap());
        assert!(control.records("zirix").await.unwrap().is_empty());

        assert!(control.ensure_initialized(Provider::Zirix).await.unwrap());
        let rows = control.records("zirix").await.unwrap();
        assert_eq!(rows.len(), Endpoint::all().len());
        assert!(rows.iter().all(|row| row.last_extraction == Some(seeded_at())));
    }

    #[tokio::test]
    async fn test_initialization_seeds_once() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);

        assert!(control.ensure_initialized(Provider::Zirix).await.unwrap());
        assert!(!control.ensure_initialized(Provider::Zirix).await.unwrap());

        let rows = control.records("zirix").await.unwrap();
        assert_eq!(rows.len(), Endpoint::all().len());
        assert!(rows.iter().all(|row| {
            row.status == ExtractionStatus::Success && row.last_extraction == Some(seeded_at())
        }));
        let names: Vec<_> = rows.iter().map(|row| row.endpoint.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "EnvioIplan",
                "EnvioViagensConsolidadas",
                "EnvioViagensRetroativas"
            ]
        );
    }

    #[tokio::test]
    async fn test_eligibility_uses_whole_minutes() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);
        control.ensure_initialized(Provider::Zirix).await.unwrap();

        // Exactly five minutes is not more than the backoff.
        let at_backoff = seeded_at() + TimeDelta::minutes(5);
        assert!(control.eligible_endpoints("zirix", at_backoff).await.unwrap().is_empty());

        // 5m59s still counts as five whole minutes.
        let almost = seeded_at() + TimeDelta::seconds(359);
        assert!(control.eligible_endpoints("zirix", almost).await.unwrap().is_empty());

        let due = seeded_at() + TimeDelta::minutes(6);
        assert_eq!(control.eligible_endpoints("zirix", due).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_eligibility_excludes_other_apis_and_null_times() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);
        control.ensure_initialized(Provider::Zirix).await.unwrap();
        warehouse
            .merge_control_record(
                control.table(),
                &ControlRecord::new("other", "EnvioIplan", Some(seeded_at()), ExtractionStatus::Success),
            )
            .await
            .unwrap();
        warehouse
            .merge_control_record(
                control.table(),
                &ControlRecord::new("zirix", "EnvioIplan", None, ExtractionStatus::Failed),
            )
            .await
            .unwrap();

        let now = seeded_at() + TimeDelta::hours(1);
        let eligible = control.eligible_endpoints("zirix", now).await.unwrap();

        let names: Vec<_> = eligible.iter().map(|row| row.endpoint.as_str()).collect();
        assert_eq!(names, vec!["EnvioViagensConsolidadas", "EnvioViagensRetroativas"]);
    }

    #[tokio::test]
    async fn test_custom_backoff() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse).with_backoff_minutes(0);
        control.ensure_initialized(Provider::Zirix).await.unwrap();

        let now = seeded_at() + TimeDelta::minutes(1);
        assert_eq!(control.eligible_endpoints("zirix", now).await.unwrap().len(), 3);
        assert_eq!(control.backoff_minutes(), 0);
    }

    #[tokio::test]
    async fn test_last_execution() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);
        assert!(control.ensure_initialized(Provider::Zirix).await.unwrap());

        let later = seeded_at() + TimeDelta::minutes(30);
        control
            .upsert("zirix", "EnvioIplan", ExtractionStatus::Failed, Some(later))
            .await
            .unwrap();

        assert_eq!(control.last_execution("zirix").await.unwrap(), Some(later));
        assert_eq!(control.last_execution("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);
        control.ensure_initialized(Provider::Zirix).await.unwrap();
        let at = seeded_at() + TimeDelta::minutes(10);

        for _ in 0..2 {
            control
                .upsert("zirix", "EnvioIplan", ExtractionStatus::Failed, Some(at))
                .await
                .unwrap();
        }

        let rows = control.records("zirix").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            ControlRecord::new("zirix", "EnvioIplan", Some(at), ExtractionStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_upsert_defaults_to_now() {
        let (_dir, warehouse) = setup();
        let control = control(&warehouse);
        control.ensure_initialized(Provider::Zirix).await.unwrap();

        let record = control
            .upsert("zirix", "EnvioNovo", ExtractionStatus::Success, None)
            .await
            .unwrap();

        assert_eq!(record.last_extraction, Some(seeded_at()));
        assert_eq!(control.records("zirix").await.unwrap().len(), 4);
    }
}
