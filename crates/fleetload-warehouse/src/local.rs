//! Filesystem-backed warehouse.

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use fleetload_format::ParquetFormatter;
use fleetload_types::ControlRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::{Result, TableRef, Warehouse, WarehouseError};

/// On-disk form of a control table.
#[derive(Debug, Serialize, Deserialize)]
struct ControlDocument {
    created_at: DateTime<Utc>,
    rows: Vec<ControlRecord>,
}

/// A warehouse kept under a local directory.
///
/// Layout below the root:
///
/// - `<project>/<dataset>/<table>.json` - control tables
/// - `<project>/<dataset>/<table>/part-*.parquet` - data tables, one file per append
///
/// Control table writes go to a temporary file that is renamed into place, so
/// readers never see a partial document.
#[derive(Debug)]
pub struct LocalWarehouse {
    root: PathBuf,
    project: String,
    formatter: ParquetFormatter,
    /// Serializes read-modify-write cycles on control tables.
    control_lock: Mutex<()>,
}

impl LocalWarehouse {
    /// Opens the warehouse for `project` under `root`, creating directories
    /// as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory cannot be created.
    pub fn new(root: PathBuf, project: impl Into<String>) -> Result<Self> {
        let project = project.into();
        create_dir(&root.join(&project))?;

        Ok(Self {
            root,
            project,
            formatter: ParquetFormatter::new(),
            control_lock: Mutex::new(()),
        })
    }

    /// Returns the default root directory.
    ///
    /// - Linux: `~/.local/share/fleetload/warehouse/`
    /// - macOS: `~/Library/Application Support/fleetload/warehouse/`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\fleetload\warehouse\`
    ///
    /// Falls back to `~/.fleetload/warehouse/`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "fleetload")
            .map_or_else(dirs_fallback, |proj_dirs| proj_dirs.data_dir().to_path_buf())
            .join("warehouse")
    }

    /// Opens the warehouse for `project` at the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory cannot be created.
    pub fn with_default_path(project: impl Into<String>) -> Result<Self> {
        Self::new(Self::default_path(), project)
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of a control table document.
    #[must_use]
    pub fn control_path(&self, table: &TableRef) -> PathBuf {
        self.dataset_path(table).join(format!("{}.json", table.table))
    }

    /// Returns the directory of a data table.
    #[must_use]
    pub fn table_path(&self, table: &TableRef) -> PathBuf {
        self.dataset_path(table).join(&table.table)
    }

    fn dataset_path(&self, table: &TableRef) -> PathBuf {
        self.root.join(&self.project).join(&table.dataset)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.control_lock.lock().map_err(|_| WarehouseError::Poisoned)
    }

    fn read_control(&self, table: &TableRef) -> Result<ControlDocument> {
        let path = self.control_path(table);
        if !path.exists() {
            return Err(WarehouseError::TableNotFound(table.clone()));
        }

        let content = fs::read_to_string(&path).map_err(|e| WarehouseError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| WarehouseError::ParseJson { path, source: e })
    }

    fn write_control(&self, table: &TableRef, document: &ControlDocument) -> Result<()> {
        let path = self.control_path(table);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(document)?;

        fs::write(&tmp, json).map_err(|e| WarehouseError::WriteFile {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| WarehouseError::WriteFile { path, source: e })
    }

    /// Applies `update` to the rows of a control table under the lock.
    fn update_control<F>(&self, table: &TableRef, update: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<ControlRecord>),
    {
        let _guard = self.lock()?;
        let mut document = self.read_control(table)?;
        update(&mut document.rows);
        self.write_control(table, &document)
    }

    fn create_control(&self, table: &TableRef) -> Result<bool> {
        let _guard = self.lock()?;
        if self.control_path(table).exists() {
            return Ok(false);
        }

        create_dir(&self.dataset_path(table))?;
        let document = ControlDocument {
            created_at: Utc::now(),
            rows: Vec::new(),
        };
        self.write_control(table, &document)?;
        Ok(true)
    }

    fn write_part(&self, table: &TableRef, batch: &RecordBatch) -> Result<u64> {
        let dir = self.table_path(table);
        create_dir(&dir)?;

        let rows = batch.num_rows() as u64;
        if rows == 0 {
            return Ok(0);
        }

        let name = format!(
            "part-{}-{}.parquet",
            Utc::now().format("%Y%m%dT%H%M%S%6f"),
            Uuid::new_v4().simple()
        );
        let path = dir.join(name);
        let tmp = path.with_extension("parquet.tmp");

        let file = File::create(&tmp).map_err(|e| WarehouseError::WriteFile {
            path: tmp.clone(),
            source: e,
        })?;
        self.formatter.write_batch(batch, file)?;
        fs::rename(&tmp, &path).map_err(|e| WarehouseError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        debug!(table = %table, path = %path.display(), rows, "wrote data file");
        Ok(rows)
    }

    fn sum_rows(&self, table: &TableRef) -> Result<u64> {
        let dir = self.table_path(table);
        if !dir.is_dir() {
            return Err(WarehouseError::TableNotFound(table.clone()));
        }

        let entries = fs::read_dir(&dir).map_err(|e| WarehouseError::ReadDir {
            path: dir.clone(),
            source: e,
        })?;

        let mut total = 0;
        for entry in entries {
            let entry = entry.map_err(|e| WarehouseError::ReadDir {
                path: dir.clone(),
                source: e,
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "parquet") {
                let file = File::open(&path).map_err(|e| WarehouseError::ReadFile {
                    path: path.clone(),
                    source: e,
                })?;
                total += ParquetFormatter::row_count(file)?;
            }
        }

        Ok(total)
    }
}

#[async_trait]
impl Warehouse for LocalWarehouse {
    fn project(&self) -> &str {
        &self.project
    }

    async fn create_control_table(&self, table: &TableRef) -> Result<bool> {
        self.create_control(table)
    }

    async fn insert_control_records(
        &self,
        table: &TableRef,
        records: &[ControlRecord],
    ) -> Result<()> {
        self.update_control(table, |rows| rows.extend_from_slice(records))
    }

    async fn merge_control_record(&self, table: &TableRef, record: &ControlRecord) -> Result<()> {
        self.update_control(table, |rows| {
            match rows
                .iter_mut()
                .find(|row| row.has_key(&record.api, &record.endpoint))
            {
                Some(row) => {
                    row.last_extraction = record.last_extraction;
                    row.status = record.status;
                }
                None => rows.push(record.clone()),
            }
        })
    }

    async fn select_control_records(
        &self,
        table: &TableRef,
        api: &str,
    ) -> Result<Vec<ControlRecord>> {
        let document = {
            let _guard = self.lock()?;
            self.read_control(table)?
        };

        Ok(document
            .rows
            .into_iter()
            .filter(|row| row.api == api)
            .collect())
    }

    async fn append(&self, table: &TableRef, batch: &RecordBatch) -> Result<u64> {
        self.write_part(table, batch)
    }

    async fn count_rows(&self, table: &TableRef) -> Result<u64> {
        self.sum_rows(table)
    }
}

fn create_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| WarehouseError::CreateDir {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Fallback for determining home directory.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".fleetload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fleetload_format::records_to_batch;
    use fleetload_types::ExtractionStatus;
    use serde_json::json;
    use tempfile::TempDir;

    fn control() -> TableRef {
        TableRef::new("mobilidade", "control_table")
    }

    fn record(api: &str, endpoint: &str, hour: u32, status: ExtractionStatus) -> ControlRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
        ControlRecord::new(api, endpoint, Some(at), status)
    }

    fn warehouse(dir: &TempDir) -> LocalWarehouse {
        LocalWarehouse::new(dir.path().to_path_buf(), "rj-smtr").unwrap()
    }

    #[test]
    fn test_layout() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);

        assert!(temp_dir.path().join("rj-smtr").is_dir());
        assert_eq!(warehouse.project(), "rj-smtr");
        assert_eq!(
            warehouse.control_path(&control()),
            temp_dir.path().join("rj-smtr/mobilidade/control_table.json")
        );
        assert_eq!(
            warehouse.table_path(&control().sibling("gps_registros")),
            temp_dir.path().join("rj-smtr/mobilidade/gps_registros")
        );
    }

    #[test]
    fn test_default_path() {
        let path = LocalWarehouse::default_path();
        assert!(path.ends_with("warehouse"));
    }

    #[tokio::test]
    async fn test_create_control_table_once() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);

        assert!(warehouse.create_control_table(&control()).await.unwrap());
        assert!(!warehouse.create_control_table(&control()).await.unwrap());
        assert!(warehouse.control_path(&control()).exists());
    }

    #[tokio::test]
    async fn test_missing_control_table() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);

        let err = warehouse
            .select_control_records(&control(), "zirix")
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_select_filters_by_api() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);
        warehouse.create_control_table(&control()).await.unwrap();

        let rows = vec![
            record("zirix", "EnvioIplan", 10, ExtractionStatus::Success),
            record("other", "EnvioIplan", 10, ExtractionStatus::Success),
            record("zirix", "EnvioViagensRetroativas", 9, ExtractionStatus::Failed),
        ];
        warehouse
            .insert_control_records(&control(), &rows)
            .await
            .unwrap();

        let selected = warehouse
            .select_control_records(&control(), "zirix")
            .await
            .unwrap();
        assert_eq!(selected, vec![rows[0].clone(), rows[2].clone()]);
    }

    #[tokio::test]
    async fn test_merge_updates_or_inserts() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);
        warehouse.create_control_table(&control()).await.unwrap();
        warehouse
            .insert_control_records(
                &control(),
                &[record("zirix", "EnvioIplan", 10, ExtractionStatus::Success)],
            )
            .await
            .unwrap();

        let failed = record("zirix", "EnvioIplan", 11, ExtractionStatus::Failed);
        warehouse
            .merge_control_record(&control(), &failed)
            .await
            .unwrap();
        warehouse
            .merge_control_record(&control(), &failed)
            .await
            .unwrap();
        let new = record("zirix", "EnvioViagensConsolidadas", 12, ExtractionStatus::Success);
        warehouse.merge_control_record(&control(), &new).await.unwrap();

        let rows = warehouse
            .select_control_records(&control(), "zirix")
            .await
            .unwrap();
        assert_eq!(rows, vec![failed, new]);
    }

    #[tokio::test]
    async fn test_control_table_persists() {
        let temp_dir = TempDir::new().unwrap();
        let row = record("zirix", "EnvioIplan", 10, ExtractionStatus::Success);
        {
            let warehouse = warehouse(&temp_dir);
            warehouse.create_control_table(&control()).await.unwrap();
            warehouse
                .merge_control_record(&control(), &row)
                .await
                .unwrap();
        }

        let reopened = warehouse(&temp_dir);
        let rows = reopened
            .select_control_records(&control(), "zirix")
            .await
            .unwrap();
        assert_eq!(rows, vec![row]);
        assert!(!reopened.control_path(&control()).with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_append_and_count() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);
        let table = TableRef::new("mobilidade", "gps_registros");

        let first = records_to_batch(&[json!({"placa": "A"}), json!({"placa": "B"})]).unwrap();
        let second = records_to_batch(&[json!({"placa": "C"})]).unwrap();

        assert_eq!(warehouse.append(&table, &first).await.unwrap(), 2);
        assert_eq!(warehouse.append(&table, &second).await.unwrap(), 1);
        assert_eq!(warehouse.count_rows(&table).await.unwrap(), 3);

        let parts: Vec<_> = fs::read_dir(warehouse.table_path(&table))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(parts.len(), 2);
        assert!(
            parts
                .iter()
                .all(|p| p.extension().is_some_and(|ext| ext == "parquet"))
        );
    }

    #[tokio::test]
    async fn test_count_missing_table() {
        let temp_dir = TempDir::new().unwrap();
        let warehouse = warehouse(&temp_dir);

        let err = warehouse
            .count_rows(&TableRef::new("mobilidade", "gps_registros"))
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::TableNotFound(_)));
    }
}
