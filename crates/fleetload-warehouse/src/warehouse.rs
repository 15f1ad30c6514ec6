//! The warehouse interface.

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use fleetload_types::ControlRecord;

use crate::Result;

/// A table inside the warehouse project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Dataset the table lives in.
    pub dataset: String,
    /// Table name.
    pub table: String,
}

impl TableRef {
    /// Creates a table reference.
    #[must_use]
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Returns a reference to another table in the same dataset.
    #[must_use]
    pub fn sibling(&self, table: impl Into<String>) -> Self {
        Self::new(self.dataset.clone(), table)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

/// Storage operations the extractor relies on.
///
/// Control tables hold [`ControlRecord`] rows keyed by `(api, endpoint)`;
/// data tables are append-only.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Project every table belongs to.
    fn project(&self) -> &str;

    /// Creates an empty control table unless it exists. Returns true if it
    /// was created.
    async fn create_control_table(&self, table: &TableRef) -> Result<bool>;

    /// Inserts rows into a control table without merging.
    async fn insert_control_records(&self, table: &TableRef, records: &[ControlRecord])
    -> Result<()>;

    /// Updates the row with the same `(api, endpoint)` key, or inserts it.
    async fn merge_control_record(&self, table: &TableRef, record: &ControlRecord) -> Result<()>;

    /// Returns the rows of `api`, in stored order.
    async fn select_control_records(&self, table: &TableRef, api: &str)
    -> Result<Vec<ControlRecord>>;

    /// Appends a batch to a data table, creating it when needed. Returns the
    /// number of rows written.
    async fn append(&self, table: &TableRef, batch: &RecordBatch) -> Result<u64>;

    /// Returns the total number of rows in a data table.
    async fn count_rows(&self, table: &TableRef) -> Result<u64>;
}
