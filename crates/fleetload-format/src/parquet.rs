//! Apache Parquet serialization.

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{ChunkReader, FileReader, SerializedFileReader};
use std::io::Write;

use crate::ConvertError;

/// Writes record batches as Parquet files.
#[derive(Debug, Clone)]
pub struct ParquetFormatter {
    /// Maximum rows per row group.
    row_group_size: usize,
    compression: Compression,
}

impl Default for ParquetFormatter {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

impl ParquetFormatter {
    /// Creates a formatter with Snappy compression.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of rows per row group.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Writes a record batch as a complete Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_batch<W: Write + Send>(
        &self,
        batch: &RecordBatch,
        writer: W,
    ) -> Result<(), ConvertError> {
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, batch.schema(), Some(props))?;
        arrow_writer.write(batch)?;
        arrow_writer.close()?;

        Ok(())
    }

    /// Reads the row count of a Parquet file from its footer.
    ///
    /// # Errors
    ///
    /// Returns an error if the footer cannot be read.
    pub fn row_count<R: ChunkReader + 'static>(reader: R) -> Result<u64, ConvertError> {
        let reader = SerializedFileReader::new(reader)?;
        let rows = reader.metadata().file_metadata().num_rows();
        Ok(u64::try_from(rows).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records_to_batch;
    use bytes::Bytes;
    use serde_json::json;

    fn written(batch: &RecordBatch) -> Vec<u8> {
        let mut output = Vec::new();
        ParquetFormatter::new()
            .write_batch(batch, &mut output)
            .unwrap();
        output
    }

    #[test]
    fn test_parquet_magic_bytes() {
        let batch = records_to_batch(&[json!({"placa": "ABC1234"})]).unwrap();
        let data = written(&batch);

        // Parquet files start with "PAR1" magic bytes
        assert!(data.len() > 4);
        assert_eq!(&data[0..4], b"PAR1");
    }

    #[test]
    fn test_row_count_from_footer() {
        let records: Vec<_> = (0..25).map(|i| json!({"seq": i})).collect();
        let batch = records_to_batch(&records).unwrap();

        let data = written(&batch);
        let rows = ParquetFormatter::row_count(Bytes::from(data)).unwrap();

        assert_eq!(rows, 25);
    }

    #[test]
    fn test_small_row_groups() {
        let records: Vec<_> = (0..10).map(|i| json!({"seq": i})).collect();
        let batch = records_to_batch(&records).unwrap();
        let mut output = Vec::new();

        ParquetFormatter::new()
            .with_row_group_size(3)
            .with_compression(Compression::UNCOMPRESSED)
            .write_batch(&batch, &mut output)
            .unwrap();

        let reader = SerializedFileReader::new(Bytes::from(output)).unwrap();
        assert_eq!(reader.metadata().num_row_groups(), 4);
    }
}
