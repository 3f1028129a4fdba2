//! Parquet files for the output tables.

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::StoreError;

/// Write one record batch to a Parquet file, replacing any existing file.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use petitions_core::ConstituencySignature;
    use petitions_core::schema::constituency_signatures_batch;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn read_parquet(path: &Path) -> Vec<RecordBatch> {
        let file = File::open(path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        reader.collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn write_then_read_constituency_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("constituency_signatures.parquet");
        let rows = vec![
            ConstituencySignature {
                petition_id: 1,
                constituency: "Bath".into(),
                region_code: "E14000547".into(),
                signatures: 120,
            },
            ConstituencySignature {
                petition_id: 1,
                constituency: "Aberavon".into(),
                region_code: "W07000049".into(),
                signatures: 3,
            },
        ];
        let batch = constituency_signatures_batch(&rows).unwrap();

        write_parquet(&path, &batch).unwrap();
        let read = read_parquet(&path);

        let total: usize = read.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);
        assert_eq!(read[0].schema().fields().len(), 4);
    }
}
