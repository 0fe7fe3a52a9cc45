// src/export/parquet.rs
use arrow::error::ArrowError;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::{Compression, ZstdLevel},
    file::properties::WriterProperties,
};
use serde::Deserialize;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::table::{
    arrow::{build_arrow_schema, from_record_batches, to_record_batch},
    Table,
};

const READ_BATCH_SIZE: usize = 8_192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportCompression {
    #[default]
    Snappy,
    Zstd,
    Uncompressed,
}

impl ExportCompression {
    fn to_parquet(self) -> Compression {
        match self {
            ExportCompression::Snappy => Compression::SNAPPY,
            ExportCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ExportCompression::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// `COPY table TO path (FORMAT parquet)`.
///
/// Writes to `<path>.tmp` and renames over `path` once the footer is written,
/// so `path` is never left half-written by this function.
#[tracing::instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), rows = table.num_rows()))]
pub fn write_parquet(
    table: &Table,
    path: impl AsRef<Path>,
    compression: ExportCompression,
) -> Result<()> {
    let path = path.as_ref();
    let tmp = tmp_path(path);

    if let Err(e) = write_file(table, &tmp, compression) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }

    info!(columns = table.num_columns(), "exported parquet");
    Ok(())
}

fn write_file(table: &Table, tmp: &Path, compression: ExportCompression) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(compression.to_parquet())
        .set_dictionary_enabled(true)
        .build();
    let file = File::create(tmp).map_err(|e| Error::io(tmp, e))?;
    let mut writer = ArrowWriter::try_new(file, build_arrow_schema(table.schema()), Some(props))?;

    if !table.is_empty() {
        writer.write(&to_record_batch(table)?)?;
    }
    writer.close()?;
    Ok(())
}

/// Read a Parquet file back into a [`Table`].
pub fn read_parquet(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.with_batch_size(READ_BATCH_SIZE).build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;

    let table = from_record_batches(&schema, &batches)?;
    debug!(path = %path.display(), rows = table.num_rows(), "read parquet");
    Ok(table)
}
