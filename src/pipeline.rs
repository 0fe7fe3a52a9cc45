// src/pipeline.rs
//
// load → clean → type → aggregate → export, wired through one Catalog.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::info;

use crate::catalog::aggregate::{register_aggregated_sales, AGGREGATED_SALES_VIEW};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::export::{read_parquet, write_parquet, ExportCompression};
use crate::process::{
    drop_empty_rows, load_csv_glob, retain_integer_key, sales_table, transform_sales, LoadStrategy,
    MissingInput, RawTable, SalesColumns, SALES_TABLE,
};

/// Catalog name of the untyped, cleaned input.
pub const RAW_TABLE: &str = "df";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTiming {
    pub strategy: LoadStrategy,
    pub rows: usize,
    pub elapsed: Duration,
}

/// Load the same files once per strategy and time each pass.
///
/// Returns the row-loader's table together with both timings.
pub fn compare_loaders(pattern: &str, missing: MissingInput) -> Result<(RawTable, Vec<LoadTiming>)> {
    let mut timings = Vec::with_capacity(2);
    let mut kept = None;

    for strategy in [LoadStrategy::Rows, LoadStrategy::Columnar] {
        let started = Instant::now();
        let table = load_csv_glob(pattern, strategy, missing)?;
        let elapsed = started.elapsed();
        info!(
            strategy = strategy.as_str(),
            rows = table.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "load timing"
        );
        timings.push(LoadTiming {
            strategy,
            rows: table.len(),
            elapsed,
        });
        if kept.is_none() {
            kept = Some(table);
        }
    }

    Ok((kept.unwrap_or_default(), timings))
}

/// Register `df` (cleaned raw rows), `sales` (typed) and the
/// `aggregated_sales` view in a fresh catalog.
///
/// With `filter_raw_keys`, rows whose order id is not an integer are also
/// removed from `df`; the typed table drops them either way.
pub fn build_catalog(raw: RawTable, columns: &SalesColumns, filter_raw_keys: bool) -> Result<Catalog> {
    let loaded = raw.len();
    let mut cleaned = drop_empty_rows(raw);
    if filter_raw_keys && !cleaned.headers.is_empty() {
        cleaned = retain_integer_key(cleaned, &columns.order_id)?;
    }

    let records = transform_sales(&cleaned, columns)?;
    info!(
        loaded,
        cleaned = cleaned.len(),
        typed = records.len(),
        "prepared sales"
    );

    let mut catalog = Catalog::new();
    catalog.create_or_replace_table(RAW_TABLE, cleaned.to_table()?);
    catalog.create_or_replace_table(SALES_TABLE, sales_table(&records)?);
    register_aggregated_sales(&mut catalog, SALES_TABLE);
    Ok(catalog)
}

/// Snapshot the aggregated view into `path`; returns the rows written.
pub fn export_aggregated(catalog: &Catalog, path: &Path, compression: ExportCompression) -> Result<usize> {
    let snapshot = catalog.scan(AGGREGATED_SALES_VIEW)?;
    write_parquet(&snapshot, path, compression)?;
    Ok(snapshot.num_rows())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub loaded_rows: usize,
    pub sales_rows: usize,
    pub exported_rows: usize,
    pub export_path: PathBuf,
}

/// The whole run without any reporting.
pub fn run(config: &Config) -> Result<(Catalog, RunSummary)> {
    let raw = load_csv_glob(&config.input_glob, LoadStrategy::Rows, config.missing_input)?;
    let loaded_rows = raw.len();
    let catalog = build_catalog(raw, &config.columns, false)?;
    let sales_rows = catalog.scan(SALES_TABLE)?.num_rows();
    let exported_rows = export_aggregated(&catalog, &config.export_path, config.compression)?;

    let reread = read_parquet(&config.export_path)?;
    debug_assert_eq!(reread.num_rows(), exported_rows);

    Ok((
        catalog,
        RunSummary {
            loaded_rows,
            sales_rows,
            exported_rows,
            export_path: config.export_path.clone(),
        },
    ))
}
