// src/process/loader.rs
use arrow::{
    array::{Array, AsArray},
    csv::ReaderBuilder as ArrowCsvReaderBuilder,
    datatypes::{DataType, Field, Schema},
};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

use super::raw_table::{RawRow, RawTable};
use crate::error::{Error, Result};

const BATCH_SIZE: usize = 8_192;

/// What to do when the glob matches no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingInput {
    /// Fail with [`Error::NotFound`].
    #[default]
    Error,
    /// Yield an empty table.
    Empty,
}

/// How each CSV file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Record by record with the `csv` crate.
    Rows,
    /// Into Arrow record batches, then back to rows.
    Columnar,
}

impl LoadStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStrategy::Rows => "rows",
            LoadStrategy::Columnar => "columnar",
        }
    }
}

/// Regular files matching `pattern`, sorted by path.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| Error::parse(pattern, e.to_string()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io(path, e.into_error())
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every CSV file matched by `pattern` into one concatenated [`RawTable`].
///
/// Files are read in lexicographic path order. All files must have as many
/// header columns as the first one; rows are concatenated positionally.
#[tracing::instrument(level = "info", skip(strategy, missing), fields(strategy = strategy.as_str()))]
pub fn load_csv_glob(pattern: &str, strategy: LoadStrategy, missing: MissingInput) -> Result<RawTable> {
    let paths = discover(pattern)?;
    if paths.is_empty() {
        return match missing {
            MissingInput::Error => Err(Error::NotFound(pattern.to_string())),
            MissingInput::Empty => {
                warn!(pattern, "no input files matched, continuing with an empty table");
                Ok(RawTable::default())
            }
        };
    }

    let mut combined: Option<RawTable> = None;
    for path in &paths {
        let table = match strategy {
            LoadStrategy::Rows => read_csv_file(path)?,
            LoadStrategy::Columnar => read_csv_file_columnar(path)?,
        };
        debug!(path = %path.display(), rows = table.len(), "loaded file");
        append(&mut combined, table, path)?;
    }

    let combined = combined.unwrap_or_default();
    info!(files = paths.len(), rows = combined.len(), "loaded csv files");
    Ok(combined)
}

fn append(combined: &mut Option<RawTable>, next: RawTable, path: &Path) -> Result<()> {
    let acc = match combined {
        Some(acc) => acc,
        None => {
            *combined = Some(next);
            return Ok(());
        }
    };
    if acc.headers.len() != next.headers.len() {
        return Err(Error::parse(
            path.display().to_string(),
            format!(
                "header has {} columns, expected {} like the first file",
                next.headers.len(),
                acc.headers.len()
            ),
        ));
    }
    if acc.headers != next.headers {
        warn!(
            path = %path.display(),
            "header names differ from the first file, mapping columns by position"
        );
    }
    acc.rows.extend(next.rows);
    Ok(())
}

fn check_headers(path: &Path, headers: &[String]) -> Result<()> {
    let name = || path.display().to_string();
    if headers.is_empty() {
        return Err(Error::parse(name(), "missing header row"));
    }
    let mut seen = HashSet::with_capacity(headers.len());
    for (i, h) in headers.iter().enumerate() {
        if h.is_empty() {
            return Err(Error::parse(name(), format!("header column {} is empty", i)));
        }
        if !seen.insert(h.as_str()) {
            return Err(Error::parse(name(), format!("duplicate header `{}`", h)));
        }
    }
    Ok(())
}

fn field(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

fn csv_error(path: &Path, e: csv::Error) -> Error {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::io(path, io),
        _ => Error::parse(path.display().to_string(), message),
    }
}

fn open(path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(false) // a row whose width differs from the header is an error
        .from_reader(BufReader::new(file)))
}

fn read_headers(path: &Path, rdr: &mut csv::Reader<BufReader<File>>) -> Result<Vec<String>> {
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    check_headers(path, &headers)?;
    Ok(headers)
}

/// Parse one CSV file record by record.
pub fn read_csv_file(path: &Path) -> Result<RawTable> {
    let mut rdr = open(path)?;
    let mut table = RawTable::new(read_headers(path, &mut rdr)?);

    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        table.rows.push(record.iter().map(field).collect());
    }
    Ok(table)
}

/// Parse one CSV file into all-Utf8 Arrow batches and pivot them back to rows.
pub fn read_csv_file_columnar(path: &Path) -> Result<RawTable> {
    let headers = read_headers(path, &mut open(path)?)?;
    let schema = Arc::new(Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = ArrowCsvReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(BufReader::new(file))
        .map_err(|e| Error::parse(path.display().to_string(), e.to_string()))?;

    let mut table = RawTable::new(headers);
    for batch in reader {
        let batch = batch.map_err(|e| Error::parse(path.display().to_string(), e.to_string()))?;
        let base = table.rows.len();
        table
            .rows
            .extend((0..batch.num_rows()).map(|_| RawRow::with_capacity(batch.num_columns())));

        for col in batch.columns() {
            let strings = col.as_string::<i32>();
            for r in 0..strings.len() {
                let value = if strings.is_null(r) {
                    None
                } else {
                    field(strings.value(r))
                };
                table.rows[base + r].push(value);
            }
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{init_test_logging, EXAMPLE_CSV};
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str =
        "Order ID,Product,Quantity Ordered,Price Each,Order Date,Purchase Address";

    fn write(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    fn pattern(dir: &TempDir) -> String {
        format!("{}/*.csv", dir.path().display())
    }

    fn order_rows(ids: std::ops::Range<u32>) -> String {
        let mut s = format!("{HEADER}\n");
        for id in ids {
            s.push_str(&format!(
                "{id},USB-C Charging Cable,1,11.95,04/19/2019 08:46,\"917 1st St, Dallas, TX 75001\"\n"
            ));
        }
        s
    }

    #[test]
    fn concatenates_files_in_path_order() -> Result<()> {
        init_test_logging();
        let dir = TempDir::new()?;
        write(&dir, "b.csv", &order_rows(100..103))?;
        write(&dir, "a.csv", &order_rows(1..5))?;
        write(&dir, "c.csv", &order_rows(200..200))?;
        write(&dir, "notes.txt", "ignored")?;

        let table = load_csv_glob(&pattern(&dir), LoadStrategy::Rows, MissingInput::Error)?;
        assert_eq!(table.len(), 4 + 3);
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.get(0, "Order ID"), Some("1"));
        assert_eq!(table.get(4, "Order ID"), Some("100"));
        Ok(())
    }

    #[test]
    fn strategies_agree() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "example.csv", EXAMPLE_CSV)?;
        write(&dir, "more.csv", &format!("{}\n,,,,,\n", order_rows(7..9).trim_end()))?;

        let rows = load_csv_glob(&pattern(&dir), LoadStrategy::Rows, MissingInput::Error)?;
        let cols = load_csv_glob(&pattern(&dir), LoadStrategy::Columnar, MissingInput::Error)?;
        assert_eq!(rows, cols);
        assert_eq!(rows.len(), 5);
        assert_eq!(
            rows.get(0, "Purchase Address"),
            Some("136 Church St, New York City, NY 10001")
        );
        assert_eq!(rows.rows[1][1], None);
        assert!(rows.rows[4].iter().all(Option::is_none));
        Ok(())
    }

    #[test]
    fn missing_input_policy() -> Result<()> {
        let dir = TempDir::new()?;
        let err = load_csv_glob(&pattern(&dir), LoadStrategy::Rows, MissingInput::Error);
        assert!(matches!(err, Err(Error::NotFound(_))));

        let empty = load_csv_glob(&pattern(&dir), LoadStrategy::Rows, MissingInput::Empty)?;
        assert!(empty.is_empty());
        assert!(empty.headers.is_empty());
        Ok(())
    }

    #[test]
    fn ragged_rows_are_parse_errors() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "bad.csv", "a,b,c\n1,2,3\n4,5\n")?;
        for strategy in [LoadStrategy::Rows, LoadStrategy::Columnar] {
            let err = load_csv_glob(&pattern(&dir), strategy, MissingInput::Error);
            assert!(matches!(err, Err(Error::Parse { .. })), "{strategy:?}: {err:?}");
        }
        Ok(())
    }

    #[test]
    fn malformed_headers_are_parse_errors() -> Result<()> {
        let dir = TempDir::new()?;
        let dup = write(&dir, "dup.csv", "a,a\n1,2\n")?;
        let blank = write(&dir, "blank.csv", "a,,c\n1,2,3\n")?;
        let empty = write(&dir, "empty.csv", "")?;
        for path in [dup, blank, empty] {
            assert!(
                matches!(read_csv_file(&path), Err(Error::Parse { .. })),
                "{}",
                path.display()
            );
        }
        Ok(())
    }

    #[test]
    fn header_width_must_match_first_file() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.csv", "x,y\n1,2\n")?;
        write(&dir, "b.csv", "x,y,z\n1,2,3\n")?;
        let err = load_csv_glob(&pattern(&dir), LoadStrategy::Rows, MissingInput::Error);
        assert!(matches!(err, Err(Error::Parse { .. })));
        Ok(())
    }

    #[test]
    fn renamed_headers_map_by_position() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.csv", "x,y\n1,2\n")?;
        write(&dir, "b.csv", "X,Y\n3,4\n")?;
        let t = load_csv_glob(&pattern(&dir), LoadStrategy::Rows, MissingInput::Error)?;
        assert_eq!(t.headers, vec!["x", "y"]);
        assert_eq!(t.get(1, "x"), Some("3"));
        Ok(())
    }

    #[test]
    fn bad_pattern_is_parse_error() {
        let err = discover("dataset/[*.csv");
        assert!(matches!(err, Err(Error::Parse { .. })));
    }
}
