use tracing::debug;

use super::convert::try_cast_integer;
use super::raw_table::{RawRow, RawTable};
use crate::error::{Error, Result};

fn is_blank(row: &RawRow) -> bool {
    row.iter()
        .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
}

/// Drop rows where every field is null or blank.
pub fn drop_empty_rows(mut table: RawTable) -> RawTable {
    let before = table.len();
    table.rows.retain(|row| !is_blank(row));
    debug!(dropped = before - table.len(), "dropped empty rows");
    table
}

/// Keep only rows whose `column` casts to an integer. A failed cast drops
/// the row; it is never an error for the table.
pub fn retain_integer_key(mut table: RawTable, column: &str) -> Result<RawTable> {
    let idx = table
        .find_column(column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
    let before = table.len();
    table
        .rows
        .retain(|row| row[idx].as_deref().and_then(try_cast_integer).is_some());
    debug!(column, dropped = before - table.len(), "filtered non-integer keys");
    Ok(table)
}
