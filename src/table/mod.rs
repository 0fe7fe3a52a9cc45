// src/table/mod.rs
pub mod arrow;
pub mod decimal;
pub mod value;

pub use decimal::Decimal;
pub use value::{DataType, Value};

use crate::error::{Error, Result};
use std::collections::HashSet;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of uniquely named columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(Error::query(format!("duplicate column `{}`", col.name)));
            }
        }
        Ok(Self { columns })
    }

    /// For fixed schemas whose names are known to be unique.
    pub(crate) fn known(columns: Vec<Column>) -> Self {
        debug_assert!(Self::new(columns.clone()).is_ok());
        Self { columns }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, DataType)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, ty)| Column::new(name, ty))
                .collect(),
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    fn check_row(&self, row: &[Value]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::query(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (value, col) in row.iter().zip(&self.columns) {
            if !value.fits(col.data_type) {
                return Err(Error::query(format!(
                    "value {value:?} does not fit column `{}` of type {}",
                    col.name, col.data_type
                )));
            }
        }
        Ok(())
    }
}

/// A materialized snapshot: a schema plus rows that all conform to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, validating every row against `schema` once.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        for row in &rows {
            schema.check_row(row)?;
        }
        Ok(Self { schema, rows })
    }

    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema.index_of(name)
    }

    /// All values of column `name`, top to bottom.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn value(&self, row: usize, name: &str) -> Result<&Value> {
        let idx = self.column_index(name)?;
        self.rows
            .get(row)
            .map(|r| &r[idx])
            .ok_or_else(|| Error::query(format!("row {row} out of range")))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        self.schema.check_row(&row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Append `rows`; either all of them conform and are appended, or none is.
    pub fn extend_rows(&mut self, rows: Vec<Vec<Value>>) -> Result<()> {
        for row in &rows {
            self.schema.check_row(row)?;
        }
        self.rows.extend(rows);
        Ok(())
    }

    /// Render as an ASCII grid.
    pub fn pretty(&self) -> Result<String> {
        let batch = self::arrow::to_record_batch(self)?;
        Ok(::arrow::util::pretty::pretty_format_batches(&[batch])?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Result<Table> {
        let schema = Schema::from_pairs([("id", DataType::Integer), ("name", DataType::Text)])?;
        Table::new(
            schema,
            vec![
                vec![Value::from(1), Value::from("ada")],
                vec![Value::from(2), Value::Null],
            ],
        )
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Schema::from_pairs([("a", DataType::Text), ("a", DataType::Integer)]);
        assert!(matches!(err, Err(Error::Query(_))));
    }

    #[test]
    fn rows_are_validated_against_schema() -> anyhow::Result<()> {
        let mut t = people()?;
        assert!(t.push_row(vec![Value::from("3"), Value::from("x")]).is_err());
        assert!(t.push_row(vec![Value::from(3)]).is_err());
        t.push_row(vec![Value::from(3), Value::from("grace")])?;
        assert_eq!(t.num_rows(), 3);
        Ok(())
    }

    #[test]
    fn column_access() -> anyhow::Result<()> {
        let t = people()?;
        let names: Vec<_> = t.column("name")?.cloned().collect();
        assert_eq!(names, vec![Value::from("ada"), Value::Null]);
        assert_eq!(t.value(0, "id")?, &Value::from(1));
        assert!(matches!(t.column("nope"), Err(Error::UnknownColumn(_))));
        Ok(())
    }

    #[test]
    fn pretty_prints_a_grid() -> anyhow::Result<()> {
        let out = people()?.pretty()?;
        assert!(out.contains("| id | name |"), "{out}");
        assert!(out.contains("| 1  | ada  |"), "{out}");
        Ok(())
    }
}
