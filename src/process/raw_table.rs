use crate::error::Result;
use crate::table::{Column, DataType, Schema, Table, Value};

/// One input row, positionally aligned with [`RawTable::headers`].
/// Empty CSV fields are `None`.
pub type RawRow = Vec<Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Column names as found in the header of the first file loaded.
    pub headers: Vec<String>,
    /// Every data row, in file discovery order then in-file order.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact header match first, then a unique ASCII case-insensitive match.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        if let Some(i) = self.headers.iter().position(|h| h == name) {
            return Some(i);
        }
        let mut matches = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.eq_ignore_ascii_case(name));
        match (matches.next(), matches.next()) {
            (Some((i, _)), None) => Some(i),
            _ => None,
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.find_column(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// The first `n` rows (a `LIMIT n` preview).
    pub fn head(&self, n: usize) -> RawTable {
        RawTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Expose the raw rows as an all-VARCHAR table so they can be queried
    /// before any typing happens.
    pub fn to_table(&self) -> Result<Table> {
        let schema = Schema::new(
            self.headers
                .iter()
                .map(|h| Column::new(h.clone(), DataType::Text))
                .collect(),
        )?;
        let rows = self
            .rows
            .iter()
            .map(|r| r.iter().map(|f| Value::from(f.clone())).collect())
            .collect();
        Table::new(schema, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable {
            headers: vec!["Order ID".into(), "Product".into()],
            rows: vec![
                vec![Some("1".into()), Some("Cable".into())],
                vec![Some("2".into()), None],
                vec![None, None],
            ],
        }
    }

    #[test]
    fn column_lookup_falls_back_to_case_insensitive() {
        let t = sample();
        assert_eq!(t.find_column("Order ID"), Some(0));
        assert_eq!(t.find_column("order ID"), Some(0));
        assert_eq!(t.find_column("Price Each"), None);
        assert_eq!(t.get(0, "product"), Some("Cable"));
        assert_eq!(t.get(1, "Product"), None);
    }

    #[test]
    fn ambiguous_case_insensitive_match_is_rejected() {
        let t = RawTable::new(vec!["ID".into(), "id".into()]);
        assert_eq!(t.find_column("Id"), None);
        assert_eq!(t.find_column("id"), Some(1));
    }

    #[test]
    fn head_and_text_table() -> anyhow::Result<()> {
        let t = sample();
        assert_eq!(t.head(2).len(), 2);
        assert_eq!(t.head(10).len(), 3);

        let table = t.to_table()?;
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.value(1, "Product")?, &Value::Null);
        assert_eq!(table.value(0, "Order ID")?, &Value::from("1"));
        Ok(())
    }
}
