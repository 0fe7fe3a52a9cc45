// src/process/transform.rs
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::convert::{cast_decimal, cast_integer, try_cast_integer};
use super::date_parser::cast_order_date;
use super::raw_table::RawTable;
use crate::error::{Error, Result};
use crate::table::{Column, DataType, Decimal, Schema, Table, Value};

pub const SALES_TABLE: &str = "sales";

/// Source header names for each sales field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SalesColumns {
    pub order_id: String,
    pub product: String,
    pub quantity: String,
    pub price_each: String,
    pub order_date: String,
    pub purchase_address: String,
}

impl Default for SalesColumns {
    fn default() -> Self {
        Self {
            order_id: "Order ID".into(),
            product: "Product".into(),
            quantity: "Quantity Ordered".into(),
            price_each: "Price Each".into(),
            order_date: "Order Date".into(),
            purchase_address: "Purchase Address".into(),
        }
    }
}

/// A typed order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    pub order_id: i64,
    pub product: Option<String>,
    pub quantity: Option<i64>,
    pub price_each: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
    pub purchase_address: Option<String>,
}

impl SalesRecord {
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.order_id),
            Value::from(self.product.clone()),
            Value::from(self.quantity),
            Value::from(self.price_each),
            Value::from(self.order_date),
            Value::from(self.purchase_address.clone()),
        ]
    }
}

/// `order_id INTEGER, product VARCHAR, quantity INTEGER, price_each DECIMAL,
/// order_date DATE, purchase_address VARCHAR`
pub fn sales_schema() -> Schema {
    Schema::known(vec![
        Column::new("order_id", DataType::Integer),
        Column::new("product", DataType::Text),
        Column::new("quantity", DataType::Integer),
        Column::new("price_each", DataType::Decimal),
        Column::new("order_date", DataType::Date),
        Column::new("purchase_address", DataType::Text),
    ])
}

struct Positions {
    order_id: usize,
    product: usize,
    quantity: usize,
    price_each: usize,
    order_date: usize,
    purchase_address: usize,
}

impl Positions {
    fn resolve(raw: &RawTable, cols: &SalesColumns) -> Result<Self> {
        let find = |name: &str| {
            raw.find_column(name)
                .ok_or_else(|| Error::UnknownColumn(name.to_string()))
        };
        Ok(Self {
            order_id: find(&cols.order_id)?,
            product: find(&cols.product)?,
            quantity: find(&cols.quantity)?,
            price_each: find(&cols.price_each)?,
            order_date: find(&cols.order_date)?,
            purchase_address: find(&cols.purchase_address)?,
        })
    }
}

/// Type every row of `raw` into a [`SalesRecord`].
///
/// Rows whose order id is not an integer are skipped. Every other cast is
/// unguarded: one bad quantity, price or date fails the whole transform.
pub fn transform_sales(raw: &RawTable, cols: &SalesColumns) -> Result<Vec<SalesRecord>> {
    // an empty load has no header at all, so there is nothing to resolve
    if raw.headers.is_empty() {
        return Ok(Vec::new());
    }
    let pos = Positions::resolve(raw, cols)?;

    let mut out = Vec::with_capacity(raw.len());
    for row in &raw.rows {
        let field = |i: usize| row[i].as_deref();
        let Some(order_id) = field(pos.order_id).and_then(try_cast_integer) else {
            continue;
        };
        out.push(SalesRecord {
            order_id,
            product: field(pos.product).map(str::to_string),
            quantity: cast_integer(&cols.quantity, field(pos.quantity))?,
            price_each: cast_decimal(&cols.price_each, field(pos.price_each))?,
            order_date: cast_order_date(&cols.order_date, field(pos.order_date))?,
            purchase_address: field(pos.purchase_address).map(str::to_string),
        });
    }
    debug!(
        input = raw.len(),
        output = out.len(),
        skipped = raw.len() - out.len(),
        "typed sales rows"
    );
    Ok(out)
}

pub fn sales_table(records: &[SalesRecord]) -> Result<Table> {
    Table::new(
        sales_schema(),
        records.iter().map(SalesRecord::to_row).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::loader::read_csv_file;
    use crate::test_support::EXAMPLE_CSV;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn example() -> Result<RawTable> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(EXAMPLE_CSV.as_bytes())?;
        Ok(read_csv_file(tmp.path())?)
    }

    #[test]
    fn example_yields_exactly_one_record() -> Result<()> {
        let records = transform_sales(&example()?, &SalesColumns::default())?;
        assert_eq!(
            records,
            vec![SalesRecord {
                order_id: 295665,
                product: Some("Macbook Pro Laptop".into()),
                quantity: Some(1),
                price_each: Decimal::parse("1700.00"),
                order_date: NaiveDate::from_ymd_opt(2019, 12, 30),
                purchase_address: Some("136 Church St, New York City, NY 10001".into()),
            }]
        );
        Ok(())
    }

    #[test]
    fn transform_is_deterministic_and_ordered() -> Result<()> {
        let mut raw = example()?;
        let mut second = raw.rows[0].clone();
        second[0] = Some("295666".into());
        raw.rows.push(second);

        let a = transform_sales(&raw, &SalesColumns::default())?;
        let b = transform_sales(&raw, &SalesColumns::default())?;
        assert_eq!(a, b);
        let ids: Vec<_> = a.iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![295665, 295666]);
        Ok(())
    }

    #[test]
    fn unguarded_cast_fails_the_whole_transform() -> Result<()> {
        let mut raw = example()?;
        raw.rows[0][2] = Some("one".into());
        let err = transform_sales(&raw, &SalesColumns::default());
        assert!(matches!(
            err,
            Err(Error::Cast { target: DataType::Integer, .. })
        ));
        Ok(())
    }

    #[test]
    fn nulls_pass_through_untouched() -> Result<()> {
        let raw = RawTable {
            headers: SalesColumns::default().to_headers(),
            rows: vec![vec![Some("7".into()), None, None, None, None, None]],
        };
        let records = transform_sales(&raw, &SalesColumns::default())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, None);
        assert_eq!(records[0].order_date, None);
        Ok(())
    }

    #[test]
    fn missing_header_is_reported() {
        let raw = RawTable::new(vec!["Order ID".into()]);
        let err = transform_sales(&raw, &SalesColumns::default());
        assert!(matches!(err, Err(Error::UnknownColumn(c)) if c == "Product"));
    }

    #[test]
    fn table_matches_schema() -> Result<()> {
        let records = transform_sales(&example()?, &SalesColumns::default())?;
        let table = sales_table(&records)?;
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.value(0, "price_each")?.to_string(), "1700.000");
        assert_eq!(table.value(0, "order_date")?.to_string(), "2019-12-30");
        Ok(())
    }

    impl SalesColumns {
        fn to_headers(&self) -> Vec<String> {
            vec![
                self.order_id.clone(),
                self.product.clone(),
                self.quantity.clone(),
                self.price_each.clone(),
                self.order_date.clone(),
                self.purchase_address.clone(),
            ]
        }
    }
}
