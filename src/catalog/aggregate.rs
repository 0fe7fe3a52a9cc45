// src/catalog/aggregate.rs
use chrono::Datelike;
use std::collections::HashMap;
use tracing::debug;

use super::query::{group_sum, order_by, SortOrder};
use super::Catalog;
use crate::error::{Error, Result};
use crate::table::{Column, DataType, Decimal, Schema, Table, Value};

pub const AGGREGATED_SALES_VIEW: &str = "aggregated_sales";

/// One output row of the `aggregated_sales` view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSalesRecord {
    pub order_id: i64,
    pub nb_orders: i64,
    pub month: Option<i64>,
    pub city: Option<String>,
    pub revenue: Option<Decimal>,
}

impl AggregatedSalesRecord {
    pub fn from_row(row: &[Value]) -> Result<Self> {
        let [order_id, nb_orders, month, city, revenue] = row else {
            return Err(Error::query(format!(
                "expected 5 aggregated columns, got {}",
                row.len()
            )));
        };
        let order_id = order_id
            .as_integer()
            .ok_or_else(|| Error::query("aggregated row without an order id"))?;
        let nb_orders = nb_orders
            .as_integer()
            .ok_or_else(|| Error::query("aggregated row without an order count"))?;
        Ok(Self {
            order_id,
            nb_orders,
            month: month.as_integer(),
            city: city.as_text().map(str::to_string),
            revenue: revenue.as_decimal(),
        })
    }
}

pub fn aggregated_sales_schema() -> Schema {
    Schema::known(vec![
        Column::new("order_id", DataType::Integer),
        Column::new("nb_orders", DataType::Integer),
        Column::new("month", DataType::Integer),
        Column::new("city", DataType::Text),
        Column::new("revenue", DataType::Decimal),
    ])
}

/// Second comma-separated segment of an address, untrimmed.
///
/// `"136 Church St, New York City, NY 10001"` → `" New York City"`
pub fn city_of(address: &str) -> Option<&str> {
    address.split(',').nth(1)
}

fn typed_column(table: &Table, name: &str, ty: DataType) -> Result<usize> {
    let idx = table.column_index(name)?;
    let actual = table.schema().columns()[idx].data_type;
    if actual != ty {
        return Err(Error::query(format!(
            "column `{name}` is {actual}, expected {ty}"
        )));
    }
    Ok(idx)
}

/// Group a `sales`-shaped table by every non-aggregate output column
/// (`order_id`, `month`, `city`), counting rows and summing
/// `quantity * price_each` per group.
///
/// Groups come out in first-appearance order. Because `order_id` is part of
/// the key, each distinct order yields its own row.
pub fn aggregate_sales(sales: &Table) -> Result<Table> {
    let order_id = typed_column(sales, "order_id", DataType::Integer)?;
    let quantity = typed_column(sales, "quantity", DataType::Integer)?;
    let price = typed_column(sales, "price_each", DataType::Decimal)?;
    let order_date = typed_column(sales, "order_date", DataType::Date)?;
    let address = typed_column(sales, "purchase_address", DataType::Text)?;

    let mut slots: HashMap<[Value; 3], usize> = HashMap::new();
    let mut groups: Vec<([Value; 3], i64, Option<Decimal>)> = Vec::new();

    for row in sales.rows() {
        let key = [
            row[order_id].clone(),
            Value::from(row[order_date].as_date().map(|d| i64::from(d.month()))),
            Value::from(row[address].as_text().and_then(city_of)),
        ];
        let line = match (row[quantity].as_integer(), row[price].as_decimal()) {
            (Some(q), Some(p)) => Some(p.checked_mul_int(q).ok_or_else(|| {
                Error::cast("revenue", format!("{q} * {p}"), DataType::Decimal)
            })?),
            _ => None,
        };

        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push((key.clone(), 0, None));
                slots.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        let group = &mut groups[slot];
        group.1 += 1;
        if let Some(line) = line {
            let total = group.2.unwrap_or(Decimal::ZERO);
            group.2 = Some(total.checked_add(line).ok_or_else(|| {
                Error::cast("revenue", format!("{total} + {line}"), DataType::Decimal)
            })?);
        }
    }

    debug!(input = sales.num_rows(), groups = groups.len(), "aggregated sales");
    let rows = groups
        .into_iter()
        .map(|([order_id, month, city], nb_orders, revenue)| {
            vec![order_id, Value::from(nb_orders), month, city, Value::from(revenue)]
        })
        .collect();
    Table::new(aggregated_sales_schema(), rows)
}

/// Install `aggregated_sales` as a view over `source`, re-aggregated on every scan.
pub fn register_aggregated_sales(catalog: &mut Catalog, source: &str) {
    let source = source.to_string();
    catalog.create_or_replace_view(AGGREGATED_SALES_VIEW, move |c: &Catalog| {
        aggregate_sales(&*c.scan(&source)?)
    });
}

/// Total revenue per city, highest first.
pub fn city_revenue_ranking(aggregated: &Table) -> Result<Table> {
    let totals = group_sum(aggregated, "city", "revenue", "total")?;
    order_by(&totals, "total", SortOrder::Descending)
}
