// src/catalog/query.rs
//
// Read-only relational operators over materialized tables. Each returns a
// new table and never touches the catalog.

use std::{cmp::Ordering, collections::HashMap};

use crate::error::{Error, Result};
use crate::table::{Column, DataType, Decimal, Schema, Table, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

fn small_table(names: &[&str], rows: Vec<Vec<Value>>, types: &[DataType]) -> Result<Table> {
    let schema = Schema::new(
        names
            .iter()
            .zip(types)
            .map(|(n, t)| Column::new(*n, *t))
            .collect(),
    )?;
    Table::new(schema, rows)
}

/// `WHERE column = value`. Null never matches.
pub fn filter_eq(table: &Table, column: &str, value: &Value) -> Result<Table> {
    let idx = table.column_index(column)?;
    let rows = table
        .rows()
        .iter()
        .filter(|r| !r[idx].is_null() && r[idx] == *value)
        .cloned()
        .collect();
    Table::new(table.schema().clone(), rows)
}

/// `SELECT COUNT(*)`
pub fn count_rows(table: &Table) -> Result<Table> {
    small_table(
        &["count_star()"],
        vec![vec![Value::from(table.num_rows() as i64)]],
        &[DataType::Integer],
    )
}

/// `DESCRIBE`: one row per column.
pub fn describe(table: &Table) -> Result<Table> {
    let rows = table
        .schema()
        .columns()
        .iter()
        .map(|c| vec![Value::from(c.name.as_str()), Value::from(c.data_type.as_str())])
        .collect();
    small_table(
        &["column_name", "column_type"],
        rows,
        &[DataType::Text, DataType::Text],
    )
}

/// Per column: type, total rows and how many of them are null.
pub fn summarize(table: &Table) -> Result<Table> {
    let total = table.num_rows() as i64;
    let rows = table
        .schema()
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let nulls = table.rows().iter().filter(|r| r[i].is_null()).count() as i64;
            vec![
                Value::from(c.name.as_str()),
                Value::from(c.data_type.as_str()),
                Value::from(total),
                Value::from(nulls),
            ]
        })
        .collect();
    small_table(
        &["column_name", "column_type", "row_count", "null_count"],
        rows,
        &[
            DataType::Text,
            DataType::Text,
            DataType::Integer,
            DataType::Integer,
        ],
    )
}

fn indices(table: &Table, columns: &[&str]) -> Result<Vec<usize>> {
    columns.iter().map(|c| table.column_index(c)).collect()
}

/// `SELECT * EXCLUDE (columns)`
pub fn exclude(table: &Table, columns: &[&str]) -> Result<Table> {
    let dropped = indices(table, columns)?;
    let keep: Vec<usize> = (0..table.num_columns())
        .filter(|i| !dropped.contains(i))
        .collect();
    project(table, &keep)
}

fn project(table: &Table, keep: &[usize]) -> Result<Table> {
    let cols = table.schema().columns();
    let schema = Schema::new(keep.iter().map(|&i| cols[i].clone()).collect())?;
    let rows = table
        .rows()
        .iter()
        .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
        .collect();
    Table::new(schema, rows)
}

/// `SELECT MIN(c1), MIN(c2), ...` ignoring nulls; an all-null column yields null.
pub fn min_columns(table: &Table, columns: &[&str]) -> Result<Table> {
    let idx = indices(table, columns)?;
    let cols = table.schema().columns();

    let mut mins: Vec<Value> = vec![Value::Null; idx.len()];
    for row in table.rows() {
        for (slot, &i) in mins.iter_mut().zip(&idx) {
            let v = &row[i];
            if v.is_null() {
                continue;
            }
            if slot.is_null() || v.compare(slot) == Some(Ordering::Less) {
                *slot = v.clone();
            }
        }
    }

    let schema = Schema::new(
        idx.iter()
            .map(|&i| Column::new(format!("min({})", cols[i].name), cols[i].data_type))
            .collect(),
    )?;
    Table::new(schema, vec![mins])
}

fn add(column: &str, acc: &Value, v: &Value) -> Result<Value> {
    let overflow = || Error::cast(column, format!("{acc} + {v}"), DataType::Decimal);
    match (acc, v) {
        (_, Value::Null) => Ok(acc.clone()),
        (Value::Null, _) => Ok(v.clone()),
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(*b)
            .map(Value::Integer)
            .ok_or_else(|| Error::cast(column, format!("{a} + {b}"), DataType::Integer)),
        (Value::Decimal(a), Value::Decimal(b)) => {
            a.checked_add(*b).map(Value::Decimal).ok_or_else(overflow)
        }
        _ => Err(Error::query(format!("cannot sum {v:?} in `{column}`"))),
    }
}

/// `SELECT key, SUM(value) AS alias GROUP BY key`, groups in first-seen order.
/// Nulls in `key` form their own group.
pub fn group_sum(table: &Table, key: &str, value: &str, alias: &str) -> Result<Table> {
    let k = table.column_index(key)?;
    let v = table.column_index(value)?;
    let cols = table.schema().columns();
    let value_type = cols[v].data_type;
    if !matches!(value_type, DataType::Integer | DataType::Decimal) {
        return Err(Error::query(format!(
            "SUM needs a numeric column, `{value}` is {value_type}"
        )));
    }

    let mut slots: HashMap<&Value, usize> = HashMap::new();
    let mut groups: Vec<Vec<Value>> = Vec::new();
    for row in table.rows() {
        let slot = *slots.entry(&row[k]).or_insert_with(|| {
            groups.push(vec![row[k].clone(), Value::Null]);
            groups.len() - 1
        });
        groups[slot][1] = add(alias, &groups[slot][1], &row[v])?;
    }

    let schema = Schema::new(vec![
        cols[k].clone(),
        Column::new(alias, value_type),
    ])?;
    Table::new(schema, groups)
}

/// `ORDER BY column`, stable, nulls last in both directions.
pub fn order_by(table: &Table, column: &str, order: SortOrder) -> Result<Table> {
    let idx = table.column_index(column)?;
    let mut rows = table.rows().to_vec();
    rows.sort_by(|a, b| match (a[idx].is_null(), b[idx].is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = a[idx].compare(&b[idx]).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    });
    Table::new(table.schema().clone(), rows)
}

/// `LIMIT n`
pub fn limit(table: &Table, n: usize) -> Result<Table> {
    Table::new(
        table.schema().clone(),
        table.rows().iter().take(n).cloned().collect(),
    )
}

/// Sum of a numeric column, ignoring nulls. `None` when every value is null.
pub fn sum(table: &Table, column: &str) -> Result<Option<Decimal>> {
    let idx = table.column_index(column)?;
    let mut acc = Value::Null;
    for row in table.rows() {
        acc = add(column, &acc, &row[idx])?;
    }
    Ok(match acc {
        Value::Integer(i) => Some(Decimal::from(i)),
        Value::Decimal(d) => Some(d),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn d(s: &str) -> Value {
        Value::from(Decimal::parse(s).unwrap())
    }

    fn orders() -> crate::Result<Table> {
        let schema = Schema::from_pairs([
            ("order_id", DataType::Integer),
            ("city", DataType::Text),
            ("revenue", DataType::Decimal),
        ])?;
        Table::new(
            schema,
            vec![
                vec![Value::from(3), Value::from(" Dallas"), d("11.95")],
                vec![Value::from(1), Value::from(" Boston"), d("1700")],
                vec![Value::from(2), Value::from(" Dallas"), d("99.99")],
                vec![Value::from(4), Value::Null, Value::Null],
            ],
        )
    }

    #[test]
    fn point_filter() -> Result<()> {
        let t = orders()?;
        let hit = filter_eq(&t, "order_id", &Value::from(2))?;
        assert_eq!(hit.num_rows(), 1);
        assert_eq!(hit.value(0, "revenue")?, &d("99.99"));
        assert!(filter_eq(&t, "city", &Value::Null)?.is_empty());
        assert!(filter_eq(&t, "order_id", &Value::from("2"))?.is_empty());
        Ok(())
    }

    #[test]
    fn describe_and_summarize() -> Result<()> {
        let t = orders()?;
        let desc = describe(&t)?;
        assert_eq!(desc.num_rows(), 3);
        assert_eq!(desc.value(2, "column_type")?, &Value::from("DECIMAL(38,3)"));

        let summary = summarize(&t)?;
        assert_eq!(summary.value(1, "null_count")?, &Value::from(1));
        assert_eq!(summary.value(0, "null_count")?, &Value::from(0));
        assert_eq!(summary.value(2, "row_count")?, &Value::from(4));

        assert_eq!(count_rows(&t)?.value(0, "count_star()")?, &Value::from(4));
        Ok(())
    }

    #[test]
    fn exclude_keeps_remaining_order() -> Result<()> {
        let t = exclude(&orders()?, &["city"])?;
        assert_eq!(t.schema().names().collect::<Vec<_>>(), vec!["order_id", "revenue"]);
        assert_eq!(t.rows()[1], vec![Value::from(1), d("1700")]);
        assert!(matches!(
            exclude(&orders()?, &["nope"]),
            Err(crate::Error::UnknownColumn(_))
        ));
        Ok(())
    }

    #[test]
    fn minimum_per_column_skips_nulls() -> Result<()> {
        let t = min_columns(&orders()?, &["order_id", "city", "revenue"])?;
        assert_eq!(
            t.schema().names().collect::<Vec<_>>(),
            vec!["min(order_id)", "min(city)", "min(revenue)"]
        );
        assert_eq!(
            t.rows()[0],
            vec![Value::from(1), Value::from(" Boston"), d("11.95")]
        );

        let empty = min_columns(&limit(&orders()?, 0)?, &["order_id"])?;
        assert_eq!(empty.rows()[0], vec![Value::Null]);
        Ok(())
    }

    #[test]
    fn grouped_sum_then_sort_descending() -> Result<()> {
        let grouped = group_sum(&orders()?, "city", "revenue", "total")?;
        assert_eq!(grouped.num_rows(), 3);
        assert_eq!(grouped.rows()[0], vec![Value::from(" Dallas"), d("111.94")]);
        assert_eq!(grouped.rows()[2], vec![Value::Null, Value::Null]);

        let ranked = order_by(&grouped, "total", SortOrder::Descending)?;
        let cities: Vec<_> = ranked.column("city")?.cloned().collect();
        assert_eq!(
            cities,
            vec![Value::from(" Boston"), Value::from(" Dallas"), Value::Null]
        );
        Ok(())
    }

    #[test]
    fn ascending_sort_keeps_nulls_last() -> Result<()> {
        let t = order_by(&orders()?, "revenue", SortOrder::Ascending)?;
        let ids: Vec<_> = t.column("order_id")?.cloned().collect();
        assert_eq!(
            ids,
            vec![Value::from(3), Value::from(2), Value::from(1), Value::from(4)]
        );
        Ok(())
    }

    #[test]
    fn sum_rejects_text() -> Result<()> {
        assert!(group_sum(&orders()?, "order_id", "city", "x").is_err());
        assert_eq!(sum(&orders()?, "revenue")?, Decimal::parse("1811.94"));
        assert_eq!(sum(&orders()?, "order_id")?, Some(Decimal::from(10)));
        Ok(())
    }
}
