// src/table/arrow.rs

use ::arrow::{
    array::{Array, ArrayRef, AsArray, Date32Array, Decimal128Array, Int64Array, StringArray},
    compute::cast,
    datatypes::{
        DataType as ArrowDataType, Decimal128Type, Field as ArrowField, Int64Type,
        Schema as ArrowSchema, SchemaRef,
    },
    record_batch::{RecordBatch, RecordBatchOptions},
};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use super::{Column, DataType, Decimal, Schema, Table, Value};
use crate::error::{Error, Result};

/// Days between 0001-01-01 (CE) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Map a table column type onto its Arrow storage type.
///
/// - INTEGER → Int64
/// - DECIMAL → Decimal128(38, 3)
/// - VARCHAR → Utf8
/// - DATE    → Date32
pub fn map_to_arrow_type(ty: DataType) -> ArrowDataType {
    match ty {
        DataType::Integer => ArrowDataType::Int64,
        DataType::Decimal => ArrowDataType::Decimal128(Decimal::PRECISION, Decimal::SCALE),
        DataType::Text => ArrowDataType::Utf8,
        DataType::Date => ArrowDataType::Date32,
    }
}

/// Inverse of [`map_to_arrow_type`], also accepting the narrower or wider
/// Arrow types a foreign Parquet writer might have used.
pub fn map_from_arrow_type(ty: &ArrowDataType) -> Option<DataType> {
    match ty {
        ArrowDataType::Int8
        | ArrowDataType::Int16
        | ArrowDataType::Int32
        | ArrowDataType::Int64
        | ArrowDataType::UInt8
        | ArrowDataType::UInt16
        | ArrowDataType::UInt32 => Some(DataType::Integer),
        ArrowDataType::Decimal128(_, scale) if *scale <= Decimal::SCALE => {
            Some(DataType::Decimal)
        }
        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 | ArrowDataType::Utf8View => {
            Some(DataType::Text)
        }
        ArrowDataType::Date32 | ArrowDataType::Date64 => Some(DataType::Date),
        _ => None,
    }
}

/// Build an Arrow schema (inside an Arc); every field is nullable.
pub fn build_arrow_schema(schema: &Schema) -> SchemaRef {
    let fields: Vec<ArrowField> = schema
        .columns()
        .iter()
        .map(|c| ArrowField::new(&c.name, map_to_arrow_type(c.data_type), true))
        .collect();
    Arc::new(ArrowSchema::new(fields))
}

pub fn schema_from_arrow(arrow_schema: &ArrowSchema) -> Result<Schema> {
    let columns = arrow_schema
        .fields()
        .iter()
        .map(|f| {
            map_from_arrow_type(f.data_type())
                .map(|ty| Column::new(f.name(), ty))
                .ok_or_else(|| {
                    Error::query(format!(
                        "column `{}` has unsupported type {}",
                        f.name(),
                        f.data_type()
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Schema::new(columns)
}

fn date_to_days(d: NaiveDate) -> i32 {
    d.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn mismatch(column: &Column, value: &Value) -> Error {
    Error::query(format!(
        "value {value:?} does not fit column `{}` of type {}",
        column.name, column.data_type
    ))
}

/// Convert a whole table into one RecordBatch.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let schema = table.schema();
    let rows = table.rows();
    let mut out: Vec<ArrayRef> = Vec::with_capacity(schema.len());

    for (i, column) in schema.columns().iter().enumerate() {
        let cells = rows.iter().map(|r| &r[i]);
        let array: ArrayRef = match column.data_type {
            DataType::Integer => {
                let vals = cells
                    .map(|v| match v {
                        Value::Integer(x) => Ok(Some(*x)),
                        Value::Null => Ok(None),
                        other => Err(mismatch(column, other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(Int64Array::from(vals))
            }
            DataType::Decimal => {
                let vals = cells
                    .map(|v| match v {
                        Value::Decimal(x) => Ok(Some(x.units())),
                        Value::Null => Ok(None),
                        other => Err(mismatch(column, other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(
                    Decimal128Array::from(vals)
                        .with_precision_and_scale(Decimal::PRECISION, Decimal::SCALE)?,
                )
            }
            DataType::Text => {
                let vals = cells
                    .map(|v| match v {
                        Value::Text(x) => Ok(Some(x.as_str())),
                        Value::Null => Ok(None),
                        other => Err(mismatch(column, other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(StringArray::from(vals))
            }
            DataType::Date => {
                let vals = cells
                    .map(|v| match v {
                        Value::Date(x) => Ok(Some(date_to_days(*x))),
                        Value::Null => Ok(None),
                        other => Err(mismatch(column, other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(Date32Array::from(vals))
            }
        };
        out.push(array);
    }

    // explicit row count so zero-column tables still convert
    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(build_arrow_schema(schema), out, &options)
        .map_err(Into::into)
}

/// Rebuild a table from RecordBatches sharing `arrow_schema`.
pub fn from_record_batches(arrow_schema: &ArrowSchema, batches: &[RecordBatch]) -> Result<Table> {
    let schema = schema_from_arrow(arrow_schema)?;
    let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total);

    for batch in batches {
        let base = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(schema.len())));

        for (i, column) in schema.columns().iter().enumerate() {
            // normalize widths/scales/encodings to the canonical storage type
            let arr = cast(batch.column(i), &map_to_arrow_type(column.data_type))?;
            for r in 0..arr.len() {
                let value = if arr.is_null(r) {
                    Value::Null
                } else {
                    match column.data_type {
                        DataType::Integer => Value::Integer(arr.as_primitive::<Int64Type>().value(r)),
                        DataType::Decimal => {
                            let units = arr.as_primitive::<Decimal128Type>().value(r);
                            Value::Decimal(Decimal::from_units(units).ok_or_else(|| {
                                Error::query(format!("decimal out of range in `{}`", column.name))
                            })?)
                        }
                        DataType::Text => Value::Text(arr.as_string::<i32>().value(r).to_string()),
                        DataType::Date => {
                            let dates = arr
                                .as_any()
                                .downcast_ref::<Date32Array>()
                                .ok_or_else(|| Error::query("expected Date32 column"))?;
                            Value::Date(dates.value_as_date(r).ok_or_else(|| {
                                Error::query(format!("date out of range in `{}`", column.name))
                            })?)
                        }
                    }
                };
                rows[base + r].push(value);
            }
        }
    }

    Table::new(schema, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::arrow::array::Int32Array;

    #[test]
    fn typed_columns_map_to_arrow() -> anyhow::Result<()> {
        let schema = Schema::from_pairs([
            ("order_id", DataType::Integer),
            ("price_each", DataType::Decimal),
            ("product", DataType::Text),
            ("order_date", DataType::Date),
        ])?;
        let day = NaiveDate::from_ymd_opt(2019, 12, 30).unwrap();
        let table = Table::new(
            schema,
            vec![
                vec![
                    Value::from(295665),
                    Value::from(Decimal::from(1700)),
                    Value::from("Macbook Pro Laptop"),
                    Value::from(day),
                ],
                vec![Value::from(1), Value::Null, Value::Null, Value::Null],
            ],
        )?;

        let batch = to_record_batch(&table)?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(
            batch.schema().field(1).data_type(),
            &ArrowDataType::Decimal128(38, 3)
        );
        let dates = batch.column(3).as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(dates.value_as_date(0), Some(day));

        let back = from_record_batches(&batch.schema(), &[batch.clone()])?;
        assert_eq!(back, table);
        Ok(())
    }

    #[test]
    fn narrower_integers_are_widened() -> anyhow::Result<()> {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
            "month",
            ArrowDataType::Int32,
            true,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int32Array::from(vec![Some(12), None]))],
        )?;
        let table = from_record_batches(&schema, &[batch])?;
        assert_eq!(table.schema().columns()[0].data_type, DataType::Integer);
        assert_eq!(table.rows(), &[vec![Value::from(12)], vec![Value::Null]]);
        Ok(())
    }

    #[test]
    fn zero_column_table_keeps_row_count() -> anyhow::Result<()> {
        let table = Table::new(Schema::default(), vec![vec![], vec![]])?;
        assert_eq!(to_record_batch(&table)?.num_rows(), 2);
        Ok(())
    }
}
