// src/process/mod.rs
pub mod cleaner;
pub mod convert;
pub mod date_parser;
pub mod loader;
pub mod raw_table;
pub mod transform;

pub use cleaner::{drop_empty_rows, retain_integer_key};
pub use loader::{load_csv_glob, LoadStrategy, MissingInput};
pub use raw_table::{RawRow, RawTable};
pub use transform::{sales_schema, sales_table, transform_sales, SalesColumns, SalesRecord, SALES_TABLE};
