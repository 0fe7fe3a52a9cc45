pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod process;
pub mod table;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use table::{DataType, Decimal, Table, Value};
