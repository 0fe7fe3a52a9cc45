pub mod parquet;

pub use self::parquet::{read_parquet, write_parquet, ExportCompression};
