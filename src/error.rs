//! Error taxonomy for loading, transforming, querying and exporting tables.

use std::path::PathBuf;
use thiserror::Error;

use crate::table::DataType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No input file matched the glob pattern.
    #[error("no input files matched `{0}`")]
    NotFound(String),

    /// Malformed glob, header, row shape or CSV syntax.
    #[error("parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// A non-guarded type conversion failed.
    #[error("cannot cast {value:?} to {target} (column `{column}`)")]
    Cast {
        column: String,
        value: String,
        target: DataType,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown table or view `{0}`")]
    UnknownRelation(String),

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    /// Schema, arity or type misuse of a table or query.
    #[error("invalid query: {0}")]
    Query(String),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl Error {
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn cast(column: impl Into<String>, value: impl Into<String>, target: DataType) -> Self {
        Self::Cast {
            column: column.into(),
            value: value.into(),
            target,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}
