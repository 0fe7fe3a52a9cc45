// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::export::ExportCompression;
use crate::process::{MissingInput, SalesColumns};

pub const CONFIG_ENV: &str = "SALES_PIPELINE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.yaml";

/// Run settings. Every field has a default, so an empty YAML document (or
/// no file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob of input CSV files.
    pub input_glob: String,
    /// Where the aggregated view is exported.
    pub export_path: PathBuf,
    pub missing_input: MissingInput,
    /// Rows shown by the load preview.
    pub preview_rows: usize,
    pub compression: ExportCompression,
    /// Raw `Order ID` value used for the point-lookup report.
    pub lookup_order_id: String,
    pub columns: SalesColumns,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_glob: "dataset/*.csv".into(),
            export_path: PathBuf::from("aggregated_sales.parquet"),
            missing_input: MissingInput::default(),
            preview_rows: 10,
            compression: ExportCompression::default(),
            lookup_order_id: "295667".into(),
            columns: SalesColumns::default(),
        }
    }
}

impl Config {
    /// Read `path` as YAML if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The file named by `$SALES_PIPELINE_CONFIG`, else `pipeline.yaml` when
    /// it exists in the working directory.
    pub fn locate() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV).map(PathBuf::from).or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        })
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        serde_yaml::from_reader(f).with_context(|| format!("parsing config {}", path.display()))
    }

    /// `SALES_INPUT_GLOB` and `SALES_EXPORT_PATH` win over file values.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(glob) = lookup("SALES_INPUT_GLOB") {
            self.input_glob = glob;
        }
        if let Some(path) = lookup("SALES_EXPORT_PATH") {
            self.export_path = PathBuf::from(path);
        }
    }
}
