//! The table/view namespace every query runs against.
//!
//! A [`Catalog`] is an explicit value owned by the caller. Tables are
//! materialized snapshots; views are functions of the catalog that are
//! re-evaluated on every [`Catalog::scan`], so they always reflect the
//! current contents of whatever they read.

pub mod aggregate;
pub mod query;

use std::{borrow::Cow, collections::BTreeMap, fmt, path::Path, sync::Arc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::parquet::read_parquet;
use crate::table::{Table, Value};

pub type ViewFn = Arc<dyn Fn(&Catalog) -> Result<Table>>;

#[derive(Clone)]
pub enum Relation {
    Table(Table),
    View(ViewFn),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    View,
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::Table(_) => RelationKind::Table,
            Relation::View(_) => RelationKind::View,
        }
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Table(t) => f
                .debug_struct("Table")
                .field("columns", &t.num_columns())
                .field("rows", &t.num_rows())
                .finish(),
            Relation::View(_) => f.write_str("View"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    relations: BTreeMap<String, Relation>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// `CREATE OR REPLACE TABLE name AS ...`
    pub fn create_or_replace_table(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        debug!(table = %name, rows = table.num_rows(), "create or replace table");
        self.relations.insert(name, Relation::Table(table));
    }

    /// `CREATE OR REPLACE VIEW name AS ...`; `definition` runs on every scan.
    pub fn create_or_replace_view<F>(&mut self, name: impl Into<String>, definition: F)
    where
        F: Fn(&Catalog) -> Result<Table> + 'static,
    {
        let name = name.into();
        debug!(view = %name, "create or replace view");
        self.relations
            .insert(name, Relation::View(Arc::new(definition)));
    }

    pub fn drop_relation(&mut self, name: &str) -> Result<()> {
        self.relations
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownRelation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<RelationKind> {
        self.relations.get(name).map(Relation::kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    /// `FROM name`: borrowed for tables, freshly computed for views.
    pub fn scan(&self, name: &str) -> Result<Cow<'_, Table>> {
        match self.relations.get(name) {
            Some(Relation::Table(t)) => Ok(Cow::Borrowed(t)),
            Some(Relation::View(definition)) => {
                debug!(view = name, "evaluating view");
                definition(self).map(Cow::Owned)
            }
            None => Err(Error::UnknownRelation(name.to_string())),
        }
    }

    /// `INSERT INTO name VALUES ...`. Returns the number of rows appended.
    /// All rows are validated before any is appended.
    pub fn insert_into(&mut self, name: &str, rows: Vec<Vec<Value>>) -> Result<usize> {
        let table = match self.relations.get_mut(name) {
            Some(Relation::Table(t)) => t,
            Some(Relation::View(_)) => {
                return Err(Error::query(format!("cannot insert into view `{name}`")))
            }
            None => return Err(Error::UnknownRelation(name.to_string())),
        };
        let n = rows.len();
        table.extend_rows(rows)?;
        debug!(table = name, rows = n, "inserted rows");
        Ok(n)
    }

    /// Load a Parquet file written by [`crate::export::parquet::write_parquet`]
    /// as table `name`.
    pub fn register_parquet(&mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Result<()> {
        let table = read_parquet(path)?;
        self.create_or_replace_table(name, table);
        Ok(())
    }
}
