//! MicroDB: a single-process relational storage core.
//!
//! [`MicroDb`] is the entry point. It owns the catalog and the buffer pool
//! and accepts the structured requests a query front end would deliver:
//! create/drop table, insert, select with a condition, delete with a
//! condition. Surface syntax, parsing, and result rendering belong to the
//! caller; everything here speaks [`Value`]s, [`Condition`]s, and
//! [`RecordSet`]s.
//!
//! # Example
//!
//! ```no_run
//! use microdb::{CompareOp, Condition, Config, FieldInfo, FieldType, MicroDb, Value};
//!
//! let mut db = MicroDb::open(Config::default()).unwrap();
//! db.create_table(
//!     "employees",
//!     vec![
//!         FieldInfo::new("id", FieldType::Integer),
//!         FieldInfo::new("name", FieldType::Text),
//!     ],
//! )
//! .unwrap();
//!
//! db.insert("employees", vec![Value::Int(1), Value::Text("alice".into())])
//!     .unwrap();
//!
//! let hits = db
//!     .select(
//!         "employees",
//!         &Condition::new("id", CompareOp::Eq, Value::Int(1)),
//!     )
//!     .unwrap();
//! assert_eq!(hits.len(), 1);
//!
//! db.shutdown().unwrap();
//! ```

use std::fs;

use buffer::BufferPool;
use catalog::Catalog;

pub use catalog::{FieldInfo, TableInfo};
pub use common::{Config, DbError, DbResult, RecordSet, Row};
pub use expr::{CompareOp, Condition};
pub use types::{FieldType, Value};

/// An open database: a data directory, its catalog, and the buffer pool
/// every file access goes through.
///
/// All operations take `&mut self`; the engine is single-threaded by
/// design and the pool is not re-entrant.
#[derive(Debug)]
pub struct MicroDb {
    catalog: Catalog,
    pool: BufferPool,
}

impl MicroDb {
    /// Open a database rooted at `config.data_dir`, creating the directory
    /// if needed.
    pub fn open(config: Config) -> DbResult<Self> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self {
            catalog: Catalog::new(config.data_dir),
            pool: BufferPool::new(),
        })
    }

    /// Create a table from an ordered field list.
    pub fn create_table(&mut self, table: &str, fields: Vec<FieldInfo>) -> DbResult<()> {
        let info = TableInfo::try_new(fields)?;
        self.catalog.create_table(&mut self.pool, table, &info)
    }

    /// Drop a table and its data.
    pub fn drop_table(&mut self, table: &str) -> DbResult<()> {
        self.catalog.drop_table(table)
    }

    /// The schema of a table, decoded fresh from its definition file.
    pub fn table_info(&mut self, table: &str) -> DbResult<TableInfo> {
        self.catalog.table_info(&mut self.pool, table)
    }

    /// Insert one record; `values` must match the schema in order and type.
    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> DbResult<()> {
        executor::insert(&mut self.pool, &self.catalog, table, &Row::new(values))
    }

    /// Records matching `condition`, in file traversal order.
    pub fn select(&mut self, table: &str, condition: &Condition) -> DbResult<RecordSet> {
        executor::select(&mut self.pool, &self.catalog, table, condition)
    }

    /// Delete records matching `condition`; returns how many were removed.
    pub fn delete(&mut self, table: &str, condition: &Condition) -> DbResult<u64> {
        executor::delete(&mut self.pool, &self.catalog, table, condition)
    }

    /// Shut down: flush every dirty page and close every file.
    ///
    /// Dropping a `MicroDb` without calling this flushes best-effort but
    /// cannot report failures.
    pub fn shutdown(self) -> DbResult<()> {
        self.pool.shutdown()
    }
}
