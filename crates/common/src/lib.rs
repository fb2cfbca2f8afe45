
use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};
use thiserror::Error;
use types::Value;

/// Upper bound on the number of fields in one table schema.
pub const MAX_FIELD: usize = 40;

/// On-disk width of a field name, including its NUL terminator.
pub const MAX_FIELD_NAME: usize = 20;

/// On-disk width of a text value, including its NUL terminator.
pub const MAX_STRING: usize = 20;

/// Upper bound on the byte length of a file name handed to the file layer.
pub const MAX_FILENAME: usize = 256;

/// Zero-based index of a page within a file.
/// Examples:
/// - `let def_page = PageId(0);`
/// - `let next = PageId(page.0 + 1);`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// Ticket for a file opened through the buffer pool. Handles are issued by
/// `open` and become invalid after `close`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

/// Positional record representation backed by `types::Value`, one value per
/// schema field in schema order.
/// Examples:
/// - `let row = Row::new(vec![Value::Int(1)]);`
/// - `let row = Row::new(vec![Value::Int(1), Value::Text("alice".into())]);`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Result of a select: column labels plus matching rows in scan order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RecordSet {
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical error type shared across database subsystems.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error("schema: {0}")]
    Schema(String),
    #[error("capacity: {0}")]
    Capacity(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Runtime configuration for the database components.
///
/// Page size, buffer count, and the field/value limits are compile-time
/// constants; the data directory is the only runtime knob.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_db"))
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory where table definition and data files live.
    #[builder(default = PathBuf::from("./db_data"))]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db_data"),
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, FileId, PageId, RecordSet, Row};
    pub use types::{FieldType, Value};
}
