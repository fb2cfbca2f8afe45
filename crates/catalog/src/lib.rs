//! Table schemas and their on-disk definition files.
//!
//! Each table `T` is a pair of files in the data directory: `T.def` holds
//! the schema in page 0, `T.dat` holds the records. The definition page
//! layout is fixed-width little-endian:
//!
//! ```text
//! [num_fields: u32][name: MAX_FIELD_NAME bytes, NUL-padded][type: u32]...
//! ```
//!
//! Schemas are written once at table creation and decoded fresh on every
//! lookup; they are never rewritten in place.

use std::mem::size_of;
use std::path::{Path, PathBuf};

use ahash::RandomState;
use buffer::BufferPool;
use common::{DbError, DbResult, MAX_FIELD, MAX_FIELD_NAME, PageId};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use storage::{PAGE_SIZE, PageBuf};
use types::FieldType;

type Map<K, V> = HashMap<K, V, RandomState>;

/// File extension of a table's definition file.
pub const DEF_FILE_EXT: &str = "def";

/// File extension of a table's data file.
pub const DATA_FILE_EXT: &str = "dat";

/// One field of a table schema.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: FieldType,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered table schema plus a name lookup table.
///
/// Field order is part of the schema: it fixes both the definition-file
/// layout and the byte layout of every record.
#[derive(Clone, Debug)]
pub struct TableInfo {
    fields: Vec<FieldInfo>,
    name_to_ordinal: Map<String, usize>,
}

impl TableInfo {
    /// Validate and build a schema.
    ///
    /// Rejects an empty field list, more than `MAX_FIELD` fields, names that
    /// do not fit `MAX_FIELD_NAME` with their NUL terminator, and duplicate
    /// names.
    pub fn try_new(fields: Vec<FieldInfo>) -> DbResult<Self> {
        if fields.is_empty() {
            return Err(DbError::Capacity(
                "table must contain at least one field".into(),
            ));
        }
        if fields.len() > MAX_FIELD {
            return Err(DbError::Capacity(format!(
                "table has {} fields, the limit is {MAX_FIELD}",
                fields.len()
            )));
        }
        let mut name_to_ordinal = Map::default();
        for (ordinal, field) in fields.iter().enumerate() {
            if field.name.is_empty() || field.name.len() > MAX_FIELD_NAME - 1 {
                return Err(DbError::Capacity(format!(
                    "field name '{}' is empty or longer than {} bytes",
                    field.name,
                    MAX_FIELD_NAME - 1
                )));
            }
            if name_to_ordinal.insert(field.name.clone(), ordinal).is_some() {
                return Err(DbError::Catalog(format!(
                    "duplicate field '{}' found while building schema",
                    field.name
                )));
            }
        }
        Ok(Self {
            fields,
            name_to_ordinal,
        })
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the ordinal for a field name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.name_to_ordinal.get(name).copied()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

fn put_u32(page: &mut PageBuf, at: &mut usize, value: u32) {
    page[*at..*at + size_of::<u32>()].copy_from_slice(&value.to_le_bytes());
    *at += size_of::<u32>();
}

fn get_u32(page: &PageBuf, at: &mut usize) -> u32 {
    let mut raw = [0u8; size_of::<u32>()];
    raw.copy_from_slice(&page[*at..*at + size_of::<u32>()]);
    *at += size_of::<u32>();
    u32::from_le_bytes(raw)
}

/// Encode a schema into a definition page. Unused bytes stay zero.
fn encode_def_page(info: &TableInfo) -> Box<PageBuf> {
    let mut page = storage::zeroed_page();
    let mut at = 0;
    put_u32(&mut page, &mut at, info.num_fields() as u32);
    for field in info.fields() {
        let name = field.name.as_bytes();
        page[at..at + name.len()].copy_from_slice(name);
        at += MAX_FIELD_NAME;
        put_u32(&mut page, &mut at, field.ty.code());
    }
    page
}

/// Decode a definition page, trusting the in-file NUL terminators.
///
/// Validation of what was read is `TableInfo::try_new`'s job, so a page
/// claiming zero or too many fields fails the same way an over-limit
/// schema does at creation.
fn decode_def_page(page: &PageBuf) -> DbResult<TableInfo> {
    let mut at = 0;
    let num_fields = get_u32(page, &mut at) as usize;

    let mut fields = Vec::new();
    for _ in 0..num_fields {
        // A claimed count the page cannot hold stops at the page end;
        // whatever arrived is still handed to the validator below.
        if at + MAX_FIELD_NAME + size_of::<u32>() > PAGE_SIZE {
            break;
        }
        let raw = &page[at..at + MAX_FIELD_NAME];
        at += MAX_FIELD_NAME;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(MAX_FIELD_NAME);
        let name = std::str::from_utf8(&raw[..end])
            .map_err(|_| DbError::Catalog("field name in definition page is not UTF-8".into()))?;
        let ty = FieldType::from_code(get_u32(page, &mut at));
        fields.push(FieldInfo::new(name, ty));
    }
    TableInfo::try_new(fields)
}

/// Creates, drops, and looks up tables under one data directory.
#[derive(Clone, Debug)]
pub struct Catalog {
    data_dir: PathBuf,
}

impl Catalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a table's definition file.
    pub fn def_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.{DEF_FILE_EXT}"))
    }

    /// Path of a table's data file.
    pub fn dat_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.{DATA_FILE_EXT}"))
    }

    /// Create a table: both files, then the schema into page 0 of `.def`.
    ///
    /// Fails if either file already exists. If the `.dat` cannot be created
    /// after the `.def` was, the `.def` is unlinked best-effort so a failed
    /// create never leaves a table the catalog can see but no data file can
    /// serve.
    pub fn create_table(
        &self,
        pool: &mut BufferPool,
        table: &str,
        info: &TableInfo,
    ) -> DbResult<()> {
        let def = self.def_path(table);
        let dat = self.dat_path(table);

        storage::create_file(&def)?;
        if let Err(err) = storage::create_file(&dat) {
            let _ = storage::delete_file(&def);
            return Err(err);
        }

        let page = encode_def_page(info);
        let fid = pool.open(&def)?;
        let written = pool.write_page(fid, PageId(0), &page);
        let closed = pool.close(fid);
        written?;
        closed
    }

    /// Drop a table: delete both files. The second delete is attempted even
    /// when the first fails; the first failure is the one reported.
    pub fn drop_table(&self, table: &str) -> DbResult<()> {
        let def = storage::delete_file(&self.def_path(table));
        let dat = storage::delete_file(&self.dat_path(table));
        def?;
        dat
    }

    /// Read a table's schema from page 0 of its definition file.
    pub fn table_info(&self, pool: &mut BufferPool, table: &str) -> DbResult<TableInfo> {
        let def = self.def_path(table);
        if storage::num_pages(&def)?.is_none() {
            return Err(DbError::Catalog(format!("unknown table '{table}'")));
        }

        let fid = pool.open(&def)?;
        let mut page = [0u8; PAGE_SIZE];
        let read = pool.read_page(fid, PageId(0), &mut page);
        let closed = pool.close(fid);
        read?;
        closed?;
        decode_def_page(&page)
    }
}
