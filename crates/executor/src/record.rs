//! Byte layout of one record slot: `[flag][field bytes in schema order]`.

use std::mem::size_of;

use catalog::TableInfo;
use common::{DbError, DbResult, MAX_STRING, Row};
use storage::PAGE_SIZE;
use types::{FieldType, Value};

/// Slot flag: the slot is free and may be claimed by an insert.
pub(crate) const SLOT_FREE: u8 = 0;

/// Slot flag: the slot holds a live record.
pub(crate) const SLOT_LIVE: u8 = 1;

fn field_width(field_name: &str, ty: FieldType) -> DbResult<usize> {
    match ty {
        FieldType::Integer => Ok(size_of::<i32>()),
        FieldType::Text => Ok(MAX_STRING),
        FieldType::Unknown => Err(DbError::Schema(format!(
            "field '{field_name}' has an unknown type and cannot be stored"
        ))),
    }
}

/// Slot geometry derived from a schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    /// Bytes per slot: one flag byte plus the field widths.
    pub record_size: usize,
    /// Whole slots that fit in a page; trailing bytes are never used.
    pub slots_per_page: usize,
}

impl RecordLayout {
    pub fn for_table(schema: &TableInfo) -> DbResult<Self> {
        let mut record_size = 1; // live/free flag
        for field in schema.fields() {
            record_size += field_width(&field.name, field.ty)?;
        }
        Ok(Self {
            record_size,
            slots_per_page: PAGE_SIZE / record_size,
        })
    }

    /// Byte range of slot `slot` within a page.
    pub fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        let start = slot * self.record_size;
        start..start + self.record_size
    }
}

/// Encode a record into its slot image, live flag included.
///
/// The row must match the schema in arity and per-field type; a text value
/// must leave room for its NUL terminator within `MAX_STRING` bytes.
pub fn encode_record(schema: &TableInfo, row: &Row) -> DbResult<Vec<u8>> {
    if row.values.len() != schema.num_fields() {
        return Err(DbError::Schema(format!(
            "record has {} values, schema has {} fields",
            row.values.len(),
            schema.num_fields()
        )));
    }

    let layout = RecordLayout::for_table(schema)?;
    let mut image = vec![0u8; layout.record_size];
    image[0] = SLOT_LIVE;

    let mut at = 1;
    for (field, value) in schema.fields().iter().zip(&row.values) {
        match (field.ty, value) {
            (FieldType::Integer, Value::Int(v)) => {
                image[at..at + size_of::<i32>()].copy_from_slice(&v.to_le_bytes());
                at += size_of::<i32>();
            }
            (FieldType::Text, Value::Text(s)) => {
                let raw = s.as_bytes();
                if raw.len() > MAX_STRING - 1 {
                    return Err(DbError::Schema(format!(
                        "value for field '{}' is longer than {} bytes",
                        field.name,
                        MAX_STRING - 1
                    )));
                }
                // The rest of the field stays zero: NUL terminator + padding.
                image[at..at + raw.len()].copy_from_slice(raw);
                at += MAX_STRING;
            }
            _ => {
                return Err(DbError::Schema(format!(
                    "field '{}' expects {:?}, got {:?}",
                    field.name,
                    field.ty,
                    value.field_type()
                )));
            }
        }
    }
    Ok(image)
}

/// Decode a slot image (flag byte included) back into a record.
pub fn decode_record(schema: &TableInfo, slot: &[u8]) -> DbResult<Row> {
    let layout = RecordLayout::for_table(schema)?;
    if slot.len() < layout.record_size {
        return Err(DbError::Storage(format!(
            "slot of {} bytes is shorter than the record size {}",
            slot.len(),
            layout.record_size
        )));
    }

    let mut at = 1; // skip the flag byte
    let mut values = Vec::with_capacity(schema.num_fields());
    for field in schema.fields() {
        match field.ty {
            FieldType::Integer => {
                let mut raw = [0u8; size_of::<i32>()];
                raw.copy_from_slice(&slot[at..at + size_of::<i32>()]);
                at += size_of::<i32>();
                values.push(Value::Int(i32::from_le_bytes(raw)));
            }
            FieldType::Text => {
                let raw = &slot[at..at + MAX_STRING];
                at += MAX_STRING;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(MAX_STRING);
                let text = std::str::from_utf8(&raw[..end]).map_err(|_| {
                    DbError::Storage(format!(
                        "stored value for field '{}' is not valid UTF-8",
                        field.name
                    ))
                })?;
                values.push(Value::Text(text.to_string()));
            }
            FieldType::Unknown => {
                return Err(DbError::Schema(format!(
                    "field '{}' has an unknown type and cannot be decoded",
                    field.name
                )));
            }
        }
    }
    Ok(Row::new(values))
}
