//! The record engine: fixed-size record layout and the data-manipulation
//! operations (insert, select, delete) over a table's data file.
//!
//! Records live in fixed-size slots packed densely into pages. The slot
//! size is derived from the table schema; a slot never straddles a page
//! boundary, and the first byte of every slot is a live/free flag. Deleted
//! slots are reused by later inserts before the file grows.

mod dml;
mod record;

#[cfg(test)]
mod tests;

pub use dml::{delete, insert, select};
pub use record::{RecordLayout, decode_record, encode_record};
