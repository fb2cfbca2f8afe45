//! Insert, select, and delete over a table's data file.
//!
//! Every operation fetches the schema, derives the slot layout, opens the
//! data file through the buffer pool, scans pages in index order, and
//! closes the file before returning; close writes back whatever the
//! operation dirtied.

use buffer::BufferPool;
use catalog::{Catalog, TableInfo};
use common::{DbResult, FileId, PageId, RecordSet, Row};
use expr::{BoundCondition, Condition};
use storage::{PAGE_SIZE, PageBuf};

use crate::record::{self, RecordLayout, SLOT_FREE, SLOT_LIVE};

/// Insert one record.
///
/// The record goes into the first free slot found scanning pages and slots
/// in order; if every slot is live, the file grows by one fresh page with
/// the record in slot 0. No constraints, no deduplication.
pub fn insert(pool: &mut BufferPool, catalog: &Catalog, table: &str, row: &Row) -> DbResult<()> {
    let schema = catalog.table_info(pool, table)?;
    let layout = RecordLayout::for_table(&schema)?;
    let image = record::encode_record(&schema, row)?;

    let dat = catalog.dat_path(table);
    if storage::num_pages(&dat)?.is_none() {
        storage::create_file(&dat)?;
    }

    let fid = pool.open(&dat)?;
    let inserted = insert_into_file(pool, fid, &layout, &image);
    let closed = pool.close(fid);
    inserted?;
    closed
}

fn insert_into_file(
    pool: &mut BufferPool,
    fid: FileId,
    layout: &RecordLayout,
    image: &[u8],
) -> DbResult<()> {
    let num_pages = pool.num_pages(fid)?;
    let mut page: PageBuf = [0u8; PAGE_SIZE];

    for pid in 0..num_pages {
        let pid = PageId(pid);
        pool.read_page(fid, pid, &mut page)?;
        for slot in 0..layout.slots_per_page {
            let range = layout.slot_range(slot);
            if page[range.start] == SLOT_FREE {
                page[range].copy_from_slice(image);
                return pool.write_page(fid, pid, &page);
            }
        }
    }

    // No free slot anywhere: extend the file with a fresh page. The page
    // must be zero-filled so its unused slots read as free.
    page.fill(0);
    page[layout.slot_range(0)].copy_from_slice(image);
    pool.write_page(fid, PageId(num_pages), &page)
}

/// Select the records matching a condition, in file traversal order.
///
/// With `condition.distinct` set, a record that is field-by-field equal to
/// one already collected is dropped.
pub fn select(
    pool: &mut BufferPool,
    catalog: &Catalog,
    table: &str,
    condition: &Condition,
) -> DbResult<RecordSet> {
    let schema = catalog.table_info(pool, table)?;
    let layout = RecordLayout::for_table(&schema)?;
    let bound = condition.bind(&schema)?;

    let mut out = RecordSet::empty(schema.field_names());
    let fid = pool.open(&catalog.dat_path(table))?;
    let scanned = scan_matching(
        pool,
        fid,
        &schema,
        &layout,
        &bound,
        condition.distinct,
        &mut out,
    );
    let closed = pool.close(fid);
    scanned?;
    closed?;
    Ok(out)
}

fn scan_matching(
    pool: &mut BufferPool,
    fid: FileId,
    schema: &TableInfo,
    layout: &RecordLayout,
    bound: &BoundCondition<'_>,
    distinct: bool,
    out: &mut RecordSet,
) -> DbResult<()> {
    let num_pages = pool.num_pages(fid)?;
    let mut page: PageBuf = [0u8; PAGE_SIZE];

    for pid in 0..num_pages {
        pool.read_page(fid, PageId(pid), &mut page)?;
        for slot in 0..layout.slots_per_page {
            let range = layout.slot_range(slot);
            if page[range.start] != SLOT_LIVE {
                continue;
            }
            let row = record::decode_record(schema, &page[range])?;
            if !bound.matches(&row) {
                continue;
            }
            if distinct && out.rows.iter().any(|seen| seen.values == row.values) {
                continue;
            }
            out.rows.push(row);
        }
    }
    Ok(())
}

/// Delete the records matching a condition, returning how many were removed.
///
/// Matching slots get their flag byte cleared; a page is written back only
/// when at least one of its slots was cleared. Freed slots are reused by
/// later inserts.
pub fn delete(
    pool: &mut BufferPool,
    catalog: &Catalog,
    table: &str,
    condition: &Condition,
) -> DbResult<u64> {
    let schema = catalog.table_info(pool, table)?;
    let layout = RecordLayout::for_table(&schema)?;
    let bound = condition.bind(&schema)?;

    let fid = pool.open(&catalog.dat_path(table))?;
    let cleared = clear_matching(pool, fid, &schema, &layout, &bound);
    let closed = pool.close(fid);
    let deleted = cleared?;
    closed?;
    Ok(deleted)
}

fn clear_matching(
    pool: &mut BufferPool,
    fid: FileId,
    schema: &TableInfo,
    layout: &RecordLayout,
    bound: &BoundCondition<'_>,
) -> DbResult<u64> {
    let num_pages = pool.num_pages(fid)?;
    let mut page: PageBuf = [0u8; PAGE_SIZE];
    let mut deleted = 0u64;

    for pid in 0..num_pages {
        let pid = PageId(pid);
        pool.read_page(fid, pid, &mut page)?;

        let mut page_touched = false;
        for slot in 0..layout.slots_per_page {
            let range = layout.slot_range(slot);
            if page[range.start] != SLOT_LIVE {
                continue;
            }
            let row = record::decode_record(schema, &page[range.clone()])?;
            if bound.matches(&row) {
                page[range.start] = SLOT_FREE;
                page_touched = true;
                deleted += 1;
            }
        }
        if page_touched {
            pool.write_page(fid, pid, &page)?;
        }
    }
    Ok(deleted)
}
