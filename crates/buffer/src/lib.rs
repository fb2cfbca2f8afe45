//! Buffer pool for page-level caching and I/O.
//!
//! The pool sits between the file layer and everything above it; the catalog
//! and record engine never touch `storage` reads and writes directly. It
//! provides:
//! - a fixed number of page frames managed in strict LRU order
//! - lazy write-back: a dirty frame reaches disk when it is evicted, when
//!   its file is closed, or on an explicit flush
//! - ownership of the open files themselves, so closing a handle can flush
//!   and drop its frames in one place
//!
//! # Example
//!
//! ```no_run
//! use buffer::BufferPool;
//! use common::PageId;
//! use storage::PAGE_SIZE;
//!
//! let mut pool = BufferPool::new();
//! let fid = pool.open("employees.dat".as_ref()).unwrap();
//!
//! let mut page = [0u8; PAGE_SIZE];
//! pool.read_page(fid, PageId(0), &mut page).unwrap();
//! page[0] = 1;
//! pool.write_page(fid, PageId(0), &page).unwrap();
//!
//! // Write-back happens on close.
//! pool.close(fid).unwrap();
//! ```


use common::{DbError, DbResult, FileId, PageId};
use hashbrown::HashMap;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use storage::{DbFile, PageBuf};

/// Number of page frames the pool keeps resident.
pub const NUM_BUFFER: usize = 4;

/// One cache slot: a page image plus its dirty flag. The frame's identity
/// (which file, which page) is the cache key.
#[derive(Debug)]
struct Frame {
    data: Box<PageBuf>,
    dirty: bool,
}

/// Fixed-capacity page cache with LRU eviction and deferred write-back.
///
/// Keying frames by `(FileId, PageId)` makes the single-copy invariant
/// structural: a given page of a given file can occupy at most one frame.
#[derive(Debug)]
pub struct BufferPool {
    frames: LruCache<(FileId, PageId), Frame>,
    files: HashMap<FileId, DbFile>,
    next_file_id: u64,
}

impl BufferPool {
    /// A pool with the standard `NUM_BUFFER` frames.
    pub fn new() -> Self {
        Self::with_capacity(NUM_BUFFER)
    }

    /// A pool with an explicit frame count.
    ///
    /// # Panics
    ///
    /// Panics if `frames` is 0.
    pub fn with_capacity(frames: usize) -> Self {
        assert!(frames > 0, "buffer pool needs at least one frame");
        Self {
            frames: LruCache::new(NonZeroUsize::new(frames).unwrap()),
            files: HashMap::new(),
            next_file_id: 0,
        }
    }

    /// Open a file and issue a handle for it. The handle stays valid until
    /// [`BufferPool::close`].
    pub fn open(&mut self, path: &Path) -> DbResult<FileId> {
        let file = DbFile::open(path)?;
        let fid = FileId(self.next_file_id);
        self.next_file_id += 1;
        self.files.insert(fid, file);
        Ok(fid)
    }

    fn file_mut(&mut self, fid: FileId) -> DbResult<&mut DbFile> {
        self.files
            .get_mut(&fid)
            .ok_or_else(|| DbError::Storage(format!("file handle {} is not open", fid.0)))
    }

    /// Page count of the underlying file. Dirty frames past the end of the
    /// file are not counted until they are written back.
    pub fn num_pages(&self, fid: FileId) -> DbResult<u64> {
        self.files
            .get(&fid)
            .ok_or_else(|| DbError::Storage(format!("file handle {} is not open", fid.0)))?
            .num_pages()
    }

    /// Make room for one more frame. The victim is the LRU tail; a dirty
    /// victim is written back before the frame is reused.
    fn evict_if_needed(&mut self) -> DbResult<()> {
        if self.frames.len() < self.frames.cap().get() {
            return Ok(());
        }
        if let Some(((fid, pid), frame)) = self.frames.pop_lru() {
            if frame.dirty {
                self.file_mut(fid)?.write_page(pid, &frame.data)?;
            }
        }
        Ok(())
    }

    /// Read a page through the pool into `out`.
    ///
    /// A hit copies the cached bytes and promotes the frame; a miss evicts
    /// if necessary, loads the page from the file layer, and caches it clean.
    pub fn read_page(&mut self, fid: FileId, pid: PageId, out: &mut PageBuf) -> DbResult<()> {
        if let Some(frame) = self.frames.get(&(fid, pid)) {
            out.copy_from_slice(&frame.data[..]);
            return Ok(());
        }

        let mut data = storage::zeroed_page();
        self.file_mut(fid)?.read_page(pid, &mut data)?;
        out.copy_from_slice(&data[..]);

        self.evict_if_needed()?;
        self.frames.push((fid, pid), Frame { data, dirty: false });
        Ok(())
    }

    /// Write a page through the pool.
    ///
    /// A hit overwrites the cached bytes; a miss loads the on-disk page
    /// first when one exists, then overwrites. Either way the frame is
    /// promoted and marked dirty; the bytes reach disk on eviction, close,
    /// or flush.
    pub fn write_page(&mut self, fid: FileId, pid: PageId, page: &PageBuf) -> DbResult<()> {
        if let Some(frame) = self.frames.get_mut(&(fid, pid)) {
            frame.data.copy_from_slice(page);
            frame.dirty = true;
            return Ok(());
        }

        let mut data = storage::zeroed_page();
        {
            let file = self.file_mut(fid)?;
            if pid.0 < file.num_pages()? {
                file.read_page(pid, &mut data)?;
            }
        }
        data.copy_from_slice(page);

        self.evict_if_needed()?;
        self.frames.push((fid, pid), Frame { data, dirty: true });
        Ok(())
    }

    /// Close a handle: write back its dirty frames, drop all of its frames,
    /// and close the underlying file.
    pub fn close(&mut self, fid: FileId) -> DbResult<()> {
        let mut file = self
            .files
            .remove(&fid)
            .ok_or_else(|| DbError::Storage(format!("file handle {} is not open", fid.0)))?;

        let owned: Vec<(FileId, PageId)> = self
            .frames
            .iter()
            .map(|(key, _)| *key)
            .filter(|(owner, _)| *owner == fid)
            .collect();

        // Evict every frame the handle owns even if a write-back fails;
        // the first failure is the one reported.
        let mut first_err = None;
        for key in owned {
            if let Some(frame) = self.frames.pop(&key) {
                if frame.dirty {
                    if let Err(err) = file.write_page(key.1, &frame.data) {
                        first_err.get_or_insert(err);
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Write back every dirty frame without disturbing cache contents or
    /// recency order.
    pub fn flush(&mut self) -> DbResult<()> {
        let dirty: Vec<(FileId, PageId)> = self
            .frames
            .iter()
            .filter(|(_, frame)| frame.dirty)
            .map(|(key, _)| *key)
            .collect();

        for (fid, pid) in dirty {
            let file = self
                .files
                .get_mut(&fid)
                .ok_or_else(|| DbError::Storage(format!("file handle {} is not open", fid.0)))?;
            if let Some(frame) = self.frames.peek_mut(&(fid, pid)) {
                file.write_page(pid, &frame.data)?;
                frame.dirty = false;
            }
        }
        Ok(())
    }

    /// Finalize the pool: flush every dirty frame, then close every file.
    pub fn shutdown(mut self) -> DbResult<()> {
        self.flush()?;
        self.frames.clear();
        self.files.clear();
        Ok(())
    }

    #[cfg(test)]
    fn cached_frames(&self) -> usize {
        self.frames.len()
    }

    #[cfg(test)]
    fn is_cached(&self, fid: FileId, pid: PageId) -> bool {
        self.frames.contains(&(fid, pid))
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        // Best-effort flush for pools dropped without an explicit shutdown.
        let _ = self.flush();
    }
}
