//! Page-granular access to the host file system.
//!
//! This is the lowest layer of the engine: named file creation and deletion,
//! open/close, and reads and writes of whole pages by index. Nothing here is
//! cached; every call touches the host. All buffering lives one layer up in
//! the `buffer` crate, which is the only intended caller.

#[cfg(test)]
mod tests;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use common::{DbError, DbResult, MAX_FILENAME, PageId};

/// Fixed size of every on-disk I/O transfer, in bytes.
pub const PAGE_SIZE: usize = 4096;

/// One page worth of bytes. Partial pages do not exist at this layer.
pub type PageBuf = [u8; PAGE_SIZE];

/// A zero-filled page on the heap. Fresh pages must be all zeroes: the
/// record engine relies on zeroed tail bytes meaning "free slot".
pub fn zeroed_page() -> Box<PageBuf> {
    Box::new([0u8; PAGE_SIZE])
}

fn check_file_name(path: &Path) -> DbResult<()> {
    let len = path
        .file_name()
        .map(|name| name.as_encoded_bytes().len())
        .unwrap_or(0);
    if len == 0 || len > MAX_FILENAME {
        return Err(DbError::Capacity(format!(
            "file name '{}' is empty or longer than {MAX_FILENAME} bytes",
            path.display()
        )));
    }
    Ok(())
}

/// Create a new, empty file. Fails if the file already exists.
pub fn create_file(path: &Path) -> DbResult<()> {
    check_file_name(path)?;
    OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(())
}

/// Remove a file. Fails if it is missing or cannot be unlinked.
pub fn delete_file(path: &Path) -> DbResult<()> {
    fs::remove_file(path)?;
    Ok(())
}

/// Number of whole pages in a file, or `None` if the file does not exist.
pub fn num_pages(path: &Path) -> DbResult<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len() / PAGE_SIZE as u64)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// An open database file.
///
/// The handle owns the descriptor; dropping it closes the file. The file
/// position after any call is unspecified; every page transfer seeks first.
#[derive(Debug)]
pub struct DbFile {
    file: File,
    path: PathBuf,
}

impl DbFile {
    /// Open an existing file for page-granular read/write access.
    pub fn open(path: &Path) -> DbResult<Self> {
        check_file_name(path)?;
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Number of whole pages currently in the file.
    pub fn num_pages(&self) -> DbResult<u64> {
        Ok(self.file.metadata()?.len() / PAGE_SIZE as u64)
    }

    /// Read page `pid` into `page`. A short read is a failure: pages are
    /// written whole, so anything less means the page does not exist.
    pub fn read_page(&mut self, pid: PageId, page: &mut PageBuf) -> DbResult<()> {
        self.file.seek(SeekFrom::Start(pid.0 * PAGE_SIZE as u64))?;
        self.file.read_exact(page).map_err(|err| {
            DbError::Storage(format!(
                "reading page {} of {} failed: {err}",
                pid.0,
                self.path.display()
            ))
        })
    }

    /// Write `page` at index `pid`. Writing at `num_pages` extends the file
    /// by exactly one page.
    pub fn write_page(&mut self, pid: PageId, page: &PageBuf) -> DbResult<()> {
        self.file.seek(SeekFrom::Start(pid.0 * PAGE_SIZE as u64))?;
        self.file.write_all(page).map_err(|err| {
            DbError::Storage(format!(
                "writing page {} of {} failed: {err}",
                pid.0,
                self.path.display()
            ))
        })
    }
}
