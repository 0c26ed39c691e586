//! Disk manager - page-granular access to the database file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use strata_common::{PageId, PAGE_SIZE};
use tracing::debug;

use super::error::{DiskError, DiskResult};

/// Reads and writes pages against a single database file.
///
/// The file handle sits behind a mutex; seek and transfer happen under the
/// lock so concurrent callers cannot interleave mid-page. Read and write
/// counters are kept for observability.
pub struct DiskManager {
    /// The underlying file, locked for the duration of each transfer.
    file: Mutex<File>,
    /// Path of the database file.
    path: PathBuf,
    /// Number of completed page reads.
    read_count: AtomicU64,
    /// Number of completed page writes.
    write_count: AtomicU64,
}

impl DiskManager {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|source| DiskError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "opened database file");

        Ok(Self {
            file: Mutex::new(file),
            path,
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
        })
    }

    /// Reads the page image for `page_id` into `buf`.
    ///
    /// A page that has never been written reads back as zeroes: a short
    /// read at the end of the file zero-fills the remainder of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly one page long.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "buffer must be one page");

        let offset = Self::page_offset(page_id);
        let mut file = self.file.lock();
        let read = Self::read_at(&mut file, offset, buf)
            .map_err(|source| DiskError::Read { page_id, source })?;
        buf[read..].fill(0);

        self.read_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes the page image in `buf` at the offset for `page_id`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly one page long.
    pub fn write_page(&self, page_id: PageId, buf: &[u8]) -> DiskResult<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "buffer must be one page");

        let offset = Self::page_offset(page_id);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(buf))
            .map_err(|source| DiskError::Write { page_id, source })?;

        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns the path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of page reads served so far.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Number of page writes served so far.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    #[inline]
    fn page_offset(page_id: PageId) -> u64 {
        page_id.as_u64() * PAGE_SIZE as u64
    }

    /// Seeks to `offset` and reads until `buf` is full or the file ends,
    /// returning the number of bytes read.
    fn read_at(file: &mut File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }
}

impl std::fmt::Debug for DiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskManager")
            .field("path", &self.path)
            .field("reads", &self.read_count())
            .field("writes", &self.write_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_manager() -> (tempfile::TempDir, DiskManager) {
        let dir = tempdir().unwrap();
        let manager = DiskManager::open(dir.path().join("test.db")).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, disk) = test_manager();

        let mut page = vec![0u8; PAGE_SIZE];
        page[0..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        disk.write_page(PageId::new(0), &page).unwrap();

        let mut out = vec![0u8; PAGE_SIZE];
        disk.read_page(PageId::new(0), &mut out).unwrap();
        assert_eq!(out, page);
    }

    #[test]
    fn test_pages_do_not_overlap() {
        let (_dir, disk) = test_manager();

        let a = vec![0xAAu8; PAGE_SIZE];
        let b = vec![0xBBu8; PAGE_SIZE];
        disk.write_page(PageId::new(0), &a).unwrap();
        disk.write_page(PageId::new(1), &b).unwrap();

        let mut out = vec![0u8; PAGE_SIZE];
        disk.read_page(PageId::new(0), &mut out).unwrap();
        assert_eq!(out, a);
        disk.read_page(PageId::new(1), &mut out).unwrap();
        assert_eq!(out, b);
    }

    #[test]
    fn test_unwritten_page_reads_zeroes() {
        let (_dir, disk) = test_manager();

        let mut out = vec![0xFFu8; PAGE_SIZE];
        disk.read_page(PageId::new(9), &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_counters() {
        let (_dir, disk) = test_manager();

        let page = vec![0u8; PAGE_SIZE];
        let mut out = vec![0u8; PAGE_SIZE];
        disk.write_page(PageId::new(0), &page).unwrap();
        disk.write_page(PageId::new(1), &page).unwrap();
        disk.read_page(PageId::new(0), &mut out).unwrap();

        assert_eq!(disk.write_count(), 2);
        assert_eq!(disk.read_count(), 1);
    }

    #[test]
    #[should_panic(expected = "one page")]
    fn test_short_buffer_panics() {
        let (_dir, disk) = test_manager();
        let mut out = vec![0u8; 16];
        let _ = disk.read_page(PageId::new(0), &mut out);
    }
}
