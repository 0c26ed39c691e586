//! Buffer frame - a slot in the buffer pool that holds one page image.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;
use strata_common::{PageId, PAGE_SIZE};

/// Frame identifier - index into the buffer pool's frame array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl FrameId {
    /// Creates a new frame ID.
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for FrameId {
    fn from(id: usize) -> Self {
        Self::new(id)
    }
}

impl From<FrameId> for usize {
    fn from(id: FrameId) -> Self {
        id.0
    }
}

/// A frame holds a single page image plus its bookkeeping.
///
/// Metadata lives in atomics and the page bytes behind their own `RwLock`,
/// so a caller holding a handle can touch the page without taking the
/// pool's management latch. The pool itself serializes every transition of
/// this metadata under its latch.
///
/// Invariants maintained by the pool: a frame with pin count 0 is either
/// free or evictable in the replacer; a dirty frame is always resident.
pub struct PageFrame {
    /// Frame ID (index in the pool's frame array).
    frame_id: FrameId,
    /// Page image.
    data: RwLock<Box<[u8]>>,
    /// Page resident in this frame (`INVALID` when free).
    page_id: AtomicU64,
    /// Number of outstanding handles.
    pin_count: AtomicU32,
    /// Whether the image has been modified since its last write-back.
    dirty: AtomicBool,
}

impl PageFrame {
    /// Creates a new free frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            data: RwLock::new(vec![0u8; PAGE_SIZE].into_boxed_slice()),
            page_id: AtomicU64::new(PageId::INVALID.as_u64()),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page resident in this frame.
    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    /// Assigns the resident page.
    #[inline]
    pub fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_u64(), Ordering::Release);
    }

    /// Returns true if a page is resident in this frame.
    #[inline]
    pub fn is_resident(&self) -> bool {
        self.page_id().is_valid()
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    ///
    /// The pool checks the count before calling; a frame at pin count 0 is
    /// never unpinned.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "unpinned frame with pin_count = 0");
        old - 1
    }

    /// Returns true if any handle is outstanding.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets or clears the dirty flag.
    #[inline]
    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Returns a read lock on the page image.
    #[inline]
    pub fn read_data(&self) -> parking_lot::RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read()
    }

    /// Returns a write lock on the page image.
    #[inline]
    pub fn write_data(&self) -> parking_lot::RwLockWriteGuard<'_, Box<[u8]>> {
        self.data.write()
    }

    /// Returns the frame to its free state, zeroing the page image.
    pub fn reset(&self) {
        self.page_id
            .store(PageId::INVALID.as_u64(), Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
        self.data.write().fill(0);
    }
}

impl std::fmt::Debug for PageFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFrame")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = PageFrame::new(FrameId::new(0));
        assert_eq!(frame.frame_id().index(), 0);
        assert!(!frame.is_resident());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.read_data().len(), PAGE_SIZE);
    }

    #[test]
    fn test_pin_unpin() {
        let frame = PageFrame::new(FrameId::new(0));
        assert!(!frame.is_pinned());

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert!(frame.is_pinned());

        assert_eq!(frame.unpin(), 1);
        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_dirty_flag() {
        let frame = PageFrame::new(FrameId::new(0));
        frame.set_dirty(true);
        assert!(frame.is_dirty());
        frame.set_dirty(false);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_residency() {
        let frame = PageFrame::new(FrameId::new(0));
        frame.set_page_id(PageId::new(42));
        assert!(frame.is_resident());
        assert_eq!(frame.page_id(), PageId::new(42));
    }

    #[test]
    fn test_data_access() {
        let frame = PageFrame::new(FrameId::new(0));
        frame.write_data()[0..4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(&frame.read_data()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_reset_zeroes() {
        let frame = PageFrame::new(FrameId::new(1));
        frame.set_page_id(PageId::new(7));
        frame.pin();
        frame.set_dirty(true);
        frame.write_data().fill(0xAB);

        frame.reset();

        assert!(!frame.is_resident());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert!(frame.read_data().iter().all(|&b| b == 0));
    }
}
