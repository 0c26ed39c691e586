//! Page handles - caller-facing references to pinned frames.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use strata_common::PageId;

use super::frame::{FrameId, PageFrame};

/// A reference to a page pinned in the buffer pool.
///
/// The handle stays valid for as long as the caller keeps the page pinned:
/// every `new_page`/`fetch_page` must be paired with exactly one
/// `unpin_page` on the pool, after which the handle must not be used again.
/// While pinned, the pool will not evict the page, so the byte buffer the
/// handle exposes is stable.
///
/// Mutating the page through [`data_mut`](Self::data_mut) marks the frame
/// dirty; the flag can only be cleared by a flush or an eviction
/// write-back.
pub struct PageHandle {
    frame: Arc<PageFrame>,
}

impl PageHandle {
    pub(crate) fn new(frame: Arc<PageFrame>) -> Self {
        Self { frame }
    }

    /// Returns the ID of the pinned page.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.frame.page_id()
    }

    /// Returns the frame slot holding the page.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Returns the current pin count of the underlying frame.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.frame.pin_count()
    }

    /// Returns true if the page has unwritten modifications.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    /// Returns read access to the page image.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }

    /// Returns write access to the page image, marking the frame dirty.
    #[inline]
    pub fn data_mut(&mut self) -> impl DerefMut<Target = [u8]> + '_ {
        self.frame.set_dirty(true);
        PageDataMut {
            guard: self.frame.write_data(),
        }
    }
}

impl std::fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHandle")
            .field("page_id", &self.page_id())
            .field("frame_id", &self.frame_id())
            .field("pin_count", &self.pin_count())
            .finish()
    }
}

/// Read view over the frame's data lock.
struct PageDataRef<'a> {
    guard: parking_lot::RwLockReadGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Write view over the frame's data lock.
struct PageDataMut<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageDataMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_reads_frame_state() {
        let frame = Arc::new(PageFrame::new(FrameId::new(3)));
        frame.set_page_id(PageId::new(42));
        frame.pin();

        let handle = PageHandle::new(Arc::clone(&frame));
        assert_eq!(handle.page_id(), PageId::new(42));
        assert_eq!(handle.frame_id(), FrameId::new(3));
        assert_eq!(handle.pin_count(), 1);
        assert!(!handle.is_dirty());
    }

    #[test]
    fn test_data_mut_marks_dirty() {
        let frame = Arc::new(PageFrame::new(FrameId::new(0)));
        frame.set_page_id(PageId::new(1));
        frame.pin();

        let mut handle = PageHandle::new(Arc::clone(&frame));
        handle.data_mut()[0..2].copy_from_slice(&[9, 9]);

        assert!(frame.is_dirty());
        assert_eq!(&frame.read_data()[0..2], &[9, 9]);
    }

    #[test]
    fn test_read_access_does_not_dirty() {
        let frame = Arc::new(PageFrame::new(FrameId::new(0)));
        frame.set_page_id(PageId::new(1));
        frame.pin();

        let handle = PageHandle::new(Arc::clone(&frame));
        assert_eq!(handle.data()[0], 0);
        assert!(!frame.is_dirty());
    }
}
