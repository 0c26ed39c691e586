//! Buffer pool manager implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_cache::ExtendibleHashTable;
use strata_common::{PageId, PAGE_TABLE_BUCKET_SIZE};
use tracing::trace;

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::eviction::LruKReplacer;
use super::frame::{FrameId, PageFrame};
use super::handle::PageHandle;
use super::BufferPoolStats;
use crate::disk::DiskManager;

/// Allocator and free-list state behind the management latch.
struct PoolState {
    /// Frames that have never been populated or were explicitly deleted.
    free_list: VecDeque<FrameId>,
    /// Next page ID to hand out. IDs are never reused.
    next_page_id: u64,
}

/// The buffer pool manager.
///
/// Owns a fixed array of frames and composes the page table, the LRU-K
/// replacer, the free list, and the disk manager behind a single
/// management latch. Callers receive [`PageHandle`]s whose byte buffers
/// stay stable for as long as the page is pinned; every
/// [`new_page`](Self::new_page)/[`fetch_page`](Self::fetch_page) must be
/// paired with exactly one [`unpin_page`](Self::unpin_page).
///
/// Frame acquisition always prefers the free list; the replacer is only
/// consulted when no free frame remains, and a dirty victim is written
/// back before its frame is reused.
pub struct BufferPoolManager {
    /// Fixed frame array; the index of a frame is its `FrameId`.
    frames: Vec<Arc<PageFrame>>,
    /// Management latch serializing every public operation.
    latch: Mutex<PoolState>,
    /// Maps resident pages to their frame slot.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Victim selection over unpinned frames.
    replacer: LruKReplacer,
    /// Page I/O.
    disk: DiskManager,
    /// Fetches served from memory.
    hit_count: AtomicU64,
    /// Fetches that went to disk.
    miss_count: AtomicU64,
    /// Pages evicted to make room.
    eviction_count: AtomicU64,
    /// Page images written back.
    flush_count: AtomicU64,
}

impl BufferPoolManager {
    /// Creates a buffer pool over `disk` with the given configuration.
    pub fn new(config: BufferPoolConfig, disk: DiskManager) -> BufferResult<Self> {
        config.validate().map_err(BufferError::Config)?;

        let frames: Vec<Arc<PageFrame>> = (0..config.num_frames)
            .map(|i| Arc::new(PageFrame::new(FrameId::new(i))))
            .collect();

        // Initially every frame is free.
        let free_list = (0..config.num_frames).map(FrameId::new).collect();

        Ok(Self {
            frames,
            latch: Mutex::new(PoolState {
                free_list,
                next_page_id: PageId::FIRST.as_u64(),
            }),
            page_table: ExtendibleHashTable::new(PAGE_TABLE_BUCKET_SIZE),
            replacer: LruKReplacer::new(config.num_frames, config.replacer_k),
            disk,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Allocates a fresh page and pins it.
    ///
    /// The returned page is zero-filled, pinned once, and clean. Fails
    /// with [`BufferError::NoFreeFrames`] when every frame is pinned; no
    /// page ID is consumed in that case.
    pub fn new_page(&self) -> BufferResult<PageHandle> {
        let mut state = self.latch.lock();

        let frame_id = self
            .acquire_frame(&mut state)?
            .ok_or(BufferError::NoFreeFrames)?;
        let page_id = PageId::new(state.next_page_id);
        state.next_page_id += 1;

        let frame = &self.frames[frame_id.index()];
        frame.set_page_id(page_id);
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        trace!(%page_id, frame = frame_id.index(), "allocated new page");
        Ok(PageHandle::new(Arc::clone(frame)))
    }

    /// Fetches the page `page_id` and pins it.
    ///
    /// A resident page is returned directly; otherwise a frame is acquired
    /// and the page image is read from disk. Fails with
    /// [`BufferError::NoFreeFrames`] when the miss path finds every frame
    /// pinned.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<PageHandle> {
        let mut state = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(PageHandle::new(Arc::clone(frame)));
        }

        let frame_id = self
            .acquire_frame(&mut state)?
            .ok_or(BufferError::NoFreeFrames)?;
        let frame = &self.frames[frame_id.index()];
        {
            let mut data = frame.write_data();
            self.disk.read_page(page_id, &mut data[..])?;
        }
        frame.set_page_id(page_id);
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        trace!(%page_id, frame = frame_id.index(), "fetched page from disk");
        Ok(PageHandle::new(Arc::clone(frame)))
    }

    /// Drops one pin on `page_id`.
    ///
    /// `is_dirty` ORs into the frame's dirty flag: the flag is sticky and
    /// only a flush or an eviction write-back clears it. Returns false when
    /// the page is not resident or its pin count is already zero. When the
    /// last pin is dropped the frame becomes evictable.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes `page_id` back to disk and clears its dirty flag.
    ///
    /// Writes regardless of the dirty flag and the pin count. Returns
    /// `Ok(false)` when the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<bool> {
        let _state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.index()];
        self.disk.write_page(page_id, &frame.read_data()[..])?;
        frame.set_dirty(false);
        self.flush_count.fetch_add(1, Ordering::Relaxed);

        trace!(%page_id, "flushed page");
        Ok(true)
    }

    /// Writes every resident page back to disk, returning the count.
    pub fn flush_all_pages(&self) -> BufferResult<usize> {
        let _state = self.latch.lock();

        let mut flushed = 0u64;
        for frame in &self.frames {
            let page_id = frame.page_id();
            if page_id.is_valid() {
                self.disk.write_page(page_id, &frame.read_data()[..])?;
                frame.set_dirty(false);
                flushed += 1;
            }
        }
        self.flush_count.fetch_add(flushed, Ordering::Relaxed);
        Ok(flushed as usize)
    }

    /// Deletes `page_id` from the pool, returning its frame to the free
    /// list.
    ///
    /// A page that is not resident is already gone: `Ok(true)`. A pinned
    /// page cannot be deleted: `Ok(false)`. A dirty page is written back
    /// before its frame is released.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<bool> {
        let mut state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(true);
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        if frame.is_dirty() {
            self.disk.write_page(page_id, &frame.read_data()[..])?;
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        frame.reset();
        state.free_list.push_back(frame_id);

        trace!(%page_id, frame = frame_id.index(), "deleted page");
        Ok(true)
    }

    /// Returns true if `page_id` is resident in the pool.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.find(&page_id).is_some()
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of frames on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.latch.lock().free_list.len()
    }

    /// Returns the disk manager backing this pool.
    pub fn disk(&self) -> &DiskManager {
        &self.disk
    }

    /// Returns counters describing pool activity.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }

    /// Acquires a frame for a new resident, from the free list first and by
    /// eviction second.
    ///
    /// Returns `Ok(None)` when no frame is free and no frame is evictable.
    /// An evicted dirty resident is written back before the frame is
    /// handed out, and its page-table entry is removed. The returned frame
    /// is reset: zero-filled, clean, unpinned.
    fn acquire_frame(&self, state: &mut PoolState) -> BufferResult<Option<FrameId>> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(Some(frame_id));
        }

        let Some(frame_id) = self.replacer.evict() else {
            return Ok(None);
        };
        let frame = &self.frames[frame_id.index()];
        let evicted = frame.page_id();

        if frame.is_dirty() {
            self.disk.write_page(evicted, &frame.read_data()[..])?;
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }
        self.page_table.remove(&evicted);
        frame.reset();
        self.eviction_count.fetch_add(1, Ordering::Relaxed);

        trace!(page_id = %evicted, frame = frame_id.index(), "evicted page");
        Ok(Some(frame_id))
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.frames.len())
            .field("free_frames", &self.free_frame_count())
            .field("stats", &self.stats())
            .finish()
    }
}
