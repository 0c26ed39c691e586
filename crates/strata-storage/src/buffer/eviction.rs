//! LRU-K replacement policy for the buffer pool.
//!
//! LRU-K ranks frames by the gap between now and their k-th most recent
//! access. A frame with fewer than `k` recorded accesses has an infinite
//! gap and is preferred as a victim; ties among those break by earliest
//! first access.
//!
//! The ordering is kept in two queues instead of timestamps:
//!
//! - the *history* queue holds frames with fewer than `k` accesses, FIFO by
//!   first access (later sub-k accesses do not re-order)
//! - the *cache* queue holds frames with at least `k` accesses, most
//!   recently used at the tail
//!
//! Eviction scans the history queue head-first, then the cache queue.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::frame::FrameId;

/// Per-frame bookkeeping.
#[derive(Default)]
struct FrameEntry {
    access_count: usize,
    evictable: bool,
}

/// Replacer state behind the mutex.
struct ReplacerState {
    entries: HashMap<FrameId, FrameEntry>,
    history: VecDeque<FrameId>,
    cache: VecDeque<FrameId>,
    evictable_count: usize,
}

impl ReplacerState {
    /// Pops the first evictable frame from `queue`, erasing its entry.
    fn evict_from(
        queue: &mut VecDeque<FrameId>,
        entries: &mut HashMap<FrameId, FrameEntry>,
    ) -> Option<FrameId> {
        let pos = queue.iter().position(|fid| entries[fid].evictable)?;
        let fid = queue.remove(pos).expect("position is in range");
        entries.remove(&fid);
        Some(fid)
    }
}

/// Selects victim frames for the buffer pool using the LRU-K policy.
///
/// Tracks up to `num_frames` frames; only frames marked evictable are
/// eviction candidates. All operations are guarded by one internal mutex.
pub struct LruKReplacer {
    num_frames: usize,
    k: usize,
    state: Mutex<ReplacerState>,
}

impl LruKReplacer {
    /// Creates a replacer for frames `0..num_frames` with parameter `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "k must be positive");
        Self {
            num_frames,
            k,
            state: Mutex::new(ReplacerState {
                entries: HashMap::new(),
                history: VecDeque::new(),
                cache: VecDeque::new(),
                evictable_count: 0,
            }),
        }
    }

    /// Records an access to `frame_id`.
    ///
    /// The first access appends the frame to the history queue; the k-th
    /// promotes it to the cache queue; every later access moves it to the
    /// cache tail. Accesses strictly between the first and the k-th leave
    /// the ordering untouched.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn record_access(&self, frame_id: FrameId) {
        self.assert_in_range(frame_id);
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let entry = state.entries.entry(frame_id).or_default();
        entry.access_count += 1;

        if entry.access_count == 1 {
            state.history.push_back(frame_id);
        } else if entry.access_count == self.k {
            remove_from(&mut state.history, frame_id);
            state.cache.push_back(frame_id);
        } else if entry.access_count > self.k {
            remove_from(&mut state.cache, frame_id);
            state.cache.push_back(frame_id);
        }
    }

    /// Marks `frame_id` evictable or pinned-down.
    ///
    /// Idempotent on the same value. On a frame the replacer has never
    /// seen, creates the bookkeeping entry.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.assert_in_range(frame_id);
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let entry = state.entries.entry(frame_id).or_default();
        if entry.evictable != evictable {
            entry.evictable = evictable;
            if evictable {
                state.evictable_count += 1;
            } else {
                state.evictable_count -= 1;
            }
        }
    }

    /// Evicts the frame with the largest backward k-distance.
    ///
    /// Scans the history queue from its head, then the cache queue.
    /// Returns `None` when no tracked frame is evictable. On success the
    /// frame's entire bookkeeping is erased; a later access starts from
    /// scratch.
    pub fn evict(&self) -> Option<FrameId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let fid = ReplacerState::evict_from(&mut state.history, &mut state.entries)
            .or_else(|| ReplacerState::evict_from(&mut state.cache, &mut state.entries))?;
        state.evictable_count -= 1;
        Some(fid)
    }

    /// Erases the bookkeeping for `frame_id`.
    ///
    /// A frame the replacer is not tracking is left alone.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range, or if the frame is tracked
    /// but not evictable.
    pub fn remove(&self, frame_id: FrameId) {
        self.assert_in_range(frame_id);
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.entries.get(&frame_id) else {
            return;
        };
        assert!(
            entry.evictable,
            "cannot remove non-evictable frame {}",
            frame_id.index()
        );

        if entry.access_count >= self.k {
            remove_from(&mut state.cache, frame_id);
        } else {
            remove_from(&mut state.history, frame_id);
        }
        state.entries.remove(&frame_id);
        state.evictable_count -= 1;
    }

    /// Number of evictable frames currently tracked.
    pub fn size(&self) -> usize {
        self.state.lock().evictable_count
    }

    #[inline]
    fn assert_in_range(&self, frame_id: FrameId) {
        assert!(
            frame_id.index() < self.num_frames,
            "frame id {} out of range for replacer over {} frames",
            frame_id.index(),
            self.num_frames
        );
    }
}

/// Drops `frame_id` from `queue` if present.
fn remove_from(queue: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(pos) = queue.iter().position(|&f| f == frame_id) {
        queue.remove(pos);
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LruKReplacer")
            .field("num_frames", &self.num_frames)
            .field("k", &self.k)
            .field("tracked", &state.entries.len())
            .field("evictable", &state.evictable_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_evict_empty() {
        let replacer = LruKReplacer::new(8, 2);
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_history_is_fifo_by_first_access() {
        let replacer = LruKReplacer::new(8, 3);
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        // A second sub-k access must not push frame 1 behind frame 2.
        replacer.record_access(fid(1));

        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_history_evicted_before_cache() {
        let replacer = LruKReplacer::new(8, 2);
        // Frame 1 reaches k accesses, frame 2 does not.
        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));

        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    fn test_cache_orders_by_recency() {
        let replacer = LruKReplacer::new(8, 2);
        for id in [1, 2] {
            replacer.record_access(fid(id));
            replacer.record_access(fid(id));
        }
        // Another access moves frame 1 to the MRU end.
        replacer.record_access(fid(1));

        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    fn test_single_access_frame_is_first_victim() {
        let replacer = LruKReplacer::new(8, 2);
        for id in [1, 2, 3, 4, 1, 2, 3, 4, 5] {
            replacer.record_access(fid(id));
        }
        for id in 1..=5 {
            replacer.set_evictable(fid(id), true);
        }

        assert_eq!(replacer.size(), 5);
        // Frame 5 has a single access and sits alone in the history queue.
        assert_eq!(replacer.evict(), Some(fid(5)));
        // Among the rest, frame 1's second-to-last access is the oldest.
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.size(), 3);
    }

    #[test]
    fn test_non_evictable_frames_are_skipped() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        replacer.set_evictable(fid(1), false);
        replacer.set_evictable(fid(2), true);

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_set_evictable_is_idempotent() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 1);

        replacer.set_evictable(fid(1), false);
        replacer.set_evictable(fid(1), false);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_set_evictable_before_first_access() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.set_evictable(fid(3), true);
        assert_eq!(replacer.size(), 1);

        replacer.record_access(fid(3));
        assert_eq!(replacer.evict(), Some(fid(3)));
    }

    #[test]
    fn test_evict_erases_bookkeeping() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.evict(), Some(fid(1)));

        // The frame starts over in the history queue.
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        replacer.record_access(fid(2));
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    fn test_remove_evictable() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        replacer.remove(fid(1));
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(fid(2)));
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.remove(fid(5));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    #[should_panic(expected = "non-evictable")]
    fn test_remove_non_evictable_panics() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.remove(fid(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_record_access_out_of_range() {
        let replacer = LruKReplacer::new(8, 2);
        // The frame array is 0..8, so index 8 is the first invalid id.
        replacer.record_access(fid(8));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_evictable_out_of_range() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.set_evictable(fid(4), true);
    }
}
