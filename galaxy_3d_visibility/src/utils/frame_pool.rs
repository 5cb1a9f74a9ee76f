/// Per-frame object pool with index handles.
///
/// Objects are checked out by index and the whole pool is released at
/// once with `reset` at the start of each frame. Storage is never dropped:
/// once the pool has grown to hold N objects (its high-water mark), the
/// next frames reuse those N objects without allocating.
///
/// A single checked-out object can be handed back early with `recycle`;
/// recycled slots are reused before the arena cursor advances.
///
/// # Example
///
/// ```ignore
/// let mut pool: FramePool<ShadowSlave> = FramePool::new();
/// let a = pool.checkout(ShadowSlave::default);  // 0
/// let b = pool.checkout(ShadowSlave::default);  // 1
/// pool.recycle(a);                              // 0 is now available
/// let c = pool.checkout(ShadowSlave::default);  // 0 (recycled)
/// pool.reset();                                 // everything free, storage kept
/// ```
#[derive(Debug, Clone)]
pub struct FramePool<T> {
    items: Vec<T>,
    /// Slots below this index have been handed out this frame
    cursor: usize,
    free_list: Vec<usize>,
}

impl<T> FramePool<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            free_list: Vec::new(),
        }
    }

    /// Check out an object, building one with `make` only when every
    /// stored object is already in use.
    ///
    /// Reused objects keep whatever state they had; callers reinitialize.
    pub fn checkout(&mut self, make: impl FnOnce() -> T) -> usize {
        if let Some(idx) = self.free_list.pop() {
            return idx;
        }
        if self.cursor == self.items.len() {
            self.items.push(make());
        }
        self.cursor += 1;
        self.cursor - 1
    }

    /// Hand one object back before the end of the frame
    pub fn recycle(&mut self, idx: usize) {
        debug_assert!(idx < self.cursor, "recycling a slot not checked out: {}", idx);
        debug_assert!(!self.free_list.contains(&idx), "slot recycled twice: {}", idx);
        if idx + 1 == self.cursor {
            self.cursor -= 1;
        } else {
            self.free_list.push(idx);
        }
    }

    /// Release every object. Storage is kept for the next frame.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.free_list.clear();
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        if self.is_live(idx) { self.items.get(idx) } else { None }
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        if self.is_live(idx) { self.items.get_mut(idx) } else { None }
    }

    /// Whether `idx` is currently checked out
    pub fn is_live(&self, idx: usize) -> bool {
        idx < self.cursor && !self.free_list.contains(&idx)
    }

    /// Checked-out objects with their indices
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items[..self.cursor]
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.free_list.contains(i))
    }

    /// Number of objects currently checked out
    pub fn len(&self) -> usize {
        self.cursor - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of objects ever built (storage size)
    pub fn high_water_mark(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for FramePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "frame_pool_tests.rs"]
mod tests;
