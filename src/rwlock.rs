use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU32, Ordering},
};

use crossbeam_utils::Backoff;

use crate::RawSimpleLock;

const UNLOCKED: u32 = 0;
// Bit 0 flags a writer; bits 1..32 count readers, so one reader is worth
// READER_UNIT in the raw word.
const WRITE: u32 = 1 << 0;
const READER_UNIT: u32 = 1 << 1;
const READER_MASK: u32 = !WRITE;

/// Busy-waiting reader/writer lock on a single bit-packed state word.
///
/// Any number of readers or one writer may hold the lock. A zeroed word is a
/// valid unlocked lock, and like [`RawSpinLock`](crate::RawSpinLock) the lock
/// is not tied to its holders.
///
/// The reader count may be transiently nonzero while a writer holds the lock:
/// a reader claims its slot by incrementing first and checks the write bit
/// after. The claim either stands (the reader waits for the writer to leave)
/// or is undone by an independent decrement (`try_read_lock`). The write bit
/// is disjoint from the count bits, so writer exclusivity is unaffected.
pub struct RawSpinRwLock {
    state: AtomicU32,
}

impl RawSpinRwLock {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    /// Acquires a shared read lock, waiting for any writer to leave.
    pub fn read_lock(&self) {
        let state = self.state.fetch_add(READER_UNIT, Ordering::Acquire);
        debug_assert!(
            state & READER_MASK != READER_MASK,
            "spinlock: reader count overflow"
        );

        if state & WRITE == 0 {
            return;
        }

        // The increment above stands as this reader's claim; wait for the
        // write bit to clear instead of retrying it.
        let backoff = Backoff::new();

        loop {
            if self.state.load(Ordering::Acquire) & WRITE == 0 {
                return;
            }

            backoff.snooze();
        }
    }

    /// Makes a single read-acquisition attempt, without spinning.
    pub fn try_read_lock(&self) -> bool {
        let state = self.state.fetch_add(READER_UNIT, Ordering::Acquire);

        if state & WRITE == 0 {
            return true;
        }

        // Undo the claim. Racing threads may observe the transient count
        // before this lands; the write bit is untouched either way.
        self.state.fetch_sub(READER_UNIT, Ordering::Release);
        false
    }

    /// Releases one read lock; other simultaneous readers are unaffected.
    ///
    /// # Panics
    ///
    /// Panics if no read lock was held, detected as reader-count underflow.
    pub fn read_unlock(&self) {
        let state = self.state.fetch_sub(READER_UNIT, Ordering::Release);

        if state & READER_MASK == 0 {
            panic!("spinlock: read_unlock of unlocked rwlock");
        }
    }

    /// Acquires the write lock, spinning until the word reads fully unlocked.
    ///
    /// There is no priority policy: the writer simply waits for zero readers
    /// and no writer.
    pub fn write_lock(&self) {
        let backoff = Backoff::new();

        while self
            .state
            .compare_exchange_weak(UNLOCKED, WRITE, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
    }

    /// Makes a single write-acquisition attempt, without spinning.
    pub fn try_write_lock(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, WRITE, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the write lock by clearing the write bit.
    ///
    /// # Panics
    ///
    /// Panics if the write bit was not set.
    pub fn write_unlock(&self) {
        let state = self.state.fetch_sub(WRITE, Ordering::Release);

        if state & WRITE == 0 {
            panic!("spinlock: write_unlock of unlocked rwlock");
        }
    }

    /// Returns a view whose [`RawSimpleLock`] operations are backed by the
    /// read half, for callers expecting a generic exclusive-lock capability.
    pub fn read_locker(&self) -> &ReadLocker {
        // SAFETY: ReadLocker is #[repr(transparent)] over RawSpinRwLock.
        unsafe { &*(self as *const RawSpinRwLock as *const ReadLocker) }
    }
}

impl Default for RawSpinRwLock {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl RawSimpleLock for RawSpinRwLock {
    #[inline]
    fn try_lock(&self) -> bool {
        self.try_write_lock()
    }

    #[inline]
    fn lock(&self) {
        self.write_lock();
    }

    #[inline]
    fn unlock(&self) {
        self.write_unlock();
    }
}

/// Read-half adapter over [`RawSpinRwLock`]; holds no state of its own.
#[repr(transparent)]
pub struct ReadLocker(RawSpinRwLock);

unsafe impl RawSimpleLock for ReadLocker {
    #[inline]
    fn try_lock(&self) -> bool {
        self.0.try_read_lock()
    }

    #[inline]
    fn lock(&self) {
        self.0.read_lock();
    }

    #[inline]
    fn unlock(&self) {
        self.0.read_unlock();
    }
}

pub struct SpinRwLock<T> {
    lock: RawSpinRwLock,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinRwLock<T> {}
unsafe impl<T: Send + Sync> Sync for SpinRwLock<T> {}

unsafe impl<'s, T> Send for ReadGuard<'s, T> {}
unsafe impl<'s, T: Send + Sync> Sync for ReadGuard<'s, T> {}

unsafe impl<'s, T> Send for WriteGuard<'s, T> {}
unsafe impl<'s, T: Send + Sync> Sync for WriteGuard<'s, T> {}

pub struct ReadGuard<'s, T> {
    lock: &'s SpinRwLock<T>,
}

pub struct WriteGuard<'s, T> {
    lock: &'s SpinRwLock<T>,
}

impl<T> SpinRwLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            lock: RawSpinRwLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn read(&self) -> ReadGuard<T> {
        self.lock.read_lock();

        ReadGuard { lock: self }
    }

    pub fn try_read(&self) -> Option<ReadGuard<T>> {
        if self.lock.try_read_lock() {
            Some(ReadGuard { lock: self })
        } else {
            None
        }
    }

    pub fn write(&self) -> WriteGuard<T> {
        self.lock.write_lock();

        WriteGuard { lock: self }
    }

    pub fn try_write(&self) -> Option<WriteGuard<T>> {
        if self.lock.try_write_lock() {
            Some(WriteGuard { lock: self })
        } else {
            None
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<'s, T> Deref for ReadGuard<'s, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'s, T> Drop for ReadGuard<'s, T> {
    fn drop(&mut self) {
        self.lock.lock.read_unlock();
    }
}

impl<'s, T> Deref for WriteGuard<'s, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'s, T> DerefMut for WriteGuard<'s, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'s, T> Drop for WriteGuard<'s, T> {
    fn drop(&mut self) {
        self.lock.lock.write_unlock();
    }
}
