use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU32, Ordering},
};

use crossbeam_utils::Backoff;

use crate::RawSimpleLock;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// Busy-waiting mutual exclusion on a single state word.
///
/// The state is only ever `UNLOCKED` or `LOCKED`. A zeroed word is a valid
/// unlocked lock. The lock is not tied to its holder: one thread may lock
/// and arrange for another to unlock.
pub struct RawSpinLock {
    state: AtomicU32,
}

impl RawSpinLock {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    /// Acquires the lock, spinning until it is available.
    pub fn lock(&self) {
        let backoff = Backoff::new();

        while self
            .state
            .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
    }

    /// Makes a single acquisition attempt, without spinning.
    pub fn try_lock(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock.
    ///
    /// # Panics
    ///
    /// Panics if the lock was not held. Detection uses only the arithmetic
    /// result of the decrement; there is no holder bookkeeping.
    pub fn unlock(&self) {
        let state = self.state.fetch_sub(LOCKED, Ordering::Release);

        if state != LOCKED {
            panic!("spinlock: unlock of unlocked mutex");
        }
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl RawSimpleLock for RawSpinLock {
    #[inline]
    fn try_lock(&self) -> bool {
        RawSpinLock::try_lock(self)
    }

    #[inline]
    fn lock(&self) {
        RawSpinLock::lock(self);
    }

    #[inline]
    fn unlock(&self) {
        RawSpinLock::unlock(self);
    }
}

pub struct SpinLock<T> {
    lock: RawSpinLock,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

unsafe impl<'s, T> Send for Guard<'s, T> {}
unsafe impl<'s, T: Send + Sync> Sync for Guard<'s, T> {}

pub struct Guard<'s, T> {
    lock: &'s SpinLock<T>,
}

impl<T> SpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            lock: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> Guard<T> {
        self.lock.lock();

        Guard { lock: self }
    }

    pub fn try_lock(&self) -> Option<Guard<T>> {
        if self.lock.try_lock() {
            Some(Guard { lock: self })
        } else {
            None
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<'s, T> Deref for Guard<'s, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'s, T> DerefMut for Guard<'s, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'s, T> Drop for Guard<'s, T> {
    fn drop(&mut self) {
        self.lock.lock.unlock();
    }
}
