//! Busy-waiting lock primitives built on single-word atomic state.
//!
//! Two independent locks: [`SpinLock`], a plain mutual-exclusion lock, and
//! [`SpinRwLock`], a reader/writer lock packing a write flag and a reader
//! count into one word. Both spin with a cooperative yield hint instead of
//! parking, so they suit short critical sections only.

pub mod mutex;
pub mod rwlock;

pub use mutex::RawSpinLock;
pub use mutex::SpinLock;
pub use rwlock::RawSpinRwLock;
pub use rwlock::ReadLocker;
pub use rwlock::SpinRwLock;

/// Minimal exclusive-lock capability over borrowed state.
///
/// Implementors guarantee that a successful `lock`/`try_lock` grants the
/// capability until the matching `unlock`; what the capability excludes is up
/// to the implementor ([`ReadLocker`] only excludes writers).
pub unsafe trait RawSimpleLock {
    /// Non-blocking: Try locking. If succeeding, return true, or false.
    fn try_lock(&self) -> bool;

    /// Blocking: Get locking or wait until getting locking
    fn lock(&self);

    /// Release lock
    fn unlock(&self);
}
