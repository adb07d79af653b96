use std::cell::UnsafeCell;

use crossbeam_utils::thread::scope;
use spinlock::RawSimpleLock;

struct RacyCounter(UnsafeCell<usize>);

unsafe impl Sync for RacyCounter {}

// Hammer a plain non-atomic counter behind `lock` and check that no
// increment was lost or torn.
pub fn check_mutual_exclusion<L: RawSimpleLock + Sync>(lock: &L, threads: usize, iters: usize) {
    let counter = RacyCounter(UnsafeCell::new(0));

    scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|_| {
                for _ in 0..iters {
                    lock.lock();
                    unsafe { *counter.0.get() += 1 };
                    lock.unlock();
                }
            });
        }
    })
    .unwrap();

    assert_eq!(unsafe { *counter.0.get() }, threads * iters);
}

// Cycle lock/unlock from many threads without touching shared data, for
// capabilities that only exclude writers rather than each other.
pub fn check_lock_unlock_cycles<L: RawSimpleLock + Sync>(lock: &L, threads: usize, iters: usize) {
    scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|_| {
                for _ in 0..iters {
                    lock.lock();
                    lock.unlock();
                }
            });
        }
    })
    .unwrap();
}
