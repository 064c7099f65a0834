//! Lock primitives backing each caller tier.
//!
//! | Lock | State | `try_acquire` | `release` |
//! |---|---|---|---|
//! | [`ExclusiveLock`] | held / not held | fails immediately when held | no-op when not held |
//! | [`CountingLock`] | holder count | always succeeds, increments | decrements, never below zero |
//!
//! Both are plain atomics: a lock is not tied to the task that acquired it,
//! so a higher tier can force-release a lower tier's lock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Common interface of the per-tier locks.
pub trait TierLock: Send + Sync {
    /// Attempt to take the lock without waiting.  Returns `true` on success.
    fn try_acquire(&self) -> bool;

    /// Take the lock, waiting if the lock kind requires it.
    ///
    /// The exclusive lock spins on the calling thread; call this from
    /// synchronous code only, never from inside a Tokio task.
    fn acquire(&self);

    /// Release one hold.  Returns `false` when there was nothing to release.
    fn release(&self) -> bool;

    /// Whether at least one hold is outstanding.
    fn is_held(&self) -> bool;
}

/// Binary lock with non-blocking admission.
#[derive(Debug, Default)]
pub struct ExclusiveLock {
    held: AtomicBool,
}

impl ExclusiveLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TierLock for ExclusiveLock {
    fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn acquire(&self) {
        while !self.try_acquire() {
            std::thread::yield_now();
        }
    }

    fn release(&self) -> bool {
        self.held.swap(false, Ordering::AcqRel)
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Counting lock: any number of concurrent holders.
#[derive(Debug, Default)]
pub struct CountingLock {
    count: AtomicUsize,
}

impl CountingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of holders.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

impl TierLock for CountingLock {
    fn try_acquire(&self) -> bool {
        self.acquire();
        true
    }

    fn acquire(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1))
            .is_ok()
    }

    fn is_held(&self) -> bool {
        self.count() > 0
    }
}
