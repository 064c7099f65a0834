//! [`ConcurrencyManager`] – per-tier admission control.
//!
//! One lock per [`Tier`], created once and living for the process lifetime:
//!
//! | Tier | Lock | Admission |
//! |---|---|---|
//! | Ego | [`ExclusiveLock`] | try-acquire; [`C2cError::Busy`] when held |
//! | Instinct | [`ExclusiveLock`] | try-acquire; [`C2cError::Busy`] when held |
//! | Reflex | [`CountingLock`] | always admitted |
//!
//! A successful [`ConcurrencyManager::admit`] returns a [`TierPermit`] that
//! releases its hold when dropped, so a dispatch that is cancelled mid-flight
//! still gives its lock back.
//!
//! # Example
//!
//! ```
//! use aliveos_kernel::ConcurrencyManager;
//! use aliveos_types::{C2cError, Tier};
//!
//! let manager = ConcurrencyManager::new();
//!
//! let permit = manager.admit(Tier::Ego).unwrap();
//! assert!(matches!(manager.admit(Tier::Ego), Err(C2cError::Busy(Tier::Ego))));
//!
//! // Reflex is never rejected.
//! let _r1 = manager.admit(Tier::Reflex).unwrap();
//! let _r2 = manager.admit(Tier::Reflex).unwrap();
//! assert_eq!(manager.status().reflex_active, 2);
//!
//! drop(permit);
//! assert!(!manager.status().ego_held);
//! ```

use aliveos_types::{C2cError, Tier};
use tracing::debug;

use crate::tier_lock::{CountingLock, ExclusiveLock, TierLock};

/// Snapshot of every tier lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    pub ego_held: bool,
    pub instinct_held: bool,
    pub reflex_active: usize,
}

/// Owns the three tier locks.
#[derive(Debug, Default)]
pub struct ConcurrencyManager {
    ego: ExclusiveLock,
    instinct: ExclusiveLock,
    reflex: CountingLock,
}

impl ConcurrencyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `tier`.
    pub fn lock_for(&self, tier: Tier) -> &dyn TierLock {
        match tier {
            Tier::Ego => &self.ego,
            Tier::Instinct => &self.instinct,
            Tier::Reflex => &self.reflex,
        }
    }

    /// Apply `tier`'s admission policy.
    ///
    /// # Errors
    ///
    /// [`C2cError::Busy`] when an exclusive tier is already held.  Reflex is
    /// always admitted.
    pub fn admit(&self, tier: Tier) -> Result<TierPermit<'_>, C2cError> {
        if self.lock_for(tier).try_acquire() {
            Ok(TierPermit {
                manager: self,
                tier,
            })
        } else {
            debug!(%tier, "admission refused");
            Err(C2cError::Busy(tier))
        }
    }

    /// Release the Ego lock whoever holds it.  Safe when the lock is free.
    ///
    /// Returns `true` when a hold was actually cleared.
    pub fn force_release_ego(&self) -> bool {
        let released = self.ego.release();
        if released {
            debug!("ego lock force-released");
        }
        released
    }

    pub fn status(&self) -> LockStatus {
        LockStatus {
            ego_held: self.ego.is_held(),
            instinct_held: self.instinct.is_held(),
            reflex_active: self.reflex.count(),
        }
    }
}

/// A granted admission.  Dropping it releases the tier's hold.
///
/// For Ego the release is conditional in effect: if an Instinct reset has
/// already cleared the lock, dropping the permit is a no-op.
#[must_use = "dropping the permit immediately releases the tier"]
pub struct TierPermit<'a> {
    manager: &'a ConcurrencyManager,
    tier: Tier,
}

impl TierPermit<'_> {
    pub fn tier(&self) -> Tier {
        self.tier
    }
}

impl Drop for TierPermit<'_> {
    fn drop(&mut self) {
        let lock = self.manager.lock_for(self.tier);
        if lock.is_held() {
            lock.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_tiers_are_independent() {
        let manager = ConcurrencyManager::new();
        let _ego = manager.admit(Tier::Ego).unwrap();
        let _instinct = manager.admit(Tier::Instinct).unwrap();
        assert!(matches!(
            manager.admit(Tier::Instinct),
            Err(C2cError::Busy(Tier::Instinct))
        ));
        let status = manager.status();
        assert!(status.ego_held);
        assert!(status.instinct_held);
        assert_eq!(status.reflex_active, 0);
    }

    #[test]
    fn dropping_permit_releases_tier() {
        let manager = ConcurrencyManager::new();
        {
            let permit = manager.admit(Tier::Instinct).unwrap();
            assert_eq!(permit.tier(), Tier::Instinct);
        }
        assert!(manager.admit(Tier::Instinct).is_ok());
    }

    #[test]
    fn reflex_permits_stack_and_unwind_to_zero() {
        let manager = ConcurrencyManager::new();
        let permits: Vec<_> = (0..5).map(|_| manager.admit(Tier::Reflex).unwrap()).collect();
        assert_eq!(manager.status().reflex_active, 5);
        drop(permits);
        assert_eq!(manager.status().reflex_active, 0);
    }

    #[test]
    fn force_release_ego_when_free_is_noop() {
        let manager = ConcurrencyManager::new();
        assert!(!manager.force_release_ego());
        assert!(!manager.status().ego_held);
    }

    #[test]
    fn ego_permit_drop_after_force_release_is_noop() {
        let manager = ConcurrencyManager::new();
        let preempted = manager.admit(Tier::Ego).unwrap();
        assert!(manager.force_release_ego());

        // A new Ego caller gets in once the lock was cleared.
        let fresh = manager.admit(Tier::Ego).unwrap();
        assert!(manager.status().ego_held);

        // The preempted permit releases the shared lock on drop, matching the
        // "release if still held" rule.
        drop(preempted);
        assert!(!manager.status().ego_held);
        drop(fresh);
        assert!(!manager.status().ego_held);
    }
}
