//! `aliveos-kernel` – Admission & Orchestration
//!
//! Decides who may run a concept right now.  It does not resolve or execute
//! anything; it enforces the tier discipline.
//!
//! # Modules
//!
//! - [`tier_lock`] – the [`TierLock`][tier_lock::TierLock] trait with its two
//!   implementations: the binary, non-blocking
//!   [`ExclusiveLock`][tier_lock::ExclusiveLock] and the never-rejecting
//!   [`CountingLock`][tier_lock::CountingLock].
//! - [`concurrency_manager`] – [`ConcurrencyManager`][concurrency_manager::ConcurrencyManager]:
//!   one lock per [`Tier`][aliveos_types::Tier], each with its own admission
//!   policy, handing out RAII [`TierPermit`][concurrency_manager::TierPermit]s.
//! - [`readiness`] – [`ReadinessGate`][readiness::ReadinessGate]: the
//!   one-time startup barrier waited on before the first `Continue` signal.

pub mod concurrency_manager;
pub mod readiness;
pub mod tier_lock;

pub use concurrency_manager::{ConcurrencyManager, LockStatus, TierPermit};
pub use readiness::ReadinessGate;
pub use tier_lock::{CountingLock, ExclusiveLock, TierLock};
