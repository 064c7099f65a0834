//! `aliveos-runtime` – Concept to Commands
//!
//! Turns symbolic concepts into ordered device commands while arbitrating
//! between the Ego, Instinct and Reflex caller tiers.
//!
//! # Modules
//!
//! - [`registry`] – [`ConceptRegistry`][registry::ConceptRegistry]: write-once
//!   store of [`ConceptDescriptor`][aliveos_types::ConceptDescriptor]s.
//! - [`resolver`] – [`CommandResolver`][resolver::CommandResolver]: picks the
//!   command list for a concept and modifier.
//! - [`executor`] – [`CommandExecutor`][executor::CommandExecutor]: runs a
//!   command list, handling the internal `wait` command itself and
//!   forwarding everything else to a
//!   [`CommandSink`][aliveos_middleware::CommandSink].
//! - [`observation`] – [`ObservationStore`][observation::ObservationStore]:
//!   latest perceived modifier per symbol.
//! - [`coordinator`] – [`Coordinator`][coordinator::Coordinator]: the
//!   per-tier dispatch entry points, Ego pause/reset/continue control and the
//!   startup readiness barrier.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus optional OTLP span export.

pub mod coordinator;
pub mod executor;
pub mod observation;
pub mod registry;
pub mod resolver;
pub mod telemetry;

pub use coordinator::{Coordinator, DispatchResult};
pub use executor::CommandExecutor;
pub use observation::ObservationStore;
pub use registry::ConceptRegistry;
pub use resolver::CommandResolver;
pub use telemetry::{LogFormat, TelemetryConfig, TracerProviderGuard, init_tracing};
