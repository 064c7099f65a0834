//! [`Coordinator`] – the concept-to-commands dispatch engine.
//!
//! Every inbound request carries a `(symbol, modifier, tier)` triple.  The
//! tier picks the entry point:
//!
//! | Entry point | Admission | Around execution |
//! |---|---|---|
//! | [`Coordinator::dispatch_ego`] | Ego exclusive lock, [`C2cError::Busy`] when held | releases the Ego lock if still held |
//! | [`Coordinator::dispatch_instinct`] | Instinct exclusive lock, [`C2cError::Busy`] when held | `Pause` + `Reset` Ego before, `Continue` after |
//! | [`Coordinator::dispatch_reflex`] | counting lock, never refused | nothing |
//!
//! Between admission and release the concept is resolved by the
//! [`CommandResolver`] and run by the [`CommandExecutor`].  Every path
//! returns a [`DispatchResult`]; nothing here panics on bad input.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use aliveos_middleware::{BusSink, EventBus};
//! use aliveos_runtime::Coordinator;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = Arc::new(EventBus::default());
//! let coordinator = Coordinator::new(Arc::new(BusSink::new(bus)));
//!
//! coordinator
//!     .register_descriptor_json(r#"{"name": "move", "descriptor": [
//!         {"modifier": "", "commands": [
//!             {"command": "forward", "device_name": "wheels", "arguments": "1.0"}
//!         ]}
//!     ]}"#)
//!     .unwrap();
//!
//! assert!(coordinator.dispatch_reflex("move", "()").await.is_ok());
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use aliveos_kernel::{ConcurrencyManager, LockStatus, ReadinessGate, TierPermit};
use aliveos_middleware::CommandSink;
use aliveos_types::{
    C2cError, C2cResponse, ConceptDescriptor, ConceptRequest, ControlSignal, Tier,
};
use tracing::{debug, error, info, instrument, warn};

use crate::executor::CommandExecutor;
use crate::observation::ObservationStore;
use crate::registry::ConceptRegistry;
use crate::resolver::CommandResolver;

/// Outcome of one dispatch.  Map it onto the wire vocabulary with
/// [`C2cResponse::from_result`].
pub type DispatchResult = Result<(), C2cError>;

pub struct Coordinator {
    registry: Arc<ConceptRegistry>,
    resolver: CommandResolver,
    executor: CommandExecutor,
    locks: ConcurrencyManager,
    observations: ObservationStore,
    sink: Arc<dyn CommandSink>,
    started: AtomicBool,
}

impl Coordinator {
    /// Build a coordinator emitting through `sink`.  All tier locks start
    /// free and the registry starts empty.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        let registry = Arc::new(ConceptRegistry::new());
        Self {
            resolver: CommandResolver::new(Arc::clone(&registry)),
            executor: CommandExecutor::new(Arc::clone(&sink)),
            registry,
            locks: ConcurrencyManager::new(),
            observations: ObservationStore::new(),
            sink,
            started: AtomicBool::new(false),
        }
    }

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    /// Wait for Ego to report ready, then send the initial `Continue`.
    ///
    /// Only the first call emits; later calls return immediately.
    pub async fn start(&self, gate: &ReadinessGate, poll_interval: Duration) {
        gate.wait_ready(poll_interval).await;
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("ego ready; releasing it");
            self.unpause_ego();
        }
    }

    // -----------------------------------------------------------------------
    // Registration & perception
    // -----------------------------------------------------------------------

    pub fn register_descriptor(&self, descriptor: ConceptDescriptor) -> Result<(), C2cError> {
        self.registry.register(descriptor)
    }

    /// Register a JSON-encoded `{name, descriptor}` payload.
    pub fn register_descriptor_json(&self, raw: &str) -> Result<(), C2cError> {
        debug!(descriptor_json = raw, "register concept descriptor");
        let descriptor = ConceptDescriptor::from_json(raw).inspect_err(|e| {
            error!(error = %e, "rejecting concept descriptor");
        })?;
        self.register_descriptor(descriptor)
    }

    /// Wire-level registration: answers `ok` or `error`.
    pub fn handle_registration(&self, raw: &str) -> C2cResponse {
        C2cResponse::from_result(&self.register_descriptor_json(raw))
    }

    pub fn observe_perception(&self, symbol: &str, modifier: &str) {
        debug!(symbol, modifier, "d2c -> c2c");
        self.observations.observe(symbol, modifier);
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Resolve and run a concept without any tier admission.
    pub async fn execute_concept(&self, symbol: &str, modifier: &str) -> DispatchResult {
        let commands = self.resolver.resolve(symbol, modifier).inspect_err(|e| {
            error!(error = %e, "cannot resolve concept");
        })?;
        self.executor.run(&commands).await
    }

    #[instrument(skip(self), fields(tier = "ego"))]
    pub async fn dispatch_ego(&self, symbol: &str, modifier: &str) -> DispatchResult {
        let _permit = self.locks.admit(Tier::Ego)?;
        self.execute_concept(symbol, modifier).await
    }

    #[instrument(skip(self), fields(tier = "instinct"))]
    pub async fn dispatch_instinct(&self, symbol: &str, modifier: &str) -> DispatchResult {
        let permit = self.locks.admit(Tier::Instinct)?;
        self.pause_ego();
        self.reset_ego();
        let _scope = InstinctScope {
            coordinator: self,
            permit: Some(permit),
        };
        self.execute_concept(symbol, modifier).await
    }

    #[instrument(skip(self), fields(tier = "reflex"))]
    pub async fn dispatch_reflex(&self, symbol: &str, modifier: &str) -> DispatchResult {
        let _permit = self.locks.admit(Tier::Reflex)?;
        self.execute_concept(symbol, modifier).await
    }

    /// Route to the entry point for `tier`.
    pub async fn dispatch(&self, tier: Tier, symbol: &str, modifier: &str) -> DispatchResult {
        match tier {
            Tier::Ego => self.dispatch_ego(symbol, modifier).await,
            Tier::Instinct => self.dispatch_instinct(symbol, modifier).await,
            Tier::Reflex => self.dispatch_reflex(symbol, modifier).await,
        }
    }

    /// Wire-level `RequestConceptExecution`.  An unknown tier code touches
    /// no lock and falls through to the default `ok` answer.
    pub async fn handle_request(&self, request: &ConceptRequest) -> C2cResponse {
        debug!(
            symbol = %request.symbol,
            modifier = %request.modifier,
            tier = request.tier,
            "mind -> c2c"
        );
        match Tier::from_code(request.tier) {
            Some(tier) => {
                let result = self.dispatch(tier, &request.symbol, &request.modifier).await;
                C2cResponse::from_result(&result)
            }
            None => {
                warn!(tier = request.tier, "request for unknown tier; nothing dispatched");
                C2cResponse::Ok
            }
        }
    }

    // -----------------------------------------------------------------------
    // Ego control
    // -----------------------------------------------------------------------

    pub fn pause_ego(&self) {
        debug!("pause_ego");
        self.sink.emit_control_signal(ControlSignal::Pause);
    }

    /// Force-release the Ego lock (no-op when free) and tell Ego to drop
    /// its in-flight state.
    pub fn reset_ego(&self) {
        debug!("reset_ego");
        self.locks.force_release_ego();
        self.sink.emit_control_signal(ControlSignal::Reset);
    }

    pub fn unpause_ego(&self) {
        debug!("unpause_ego");
        self.sink.emit_control_signal(ControlSignal::Continue);
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    pub fn observations(&self) -> &ObservationStore {
        &self.observations
    }

    pub fn lock_status(&self) -> LockStatus {
        self.locks.status()
    }
}

/// Open Instinct dispatch.  Dropping it, on completion or cancellation,
/// sends `Continue` to Ego and then releases the Instinct lock.
struct InstinctScope<'a> {
    coordinator: &'a Coordinator,
    permit: Option<TierPermit<'a>>,
}

impl Drop for InstinctScope<'_> {
    fn drop(&mut self) {
        self.coordinator.unpause_ego();
        drop(self.permit.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::{Emitted, RecordingSink};
    use aliveos_types::{CommandArgs, CommandSpec, DeviceCommand, ModifierEntry};
    use std::time::Instant;

    fn concept(name: &str, commands: Vec<CommandSpec>) -> ConceptDescriptor {
        ConceptDescriptor::new(
            name,
            vec![ModifierEntry {
                modifier: String::new(),
                commands,
            }],
        )
    }

    fn forward() -> CommandSpec {
        CommandSpec::new("wheels", "forward", Some(CommandArgs::Single("1.0".into())))
    }

    fn wait(secs: &str) -> CommandSpec {
        CommandSpec::new("", "wait", Some(CommandArgs::List(vec![secs.to_string()])))
    }

    fn setup() -> (Arc<Coordinator>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let coordinator = Arc::new(Coordinator::new(sink.clone()));
        coordinator.register_descriptor(concept("move", vec![forward()])).unwrap();
        coordinator.register_descriptor(concept("linger", vec![wait("0.2")])).unwrap();
        (coordinator, sink)
    }

    fn forward_emitted() -> Emitted {
        Emitted::Device(DeviceCommand {
            device: "wheels".into(),
            command: "forward".into(),
            argument: "1.0".into(),
        })
    }

    #[tokio::test]
    async fn reflex_move_emits_one_device_command() {
        let (coordinator, sink) = setup();
        assert_eq!(coordinator.dispatch_reflex("move", "").await, Ok(()));
        assert_eq!(sink.emitted(), vec![forward_emitted()]);
        assert_eq!(coordinator.lock_status().reflex_active, 0);
    }

    #[tokio::test]
    async fn wait_concept_suspends_without_device_traffic() {
        let sink = Arc::new(RecordingSink::default());
        let coordinator = Coordinator::new(sink.clone());
        coordinator
            .register_descriptor(concept("pause", vec![wait("0.05")]))
            .unwrap();

        let started = Instant::now();
        assert_eq!(coordinator.dispatch_reflex("pause", "").await, Ok(()));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(sink.emitted().is_empty());
    }

    #[tokio::test]
    async fn unknown_concept_and_modifier_are_error_values() {
        let (coordinator, _) = setup();
        assert_eq!(
            coordinator.dispatch_ego("dance", "").await,
            Err(C2cError::UnknownConcept("dance".into()))
        );
        assert!(matches!(
            coordinator.dispatch_ego("move", "sideways").await,
            Err(C2cError::UnknownModifier { .. })
        ));
        // A failed Ego execution still gives the lock back.
        assert!(!coordinator.lock_status().ego_held);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_ego_dispatch_is_busy() {
        let (coordinator, _) = setup();

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.dispatch_ego("linger", "").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        let second = coordinator.dispatch_ego("move", "").await;
        assert_eq!(second, Err(C2cError::Busy(Tier::Ego)));
        assert!(started.elapsed() < Duration::from_millis(100), "Busy must not wait");

        assert_eq!(first.await.unwrap(), Ok(()));
        assert!(!coordinator.lock_status().ego_held);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reflex_dispatch_never_busy() {
        let (coordinator, _) = setup();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.dispatch_reflex("linger", "").await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(coordinator.lock_status().reflex_active > 0);

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(()));
        }
        assert_eq!(coordinator.lock_status().reflex_active, 0);
    }

    #[tokio::test]
    async fn instinct_signals_around_execution() {
        let (coordinator, sink) = setup();
        assert_eq!(coordinator.dispatch_instinct("move", "").await, Ok(()));
        assert_eq!(
            sink.emitted(),
            vec![
                Emitted::Signal(ControlSignal::Pause),
                Emitted::Signal(ControlSignal::Reset),
                forward_emitted(),
                Emitted::Signal(ControlSignal::Continue),
            ]
        );
        assert!(!coordinator.lock_status().instinct_held);
    }

    #[tokio::test]
    async fn instinct_continues_ego_even_on_error() {
        let (coordinator, sink) = setup();
        assert!(coordinator.dispatch_instinct("dance", "").await.is_err());
        assert_eq!(
            sink.emitted(),
            vec![
                Emitted::Signal(ControlSignal::Pause),
                Emitted::Signal(ControlSignal::Reset),
                Emitted::Signal(ControlSignal::Continue),
            ]
        );
        assert!(!coordinator.lock_status().instinct_held);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn instinct_preempts_running_ego() {
        let (coordinator, sink) = setup();

        let ego = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.dispatch_ego("linger", "").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(coordinator.lock_status().ego_held);

        assert_eq!(coordinator.dispatch_instinct("move", "").await, Ok(()));
        // Reset cleared the Ego lock while Ego was still waiting.
        assert!(!coordinator.lock_status().ego_held);
        assert_eq!(
            sink.emitted(),
            vec![
                Emitted::Signal(ControlSignal::Pause),
                Emitted::Signal(ControlSignal::Reset),
                forward_emitted(),
                Emitted::Signal(ControlSignal::Continue),
            ]
        );

        assert_eq!(ego.await.unwrap(), Ok(()));
        assert!(!coordinator.lock_status().ego_held);
    }

    #[tokio::test]
    async fn cancelled_instinct_still_continues_ego() {
        let (coordinator, sink) = setup();
        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            coordinator.dispatch_instinct("linger", ""),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(
            sink.emitted(),
            vec![
                Emitted::Signal(ControlSignal::Pause),
                Emitted::Signal(ControlSignal::Reset),
                Emitted::Signal(ControlSignal::Continue),
            ]
        );
        assert!(!coordinator.lock_status().instinct_held);
        assert_eq!(coordinator.dispatch_instinct("move", "").await, Ok(()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_instinct_dispatch_is_busy() {
        let (coordinator, _) = setup();
        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.dispatch_instinct("linger", "").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            coordinator.dispatch_instinct("move", "").await,
            Err(C2cError::Busy(Tier::Instinct))
        );
        assert_eq!(first.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn handle_request_routes_by_tier_code() {
        let (coordinator, sink) = setup();
        let request = |tier: u8| ConceptRequest {
            symbol: "move".into(),
            modifier: "()".into(),
            tier,
        };

        assert_eq!(coordinator.handle_request(&request(Tier::Reflex.code())).await, C2cResponse::Ok);
        assert_eq!(coordinator.handle_request(&request(Tier::Ego.code())).await, C2cResponse::Ok);
        assert_eq!(sink.emitted().len(), 2);

        // Unknown codes dispatch nothing and answer the default.
        assert_eq!(coordinator.handle_request(&request(42)).await, C2cResponse::Ok);
        assert_eq!(sink.emitted().len(), 2);
        assert_eq!(
            coordinator.lock_status(),
            LockStatus {
                ego_held: false,
                instinct_held: false,
                reflex_active: 0,
            }
        );
    }

    #[tokio::test]
    async fn handle_request_reports_busy() {
        let (coordinator, _) = setup();
        let _held = coordinator.locks.admit(Tier::Ego).unwrap();
        let response = coordinator
            .handle_request(&ConceptRequest {
                symbol: "move".into(),
                modifier: String::new(),
                tier: Tier::Ego.code(),
            })
            .await;
        assert_eq!(response, C2cResponse::Busy);
    }

    #[test]
    fn registration_json_paths() {
        let (coordinator, _) = setup();
        let raw = r#"{"name": "blink", "descriptor": [{"modifier": "", "commands": [
            {"command": "on", "device_name": "led"}]}]}"#;
        assert_eq!(coordinator.handle_registration(raw), C2cResponse::Ok);
        assert_eq!(coordinator.handle_registration(raw), C2cResponse::Error);
        assert_eq!(coordinator.handle_registration("not json"), C2cResponse::Error);
        assert_eq!(
            coordinator.register_descriptor_json(raw),
            Err(C2cError::DuplicateConcept("blink".into()))
        );
    }

    #[test]
    fn perception_updates_observation_store() {
        let (coordinator, _) = setup();
        coordinator.observe_perception("distance", "near");
        coordinator.observe_perception("distance", "far");
        assert_eq!(
            coordinator.observations().latest("distance").as_deref(),
            Some("far")
        );
    }

    #[tokio::test]
    async fn start_waits_for_readiness_and_continues_once() {
        let (coordinator, sink) = setup();
        let gate = ReadinessGate::new();

        let pending = tokio::time::timeout(
            Duration::from_millis(30),
            coordinator.start(&gate, Duration::from_millis(5)),
        )
        .await;
        assert!(pending.is_err());
        assert!(sink.emitted().is_empty());

        gate.mark_ready();
        coordinator.start(&gate, Duration::from_millis(5)).await;
        coordinator.start(&gate, Duration::from_millis(5)).await;
        assert_eq!(sink.emitted(), vec![Emitted::Signal(ControlSignal::Continue)]);
    }

    #[test]
    fn standalone_reset_when_ego_idle_is_safe() {
        let (coordinator, sink) = setup();
        coordinator.reset_ego();
        assert!(!coordinator.lock_status().ego_held);
        assert_eq!(sink.emitted(), vec![Emitted::Signal(ControlSignal::Reset)]);
    }
}
