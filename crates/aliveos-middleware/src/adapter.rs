//! The outbound boundary of the concept coordinator.
//!
//! The coordinator never speaks to devices or to the Ego node directly.  It
//! hands resolved commands and control signals to a [`CommandSink`];
//! [`BusSink`] publishes them onto the internal [`EventBus`] where transport
//! adapters pick them up.
//!
//! Emission is fire-and-forget: no acknowledgement is awaited and nothing is
//! retried here.

use std::sync::Arc;

use aliveos_types::{ControlSignal, DeviceCommand, Event, EventPayload};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::bus::{EventBus, Topic};

/// Every outbound adapter must implement this trait.
///
/// # Contract
///
/// * `emit_device_command` – forward a resolved device command.
/// * `emit_control_signal` – deliver a `Pause` / `Reset` / `Continue` signal
///   to the Ego execution context.
///
/// Both calls are best-effort and must not block.
pub trait CommandSink: Send + Sync {
    fn emit_device_command(&self, command: DeviceCommand);

    fn emit_control_signal(&self, signal: ControlSignal);
}

/// [`CommandSink`] that publishes onto an [`EventBus`].
///
/// Device commands go to [`Topic::DeviceCommands`], control signals to
/// [`Topic::EgoCommands`].  An event published while nobody is subscribed is
/// dropped with a debug log.
#[derive(Clone)]
pub struct BusSink {
    bus: Arc<EventBus>,
    source: String,
}

impl BusSink {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            source: "aliveos-runtime::c2c".to_string(),
        }
    }

    fn publish(&self, topic: Topic, payload: EventPayload) {
        let event = Event {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: self.source.clone(),
            payload,
        };
        if let Err(e) = self.bus.publish_to(topic, event) {
            debug!(?topic, error = %e, "dropping unrouted event");
        }
    }
}

impl CommandSink for BusSink {
    fn emit_device_command(&self, command: DeviceCommand) {
        debug!(
            device = %command.device,
            command = %command.command,
            argument = %command.argument,
            "c2c -> dev"
        );
        self.publish(Topic::DeviceCommands, EventPayload::DeviceCommand(command));
    }

    fn emit_control_signal(&self, signal: ControlSignal) {
        debug!(%signal, "-> ego command");
        self.publish(Topic::EgoCommands, EventPayload::ControlSignal(signal));
    }
}
