//! Bus listeners that connect the coordinator to the rest of the robot.
//!
//! * Perception updates on [`Topic::Perception`] feed the observation store.
//! * [`EventPayload::EgoReady`] on [`Topic::SystemAlerts`] opens the
//!   readiness gate.
//! * Device commands and control signals are echoed to the terminal.

use std::sync::Arc;

use aliveos_kernel::ReadinessGate;
use aliveos_middleware::{EventBus, Topic, TopicReceiver};
use aliveos_runtime::Coordinator;
use aliveos_types::{Event, EventPayload};
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

pub fn spawn_perception_listener(bus: &EventBus, coordinator: Arc<Coordinator>) -> JoinHandle<()> {
    let rx = bus.subscribe_to(Topic::Perception);
    tokio::spawn(drain(rx, move |event| {
        if let EventPayload::Perception(p) = event.payload {
            coordinator.observe_perception(&p.symbol, &p.modifier);
        }
    }))
}

pub fn spawn_readiness_listener(bus: &EventBus, gate: ReadinessGate) -> JoinHandle<()> {
    let rx = bus.subscribe_to(Topic::SystemAlerts);
    tokio::spawn(drain(rx, move |event| {
        if matches!(event.payload, EventPayload::EgoReady) {
            gate.mark_ready();
        }
    }))
}

pub fn spawn_monitor(bus: &EventBus) -> JoinHandle<()> {
    let devices = bus.subscribe_to(Topic::DeviceCommands);
    let ego = bus.subscribe_to(Topic::EgoCommands);
    tokio::spawn(async move {
        tokio::join!(drain(devices, echo), drain(ego, echo));
    })
}

fn echo(event: Event) {
    match event.payload {
        EventPayload::DeviceCommand(cmd) => println!(
            "\n  {} {} - {}({})",
            "c2c -> dev:".dimmed(),
            cmd.device.bold(),
            cmd.command.cyan(),
            cmd.argument
        ),
        EventPayload::ControlSignal(signal) => {
            println!("\n  {} {}", "-> ego:".dimmed(), signal.to_string().magenta())
        }
        _ => {}
    }
}

/// Feed every event on `rx` to `handle` until the bus closes.
async fn drain(mut rx: TopicReceiver, mut handle: impl FnMut(Event)) {
    loop {
        match rx.recv().await {
            Ok(event) => handle(event),
            Err(RecvError::Lagged(n)) => {
                warn!(topic = ?rx.topic(), lagged_by = n, "listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
