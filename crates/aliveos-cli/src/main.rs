//! `aliveos-cli` – Concept Coordinator process
//!
//! This binary hosts the concept-to-commands coordinator.  It:
//!
//! 1. Loads `~/.aliveos/c2c.toml` (writing defaults on first run) and applies
//!    `ALIVEOS_*` environment overrides.
//! 2. Initialises logging and optional OTLP span export.
//! 3. Builds the event bus and the [`Coordinator`], preloading concept
//!    descriptors from `concepts_dir`.
//! 4. Waits for Ego readiness in the background and then releases Ego with a
//!    `Continue` signal.
//! 5. Drops the operator into an interactive shell.
//! 6. Intercepts **Ctrl-C** to pause Ego and exit safely.

mod config;
mod preload;
mod repl;
mod wiring;

use colored::Colorize;
use std::sync::Arc;
use tracing::{info, warn};

use aliveos_kernel::ReadinessGate;
use aliveos_middleware::{BusSink, EventBus};
use aliveos_runtime::{Coordinator, TelemetryConfig, init_tracing};

fn main() {
    // ── Configuration ─────────────────────────────────────────────────────
    let (mut cfg, first_run) = match config::load() {
        Ok(Some(cfg)) => (cfg, false),
        Ok(None) => (config::Config::default(), true),
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            (config::Config::default(), false)
        }
    };
    if first_run {
        match config::save(&cfg) {
            Ok(()) => println!(
                "  {} Default config written to {}",
                "✓".green().bold(),
                config::config_path().display().to_string().bold()
            ),
            Err(e) => eprintln!("{}: {}", "Error saving config".red(), e),
        }
    }
    config::apply_env_overrides(&mut cfg);

    // ── Structured logging ────────────────────────────────────────────────
    let _telemetry = init_tracing(&TelemetryConfig {
        service_name: "aliveos-c2c".to_string(),
        log_format: cfg.log_format,
        otlp_endpoint: cfg.otlp_endpoint.clone(),
    });
    info!(?cfg, "configuration loaded");

    print_banner();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            std::process::exit(1);
        }
    };

    // ── Coordinator ───────────────────────────────────────────────────────
    let bus = Arc::new(EventBus::new(cfg.bus_capacity));
    let coordinator = Arc::new(Coordinator::new(Arc::new(BusSink::new(bus.clone()))));

    if let Some(dir) = &cfg.concepts_dir {
        match preload::preload_concepts(&coordinator, dir) {
            Ok(report) => println!(
                "  Preloaded {} concept(s) from {} ({} skipped)",
                report.loaded.len().to_string().bold(),
                dir.display(),
                report.failed.len()
            ),
            Err(e) => println!("{}: {}", "Preload error".red(), e),
        }
    }

    // ── Bus wiring & readiness barrier ────────────────────────────────────
    let gate = ReadinessGate::new();
    {
        let _enter = runtime.enter();
        wiring::spawn_monitor(&bus);
        wiring::spawn_perception_listener(&bus, Arc::clone(&coordinator));
        wiring::spawn_readiness_listener(&bus, gate.clone());
    }
    if cfg.ego_ready_on_start {
        gate.mark_ready();
    } else {
        println!("  Waiting for Ego; type {} to announce it.", "/ready".bold().cyan());
    }
    {
        let coordinator = Arc::clone(&coordinator);
        let gate = gate.clone();
        let poll_interval = cfg.ready_poll_interval();
        runtime.spawn(async move { coordinator.start(&gate, poll_interval).await });
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    {
        let coordinator = Arc::clone(&coordinator);
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "⚠  Ctrl-C received – pausing Ego and shutting down …".yellow().bold());
            coordinator.pause_ego();
            std::process::exit(0);
        }) {
            warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
        }
    }

    println!(
        "  Type {} for a list of commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    let shell = repl::Shell {
        coordinator,
        bus,
        runtime: runtime.handle().clone(),
    };
    repl::run(&shell);
}

fn print_banner() {
    println!();
    println!("{}", "   ___ ___  ___ ".bold().cyan());
    println!("{}", "  / __|_  )/ __|".bold().cyan());
    println!("{}", " | (__ / /| (__ ".bold().cyan());
    println!("{}", "  \\___/___|\\___|".bold().cyan());
    println!();
    println!("  {} {}",
        "AliveOS Concept Coordinator".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Concepts in, device commands out");
    println!();
}
