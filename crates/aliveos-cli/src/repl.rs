//! REPL – operator shell for the concept coordinator.
//!
//! Supported slash-commands:
//!   /exec <tier> <symbol> [modifier]  – dispatch a concept (runs in the background)
//!   /register <json>                  – register a `{name, descriptor}` payload
//!   /load <file>                      – register a descriptor file
//!   /observe <symbol> <modifier>      – publish a perception update
//!   /observations                     – list the latest perceptions
//!   /concepts                         – list registered concepts
//!   /pause | /reset | /resume         – send a control signal to Ego
//!   /ready                            – announce Ego readiness on the bus
//!   /status                           – show tier lock state
//!   /quit | /exit                     – exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use aliveos_middleware::{EventBus, Topic};
use aliveos_runtime::Coordinator;
use aliveos_types::{C2cResponse, Event, EventPayload, PerceptionConcept, Tier};
use chrono::Utc;
use tokio::runtime::Handle;
use uuid::Uuid;

use crate::preload;

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    Exec {
        tier: Tier,
        symbol: String,
        modifier: String,
    },
    Register(String),
    Load(PathBuf),
    Observe {
        symbol: String,
        modifier: String,
    },
    Observations,
    Concepts,
    Pause,
    Reset,
    Resume,
    Ready,
    Status,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match head {
            "/help" => Ok(ShellCommand::Help),
            "/exec" => match args.as_slice() {
                [tier, symbol, rest @ ..] => Ok(ShellCommand::Exec {
                    tier: tier.parse::<Tier>().map_err(|e| e.to_string())?,
                    symbol: symbol.to_string(),
                    modifier: rest.first().map(|m| m.to_string()).unwrap_or_default(),
                }),
                _ => Err("usage: /exec <ego|instinct|reflex> <symbol> [modifier]".to_string()),
            },
            "/register" if !rest.is_empty() => Ok(ShellCommand::Register(rest.to_string())),
            "/register" => Err("usage: /register <json>".to_string()),
            "/load" if !rest.is_empty() => Ok(ShellCommand::Load(PathBuf::from(rest))),
            "/load" => Err("usage: /load <file>".to_string()),
            "/observe" => match args.as_slice() {
                [symbol, modifier] => Ok(ShellCommand::Observe {
                    symbol: symbol.to_string(),
                    modifier: modifier.to_string(),
                }),
                _ => Err("usage: /observe <symbol> <modifier>".to_string()),
            },
            "/observations" => Ok(ShellCommand::Observations),
            "/concepts" => Ok(ShellCommand::Concepts),
            "/pause" => Ok(ShellCommand::Pause),
            "/reset" => Ok(ShellCommand::Reset),
            "/resume" => Ok(ShellCommand::Resume),
            "/ready" => Ok(ShellCommand::Ready),
            "/status" => Ok(ShellCommand::Status),
            "/quit" | "/exit" => Ok(ShellCommand::Quit),
            other => Err(format!("Unknown command: '{other}'")),
        }
    }
}

/// Everything the shell needs to act on the running coordinator.
pub struct Shell {
    pub coordinator: Arc<Coordinator>,
    pub bus: Arc<EventBus>,
    pub runtime: Handle,
}

/// Entry point for the interactive REPL.  Returns on `/quit` or end of
/// input.
pub fn run(shell: &Shell) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "c2c>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        match ShellCommand::parse(&line) {
            Ok(ShellCommand::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Ok(cmd) => shell.execute(cmd),
            Err(e) => println!(
                "{} Type {} for available commands.",
                e.red(),
                "/help".bold()
            ),
        }
    }
}

impl Shell {
    fn execute(&self, cmd: ShellCommand) {
        match cmd {
            ShellCommand::Help => cmd_help(),
            ShellCommand::Exec {
                tier,
                symbol,
                modifier,
            } => self.cmd_exec(tier, symbol, modifier),
            ShellCommand::Register(raw) => {
                print_response(&C2cResponse::from_result(
                    &self.coordinator.register_descriptor_json(&raw),
                ));
            }
            ShellCommand::Load(path) => match preload::register_file(&self.coordinator, &path) {
                Ok(()) => println!("{} {}", "✓ Registered".green(), path.display()),
                Err(e) => println!("{}: {}", "Load failed".red(), e),
            },
            ShellCommand::Observe { symbol, modifier } => {
                self.publish(
                    Topic::Perception,
                    EventPayload::Perception(PerceptionConcept { symbol, modifier }),
                );
            }
            ShellCommand::Observations => {
                let snapshot = self.coordinator.observations().snapshot();
                if snapshot.is_empty() {
                    println!("  {}", "no perceptions yet".dimmed());
                }
                for (symbol, modifier) in snapshot {
                    println!("  {} = {}", symbol.bold(), modifier.yellow());
                }
            }
            ShellCommand::Concepts => {
                let names = self.coordinator.registry().names();
                if names.is_empty() {
                    println!("  {}", "no concepts registered".dimmed());
                }
                for name in names {
                    println!("  • {}", name.bold());
                }
            }
            ShellCommand::Pause => self.coordinator.pause_ego(),
            ShellCommand::Reset => self.coordinator.reset_ego(),
            ShellCommand::Resume => self.coordinator.unpause_ego(),
            ShellCommand::Ready => self.publish(Topic::SystemAlerts, EventPayload::EgoReady),
            ShellCommand::Status => {
                let status = self.coordinator.lock_status();
                println!("{}", "Tier Locks".bold().underline());
                println!("  ego      : {}", held(status.ego_held));
                println!("  instinct : {}", held(status.instinct_held));
                println!("  reflex   : {} active", status.reflex_active.to_string().yellow());
            }
            ShellCommand::Quit => {}
        }
    }

    fn cmd_exec(&self, tier: Tier, symbol: String, modifier: String) {
        let coordinator = Arc::clone(&self.coordinator);
        self.runtime.spawn(async move {
            let result = coordinator.dispatch(tier, &symbol, &modifier).await;
            let response = C2cResponse::from_result(&result);
            print!("\n  {} {} {} → ", tier.to_string().dimmed(), symbol.bold(), modifier);
            print_response(&response);
            if let Err(e) = result {
                println!("    {}", e.to_string().dimmed());
            }
        });
    }

    fn publish(&self, topic: Topic, payload: EventPayload) {
        let event = Event {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: "aliveos-cli".to_string(),
            payload,
        };
        if let Err(e) = self.bus.publish_to(topic, event) {
            println!("{}: {}", "Publish failed".red(), e);
        }
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Concept Coordinator Commands".bold().underline());
    println!("  {} – dispatch a concept", "/exec <tier> <symbol> [modifier]".bold().cyan());
    println!("  {}                 – register a descriptor", "/register <json>".bold().cyan());
    println!("  {}                     – register a descriptor file", "/load <file>".bold().cyan());
    println!("  {}     – publish a perception", "/observe <symbol> <modifier>".bold().cyan());
    println!("  {}                    – latest perceptions", "/observations".bold().cyan());
    println!("  {}                        – registered concepts", "/concepts".bold().cyan());
    println!("  {}          – control signals to Ego", "/pause  /reset  /resume".bold().cyan());
    println!("  {}                           – announce Ego readiness", "/ready".bold().cyan());
    println!("  {}                          – tier lock state", "/status".bold().cyan());
    println!("  {}                    – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn print_response(response: &C2cResponse) {
    let text = response.to_string();
    match response {
        C2cResponse::Ok => println!("{}", text.green()),
        C2cResponse::Busy => println!("{}", text.yellow()),
        C2cResponse::Error | C2cResponse::Abort => println!("{}", text.red()),
    }
}

fn held(flag: bool) -> colored::ColoredString {
    if flag { "held".yellow() } else { "free".green() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_exec_with_and_without_modifier() {
        assert_eq!(
            ShellCommand::parse("/exec reflex move fast"),
            Ok(ShellCommand::Exec {
                tier: Tier::Reflex,
                symbol: "move".into(),
                modifier: "fast".into(),
            })
        );
        assert_eq!(
            ShellCommand::parse("  /exec Ego move  "),
            Ok(ShellCommand::Exec {
                tier: Tier::Ego,
                symbol: "move".into(),
                modifier: String::new(),
            })
        );
    }

    #[test]
    fn parse_exec_rejects_unknown_tier_and_missing_symbol() {
        assert!(ShellCommand::parse("/exec limbic move").unwrap_err().contains("limbic"));
        assert!(ShellCommand::parse("/exec reflex").unwrap_err().starts_with("usage"));
    }

    #[test]
    fn parse_register_keeps_json_intact() {
        let raw = r#"{"name": "blink", "descriptor": []}"#;
        assert_eq!(
            ShellCommand::parse(&format!("/register {raw}")),
            Ok(ShellCommand::Register(raw.to_string()))
        );
        assert!(ShellCommand::parse("/register").is_err());
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(ShellCommand::parse("/status"), Ok(ShellCommand::Status));
        assert_eq!(ShellCommand::parse("/exit"), Ok(ShellCommand::Quit));
        assert_eq!(
            ShellCommand::parse("/observe distance near"),
            Ok(ShellCommand::Observe {
                symbol: "distance".into(),
                modifier: "near".into(),
            })
        );
        assert!(ShellCommand::parse("/observe distance").is_err());
        assert!(ShellCommand::parse("/dance").unwrap_err().contains("/dance"));
    }
}
