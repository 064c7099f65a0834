use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Command name reserved for the coordinator's own timed pause.
pub const WAIT_COMMAND: &str = "wait";

/// Modifier token that callers using a call-style surface send for "no
/// modifier".
pub const EMPTY_CALL_MODIFIER: &str = "()";

/// Caller priority tier.  Ordered by priority: `Ego < Instinct < Reflex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Long-running, interruptible baseline activity.
    Ego,
    /// Higher-priority behavior that preempts Ego.
    Instinct,
    /// Fire-and-forget reactive concepts; never blocked.
    Reflex,
}

impl Tier {
    /// Numeric code used on the request wire.
    pub fn code(self) -> u8 {
        match self {
            Tier::Ego => 0,
            Tier::Instinct => 1,
            Tier::Reflex => 2,
        }
    }

    /// Inverse of [`Tier::code`].  Returns `None` for unknown codes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Tier::Ego),
            1 => Some(Tier::Instinct),
            2 => Some(Tier::Reflex),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Ego => write!(f, "ego"),
            Tier::Instinct => write!(f, "instinct"),
            Tier::Reflex => write!(f, "reflex"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = C2cError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ego" => Ok(Tier::Ego),
            "instinct" => Ok(Tier::Instinct),
            "reflex" => Ok(Tier::Reflex),
            other => Err(C2cError::UnknownTier(other.to_string())),
        }
    }
}

/// Signals used to interrupt and restore the Ego execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSignal {
    Pause,
    Reset,
    Continue,
}

impl std::fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlSignal::Pause => write!(f, "pause"),
            ControlSignal::Reset => write!(f, "reset"),
            ControlSignal::Continue => write!(f, "continue"),
        }
    }
}

/// A resolved command forwarded verbatim to an external device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub device: String,
    pub command: String,
    pub argument: String,
}

/// Argument payload of a [`CommandSpec`]: a single string or a list of
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArgs {
    Single(String),
    List(Vec<String>),
}

impl CommandArgs {
    /// Tokens considered when looking for a `wait` duration.  A single string
    /// is split on whitespace.
    pub fn candidates(&self) -> Vec<String> {
        match self {
            CommandArgs::Single(s) => s.split_whitespace().map(str::to_string).collect(),
            CommandArgs::List(items) => items.clone(),
        }
    }

    /// Wire form of the argument sent alongside a device command.  A list is
    /// sent as its JSON array encoding, e.g. `["smile","wide"]`.
    pub fn to_wire_string(&self) -> String {
        match self {
            CommandArgs::Single(s) => s.clone(),
            // Serializing a Vec<String> cannot fail.
            CommandArgs::List(items) => serde_json::to_string(items).unwrap_or_default(),
        }
    }
}

/// One step in a concept's command mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(rename = "device_name", default)]
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<CommandArgs>,
}

/// How a [`CommandSpec`] is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Internal timed pause; the duration is the first numeric candidate.
    Wait { candidates: Vec<String> },
    /// Forwarded to an external device.
    Device(DeviceCommand),
}

impl CommandSpec {
    pub fn new(device: &str, command: &str, arguments: Option<CommandArgs>) -> Self {
        Self {
            command: command.to_string(),
            device: device.to_string(),
            arguments,
        }
    }

    /// Classify this command by name.
    pub fn kind(&self) -> CommandKind {
        if self.command == WAIT_COMMAND {
            CommandKind::Wait {
                candidates: self
                    .arguments
                    .as_ref()
                    .map(CommandArgs::candidates)
                    .unwrap_or_default(),
            }
        } else {
            CommandKind::Device(DeviceCommand {
                device: self.device.clone(),
                command: self.command.clone(),
                argument: self
                    .arguments
                    .as_ref()
                    .map(CommandArgs::to_wire_string)
                    .unwrap_or_default(),
            })
        }
    }
}

/// Commands to run for one modifier of a concept.  The empty modifier means
/// "no modifier".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    #[serde(default)]
    pub modifier: String,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// A named concept and its ordered modifier entries.
///
/// Serializes to the registration shape
/// `{"name": ..., "descriptor": [{"modifier": ..., "commands": [...]}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDescriptor {
    pub name: String,
    #[serde(rename = "descriptor", default)]
    pub entries: Vec<ModifierEntry>,
}

impl ConceptDescriptor {
    pub fn new(name: impl Into<String>, entries: Vec<ModifierEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Parse a registration payload.
    pub fn from_json(raw: &str) -> Result<Self, C2cError> {
        serde_json::from_str(raw).map_err(|e| C2cError::MalformedDescriptor(e.to_string()))
    }

    /// First entry whose modifier equals `modifier`.
    pub fn entry_for(&self, modifier: &str) -> Option<&ModifierEntry> {
        self.entries.iter().find(|e| e.modifier == modifier)
    }
}

/// Latest perception of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptionConcept {
    pub symbol: String,
    pub modifier: String,
}

/// Raw inbound concept execution request.  `tier` is the wire code from
/// [`Tier::code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRequest {
    pub symbol: String,
    #[serde(default)]
    pub modifier: String,
    pub tier: u8,
}

/// Result vocabulary returned to upstream callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum C2cResponse {
    Ok,
    Error,
    Busy,
    /// Reserved; no dispatch path produces it.
    Abort,
}

impl C2cResponse {
    pub fn from_result(result: &Result<(), C2cError>) -> Self {
        match result {
            Ok(()) => C2cResponse::Ok,
            Err(C2cError::Busy(_)) => C2cResponse::Busy,
            Err(_) => C2cResponse::Error,
        }
    }
}

impl std::fmt::Display for C2cResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            C2cResponse::Ok => write!(f, "ok"),
            C2cResponse::Error => write!(f, "error"),
            C2cResponse::Busy => write!(f, "busy"),
            C2cResponse::Abort => write!(f, "abort"),
        }
    }
}

/// Unified event wrapper for the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"aliveos-runtime::c2c"`
    pub source: String,
    pub payload: EventPayload,
}

/// Variants of data routed over the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    DeviceCommand(DeviceCommand),
    ControlSignal(ControlSignal),
    Perception(PerceptionConcept),
    /// The Ego node announced it is ready to receive control signals.
    EgoReady,
}

/// Global error type for concept resolution, execution and admission.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum C2cError {
    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    #[error("There is no such modifier: {modifier:?} for concept {concept}")]
    UnknownModifier { concept: String, modifier: String },

    #[error("Wait command has no duration argument")]
    WaitArgumentMissing,

    #[error("Tier {0} is busy")]
    Busy(Tier),

    #[error("Command concept {0} already exists")]
    DuplicateConcept(String),

    #[error("Malformed concept descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Event bus error: {0}")]
    Channel(String),
}
