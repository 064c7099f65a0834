//! `aliveos-middleware` – The Nervous System
//!
//! Carries device commands, Ego control signals and perception updates
//! between the concept coordinator and the rest of the robot without caring
//! about their meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.
//! - [`adapter`] – The [`CommandSink`] boundary through which the coordinator
//!   emits device commands and control signals, plus the bus-backed
//!   [`BusSink`].

pub mod adapter;
pub mod bus;

pub use adapter::{BusSink, CommandSink};
pub use bus::{EventBus, Topic, TopicReceiver};
