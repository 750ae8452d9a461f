//! CamHub rule engine library.
//!
//! Evaluates detection events from edge cameras against user-defined
//! automation rules and dispatches the resulting actions. Rules are AND
//! combinations of typed conditions with a per-rule cooldown; the engine
//! keeps a bounded per-camera history so frequency conditions can look
//! back over a time window.

pub mod errors;
pub mod models;
pub mod services;

pub use errors::EngineError;
pub use models::{EventContext, EventOutcome};
pub use services::dispatcher::{ActionDispatcher, ChannelDispatcher, LogDispatcher, TriggerObserver};
pub use services::engine::RuleEngine;
pub use services::event_history::EventHistory;
pub use services::rule_store::{InMemoryRuleProvider, JsonFileRuleProvider, RuleProvider};
