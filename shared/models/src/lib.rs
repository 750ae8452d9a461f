//! Shared entity types for CamHub services.
//!
//! Everything that crosses a crate boundary lives here: detection events,
//! automation rules, action descriptors, and classifier sample/result types.
//! All types are JSON-serializable; no wire format beyond that is assumed.

pub mod action;
pub mod event;
pub mod rule;
pub mod sample;

pub use action::{ActionRequest, LightAction, RuleAction, RuleTriggerNotice};
pub use event::{BoundingBox, CustomDetection, DetectionEvent, Severity, DEFAULT_MOTION_CONFIDENCE};
pub use rule::{
    ConfidenceOperator, DetectionOperator, Rule, RuleCondition, SeverityOperator, ZoneOperator,
};
pub use sample::{ClassificationResult, Neighbor, TrainingSample};
