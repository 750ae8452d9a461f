//! Side-effect descriptors emitted on rule triggers.
//!
//! `RuleAction` carries no behavior; execution belongs to the external
//! dispatcher. Same tagged-union discipline as `RuleCondition`: unknown
//! tags land in the `Unknown` variant for deliberate log-and-skip handling.

use crate::event::DetectionEvent;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightAction {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    Notification {
        title: String,
        message: String,
    },
    Siren {
        duration_sec: u32,
    },
    Light {
        action: LightAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_sec: Option<u32>,
    },
    Webhook {
        url: String,
        method: String,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<serde_json::Value>,
    },
    Record {
        duration_sec: u32,
    },
    Custom {
        action: String,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        parameters: HashMap<String, serde_json::Value>,
    },
    /// Unrecognized action tag, preserved for deliberate skip handling.
    Unknown { kind: String },
}

const KNOWN_ACTION_TAGS: &[&str] =
    &["notification", "siren", "light", "webhook", "record", "custom"];

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownAction {
    Notification {
        title: String,
        message: String,
    },
    Siren {
        duration_sec: u32,
    },
    Light {
        action: LightAction,
        #[serde(default)]
        duration_sec: Option<u32>,
    },
    Webhook {
        url: String,
        method: String,
        #[serde(default)]
        headers: HashMap<String, String>,
        #[serde(default)]
        body: Option<serde_json::Value>,
    },
    Record {
        duration_sec: u32,
    },
    Custom {
        action: String,
        #[serde(default)]
        parameters: HashMap<String, serde_json::Value>,
    },
}

impl From<KnownAction> for RuleAction {
    fn from(known: KnownAction) -> Self {
        match known {
            KnownAction::Notification { title, message } => {
                RuleAction::Notification { title, message }
            }
            KnownAction::Siren { duration_sec } => RuleAction::Siren { duration_sec },
            KnownAction::Light { action, duration_sec } => {
                RuleAction::Light { action, duration_sec }
            }
            KnownAction::Webhook { url, method, headers, body } => {
                RuleAction::Webhook { url, method, headers, body }
            }
            KnownAction::Record { duration_sec } => RuleAction::Record { duration_sec },
            KnownAction::Custom { action, parameters } => {
                RuleAction::Custom { action, parameters }
            }
        }
    }
}

impl<'de> Deserialize<'de> for RuleAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::custom("action is missing a \"type\" tag"))?
            .to_string();

        if KNOWN_ACTION_TAGS.contains(&kind.as_str()) {
            serde_json::from_value::<KnownAction>(value)
                .map(RuleAction::from)
                .map_err(D::Error::custom)
        } else {
            Ok(RuleAction::Unknown { kind })
        }
    }
}

impl RuleAction {
    pub fn kind(&self) -> &str {
        match self {
            RuleAction::Notification { .. } => "notification",
            RuleAction::Siren { .. } => "siren",
            RuleAction::Light { .. } => "light",
            RuleAction::Webhook { .. } => "webhook",
            RuleAction::Record { .. } => "record",
            RuleAction::Custom { .. } => "custom",
            RuleAction::Unknown { kind } => kind,
        }
    }
}

/// One action to execute for one triggered rule, addressed to the external
/// dispatcher. The engine does not wait for dispatch completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub rule_id: String,
    pub rule_name: String,
    pub camera_id: String,
    pub event_id: Uuid,
    pub action: RuleAction,
}

/// Audit/telemetry record published whenever a rule fires. The booleans in
/// `conditions_met` follow the order of the rule's condition list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTriggerNotice {
    pub rule_id: String,
    pub rule_name: String,
    pub camera_id: String,
    pub conditions_met: Vec<bool>,
    pub event: DetectionEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_roundtrip() {
        let action = RuleAction::Light { action: LightAction::On, duration_sec: Some(30) };
        let json = serde_json::to_string(&action).unwrap();
        let parsed: RuleAction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, action);
    }

    #[test]
    fn unknown_action_tag_is_preserved() {
        let parsed: RuleAction =
            serde_json::from_str(r#"{"type": "hologram", "brightness": 11}"#).unwrap();
        assert_eq!(parsed, RuleAction::Unknown { kind: "hologram".into() });
    }

    #[test]
    fn webhook_defaults() {
        let parsed: RuleAction = serde_json::from_str(
            r#"{"type": "webhook", "url": "http://hub.local/hook", "method": "POST"}"#,
        )
        .unwrap();
        match parsed {
            RuleAction::Webhook { headers, body, .. } => {
                assert!(headers.is_empty());
                assert!(body.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn known_action_with_malformed_payload_fails() {
        let result =
            serde_json::from_str::<RuleAction>(r#"{"type": "siren", "duration_sec": "loud"}"#);
        assert!(result.is_err());
    }
}
