//! Automation rule definitions.
//!
//! `RuleCondition` is a closed tagged union keyed by a `"type"` field.
//! Unrecognized tags deserialize into the explicit `Unknown` variant so the
//! engine can log-and-skip them deliberately; a recognized tag with a
//! malformed payload is a hard deserialization error, surfaced as a config
//! failure by whoever is loading the rule.

use crate::action::RuleAction;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOperator {
    Equals,
    NotEquals,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneOperator {
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceOperator {
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityOperator {
    Equals,
    Gte,
}

/// One predicate of a rule. All of a rule's conditions must hold for the
/// rule to trigger. Optional fields left out of the configuration make the
/// condition evaluate false rather than match everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    Detection {
        operator: DetectionOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detection_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        types: Option<Vec<String>>,
    },
    Zone {
        operator: ZoneOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zone: Option<String>,
    },
    /// `"HH:MM-HH:MM"` range or exact `"HH:MM"`. Compared lexicographically
    /// on zero-padded 24h strings; ranges spanning midnight never match.
    Time { time: String },
    Frequency {
        threshold_count: usize,
        window_minutes: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detection_type: Option<String>,
    },
    Confidence {
        operator: ConfidenceOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
    },
    Severity {
        operator: SeverityOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<crate::event::Severity>,
    },
    Custom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Unrecognized condition tag, preserved so evaluation can log-and-skip.
    Unknown { kind: String },
}

const KNOWN_CONDITION_TAGS: &[&str] = &[
    "detection",
    "zone",
    "time",
    "frequency",
    "confidence",
    "severity",
    "custom",
];

// Mirror of the known variants; keeps derive-based payload checking while
// the outer type adds the unknown-tag fallthrough.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownCondition {
    Detection {
        operator: DetectionOperator,
        #[serde(default)]
        detection_type: Option<String>,
        #[serde(default)]
        types: Option<Vec<String>>,
    },
    Zone {
        operator: ZoneOperator,
        #[serde(default)]
        zone: Option<String>,
    },
    Time { time: String },
    Frequency {
        threshold_count: usize,
        window_minutes: i64,
        #[serde(default)]
        detection_type: Option<String>,
    },
    Confidence {
        operator: ConfidenceOperator,
        #[serde(default)]
        threshold: Option<f32>,
    },
    Severity {
        operator: SeverityOperator,
        #[serde(default)]
        value: Option<crate::event::Severity>,
    },
    Custom {
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<KnownCondition> for RuleCondition {
    fn from(known: KnownCondition) -> Self {
        match known {
            KnownCondition::Detection { operator, detection_type, types } => {
                RuleCondition::Detection { operator, detection_type, types }
            }
            KnownCondition::Zone { operator, zone } => RuleCondition::Zone { operator, zone },
            KnownCondition::Time { time } => RuleCondition::Time { time },
            KnownCondition::Frequency { threshold_count, window_minutes, detection_type } => {
                RuleCondition::Frequency { threshold_count, window_minutes, detection_type }
            }
            KnownCondition::Confidence { operator, threshold } => {
                RuleCondition::Confidence { operator, threshold }
            }
            KnownCondition::Severity { operator, value } => {
                RuleCondition::Severity { operator, value }
            }
            KnownCondition::Custom { label } => RuleCondition::Custom { label },
        }
    }
}

impl<'de> Deserialize<'de> for RuleCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::custom("condition is missing a \"type\" tag"))?
            .to_string();

        if KNOWN_CONDITION_TAGS.contains(&kind.as_str()) {
            serde_json::from_value::<KnownCondition>(value)
                .map(RuleCondition::from)
                .map_err(D::Error::custom)
        } else {
            Ok(RuleCondition::Unknown { kind })
        }
    }
}

impl RuleCondition {
    /// Tag string, mainly for logging.
    pub fn kind(&self) -> &str {
        match self {
            RuleCondition::Detection { .. } => "detection",
            RuleCondition::Zone { .. } => "zone",
            RuleCondition::Time { .. } => "time",
            RuleCondition::Frequency { .. } => "frequency",
            RuleCondition::Confidence { .. } => "confidence",
            RuleCondition::Severity { .. } => "severity",
            RuleCondition::Custom { .. } => "custom",
            RuleCondition::Unknown { kind } => kind,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// A named, independently enabled automation policy. Conditions combine
/// with AND semantics; an empty condition list never triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub cooldown_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_roundtrip() {
        let condition = RuleCondition::Confidence {
            operator: ConfidenceOperator::Gte,
            threshold: Some(0.8),
        };
        let json = serde_json::to_string(&condition).unwrap();
        let parsed: RuleCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, condition);
    }

    #[test]
    fn unknown_condition_tag_is_preserved() {
        let parsed: RuleCondition =
            serde_json::from_str(r#"{"type": "weather", "temperature": 3}"#).unwrap();
        assert_eq!(parsed, RuleCondition::Unknown { kind: "weather".into() });
    }

    #[test]
    fn known_tag_with_malformed_payload_fails() {
        // "gently" is not a confidence operator; a recognized tag must not
        // fall through to Unknown.
        let result = serde_json::from_str::<RuleCondition>(
            r#"{"type": "confidence", "operator": "gently", "threshold": 0.5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_tag_fails() {
        assert!(serde_json::from_str::<RuleCondition>(r#"{"operator": "gte"}"#).is_err());
    }

    #[test]
    fn optional_fields_default_to_none() {
        let parsed: RuleCondition =
            serde_json::from_str(r#"{"type": "detection", "operator": "equals"}"#).unwrap();
        match parsed {
            RuleCondition::Detection { detection_type, types, .. } => {
                assert!(detection_type.is_none());
                assert!(types.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn rule_defaults() {
        let rule: Rule = serde_json::from_str(
            r#"{"id": "r1", "name": "Person at night"}"#,
        )
        .unwrap();
        assert!(rule.enabled);
        assert!(rule.conditions.is_empty());
        assert!(rule.actions.is_empty());
        assert_eq!(rule.cooldown_minutes, 0);
    }
}
