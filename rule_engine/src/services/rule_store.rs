//! Rule providers.
//!
//! The engine pulls its rule set wholesale from a [`RuleProvider`] at
//! startup and on explicit reload. Providers never hand back a partially
//! updated set.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use camhub_models::Rule;

use crate::errors::EngineError;

/// Source of rule definitions.
#[async_trait]
pub trait RuleProvider: Send + Sync {
    /// All currently enabled rules. Disabled rules are filtered out at
    /// the provider so the engine never sees them.
    async fn list_enabled_rules(&self) -> Result<Vec<Rule>, EngineError>;
}

/// Mutable in-memory provider, used by tests and by deployments that
/// push rules over an API instead of a file.
pub struct InMemoryRuleProvider {
    rules: RwLock<Vec<Rule>>,
}

impl InMemoryRuleProvider {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules: RwLock::new(rules) }
    }

    /// Replace the whole rule set.
    pub async fn set_rules(&self, rules: Vec<Rule>) {
        *self.rules.write().await = rules;
    }
}

impl Default for InMemoryRuleProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RuleProvider for InMemoryRuleProvider {
    async fn list_enabled_rules(&self) -> Result<Vec<Rule>, EngineError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().filter(|r| r.enabled).cloned().collect())
    }
}

/// Loads rules from a JSON file containing an array of rule objects.
///
/// Individual malformed entries are logged and skipped so one bad rule
/// cannot take down the rest of the configuration. A missing or
/// unreadable file is a storage error.
pub struct JsonFileRuleProvider {
    path: PathBuf,
}

impl JsonFileRuleProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleProvider for JsonFileRuleProvider {
    async fn list_enabled_rules(&self) -> Result<Vec<Rule>, EngineError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| EngineError::Storage(format!("{}: {}", self.path.display(), e)))?;

        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| EngineError::Config(format!("{}: {}", self.path.display(), e)))?;

        let mut rules = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Rule>(entry) {
                Ok(rule) => {
                    if rule.enabled {
                        rules.push(rule);
                    }
                }
                Err(err) => {
                    warn!(index, error = %err, "skipping malformed rule entry");
                }
            }
        }

        debug!(path = %self.path.display(), count = rules.len(), "rules loaded");
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    use camhub_models::{RuleAction, RuleCondition, ZoneOperator};

    fn sample_rule(id: &str, enabled: bool) -> Rule {
        Rule {
            id: id.to_string(),
            name: format!("rule {}", id),
            enabled,
            conditions: vec![RuleCondition::Zone {
                operator: ZoneOperator::In,
                zone: Some("driveway".to_string()),
            }],
            actions: vec![RuleAction::Record { duration_sec: 30 }],
            cooldown_minutes: 0,
        }
    }

    #[tokio::test]
    async fn in_memory_filters_disabled() {
        let provider =
            InMemoryRuleProvider::new(vec![sample_rule("a", true), sample_rule("b", false)]);

        let rules = provider.list_enabled_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "a");

        provider.set_rules(vec![sample_rule("c", true)]).await;
        let rules = provider.list_enabled_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "c");
    }

    #[tokio::test]
    async fn file_provider_loads_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let rules = vec![sample_rule("a", true), sample_rule("b", false)];
        write!(file, "{}", serde_json::to_string(&rules).unwrap()).unwrap();

        let provider = JsonFileRuleProvider::new(file.path());
        let loaded = provider.list_enabled_rules().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }

    #[tokio::test]
    async fn file_provider_skips_malformed_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let good = serde_json::to_value(sample_rule("good", true)).unwrap();
        let payload = serde_json::json!([
            good,
            {"id": "broken", "name": "no conditions field"},
            {"not even": "a rule"}
        ]);
        write!(file, "{}", payload).unwrap();

        let provider = JsonFileRuleProvider::new(file.path());
        let loaded = provider.list_enabled_rules().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "good");
    }

    #[tokio::test]
    async fn file_provider_missing_file_is_storage_error() {
        let provider = JsonFileRuleProvider::new("/nonexistent/rules.json");
        let err = provider.list_enabled_rules().await.unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[tokio::test]
    async fn file_provider_invalid_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let provider = JsonFileRuleProvider::new(file.path());
        let err = provider.list_enabled_rules().await.unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
