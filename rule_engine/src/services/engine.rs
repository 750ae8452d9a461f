//! Rule evaluation core.
//!
//! One engine instance owns the rule cache, the per-rule cooldown table
//! and the per-camera event history. Events are processed one at a time;
//! the host binary serializes calls, so no internal locking is needed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use camhub_models::{ActionRequest, DetectionEvent, Rule, RuleCondition, RuleTriggerNotice};
use camhub_models::{ConfidenceOperator, DetectionOperator, SeverityOperator, ZoneOperator};

use crate::models::{EventContext, EventOutcome};
use crate::services::dispatcher::{ActionDispatcher, TriggerObserver};
use crate::services::event_history::EventHistory;
use crate::services::rule_store::RuleProvider;

pub struct RuleEngine {
    provider: Arc<dyn RuleProvider>,
    dispatcher: Arc<dyn ActionDispatcher>,
    observers: Vec<Arc<dyn TriggerObserver>>,
    rules: Vec<Rule>,
    last_triggered: HashMap<String, DateTime<Utc>>,
    history: EventHistory,
}

impl RuleEngine {
    pub fn new(
        provider: Arc<dyn RuleProvider>,
        dispatcher: Arc<dyn ActionDispatcher>,
        history_capacity: usize,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            observers: Vec::new(),
            rules: Vec::new(),
            last_triggered: HashMap::new(),
            history: EventHistory::with_capacity(history_capacity),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TriggerObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Load the initial rule set from the provider.
    pub async fn initialize(&mut self) {
        self.reload_rules().await;
        info!(rules = self.rules.len(), "rule engine initialized");
    }

    /// Replace the cached rule set wholesale. If the provider fails the
    /// engine runs with an empty set until the next successful reload.
    pub async fn reload_rules(&mut self) {
        match self.provider.list_enabled_rules().await {
            Ok(rules) => {
                debug!(count = rules.len(), "rules reloaded");
                self.rules = rules;
            }
            Err(err) => {
                warn!(error = %err, "rule reload failed, running with empty rule set");
                self.rules = Vec::new();
            }
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    /// Evaluate one event against every cached rule, dispatch the actions
    /// of triggered rules, then record the event in history.
    pub async fn process_event(&mut self, event: DetectionEvent) -> EventOutcome {
        self.process_event_at(event, Utc::now()).await
    }

    /// Same as [`process_event`](Self::process_event) with an injected
    /// clock for deterministic tests.
    pub async fn process_event_at(
        &mut self,
        event: DetectionEvent,
        now: DateTime<Utc>,
    ) -> EventOutcome {
        let recent = self.history.snapshot(&event.camera_id);
        let zone_tally = EventHistory::zone_tally(&recent);
        let ctx = EventContext { event, recent, zone_tally, now };

        debug!(
            camera_id = %ctx.event.camera_id,
            detection_type = %ctx.event.detection_type,
            buffered = ctx.recent.len(),
            zones_seen = ctx.zone_tally.len(),
            "processing event"
        );

        let mut outcome = EventOutcome::default();

        for rule in &self.rules {
            if !rule.enabled {
                continue;
            }

            // Cooldown wins over everything else: conditions are not even
            // evaluated while a rule is cooling down.
            if let Some(last) = self.last_triggered.get(&rule.id) {
                let ready_at = *last + Duration::minutes(rule.cooldown_minutes as i64);
                if ctx.now < ready_at {
                    debug!(rule_id = %rule.id, "rule in cooldown, skipping");
                    continue;
                }
            }

            if rule.conditions.is_empty() {
                continue;
            }

            let conditions_met: Vec<bool> = rule
                .conditions
                .iter()
                .map(|c| evaluate_condition(c, &ctx, &self.history))
                .collect();

            if !conditions_met.iter().all(|&met| met) {
                continue;
            }

            info!(rule_id = %rule.id, rule_name = %rule.name, camera_id = %ctx.event.camera_id, "rule triggered");
            self.last_triggered.insert(rule.id.clone(), ctx.now);

            let notice = RuleTriggerNotice {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                camera_id: ctx.event.camera_id.clone(),
                conditions_met,
                event: ctx.event.clone(),
            };

            for action in &rule.actions {
                let request = ActionRequest {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    camera_id: ctx.event.camera_id.clone(),
                    event_id: ctx.event.id,
                    action: action.clone(),
                };

                // One failed sink must not starve the remaining actions.
                if let Err(err) = self.dispatcher.dispatch(&request).await {
                    warn!(rule_id = %rule.id, action = request.action.kind(), error = %err, "action dispatch failed");
                }
                outcome.actions.push(request);
            }

            for observer in &self.observers {
                observer.rule_triggered(&notice).await;
            }
            outcome.triggered.push(notice);
        }

        // History only grows after evaluation so a frequency window never
        // double-counts the event being processed.
        self.history.append(ctx.event);

        outcome
    }
}

fn evaluate_condition(condition: &RuleCondition, ctx: &EventContext, history: &EventHistory) -> bool {
    match condition {
        RuleCondition::Detection { operator, detection_type, types } => {
            match operator {
                DetectionOperator::Equals => detection_type
                    .as_deref()
                    .map(|t| ctx.event.detection_type == t)
                    .unwrap_or(false),
                DetectionOperator::NotEquals => detection_type
                    .as_deref()
                    .map(|t| ctx.event.detection_type != t)
                    .unwrap_or(false),
                DetectionOperator::In => types
                    .as_ref()
                    .map(|ts| ts.iter().any(|t| *t == ctx.event.detection_type))
                    .unwrap_or(false),
            }
        }
        RuleCondition::Zone { operator, zone } => match zone {
            Some(zone) => {
                let inside = ctx.event.zones.contains(zone);
                match operator {
                    ZoneOperator::In => inside,
                    ZoneOperator::NotIn => !inside,
                }
            }
            None => false,
        },
        RuleCondition::Time { time } => evaluate_time(time, ctx.now),
        RuleCondition::Frequency { threshold_count, window_minutes, detection_type } => {
            let matches_type = |e: &DetectionEvent| {
                detection_type
                    .as_deref()
                    .map(|t| e.detection_type == t)
                    .unwrap_or(true)
            };

            let mut count = history
                .recent(&ctx.event.camera_id, *window_minutes, ctx.now)
                .iter()
                .filter(|e| matches_type(e))
                .count();
            // The event under evaluation has not been buffered yet but
            // belongs to the window.
            if matches_type(&ctx.event) {
                count += 1;
            }
            count >= *threshold_count
        }
        RuleCondition::Confidence { operator, threshold } => match threshold {
            Some(threshold) => match operator {
                ConfidenceOperator::Gt => ctx.event.confidence > *threshold,
                ConfidenceOperator::Gte => ctx.event.confidence >= *threshold,
                ConfidenceOperator::Lt => ctx.event.confidence < *threshold,
                ConfidenceOperator::Lte => ctx.event.confidence <= *threshold,
            },
            None => false,
        },
        RuleCondition::Severity { operator, value } => match value {
            Some(value) => match operator {
                SeverityOperator::Equals => ctx.event.severity == *value,
                SeverityOperator::Gte => ctx.event.severity.ordinal() >= value.ordinal(),
            },
            None => false,
        },
        RuleCondition::Custom { label } => match label {
            Some(label) => ctx
                .event
                .custom_detections
                .iter()
                .any(|d| d.label == *label),
            None => false,
        },
        RuleCondition::Unknown { kind } => {
            warn!(kind = %kind, "unknown condition type evaluates to false");
            false
        }
    }
}

/// Match the current wall-clock time against an exact `"HH:MM"` or a
/// `"HH:MM-HH:MM"` range. Zero-padded 24h strings compare correctly as
/// text; a range whose start sorts after its end never matches.
fn evaluate_time(window: &str, now: DateTime<Utc>) -> bool {
    let current = now.format("%H:%M").to_string();
    match window.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (start.trim(), end.trim());
            start <= current.as_str() && current.as_str() <= end
        }
        None => window.trim() == current,
    }
}
