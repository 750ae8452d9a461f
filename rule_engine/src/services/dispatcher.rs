//! Action sinks and trigger observers.
//!
//! The engine hands each produced [`ActionRequest`] to a dispatcher. One
//! failed dispatch is logged and must not stop the remaining actions of
//! the same rule, so dispatchers report failure per request.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use camhub_models::{ActionRequest, RuleTriggerNotice};

use crate::errors::EngineError;

/// Delivers action requests to the outside world.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn dispatch(&self, request: &ActionRequest) -> Result<(), EngineError>;
}

/// Notified after a rule has triggered, with the full condition vector.
/// Useful for audit trails and metrics without coupling them into the
/// engine.
#[async_trait]
pub trait TriggerObserver: Send + Sync {
    async fn rule_triggered(&self, notice: &RuleTriggerNotice);
}

/// Dispatcher that only logs. The default for development setups.
pub struct LogDispatcher;

#[async_trait]
impl ActionDispatcher for LogDispatcher {
    async fn dispatch(&self, request: &ActionRequest) -> Result<(), EngineError> {
        info!(
            rule_id = %request.rule_id,
            camera_id = %request.camera_id,
            action = request.action.kind(),
            "action dispatched"
        );
        Ok(())
    }
}

/// Dispatcher that forwards requests over an mpsc channel, letting a
/// separate task own the actual delivery (stdout, webhook worker, MQTT).
pub struct ChannelDispatcher {
    sender: mpsc::Sender<ActionRequest>,
}

impl ChannelDispatcher {
    pub fn new(sender: mpsc::Sender<ActionRequest>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ActionDispatcher for ChannelDispatcher {
    async fn dispatch(&self, request: &ActionRequest) -> Result<(), EngineError> {
        self.sender
            .send(request.clone())
            .await
            .map_err(|e| EngineError::Dispatch(format!("action channel closed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camhub_models::RuleAction;
    use uuid::Uuid;

    fn request() -> ActionRequest {
        ActionRequest {
            rule_id: "r1".to_string(),
            rule_name: "test rule".to_string(),
            camera_id: "front".to_string(),
            event_id: Uuid::new_v4(),
            action: RuleAction::Record { duration_sec: 30 },
        }
    }

    #[tokio::test]
    async fn channel_dispatcher_forwards() {
        let (tx, mut rx) = mpsc::channel(4);
        let dispatcher = ChannelDispatcher::new(tx);

        dispatcher.dispatch(&request()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.rule_id, "r1");
    }

    #[tokio::test]
    async fn channel_dispatcher_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let dispatcher = ChannelDispatcher::new(tx);

        let err = dispatcher.dispatch(&request()).await.unwrap_err();
        assert!(matches!(err, EngineError::Dispatch(_)));
    }
}
