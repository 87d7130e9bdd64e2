// ABOUTME: Per-task completion events broadcast while a run is in progress
// ABOUTME: Lets callers observe results incrementally without polling the history

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::result::ExecutionResult;

/// Emitted once for every result recorded into a run's history
#[derive(Debug, Clone, Serialize)]
pub struct TaskEvent {
    pub run_id: String,
    pub result: ExecutionResult,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<TaskEvent>,
}

impl EventPublisher {
    /// Create a publisher whose channel buffers `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, run_id: &str, result: &ExecutionResult) {
        let event = TaskEvent {
            run_id: run_id.to_string(),
            result: result.clone(),
            published_at: Utc::now(),
        };

        // Sending only fails when nobody is subscribed
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::SkipReason;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let publisher = EventPublisher::new(8);
        let mut receiver = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        let result = ExecutionResult::skipped("a", SkipReason::ConditionNotMet);
        publisher.publish("run_1", &result);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.run_id, "run_1");
        assert_eq!(event.result, result);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::default();
        let result = ExecutionResult::skipped("a", SkipReason::ConditionNotMet);
        publisher.publish("run_1", &result);
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
