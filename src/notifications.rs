// Notification sink collaborator seam.
//
// Fire-and-forget: events are emitted after the monetary transaction that
// produced them has committed, and a failing sink never rolls that
// transaction back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BetPlaced,
    BetWon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub user_id: String,
    pub kind: NotificationKind,
    pub payload: Value,
}

impl NotificationEvent {
    pub fn bet_placed(user_id: &str, pool_id: &str, bet_id: &str, match_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: NotificationKind::BetPlaced,
            payload: serde_json::json!({
                "pool_id": pool_id,
                "bet_id": bet_id,
                "match_id": match_id,
            }),
        }
    }

    pub fn bet_won(user_id: &str, pool_id: &str, correct_predictions: u32, prize: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: NotificationKind::BetWon,
            payload: serde_json::json!({
                "pool_id": pool_id,
                "correct_predictions": correct_predictions,
                "prize_amount": prize,
            }),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: NotificationEvent);
}

/// Default sink: structured log line per event.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, event: NotificationEvent) {
        info!(
            user = %event.user_id,
            kind = ?event.kind,
            payload = %event.payload,
            "Notification emitted"
        );
    }
}

/// Test sink that records every event it receives.
pub struct RecordingSink {
    pub events: std::sync::Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: std::sync::Mutex::new(Vec::new()) }
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events
            .lock()
            .map(|e| e.iter().map(|ev| ev.kind).collect())
            .unwrap_or_default()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
