//! Event Emitter - Ingestion notifications
//!
//! The engine emits at most one event per ingestion attempt. Delivery is the
//! sink's business; a failed emit is logged and never changes the outcome.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::types::AnomalyDetails;

/// Event names
pub mod names {
    pub const ANOMALY_DETECTED: &str = "anomaly_detected";
    pub const DUPLICATE_DETECTED: &str = "duplicate_detected";
    pub const FILE_UPLOADED: &str = "file_uploaded";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    AnomalyDetected {
        filename: String,
        details: AnomalyDetails,
    },
    DuplicateDetected {
        filename: String,
        existing_filename: String,
    },
    FileUploaded {
        filename: String,
        id: Uuid,
    },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::AnomalyDetected { .. } => names::ANOMALY_DETECTED,
            Notification::DuplicateDetected { .. } => names::DUPLICATE_DETECTED,
            Notification::FileUploaded { .. } => names::FILE_UPLOADED,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("notification '{event}' not delivered: {reason}")]
pub struct NotifyError {
    pub event: &'static str,
    pub reason: String,
}

/// Receiver of live notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes every notification to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        log::info!("event {}: {:?}", notification.name(), notification);
        Ok(())
    }
}

/// Emit, swallowing delivery failures
pub fn emit(sink: &dyn NotificationSink, notification: Notification) {
    if let Err(e) = sink.notify(&notification) {
        log::warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl NotificationSink for BrokenSink {
        fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError {
                event: notification.name(),
                reason: "no subscribers".to_string(),
            })
        }
    }

    #[test]
    fn test_event_names() {
        let n = Notification::FileUploaded {
            filename: "a.txt".to_string(),
            id: Uuid::nil(),
        };
        assert_eq!(n.name(), "file_uploaded");
    }

    #[test]
    fn test_serialized_shape() {
        let n = Notification::DuplicateDetected {
            filename: "b.txt".to_string(),
            existing_filename: "a.txt".to_string(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["event"], "duplicate_detected");
        assert_eq!(json["payload"]["existing_filename"], "a.txt");
    }

    #[test]
    fn test_emit_swallows_failures() {
        emit(
            &BrokenSink,
            Notification::FileUploaded {
                filename: "a.txt".to_string(),
                id: Uuid::nil(),
            },
        );
    }
}
