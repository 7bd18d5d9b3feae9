//! Lifecycle notifications.

use serde::Serialize;

use super::model::{BreakKind, SessionStatus};
use crate::core::SessionId;
use crate::features::activity::{Alert, Recommendation};

/// Something that happened to a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was planned.
    Created {
        /// Session.
        session_id: SessionId,
    },
    /// `planned -> active`.
    Started {
        /// Session.
        session_id: SessionId,
    },
    /// `active -> paused`.
    Paused {
        /// Session.
        session_id: SessionId,
    },
    /// `paused -> active`.
    Resumed {
        /// Session.
        session_id: SessionId,
    },
    /// The session finished normally.
    Completed {
        /// Session.
        session_id: SessionId,
        /// Studied minutes.
        actual_duration_minutes: u32,
    },
    /// The session was abandoned.
    Cancelled {
        /// Session.
        session_id: SessionId,
        /// Status at the moment of cancellation.
        from: SessionStatus,
    },
    /// A break was appended.
    BreakRecorded {
        /// Session.
        session_id: SessionId,
        /// Break length.
        duration_minutes: u32,
        /// Break type.
        kind: BreakKind,
    },
    /// A raw metric sample was folded into the aggregates.
    SampleApplied {
        /// Session.
        session_id: SessionId,
    },
    /// An analysed observation was stored.
    SampleRecorded {
        /// Session.
        session_id: SessionId,
        /// Alerts raised by the observation.
        alerts: Vec<Alert>,
        /// Suggestions for the student.
        recommendations: Vec<Recommendation>,
    },
}

impl SessionEvent {
    /// The session the event concerns.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        match self {
            Self::Created { session_id }
            | Self::Started { session_id }
            | Self::Paused { session_id }
            | Self::Resumed { session_id }
            | Self::Completed { session_id, .. }
            | Self::Cancelled { session_id, .. }
            | Self::BreakRecorded { session_id, .. }
            | Self::SampleApplied { session_id }
            | Self::SampleRecorded { session_id, .. } => *session_id,
        }
    }

    /// Short name, as used in the serialized `event` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Started { .. } => "started",
            Self::Paused { .. } => "paused",
            Self::Resumed { .. } => "resumed",
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::BreakRecorded { .. } => "break_recorded",
            Self::SampleApplied { .. } => "sample_applied",
            Self::SampleRecorded { .. } => "sample_recorded",
        }
    }
}

/// Receiver of lifecycle events.
///
/// Publishing is fire-and-forget: a sink cannot fail the operation that
/// produced the event.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Deliver one event.
    fn publish(&self, event: &SessionEvent);
}

/// Writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: &SessionEvent) {
        match event {
            SessionEvent::SampleRecorded {
                session_id,
                alerts,
                recommendations,
            } => {
                for alert in alerts {
                    log::warn!("session {session_id}: {} ({})", alert.message, alert.action);
                }
                for rec in recommendations {
                    log::info!("session {session_id}: {}", rec.message);
                }
            }
            other => log::info!("session {}: {}", other.session_id(), other.name()),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: &SessionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let id = SessionId::new();
        let json = serde_json::to_value(SessionEvent::Completed {
            session_id: id,
            actual_duration_minutes: 42,
        })
        .unwrap();

        assert_eq!(json["event"], "completed");
        assert_eq!(json["actual_duration_minutes"], 42);
        assert_eq!(json["session_id"], id.to_string());
    }

    #[test]
    fn test_name_matches_tag() {
        let event = SessionEvent::BreakRecorded {
            session_id: SessionId::new(),
            duration_minutes: 5,
            kind: BreakKind::Manual,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }

    #[test]
    fn test_sinks_accept_events() {
        let event = SessionEvent::Started {
            session_id: SessionId::new(),
        };
        LogSink.publish(&event);
        NullSink.publish(&event);
    }
}
