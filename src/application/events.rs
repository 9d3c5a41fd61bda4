use crate::domain::complaint::{Complaint, ComplaintStatus, StatusChange};
use crate::infrastructure::BroadcastMessage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Broadcast event name observers listen for.
pub const NEW_COMPLAINT_EVENT: &str = "new_complaint";

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;
    fn aggregate_id(&self) -> &str;
    fn occurred_at(&self) -> DateTime<Utc>;
    fn event_type(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplaintCreatedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub complaint: Complaint,
}

impl ComplaintCreatedEvent {
    /// Real-time frame carrying the full complaint record.
    pub fn to_broadcast(&self) -> Result<BroadcastMessage, serde_json::Error> {
        Ok(BroadcastMessage {
            event: NEW_COMPLAINT_EVENT.to_string(),
            data: serde_json::to_value(&self.complaint)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplaintStatusChangedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    pub student_email: String,
}

pub struct EventFactory;

impl EventFactory {
    pub fn complaint_created(complaint: &Complaint) -> ComplaintCreatedEvent {
        ComplaintCreatedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: complaint.id.clone(),
            occurred_at: complaint.created_at,
            complaint: complaint.clone(),
        }
    }

    pub fn complaint_status_changed(
        complaint: &Complaint,
        change: StatusChange,
    ) -> ComplaintStatusChangedEvent {
        ComplaintStatusChangedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: complaint.id.clone(),
            occurred_at: complaint.updated_at,
            from: change.from,
            to: change.to,
            student_email: complaint.student_email.clone(),
        }
    }
}

impl DomainEvent for ComplaintCreatedEvent {
    fn event_id(&self) -> &str {
        &self.event_id
    }
    fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &str {
        "ComplaintCreated"
    }
}

impl DomainEvent for ComplaintStatusChangedEvent {
    fn event_id(&self) -> &str {
        &self.event_id
    }
    fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &str {
        "ComplaintStatusChanged"
    }
}
