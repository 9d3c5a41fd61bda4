use crate::domain::account::Account;
use crate::domain::department::Department;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Open complaints older than this are overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 7;

pub fn overdue_threshold() -> Duration {
    Duration::days(OVERDUE_AFTER_DAYS)
}

/// Complaint status. Any status may follow any other; `Pending` is the only
/// initial state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Rejected => "Rejected",
        }
    }

    /// Resolved and Rejected complaints never count as overdue.
    pub fn is_closed(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown complaint status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ComplaintStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Complaint aggregate.
///
/// `student_name` and `student_email` are snapshots of the submitter taken
/// at creation and are never refreshed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub created_by: String,
    pub student_name: String,
    pub student_email: String,
    pub category: Department,
    pub description: String,
    /// Empty when no attachment was uploaded.
    pub image_path: String,
    pub status: ComplaintStatus,
    pub assigned_to: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update. Empty strings are treated as absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplaintChanges {
    pub status: Option<ComplaintStatus>,
    pub assigned_to: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
}

impl Complaint {
    pub fn new(
        author: &Account,
        category: Department,
        description: &str,
        image_path: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_by: author.id.clone(),
            student_name: author.name.clone(),
            student_email: author.email.clone(),
            category,
            description: description.trim().to_string(),
            image_path: image_path.unwrap_or_default(),
            status: ComplaintStatus::Pending,
            assigned_to: String::new(),
            remarks: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_closed() && now - self.created_at > overdue_threshold()
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    /// Applies the present fields and stamps `updated_at`. Returns the
    /// transition when the status actually changed.
    pub fn apply(&mut self, changes: ComplaintChanges) -> Option<StatusChange> {
        let previous = self.status;
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(assigned_to) = changes.assigned_to.filter(|s| !s.is_empty()) {
            self.assigned_to = assigned_to;
        }
        if let Some(remarks) = changes.remarks.filter(|s| !s.is_empty()) {
            self.remarks = remarks;
        }
        self.updated_at = Utc::now();

        (self.status != previous).then_some(StatusChange {
            from: previous,
            to: self.status,
        })
    }

    pub fn tracked_at(self, now: DateTime<Utc>) -> TrackedComplaint {
        let is_overdue = self.is_overdue_at(now);
        TrackedComplaint {
            complaint: self,
            is_overdue,
        }
    }
}

/// A complaint together with its read-time SLA flag.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedComplaint {
    pub complaint: Complaint,
    pub is_overdue: bool,
}

/// Equality/range filter evaluated by the complaint store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplaintFilter {
    pub created_by: Option<String>,
    pub category: Option<Department>,
    pub status: Option<ComplaintStatus>,
    /// Excludes Resolved and Rejected complaints.
    pub open_only: bool,
    /// Only complaints created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

impl ComplaintFilter {
    pub fn created_by(account_id: impl Into<String>) -> Self {
        Self {
            created_by: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn in_category(category: Department) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Open complaints created more than the overdue threshold before `now`.
    pub fn overdue_at(mut self, now: DateTime<Utc>) -> Self {
        self.open_only = true;
        self.created_before = Some(now - overdue_threshold());
        self
    }

    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.created_by
            .as_ref()
            .is_none_or(|id| *id == complaint.created_by)
            && self.category.is_none_or(|c| c == complaint.category)
            && self.status.is_none_or(|s| s == complaint.status)
            && (!self.open_only || !complaint.status.is_closed())
            && self
                .created_before
                .is_none_or(|before| complaint.created_at < before)
    }
}
