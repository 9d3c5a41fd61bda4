use crate::application::access_policy::AccessPolicy;
use crate::application::commands::{CreateComplaintCommand, UpdateComplaintCommand};
use crate::application::errors::ServiceError;
use crate::application::events::{DomainEvent, EventFactory};
use crate::application::notifications;
use crate::application::queries::ListComplaintsQuery;
use crate::application::validators::{AttachmentValidator, ComplaintValidator};
use crate::domain::actor::Actor;
use crate::domain::complaint::{
    Complaint, ComplaintChanges, ComplaintFilter, ComplaintStatus, TrackedComplaint,
};
use crate::domain::department::Department;
use crate::infrastructure::{
    AccountRepository, BlobStore, COMPLAINTS_TOPIC, ComplaintRepository, EmailMessage, Notifier,
    TopicBroadcaster,
};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Whether a notification call site waits for delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    /// Spawned onto the runtime; the caller returns immediately.
    Detached,
    /// Awaited before the caller returns.
    Awaited,
}

/// Dispatch mode per notification call site. Delivery failures are logged
/// and never fail the operation in either mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub on_create: DispatchMode,
    pub on_status_change: DispatchMode,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            on_create: DispatchMode::Detached,
            on_status_change: DispatchMode::Awaited,
        }
    }
}

impl NotificationPolicy {
    pub fn awaited() -> Self {
        Self {
            on_create: DispatchMode::Awaited,
            on_status_change: DispatchMode::Awaited,
        }
    }
}

/// Complaint counts within the caller's scope. The four status counts
/// partition `total`; `overdue` overlaps with pending and in-progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintStats {
    pub total: u64,
    pub resolved: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub rejected: u64,
    pub overdue: u64,
}

/// Complaint lifecycle: submission, scoped retrieval, triage and analytics.
pub struct ComplaintService {
    accounts: Arc<dyn AccountRepository>,
    complaints: Arc<dyn ComplaintRepository>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    broadcaster: Arc<TopicBroadcaster>,
    policy: NotificationPolicy,
}

impl ComplaintService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        complaints: Arc<dyn ComplaintRepository>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        broadcaster: Arc<TopicBroadcaster>,
    ) -> Self {
        Self {
            accounts,
            complaints,
            blobs,
            notifier,
            broadcaster,
            policy: NotificationPolicy::default(),
        }
    }

    pub fn with_notification_policy(mut self, policy: NotificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[instrument(name = "create_complaint", skip(self, command), fields(account_id = %actor.account_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        command: CreateComplaintCommand,
    ) -> Result<Complaint, ServiceError> {
        let submission = ComplaintValidator::validate_create(&command)?;
        let author = self
            .accounts
            .find_by_id(&actor.account_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let (blob_key, image_path) = match command.attachment {
            Some(attachment) => {
                let key = AttachmentValidator::storage_key(
                    &attachment.file_name,
                    Utc::now().timestamp_millis(),
                );
                let path = self.blobs.put(&key, attachment.bytes).await?;
                (Some(key), Some(path))
            }
            None => (None, None),
        };

        let complaint = Complaint::new(
            &author,
            submission.category,
            &submission.description,
            image_path,
        );
        if let Err(e) = self.complaints.insert(&complaint).await {
            if let Some(key) = blob_key {
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove orphaned attachment");
                }
            }
            return Err(e.into());
        }
        info!(complaint_id = %complaint.id, category = %complaint.category, "Complaint created");

        let task = notify_admins(
            self.accounts.clone(),
            self.notifier.clone(),
            complaint.clone(),
        );
        dispatch(self.policy.on_create, task).await;

        let event = EventFactory::complaint_created(&complaint);
        match event.to_broadcast() {
            Ok(message) => {
                let receivers = self.broadcaster.publish(COMPLAINTS_TOPIC, message).await;
                info!(
                    event_id = %event.event_id(),
                    complaint_id = %event.aggregate_id(),
                    occurred_at = %event.occurred_at(),
                    receivers,
                    "Broadcast {}",
                    event.event_type()
                );
            }
            Err(e) => warn!(error = %e, "Failed to encode complaint broadcast"),
        }

        Ok(complaint)
    }

    /// The caller's own complaints, newest first.
    #[instrument(name = "list_my_complaints", skip(self), fields(account_id = %actor.account_id))]
    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Complaint>, ServiceError> {
        let filter = ComplaintFilter::created_by(actor.account_id.clone());
        Ok(self.complaints.list(&filter).await?)
    }

    /// Staff listing scoped by role, newest first, each flagged for SLA.
    #[instrument(name = "list_complaints", skip(self), fields(account_id = %actor.account_id))]
    pub async fn list_for_admin(
        &self,
        actor: &Actor,
        query: ListComplaintsQuery,
    ) -> Result<Vec<TrackedComplaint>, ServiceError> {
        AccessPolicy::require_staff(actor)?;
        let status = parse_status(query.status.as_deref())?;
        let category = parse_category(query.category.as_deref())?;

        let mut filter = AccessPolicy::scope_filter(actor, category);
        filter.status = status;
        let now = Utc::now();
        Ok(self
            .complaints
            .list(&filter)
            .await?
            .into_iter()
            .map(|c| c.tracked_at(now))
            .collect())
    }

    /// Counts per status plus overdue, each an independent query.
    #[instrument(name = "complaint_analytics", skip(self), fields(account_id = %actor.account_id))]
    pub async fn analytics(&self, actor: &Actor) -> Result<ComplaintStats, ServiceError> {
        AccessPolicy::require_staff(actor)?;
        let scope = AccessPolicy::scope_filter(actor, None);
        let resolved = scope.clone().with_status(ComplaintStatus::Resolved);
        let pending = scope.clone().with_status(ComplaintStatus::Pending);
        let in_progress = scope.clone().with_status(ComplaintStatus::InProgress);
        let rejected = scope.clone().with_status(ComplaintStatus::Rejected);
        let overdue = scope.clone().overdue_at(Utc::now());

        let (total, resolved, pending, in_progress, rejected, overdue) = tokio::try_join!(
            self.complaints.count(&scope),
            self.complaints.count(&resolved),
            self.complaints.count(&pending),
            self.complaints.count(&in_progress),
            self.complaints.count(&rejected),
            self.complaints.count(&overdue),
        )?;

        Ok(ComplaintStats {
            total,
            resolved,
            pending,
            in_progress,
            rejected,
            overdue,
        })
    }

    #[instrument(name = "update_complaint", skip(self, command), fields(account_id = %actor.account_id, complaint_id = %command.complaint_id))]
    pub async fn update(
        &self,
        actor: &Actor,
        command: UpdateComplaintCommand,
    ) -> Result<Complaint, ServiceError> {
        AccessPolicy::require_staff(actor)?;
        let status = parse_status(command.status.as_deref())?;
        let mut complaint = self.find_existing(&command.complaint_id).await?;
        if !AccessPolicy::can_mutate(actor, &complaint) {
            return Err(ServiceError::Authorization(
                "You can only manage complaints in your department".to_string(),
            ));
        }

        let change = complaint.apply(ComplaintChanges {
            status,
            assigned_to: command.assigned_to,
            remarks: command.remarks,
        });
        self.complaints.update(&complaint).await?;

        if let Some(change) = change {
            let event = EventFactory::complaint_status_changed(&complaint, change);
            info!(
                event_id = %event.event_id(),
                complaint_id = %event.aggregate_id(),
                occurred_at = %event.occurred_at(),
                from = %event.from,
                to = %event.to,
                "{}",
                event.event_type()
            );
            let task = deliver(
                self.notifier.clone(),
                vec![notifications::status_update(&complaint)],
            );
            dispatch(self.policy.on_status_change, task).await;
        }
        Ok(complaint)
    }

    #[instrument(name = "delete_complaint", skip(self), fields(account_id = %actor.account_id))]
    pub async fn delete(&self, actor: &Actor, complaint_id: &str) -> Result<(), ServiceError> {
        AccessPolicy::require_staff(actor)?;
        let complaint = self.find_existing(complaint_id).await?;
        if !AccessPolicy::can_mutate(actor, &complaint) {
            return Err(ServiceError::Authorization(
                "You can only delete complaints in your department".to_string(),
            ));
        }
        if !self.complaints.delete(complaint_id).await? {
            return Err(complaint_not_found());
        }
        info!("Complaint deleted");
        Ok(())
    }

    async fn find_existing(&self, complaint_id: &str) -> Result<Complaint, ServiceError> {
        self.complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or_else(complaint_not_found)
    }
}

fn complaint_not_found() -> ServiceError {
    ServiceError::NotFound("Complaint not found".to_string())
}

fn parse_status(raw: Option<&str>) -> Result<Option<ComplaintStatus>, ServiceError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<ComplaintStatus>)
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()))
}

fn parse_category(raw: Option<&str>) -> Result<Option<Department>, ServiceError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<Department>)
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()))
}

async fn dispatch<F>(mode: DispatchMode, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match mode {
        DispatchMode::Detached => {
            tokio::spawn(task);
        }
        DispatchMode::Awaited => task.await,
    }
}

async fn notify_admins(
    accounts: Arc<dyn AccountRepository>,
    notifier: Arc<dyn Notifier>,
    complaint: Complaint,
) {
    let recipients = match accounts.find_notification_recipients(complaint.category).await {
        Ok(recipients) => recipients,
        Err(e) => {
            warn!(complaint_id = %complaint.id, error = %e, "Could not load notification recipients");
            return;
        }
    };
    let messages = recipients
        .iter()
        .map(|admin| notifications::new_complaint(&admin.email, &complaint))
        .collect();
    deliver(notifier, messages).await;
}

/// Sends one message at a time; a failed send is logged and skipped.
async fn deliver(notifier: Arc<dyn Notifier>, messages: Vec<EmailMessage>) {
    for message in &messages {
        if let Err(e) = notifier.send(message).await {
            warn!(to = %message.to, error = %e, "Failed to send notification");
        }
    }
}
