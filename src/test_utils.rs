//! Shared fixtures for unit and integration tests: an in-memory application
//! context, notifier doubles and seed helpers.

use crate::application::{
    AccountService, ComplaintService, NotificationPolicy, PasswordService, TokenService,
};
use crate::domain::account::{Account, AccountKind};
use crate::domain::complaint::{Complaint, ComplaintStatus};
use crate::domain::department::Department;
use crate::infrastructure::{
    AccountRepository, ComplaintRepository, EmailMessage, InMemoryAccountRepository,
    InMemoryBlobStore, InMemoryComplaintRepository, NotificationError, Notifier,
    TopicBroadcaster,
};
use crate::interface::app_state::AppState;
use async_trait::async_trait;
use bcrypt::hash;
use chrono::{Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const TEST_PASSWORD: &str = "password123";
/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Records every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Polls until at least `count` messages arrived or one second passed.
    /// Detached sends complete on another task.
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let sent = self.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.sent().await
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Rejects every message.
#[derive(Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected(format!(
            "mailbox unavailable: {}",
            message.to
        )))
    }
}

/// In-memory application wiring with handles on every collaborator.
pub struct TestContext {
    pub accounts: Arc<InMemoryAccountRepository>,
    pub complaints: Arc<InMemoryComplaintRepository>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub broadcaster: Arc<TopicBroadcaster>,
    pub token_service: Arc<TokenService>,
    pub account_service: Arc<AccountService>,
    pub complaint_service: Arc<ComplaintService>,
}

impl TestContext {
    /// Production notification policy: creation alerts are detached.
    pub fn new() -> Self {
        Self::with_policy(NotificationPolicy::default())
    }

    pub fn with_policy(policy: NotificationPolicy) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::build(notifier.clone(), notifier, policy)
    }

    /// Context whose services use `FailingNotifier`; `self.notifier` stays empty.
    pub fn with_failing_notifier() -> Self {
        Self::build(
            Arc::new(RecordingNotifier::default()),
            Arc::new(FailingNotifier),
            NotificationPolicy::awaited(),
        )
    }

    fn build(
        recorder: Arc<RecordingNotifier>,
        notifier: Arc<dyn Notifier>,
        policy: NotificationPolicy,
    ) -> Self {
        let accounts = Arc::new(InMemoryAccountRepository::default());
        let complaints = Arc::new(InMemoryComplaintRepository::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let broadcaster = Arc::new(TopicBroadcaster::default());
        let token_service = Arc::new(TokenService::new(TEST_JWT_SECRET));

        let account_service = Arc::new(AccountService::new(
            accounts.clone(),
            PasswordService::new(TEST_BCRYPT_COST),
            (*token_service).clone(),
        ));
        let complaint_service = Arc::new(
            ComplaintService::new(
                accounts.clone(),
                complaints.clone(),
                blobs.clone(),
                notifier,
                broadcaster.clone(),
            )
            .with_notification_policy(policy),
        );

        Self {
            accounts,
            complaints,
            blobs,
            notifier: recorder,
            broadcaster,
            token_service,
            account_service,
            complaint_service,
        }
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            account_service: self.account_service.clone(),
            complaint_service: self.complaint_service.clone(),
            token_service: self.token_service.clone(),
            broadcaster: self.broadcaster.clone(),
            upload_dir: PathBuf::from("uploads"),
        })
    }

    async fn seed(&self, account: Account) -> Account {
        self.accounts.insert(&account).await.unwrap();
        account
    }

    pub async fn seed_student(&self, name: &str, email: &str) -> Account {
        self.seed(test_account(
            name,
            email,
            AccountKind::Student {
                student_id: format!("S-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
            },
        ))
        .await
    }

    pub async fn seed_department_admin(&self, email: &str, department: Department) -> Account {
        self.seed(test_account(
            &format!("{department} Admin"),
            email,
            AccountKind::DepartmentAdmin { department },
        ))
        .await
    }

    pub async fn seed_super_admin(&self, email: &str) -> Account {
        self.seed(test_account("Super Admin", email, AccountKind::SuperAdmin))
            .await
    }

    /// Stores a complaint by `author` created `age_days` ago with `status`.
    pub async fn seed_complaint(
        &self,
        author: &Account,
        category: Department,
        status: ComplaintStatus,
        age_days: i64,
    ) -> Complaint {
        let mut complaint = Complaint::new(author, category, "seeded complaint", None);
        complaint.status = status;
        complaint.created_at = Utc::now() - Duration::days(age_days);
        complaint.updated_at = complaint.created_at;
        self.complaints.insert(&complaint).await.unwrap();
        complaint
    }

    pub async fn stored_complaint(&self, id: &str) -> Option<Complaint> {
        self.complaints.find_by_id(id).await.unwrap()
    }

    /// Bearer token for `account`.
    pub fn token_for(&self, account: &Account) -> String {
        self.token_service.issue(account).unwrap().token
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Account whose password is `TEST_PASSWORD`.
pub fn test_account(name: &str, email: &str, kind: AccountKind) -> Account {
    Account::new(
        name,
        email,
        hash(TEST_PASSWORD, TEST_BCRYPT_COST).unwrap(),
        kind,
    )
}
