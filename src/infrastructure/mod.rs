use crate::domain::account::Account;
use crate::domain::complaint::{Complaint, ComplaintFilter};
use crate::domain::department::Department;
use async_trait::async_trait;

// Infrastructure layer: database, external services, adapters
pub mod account_repository;
pub mod blob_store;
pub mod broadcaster;
pub mod complaint_repository;
pub mod notifier;

pub use account_repository::{InMemoryAccountRepository, PostgresAccountRepository};
pub use blob_store::{BlobError, BlobStore, InMemoryBlobStore, LocalBlobStore};
pub use broadcaster::{BroadcastMessage, COMPLAINTS_TOPIC, TopicBroadcaster};
pub use complaint_repository::{InMemoryComplaintRepository, PostgresComplaintRepository};
pub use notifier::{EmailMessage, HttpMailNotifier, LogNotifier, NotificationError, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `RepositoryError::Duplicate` when the email is taken.
    async fn insert(&self, account: &Account) -> RepoResult<()>;
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Account>>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
    /// Department admins of `category` plus every super admin.
    async fn find_notification_recipients(&self, category: Department)
    -> RepoResult<Vec<Account>>;
}

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    async fn insert(&self, complaint: &Complaint) -> RepoResult<()>;
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Complaint>>;
    /// Matching complaints, newest created first.
    async fn list(&self, filter: &ComplaintFilter) -> RepoResult<Vec<Complaint>>;
    async fn count(&self, filter: &ComplaintFilter) -> RepoResult<u64>;
    /// Overwrites the stored record; last write wins.
    async fn update(&self, complaint: &Complaint) -> RepoResult<()>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: &str) -> RepoResult<bool>;
}
