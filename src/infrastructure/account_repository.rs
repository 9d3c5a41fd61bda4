use super::{AccountRepository, RepoResult, RepositoryError};
use crate::domain::account::{Account, AccountKind, Role};
use crate::domain::department::Department;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

#[derive(Debug, FromRow)]
struct AccountRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: Option<String>,
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::Corrupt(format!("account {}: {e}", row.id))
        };
        let role: Role = row.role.parse().map_err(|e| corrupt(&e))?;
        let department = row
            .department
            .as_deref()
            .map(str::parse::<Department>)
            .transpose()
            .map_err(|e| corrupt(&e))?;
        let kind =
            AccountKind::from_parts(role, row.student_id, department).map_err(|e| corrupt(&e))?;
        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            kind,
            created_at: row.created_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, role, department, student_id, created_at";

/// In-memory account store keyed by account id.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new(accounts: Vec<Account>) -> Self {
        let accounts = accounts.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: &Account) -> RepoResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::Duplicate(account.email.clone()));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_notification_recipients(
        &self,
        category: Department,
    ) -> RepoResult<Vec<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.is_notified_for(category))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn insert(&self, account: &Account) -> RepoResult<()> {
        let result = sqlx::query(
            "INSERT INTO accounts (id, name, email, password_hash, role, department, student_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role().as_str())
        .bind(account.department().map(|d| d.as_str()))
        .bind(account.kind.student_id())
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepositoryError::Duplicate(account.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Account::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Account::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_notification_recipients(
        &self,
        category: Department,
    ) -> RepoResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE (role = 'department_admin' AND department = $1) OR role = 'super_admin'"
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Account::try_from).collect()
    }
}
