use super::{ComplaintRepository, RepoResult, RepositoryError};
use crate::domain::complaint::{Complaint, ComplaintFilter, ComplaintStatus};
use crate::domain::department::Department;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

#[derive(Debug, FromRow)]
struct ComplaintRow {
    pub id: String,
    pub created_by: String,
    pub student_name: String,
    pub student_email: String,
    pub category: String,
    pub description: String,
    pub image_path: String,
    pub status: String,
    pub assigned_to: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = RepositoryError;

    fn try_from(row: ComplaintRow) -> Result<Self, Self::Error> {
        let category: Department = row
            .category
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("complaint {}: {e}", row.id)))?;
        let status: ComplaintStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("complaint {}: {e}", row.id)))?;
        Ok(Complaint {
            id: row.id,
            created_by: row.created_by,
            student_name: row.student_name,
            student_email: row.student_email,
            category,
            description: row.description,
            image_path: row.image_path,
            status,
            assigned_to: row.assigned_to,
            remarks: row.remarks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// In-memory complaint store keyed by complaint id.
#[derive(Default)]
pub struct InMemoryComplaintRepository {
    complaints: RwLock<HashMap<String, Complaint>>,
}

impl InMemoryComplaintRepository {
    pub fn new(complaints: Vec<Complaint>) -> Self {
        let complaints = complaints.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            complaints: RwLock::new(complaints),
        }
    }
}

#[async_trait]
impl ComplaintRepository for InMemoryComplaintRepository {
    async fn insert(&self, complaint: &Complaint) -> RepoResult<()> {
        let mut complaints = self.complaints.write().await;
        if complaints.contains_key(&complaint.id) {
            return Err(RepositoryError::Duplicate(complaint.id.clone()));
        }
        complaints.insert(complaint.id.clone(), complaint.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Complaint>> {
        Ok(self.complaints.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &ComplaintFilter) -> RepoResult<Vec<Complaint>> {
        let mut matching: Vec<Complaint> = self
            .complaints
            .read()
            .await
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn count(&self, filter: &ComplaintFilter) -> RepoResult<u64> {
        let complaints = self.complaints.read().await;
        Ok(complaints.values().filter(|c| filter.matches(c)).count() as u64)
    }

    async fn update(&self, complaint: &Complaint) -> RepoResult<()> {
        self.complaints
            .write()
            .await
            .insert(complaint.id.clone(), complaint.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<bool> {
        Ok(self.complaints.write().await.remove(id).is_some())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresComplaintRepository {
    pool: PgPool,
}

impl PostgresComplaintRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COMPLAINT_COLUMNS: &str = "id, created_by, student_name, student_email, category, description, \
     image_path, status, assigned_to, remarks, created_at, updated_at";

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ComplaintFilter) {
    query.push(" WHERE TRUE");
    if let Some(created_by) = &filter.created_by {
        query.push(" AND created_by = ").push_bind(created_by.clone());
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if filter.open_only {
        query.push(" AND status NOT IN ('Resolved', 'Rejected')");
    }
    if let Some(before) = filter.created_before {
        query.push(" AND created_at < ").push_bind(before);
    }
}

#[async_trait]
impl ComplaintRepository for PostgresComplaintRepository {
    #[instrument(skip(self, complaint), fields(complaint_id = %complaint.id))]
    async fn insert(&self, complaint: &Complaint) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO complaints (id, created_by, student_name, student_email, category, description, \
             image_path, status, assigned_to, remarks, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&complaint.id)
        .bind(&complaint.created_by)
        .bind(&complaint.student_name)
        .bind(&complaint.student_email)
        .bind(complaint.category.as_str())
        .bind(&complaint.description)
        .bind(&complaint.image_path)
        .bind(complaint.status.as_str())
        .bind(&complaint.assigned_to)
        .bind(&complaint.remarks)
        .bind(complaint.created_at)
        .bind(complaint.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Complaint>> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Complaint::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &ComplaintFilter) -> RepoResult<Vec<Complaint>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints"
        ));
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC");
        let rows = query
            .build_query_as::<ComplaintRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Complaint::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &ComplaintFilter) -> RepoResult<u64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM complaints");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self, complaint), fields(complaint_id = %complaint.id))]
    async fn update(&self, complaint: &Complaint) -> RepoResult<()> {
        sqlx::query(
            "UPDATE complaints SET status = $2, assigned_to = $3, remarks = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(&complaint.id)
        .bind(complaint.status.as_str())
        .bind(&complaint.assigned_to)
        .bind(&complaint.remarks)
        .bind(complaint.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM complaints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Account, AccountKind};
    use chrono::Duration;

    fn complaint(category: Department, age_days: i64) -> Complaint {
        let author = Account::new(
            "Mei",
            "mei@example.com",
            String::new(),
            AccountKind::Student {
                student_id: "S-7".to_string(),
            },
        );
        let mut complaint = Complaint::new(&author, category, "broken", None);
        complaint.created_at = Utc::now() - Duration::days(age_days);
        complaint
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let oldest = complaint(Department::Hostel, 5);
        let newest = complaint(Department::Hostel, 1);
        let middle = complaint(Department::Hostel, 3);
        let repo = InMemoryComplaintRepository::new(vec![
            oldest.clone(),
            newest.clone(),
            middle.clone(),
        ]);

        let ids: Vec<String> = repo
            .list(&ComplaintFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
    }

    #[tokio::test]
    async fn test_count_and_delete() {
        let hostel = complaint(Department::Hostel, 1);
        let library = complaint(Department::Library, 1);
        let repo = InMemoryComplaintRepository::new(vec![hostel.clone(), library]);

        let in_hostel = ComplaintFilter::in_category(Department::Hostel);
        assert_eq!(repo.count(&in_hostel).await.unwrap(), 1);
        assert!(repo.delete(&hostel.id).await.unwrap());
        assert!(!repo.delete(&hostel.id).await.unwrap());
        assert_eq!(repo.count(&in_hostel).await.unwrap(), 0);
        assert_eq!(repo.count(&ComplaintFilter::default()).await.unwrap(), 1);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_status() {
        let row = ComplaintRow {
            id: "c1".to_string(),
            created_by: "a1".to_string(),
            student_name: "Mei".to_string(),
            student_email: "mei@example.com".to_string(),
            category: "Hostel".to_string(),
            description: "broken".to_string(),
            image_path: String::new(),
            status: "Escalated".to_string(),
            assigned_to: String::new(),
            remarks: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            Complaint::try_from(row),
            Err(RepositoryError::Corrupt(_))
        ));
    }
}
