use grievance_service::domain::account::AccountKind;
use grievance_service::domain::complaint::{Complaint, ComplaintChanges, ComplaintFilter, ComplaintStatus};
use grievance_service::domain::department::Department;
use grievance_service::infrastructure::{
    AccountRepository, ComplaintRepository, PostgresAccountRepository,
    PostgresComplaintRepository, RepositoryError,
};
use grievance_service::test_utils::test_account;
use sqlx::{PgPool, Row};

async fn connect() -> Option<PgPool> {
    // Skip if no database connection available
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("Skipping database test - no DATABASE_URL");
        return None;
    };
    let pool = PgPool::connect(&database_url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Some(pool)
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_database_connectivity() {
    let Some(pool) = connect().await else {
        return;
    };

    let result = sqlx::query("SELECT 1 as test_value")
        .fetch_one(&pool)
        .await
        .unwrap();
    let test_value: i32 = result.get("test_value");
    assert_eq!(test_value, 1);

    let tables = sqlx::query(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let table_names: Vec<String> = tables
        .iter()
        .map(|row| row.get::<String, _>("table_name"))
        .collect();

    println!("Available tables: {:?}", table_names);
    assert!(
        table_names.contains(&"accounts".to_string()),
        "accounts table not found"
    );
    assert!(
        table_names.contains(&"complaints".to_string()),
        "complaints table not found"
    );
}

#[tokio::test]
async fn test_postgres_account_repository() {
    let Some(pool) = connect().await else {
        return;
    };
    let accounts = PostgresAccountRepository::new(pool);

    let email = unique_email("pg-admin");
    let admin = test_account(
        "Library Admin",
        &email,
        AccountKind::DepartmentAdmin {
            department: Department::Library,
        },
    );
    accounts.insert(&admin).await.unwrap();

    let found = accounts.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, admin.id);
    assert_eq!(found.kind, admin.kind);
    assert_eq!(accounts.find_by_id(&admin.id).await.unwrap().unwrap().email, email);

    let duplicate = test_account("Copy", &email, AccountKind::SuperAdmin);
    assert!(matches!(
        accounts.insert(&duplicate).await,
        Err(RepositoryError::Duplicate(_))
    ));

    let recipients = accounts
        .find_notification_recipients(Department::Library)
        .await
        .unwrap();
    assert!(recipients.iter().any(|a| a.id == admin.id));
    let recipients = accounts
        .find_notification_recipients(Department::Hostel)
        .await
        .unwrap();
    assert!(recipients.iter().all(|a| a.id != admin.id));
}

#[tokio::test]
async fn test_postgres_complaint_repository() {
    let Some(pool) = connect().await else {
        return;
    };
    let accounts = PostgresAccountRepository::new(pool.clone());
    let complaints = PostgresComplaintRepository::new(pool);

    let student = test_account(
        "Pg Student",
        &unique_email("pg-student"),
        AccountKind::Student {
            student_id: "S-PG".to_string(),
        },
    );
    accounts.insert(&student).await.unwrap();

    let mut stale = Complaint::new(&student, Department::Canteen, "cold food", None);
    stale.created_at -= chrono::Duration::days(10);
    let fresh = Complaint::new(&student, Department::Hostel, "leaking tap", None);
    complaints.insert(&stale).await.unwrap();
    complaints.insert(&fresh).await.unwrap();

    let mine = complaints
        .list(&ComplaintFilter::created_by(student.id.clone()))
        .await
        .unwrap();
    let ids: Vec<&str> = mine.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![fresh.id.as_str(), stale.id.as_str()]);

    let overdue = ComplaintFilter::created_by(student.id.clone()).overdue_at(chrono::Utc::now());
    assert_eq!(complaints.count(&overdue).await.unwrap(), 1);

    let mut updated = stale.clone();
    updated.apply(ComplaintChanges {
        status: Some(ComplaintStatus::InProgress),
        assigned_to: Some("Chef".to_string()),
        remarks: None,
    });
    complaints.update(&updated).await.unwrap();
    let stored = complaints.find_by_id(&stale.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ComplaintStatus::InProgress);
    assert_eq!(stored.assigned_to, "Chef");

    let in_progress = ComplaintFilter::created_by(student.id.clone())
        .with_status(ComplaintStatus::InProgress);
    assert_eq!(complaints.count(&in_progress).await.unwrap(), 1);

    assert!(complaints.delete(&fresh.id).await.unwrap());
    assert!(!complaints.delete(&fresh.id).await.unwrap());
    assert!(complaints.find_by_id(&fresh.id).await.unwrap().is_none());
}
