// Interface layer: HTTP API, websocket channel, DTOs

use crate::application::AuthSession;
use crate::domain::account::{Account, Role};
use crate::domain::complaint::{Complaint, ComplaintStatus, TrackedComplaint};
use crate::domain::department::Department;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::{IntoParams, ToSchema};

pub mod app_state;
pub mod http_handlers;
pub mod routes;
pub mod websocket;

pub use app_state::AppState;
pub use routes::build_router;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `student`, `department_admin` (or legacy `admin`), `super_admin`
    pub role: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub student_id: Option<String>,
    pub department: Option<String>,
}

/// Older clients send numeric student ids; keep their textual form.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(de::Error::custom("expected a string or number")),
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ExternalLoginRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Public account profile. Never carries the password hash.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[schema(value_type = String)]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Department>,
}

impl From<&Account> for UserResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role(),
            department: account.department(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub token: String,
    pub user: UserResponse,
}

impl AuthResponse {
    pub fn new(session: &AuthSession, message: Option<&str>) -> Self {
        Self {
            message: message.map(str::to_string),
            token: session.token.token.clone(),
            user: UserResponse::from(&session.account),
        }
    }
}

/// Complaint as returned to clients. `isOverdue` is present on staff listings only.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintView {
    pub id: String,
    pub created_by: String,
    pub student_name: String,
    pub student_email: String,
    #[schema(value_type = String)]
    pub category: Department,
    pub description: String,
    pub image_path: String,
    #[schema(value_type = String)]
    pub status: ComplaintStatus,
    pub assigned_to: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_overdue: Option<bool>,
}

impl From<Complaint> for ComplaintView {
    fn from(c: Complaint) -> Self {
        Self {
            id: c.id,
            created_by: c.created_by,
            student_name: c.student_name,
            student_email: c.student_email,
            category: c.category,
            description: c.description,
            image_path: c.image_path,
            status: c.status,
            assigned_to: c.assigned_to,
            remarks: c.remarks,
            created_at: c.created_at,
            updated_at: c.updated_at,
            is_overdue: None,
        }
    }
}

impl From<TrackedComplaint> for ComplaintView {
    fn from(tracked: TrackedComplaint) -> Self {
        Self {
            is_overdue: Some(tracked.is_overdue),
            ..Self::from(tracked.complaint)
        }
    }
}

/// Multipart form accepted by complaint submission. Documentation only; the
/// handler reads the fields off the stream.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CreateComplaintForm {
    category: String,
    description: String,
    /// JPEG or PNG, at most 5MB
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
}

#[derive(Serialize, ToSchema)]
pub struct ComplaintResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub complaint: ComplaintView,
}

#[derive(Serialize, ToSchema)]
pub struct ComplaintListResponse {
    pub complaints: Vec<ComplaintView>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ComplaintListParams {
    /// Pending, In Progress, Resolved or Rejected
    pub status: Option<String>,
    /// Honored for super admins only
    pub category: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintRequest {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountKind;

    #[test]
    fn test_user_response_omits_secret_and_empty_department() {
        let account = Account::new(
            "Asha",
            "asha@example.com",
            "hash".to_string(),
            AccountKind::Student {
                student_id: "S-1".to_string(),
            },
        );
        let value = serde_json::to_value(UserResponse::from(&account)).unwrap();
        assert_eq!(value["role"], "student");
        assert!(value.get("department").is_none());
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn test_register_request_accepts_numeric_student_id() {
        let request: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "studentId": 12345 })).unwrap();
        assert_eq!(request.student_id.as_deref(), Some("12345"));

        let request: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "studentId": "S-9" })).unwrap();
        assert_eq!(request.student_id.as_deref(), Some("S-9"));

        let request: RegisterRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(request.student_id, None);

        assert!(
            serde_json::from_value::<RegisterRequest>(serde_json::json!({ "studentId": [1] }))
                .is_err()
        );
    }

    #[test]
    fn test_complaint_view_overdue_flag_only_when_tracked() {
        let account = Account::new(
            "Asha",
            "asha@example.com",
            String::new(),
            AccountKind::Student {
                student_id: "S-1".to_string(),
            },
        );
        let complaint = Complaint::new(&account, Department::Library, "noisy", None);

        let plain = serde_json::to_value(ComplaintView::from(complaint.clone())).unwrap();
        assert!(plain.get("isOverdue").is_none());

        let tracked =
            serde_json::to_value(ComplaintView::from(complaint.tracked_at(Utc::now()))).unwrap();
        assert_eq!(tracked["isOverdue"], false);
        assert_eq!(tracked["studentEmail"], "asha@example.com");
    }
}
