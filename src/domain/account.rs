use crate::domain::department::Department;
use bcrypt::{BcryptError, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried in session claims and stored alongside each account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    #[serde(alias = "admin")]
    DepartmentAdmin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::DepartmentAdmin => "department_admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "student" => Ok(Role::Student),
            "department_admin" | "admin" => Ok(Role::DepartmentAdmin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Per-role account data. Each variant carries exactly the fields its role
/// requires, so an account can never hold a department unless it is a
/// department admin, nor a student identifier unless it is a student.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountKind {
    Student { student_id: String },
    DepartmentAdmin { department: Department },
    SuperAdmin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountKindError {
    #[error("Student ID is required for students")]
    MissingStudentId,
    #[error("Department is required for department admins")]
    MissingDepartment,
}

impl AccountKind {
    /// Builds the variant for `role`, discarding fields that do not belong to it.
    pub fn from_parts(
        role: Role,
        student_id: Option<String>,
        department: Option<Department>,
    ) -> Result<Self, AccountKindError> {
        match role {
            Role::Student => {
                let student_id = student_id
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or(AccountKindError::MissingStudentId)?;
                Ok(AccountKind::Student { student_id })
            }
            Role::DepartmentAdmin => {
                let department = department.ok_or(AccountKindError::MissingDepartment)?;
                Ok(AccountKind::DepartmentAdmin { department })
            }
            Role::SuperAdmin => Ok(AccountKind::SuperAdmin),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            AccountKind::Student { .. } => Role::Student,
            AccountKind::DepartmentAdmin { .. } => Role::DepartmentAdmin,
            AccountKind::SuperAdmin => Role::SuperAdmin,
        }
    }

    pub fn department(&self) -> Option<Department> {
        match self {
            AccountKind::DepartmentAdmin { department } => Some(*department),
            _ => None,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        match self {
            AccountKind::Student { student_id } => Some(student_id),
            _ => None,
        }
    }
}

/// Account aggregate: a registered identity with exactly one role.
#[derive(Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub kind: AccountKind,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with a fresh id, trimming the name and normalizing the email.
    pub fn new(name: &str, email: &str, password_hash: String, kind: AccountKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn department(&self) -> Option<Department> {
        self.kind.department()
    }

    /// Verifies a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.password_hash)
    }

    /// True when this account should hear about new complaints in `category`.
    pub fn is_notified_for(&self, category: Department) -> bool {
        match &self.kind {
            AccountKind::DepartmentAdmin { department } => *department == category,
            AccountKind::SuperAdmin => true,
            AccountKind::Student { .. } => false,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("kind", &self.kind)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Emails are unique case-insensitively and ignoring surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcrypt::hash;

    fn student() -> Account {
        Account::new(
            "  Asha  ",
            " Asha@Example.COM ",
            hash("password123", 4).unwrap(),
            AccountKind::Student {
                student_id: "S-1".to_string(),
            },
        )
    }

    #[test]
    fn test_new_account_normalizes_identity() {
        let account = student();
        assert_eq!(account.name, "Asha");
        assert_eq!(account.email, "asha@example.com");
        assert_eq!(account.role(), Role::Student);
        assert!(!account.id.is_empty());
    }

    #[test]
    fn test_password_verification() {
        let account = student();
        assert!(account.verify_password("password123").unwrap());
        assert!(!account.verify_password("wrong").unwrap());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let account = student();
        let debug_str = format!("{account:?}");
        assert!(debug_str.contains("<redacted>"));
        assert!(!debug_str.contains(&account.password_hash));
    }

    #[test]
    fn test_kind_requires_role_fields() {
        assert_eq!(
            AccountKind::from_parts(Role::Student, None, None),
            Err(AccountKindError::MissingStudentId)
        );
        assert_eq!(
            AccountKind::from_parts(Role::Student, Some("   ".to_string()), None),
            Err(AccountKindError::MissingStudentId)
        );
        assert_eq!(
            AccountKind::from_parts(Role::DepartmentAdmin, Some("S-1".to_string()), None),
            Err(AccountKindError::MissingDepartment)
        );
    }

    #[test]
    fn test_kind_drops_foreign_fields() {
        let kind = AccountKind::from_parts(
            Role::SuperAdmin,
            Some("S-1".to_string()),
            Some(Department::Hostel),
        )
        .unwrap();
        assert_eq!(kind, AccountKind::SuperAdmin);
        assert_eq!(kind.department(), None);
        assert_eq!(kind.student_id(), None);

        let kind = AccountKind::from_parts(
            Role::DepartmentAdmin,
            Some("S-1".to_string()),
            Some(Department::Hostel),
        )
        .unwrap();
        assert_eq!(kind.department(), Some(Department::Hostel));
        assert_eq!(kind.student_id(), None);
    }

    #[test]
    fn test_role_parsing_accepts_legacy_admin() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::DepartmentAdmin));
        assert_eq!("department_admin".parse::<Role>(), Ok(Role::DepartmentAdmin));
        assert!("root".parse::<Role>().is_err());
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::DepartmentAdmin);
    }

    #[test]
    fn test_notification_routing() {
        let admin = Account::new(
            "Hostel Admin",
            "hostel@example.com",
            String::new(),
            AccountKind::DepartmentAdmin {
                department: Department::Hostel,
            },
        );
        let root = Account::new("Root", "root@example.com", String::new(), AccountKind::SuperAdmin);
        assert!(admin.is_notified_for(Department::Hostel));
        assert!(!admin.is_notified_for(Department::Library));
        assert!(root.is_notified_for(Department::Library));
        assert!(!student().is_notified_for(Department::Library));
    }
}
