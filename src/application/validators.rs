use crate::application::commands::{
    Attachment, CreateComplaintCommand, ExternalLoginCommand, LoginCommand, RegisterAccountCommand,
};
use crate::domain::account::{AccountKind, AccountKindError, Role, normalize_email};
use crate::domain::department::Department;

/// Largest accepted attachment.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: [&str; 3] = ["jpeg", "jpg", "png"];

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{message}")]
    MissingFields { message: String },
    #[error("{message}")]
    FieldValidation { field: String, message: String },
}

impl ValidationError {
    fn missing(message: &str) -> Self {
        ValidationError::MissingFields {
            message: message.to_string(),
        }
    }

    fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::FieldValidation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Treats blank input the same as absent input.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub kind: AccountKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: Option<String>,
}

/// Account command validation rules
pub struct AccountValidator;

impl AccountValidator {
    pub fn validate_email(email: &str) -> Result<(), ValidationError> {
        if !email.contains('@') || !email.contains('.') {
            return Err(ValidationError::field("email", "Invalid email format"));
        }
        Ok(())
    }

    pub fn validate_registration(
        command: &RegisterAccountCommand,
    ) -> Result<Registration, ValidationError> {
        let (Some(name), Some(email), Some(password), Some(role)) = (
            present(&command.name),
            present(&command.email),
            command.password.as_deref().filter(|p| !p.is_empty()),
            present(&command.role),
        ) else {
            return Err(ValidationError::missing("Please provide all required fields"));
        };

        let email = normalize_email(email);
        Self::validate_email(&email)?;
        let role = role
            .parse::<Role>()
            .map_err(|e| ValidationError::field("role", e.to_string()))?;

        // Department is only meaningful for department admins; ignore it otherwise.
        let department = match role {
            Role::DepartmentAdmin => present(&command.department)
                .map(str::parse::<Department>)
                .transpose()
                .map_err(|e| ValidationError::field("department", e.to_string()))?,
            _ => None,
        };

        let kind = AccountKind::from_parts(role, command.student_id.clone(), department)
            .map_err(|e| match e {
                AccountKindError::MissingStudentId => {
                    ValidationError::field("studentId", e.to_string())
                }
                AccountKindError::MissingDepartment => {
                    ValidationError::field("department", e.to_string())
                }
            })?;

        Ok(Registration {
            name: name.to_string(),
            email,
            password: password.to_string(),
            kind,
        })
    }

    pub fn validate_login(command: &LoginCommand) -> Result<Credentials, ValidationError> {
        match (
            present(&command.email),
            command.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            (Some(email), Some(password)) => Ok(Credentials {
                email: normalize_email(email),
                password: password.to_string(),
            }),
            _ => Err(ValidationError::missing("Please provide email and password")),
        }
    }

    pub fn validate_external_login(
        command: &ExternalLoginCommand,
    ) -> Result<ExternalIdentity, ValidationError> {
        let email = present(&command.email)
            .map(normalize_email)
            .ok_or_else(|| ValidationError::missing("Please provide email"))?;
        Self::validate_email(&email)?;
        Ok(ExternalIdentity {
            email,
            name: present(&command.name).map(str::to_string),
        })
    }
}

/// Validated complaint submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintSubmission {
    pub category: Department,
    pub description: String,
}

pub struct ComplaintValidator;

impl ComplaintValidator {
    pub fn validate_create(
        command: &CreateComplaintCommand,
    ) -> Result<ComplaintSubmission, ValidationError> {
        let (Some(category), Some(description)) =
            (present(&command.category), present(&command.description))
        else {
            return Err(ValidationError::missing(
                "Please provide category and description",
            ));
        };
        let category = category
            .parse::<Department>()
            .map_err(|e| ValidationError::field("category", e.to_string()))?;
        if let Some(attachment) = &command.attachment {
            AttachmentValidator::validate(attachment)?;
        }
        Ok(ComplaintSubmission {
            category,
            description: description.to_string(),
        })
    }
}

/// Accepts JPEG or PNG images up to `MAX_ATTACHMENT_BYTES`. Both the declared
/// content type and the file extension must name an allowed type.
pub struct AttachmentValidator;

impl AttachmentValidator {
    pub fn validate(attachment: &Attachment) -> Result<(), ValidationError> {
        if attachment.bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(ValidationError::field("image", "File too large (max 5MB)"));
        }
        let content_type = attachment.content_type.to_ascii_lowercase();
        let type_ok = ALLOWED_IMAGE_TYPES.iter().any(|t| content_type.contains(t));
        let extension = std::path::Path::new(&attachment.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let extension_ok = ALLOWED_IMAGE_TYPES.contains(&extension.as_str());
        if !type_ok || !extension_ok {
            return Err(ValidationError::field(
                "image",
                "Only images are allowed (jpeg, jpg, png)!",
            ));
        }
        Ok(())
    }

    /// Storage key for an accepted attachment: millisecond timestamp prefix
    /// plus the file name reduced to `[A-Za-z0-9._-]`.
    pub fn storage_key(file_name: &str, timestamp_millis: i64) -> String {
        let base = std::path::Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let sanitized: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let sanitized = sanitized.trim_start_matches('.');
        format!("{timestamp_millis}-{sanitized}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(role: &str) -> RegisterAccountCommand {
        RegisterAccountCommand {
            name: Some("Asha".to_string()),
            email: Some("asha@example.com".to_string()),
            password: Some("secret123".to_string()),
            role: Some(role.to_string()),
            student_id: None,
            department: None,
        }
    }

    fn image(name: &str, content_type: &str, size: usize) -> Attachment {
        Attachment {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn test_registration_requires_core_fields() {
        for strip in ["name", "email", "password", "role"] {
            let mut command = registration("super_admin");
            match strip {
                "name" => command.name = Some("   ".to_string()),
                "email" => command.email = None,
                "password" => command.password = Some(String::new()),
                _ => command.role = None,
            }
            assert_eq!(
                AccountValidator::validate_registration(&command),
                Err(ValidationError::missing("Please provide all required fields")),
                "stripped {strip}"
            );
        }
    }

    #[test]
    fn test_registration_role_specific_fields() {
        let err = AccountValidator::validate_registration(&registration("student")).unwrap_err();
        assert_eq!(err.to_string(), "Student ID is required for students");

        let err =
            AccountValidator::validate_registration(&registration("department_admin")).unwrap_err();
        assert_eq!(err.to_string(), "Department is required for department admins");

        let mut command = registration("admin");
        command.department = Some("Hostel".to_string());
        let valid = AccountValidator::validate_registration(&command).unwrap();
        assert_eq!(
            valid.kind,
            AccountKind::DepartmentAdmin {
                department: Department::Hostel
            }
        );
    }

    #[test]
    fn test_registration_rejects_unknown_values() {
        let mut command = registration("department_admin");
        command.department = Some("Parking".to_string());
        assert!(matches!(
            AccountValidator::validate_registration(&command),
            Err(ValidationError::FieldValidation { field, .. }) if field == "department"
        ));

        let command = registration("janitor");
        assert!(matches!(
            AccountValidator::validate_registration(&command),
            Err(ValidationError::FieldValidation { field, .. }) if field == "role"
        ));
    }

    #[test]
    fn test_registration_normalizes_email() {
        let mut command = registration("student");
        command.email = Some("  Asha@Example.COM ".to_string());
        command.student_id = Some("S-1".to_string());
        let valid = AccountValidator::validate_registration(&command).unwrap();
        assert_eq!(valid.email, "asha@example.com");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let command = LoginCommand {
            email: Some("a@example.com".to_string()),
            password: None,
        };
        assert_eq!(
            AccountValidator::validate_login(&command).unwrap_err().to_string(),
            "Please provide email and password"
        );
    }

    #[test]
    fn test_complaint_validation() {
        let command = CreateComplaintCommand {
            category: Some("Library".to_string()),
            description: Some("  ".to_string()),
            attachment: None,
        };
        assert_eq!(
            ComplaintValidator::validate_create(&command).unwrap_err().to_string(),
            "Please provide category and description"
        );

        let command = CreateComplaintCommand {
            category: Some("Gym".to_string()),
            description: Some("broken".to_string()),
            attachment: None,
        };
        assert!(matches!(
            ComplaintValidator::validate_create(&command),
            Err(ValidationError::FieldValidation { field, .. }) if field == "category"
        ));
    }

    #[test]
    fn test_attachment_rules() {
        assert!(AttachmentValidator::validate(&image("a.png", "image/png", 10)).is_ok());
        assert!(AttachmentValidator::validate(&image("a.JPG", "image/jpeg", 10)).is_ok());
        assert!(AttachmentValidator::validate(&image("a.gif", "image/gif", 10)).is_err());
        assert!(AttachmentValidator::validate(&image("a.png", "application/pdf", 10)).is_err());
        assert!(AttachmentValidator::validate(&image("a.pdf", "image/png", 10)).is_err());
        assert!(
            AttachmentValidator::validate(&image("a.png", "image/png", MAX_ATTACHMENT_BYTES))
                .is_ok()
        );
        assert!(
            AttachmentValidator::validate(&image("a.png", "image/png", MAX_ATTACHMENT_BYTES + 1))
                .is_err()
        );
    }

    #[test]
    fn test_storage_key_is_sanitized() {
        assert_eq!(
            AttachmentValidator::storage_key("my photo (1).png", 1700000000000),
            "1700000000000-my_photo__1_.png"
        );
        assert_eq!(
            AttachmentValidator::storage_key("../../etc/passwd.png", 5),
            "5-passwd.png"
        );
    }
}
