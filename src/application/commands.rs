/// Command to register an account. Fields are optional because presence is
/// itself validated; blank strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct RegisterAccountCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
}

/// Command to log in with email and password
#[derive(Debug, Clone, Default)]
pub struct LoginCommand {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Command to sign in through an external identity provider. The provider
/// is trusted to have verified `email`.
#[derive(Debug, Clone, Default)]
pub struct ExternalLoginCommand {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// An uploaded file as received from the client.
#[derive(Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Command to submit a complaint
#[derive(Debug, Clone, Default)]
pub struct CreateComplaintCommand {
    pub category: Option<String>,
    pub description: Option<String>,
    pub attachment: Option<Attachment>,
}

/// Command to triage a complaint
#[derive(Debug, Clone, Default)]
pub struct UpdateComplaintCommand {
    pub complaint_id: String,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub remarks: Option<String>,
}
