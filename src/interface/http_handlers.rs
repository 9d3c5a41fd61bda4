use crate::application::ServiceError;
use crate::application::commands::{
    Attachment, CreateComplaintCommand, ExternalLoginCommand, LoginCommand, RegisterAccountCommand,
    UpdateComplaintCommand,
};
use crate::application::queries::ListComplaintsQuery;
use crate::application::ComplaintStats;
use crate::domain::actor::Actor;
use crate::interface::app_state::AppState;
use crate::interface::{
    AuthResponse, ComplaintListParams, ComplaintListResponse, ComplaintResponse, ComplaintView,
    CreateComplaintForm, ErrorResponse, ExternalLoginRequest, LoginRequest, MessageResponse,
    RegisterRequest, UpdateComplaintRequest,
};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Query, State};
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, error};

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServiceError::Validation(m) | ServiceError::Conflict(m) => (StatusCode::BAD_REQUEST, m),
            ServiceError::Authentication(m) => (StatusCode::UNAUTHORIZED, m),
            ServiceError::Authorization(m) => (StatusCode::FORBIDDEN, m),
            ServiceError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ServiceError::Unexpected(detail) => {
                error!(error = %detail, "Unexpected error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// JSON body extractor whose rejections use the `{"message"}` error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON body",
            _ => "Invalid request body",
        };
        ServiceError::Validation(message.to_string())
    }
}

/// Caller identity established from the bearer session token.
pub struct AuthenticatedUser {
    pub actor: Actor,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Deref<Target = AppState> + Send + Sync + 'static,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state: &AppState = state.deref();
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization header"))?;
        let claims = app_state
            .token_service
            .validate(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;
        let actor = claims
            .actor()
            .ok_or_else(|| unauthorized("Invalid or expired token"))?;
        Ok(AuthenticatedUser { actor })
    }
}

fn unauthorized(message: &str) -> ServiceError {
    ServiceError::Authentication(message.to_string())
}

// --- HEALTH ---

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = MessageResponse)),
    tags = ["Health"]
)]
pub async fn health_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Student Grievance API is running".to_string(),
    })
}

// --- AUTH HANDLERS ---

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields, or email taken", body = ErrorResponse),
    ),
    tags = ["Auth"],
    description = "Register a student, department admin or super admin and open a session."
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ServiceError> {
    let session = state
        .account_service
        .register(RegisterAccountCommand {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role,
            student_id: payload.student_id,
            department: payload.department,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(&session, Some("User registered successfully"))),
    ))
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
    tags = ["Auth"]
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let session = state
        .account_service
        .login(LoginCommand {
            email: payload.email,
            password: payload.password,
        })
        .await?;
    Ok(Json(AuthResponse::new(&session, Some("Login successful"))))
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/api/auth/google-mock",
    request_body = ExternalLoginRequest,
    responses(
        (status = 200, description = "Session for the external identity", body = AuthResponse),
        (status = 400, description = "Missing email", body = ErrorResponse),
    ),
    tags = ["Auth"],
    description = "Trusts the supplied email as verified by an external provider. Creates a student account on first use."
)]
pub async fn external_login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<ExternalLoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let session = state
        .account_service
        .external_login(ExternalLoginCommand {
            email: payload.email,
            name: payload.name,
        })
        .await?;
    Ok(Json(AuthResponse::new(&session, None)))
}

// --- COMPLAINT HANDLERS ---

fn malformed_form(e: axum::extract::multipart::MultipartError) -> ServiceError {
    ServiceError::Validation(format!("Malformed form data: {}", e.body_text()))
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body(content_type = "multipart/form-data", content = CreateComplaintForm),
    responses(
        (status = 201, description = "Complaint submitted", body = ComplaintResponse),
        (status = 400, description = "Missing fields or rejected attachment", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse),
    ),
    tags = ["Complaints"],
    security(("bearerAuth" = []))
)]
pub async fn create_complaint_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ComplaintResponse>), ServiceError> {
    let mut command = CreateComplaintCommand::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "category" => command.category = Some(field.text().await.map_err(malformed_form)?),
            "description" => {
                command.description = Some(field.text().await.map_err(malformed_form)?)
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(malformed_form)?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() || !bytes.is_empty() {
                    command.attachment = Some(Attachment {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let complaint = state.complaint_service.create(&user.actor, command).await?;
    Ok((
        StatusCode::CREATED,
        Json(ComplaintResponse {
            message: Some("Complaint submitted successfully".to_string()),
            complaint: complaint.into(),
        }),
    ))
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/api/complaints/my",
    responses((status = 200, description = "Caller's complaints, newest first", body = ComplaintListResponse)),
    tags = ["Complaints"],
    security(("bearerAuth" = []))
)]
pub async fn my_complaints_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<ComplaintListResponse>, ServiceError> {
    let complaints = state.complaint_service.list_mine(&user.actor).await?;
    Ok(Json(ComplaintListResponse {
        complaints: complaints.into_iter().map(ComplaintView::from).collect(),
    }))
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/api/complaints",
    params(ComplaintListParams),
    responses(
        (status = 200, description = "Complaints in the caller's scope with SLA flag", body = ComplaintListResponse),
        (status = 400, description = "Unknown status or category", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
    ),
    tags = ["Complaints"],
    security(("bearerAuth" = []))
)]
pub async fn list_complaints_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(params): Query<ComplaintListParams>,
) -> Result<Json<ComplaintListResponse>, ServiceError> {
    let complaints = state
        .complaint_service
        .list_for_admin(
            &user.actor,
            ListComplaintsQuery {
                status: params.status,
                category: params.category,
            },
        )
        .await?;
    Ok(Json(ComplaintListResponse {
        complaints: complaints.into_iter().map(ComplaintView::from).collect(),
    }))
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/api/complaints/analytics",
    responses(
        (status = 200, description = "Complaint counts in the caller's scope", body = ComplaintStats),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
    ),
    tags = ["Complaints"],
    security(("bearerAuth" = []))
)]
pub async fn analytics_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<ComplaintStats>, ServiceError> {
    Ok(Json(state.complaint_service.analytics(&user.actor).await?))
}

#[axum::debug_handler]
#[utoipa::path(
    put,
    path = "/api/complaints/{id}",
    params(("id" = String, Path, description = "Complaint id")),
    request_body = UpdateComplaintRequest,
    responses(
        (status = 200, description = "Complaint updated", body = ComplaintResponse),
        (status = 403, description = "Outside the caller's department", body = ErrorResponse),
        (status = 404, description = "Complaint not found", body = ErrorResponse),
    ),
    tags = ["Complaints"],
    security(("bearerAuth" = []))
)]
pub async fn update_complaint_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateComplaintRequest>,
) -> Result<Json<ComplaintResponse>, ServiceError> {
    let complaint = state
        .complaint_service
        .update(
            &user.actor,
            UpdateComplaintCommand {
                complaint_id: id,
                status: payload.status,
                assigned_to: payload.assigned_to,
                remarks: payload.remarks,
            },
        )
        .await?;
    Ok(Json(ComplaintResponse {
        message: Some("Complaint updated successfully".to_string()),
        complaint: complaint.into(),
    }))
}

#[axum::debug_handler]
#[utoipa::path(
    delete,
    path = "/api/complaints/{id}",
    params(("id" = String, Path, description = "Complaint id")),
    responses(
        (status = 200, description = "Complaint deleted", body = MessageResponse),
        (status = 403, description = "Outside the caller's department", body = ErrorResponse),
        (status = 404, description = "Complaint not found", body = ErrorResponse),
    ),
    tags = ["Complaints"],
    security(("bearerAuth" = []))
)]
pub async fn delete_complaint_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.complaint_service.delete(&user.actor, &id).await?;
    Ok(Json(MessageResponse {
        message: "Complaint deleted successfully".to_string(),
    }))
}
