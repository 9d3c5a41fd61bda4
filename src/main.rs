use dotenvy::dotenv;
use grievance_service::application::ComplaintStats;
use grievance_service::interface::{
    AuthResponse, ComplaintListResponse, ComplaintResponse, ComplaintView, CreateComplaintForm,
    ErrorResponse, ExternalLoginRequest, LoginRequest, MessageResponse, RegisterRequest,
    UpdateComplaintRequest, UserResponse, build_router,
};
use grievance_service::{AppConfig, AppError, AppStateBuilder};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        grievance_service::interface::http_handlers::health_handler,
        grievance_service::interface::http_handlers::register_handler,
        grievance_service::interface::http_handlers::login_handler,
        grievance_service::interface::http_handlers::external_login_handler,
        grievance_service::interface::http_handlers::create_complaint_handler,
        grievance_service::interface::http_handlers::my_complaints_handler,
        grievance_service::interface::http_handlers::list_complaints_handler,
        grievance_service::interface::http_handlers::analytics_handler,
        grievance_service::interface::http_handlers::update_complaint_handler,
        grievance_service::interface::http_handlers::delete_complaint_handler,
    ),
    components(schemas(
        RegisterRequest, LoginRequest, ExternalLoginRequest, AuthResponse, UserResponse,
        CreateComplaintForm, ComplaintView, ComplaintResponse, ComplaintListResponse,
        UpdateComplaintRequest, ComplaintStats, MessageResponse, ErrorResponse
    )),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Registration and sessions"),
        (name = "Complaints", description = "Complaint lifecycle and analytics")
    ),
    security((), ("bearerAuth" = [])),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(?config, "Configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppStateBuilder::new()
        .with_pool(pool)
        .with_config(config.clone())
        .build()
        .await?;

    let app = build_router(app_state)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let http_addr = config.http_address();
    let listener = TcpListener::bind(&http_addr)
        .await
        .map_err(|e| AppError::Initialization(format!("Failed to bind {http_addr}: {e}")))?;
    info!("HTTP server listening on {}", http_addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Initialization(format!("HTTP server error: {e}")))?;
    Ok(())
}
