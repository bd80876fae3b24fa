//! Rolegrid API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod extract;
mod handlers;
mod middleware;
mod request_id;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use rolegrid_application::{
    AuthTokenService, EmailService, MatrixService, ProjectService, RegistryService,
    SessionService, UserService,
};
use rolegrid_core::AppError;
use rolegrid_infrastructure::{
    Argon2PasswordHasher, ChannelEmailDispatcher, ConsoleEmailService, PostgresAuthTokenRepository,
    PostgresMatrixRepository, PostgresProjectRepository, PostgresRegistryRepository,
    PostgresSessionRepository, PostgresUserRepository, SmtpEmailConfig, SmtpEmailService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let session_ttl_hours = env::var("SESSION_TTL_HOURS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(24);

    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    // User and session services.
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let user_service = UserService::new(user_repository, password_hasher);

    let session_repository = Arc::new(PostgresSessionRepository::new(pool.clone()));
    let session_service = SessionService::new(session_repository, session_ttl_hours);

    // Auth token and email services.
    let auth_token_repository = Arc::new(PostgresAuthTokenRepository::new(pool.clone()));
    let email_service: Arc<dyn EmailService> = match email_provider.as_str() {
        "smtp" => {
            let smtp_port = required_non_empty_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;

            let smtp_config = SmtpEmailConfig {
                host: required_non_empty_env("SMTP_HOST")?,
                port: smtp_port,
                username: required_non_empty_env("SMTP_USERNAME")?,
                password: required_non_empty_env("SMTP_PASSWORD")?,
                from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
            };
            Arc::new(SmtpEmailService::new(smtp_config))
        }
        "console" => Arc::new(ConsoleEmailService::new()),
        _ => {
            return Err(AppError::Validation(format!(
                "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{email_provider}'"
            )));
        }
    };
    let email_dispatcher = Arc::new(ChannelEmailDispatcher::spawn(email_service));
    let auth_token_service =
        AuthTokenService::new(auth_token_repository, email_dispatcher, frontend_url.clone());

    // Project, registry, and matrix services.
    let project_repository = Arc::new(PostgresProjectRepository::new(pool.clone()));
    let project_service = ProjectService::new(project_repository);

    let registry_repository = Arc::new(PostgresRegistryRepository::new(pool.clone()));
    let registry_service = RegistryService::new(registry_repository.clone());

    let matrix_repository = Arc::new(PostgresMatrixRepository::new(pool.clone()));
    let matrix_service = MatrixService::new(registry_repository, matrix_repository);

    let app_state = AppState {
        user_service,
        session_service,
        auth_token_service,
        project_service,
        registry_service,
        matrix_service,
        pool,
        frontend_url: frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/projects",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/api/projects/{projectId}",
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route(
            "/api/project-roles",
            get(handlers::registry::list_roles).post(handlers::registry::create_role),
        )
        .route(
            "/api/project-roles/{roleId}",
            put(handlers::registry::rename_role).delete(handlers::registry::delete_role),
        )
        .route(
            "/api/project-permissions",
            get(handlers::registry::list_permissions).post(handlers::registry::create_permission),
        )
        .route(
            "/api/project-permissions/{permissionId}",
            put(handlers::registry::rename_permission)
                .delete(handlers::registry::delete_permission),
        )
        .route(
            "/api/manage-permissions/projects/{projectId}",
            get(handlers::matrix::get_matrix).put(handlers::matrix::update_matrix),
        )
        .route(
            "/api/sessions",
            get(handlers::sessions::list_sessions).delete(handlers::sessions::revoke_other_sessions),
        )
        .route(
            "/api/sessions/{sessionId}",
            delete(handlers::sessions::revoke_session),
        )
        .route(
            "/api/sessions/{sessionId}/deactivate",
            post(handlers::sessions::deactivate_session),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/verify-email", get(handlers::auth::verify_email))
        .route(
            "/api/auth/resend-verification",
            post(handlers::auth::resend_verification),
        )
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .merge(protected_routes)
        .layer(from_fn(request_id::propagate_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "rolegrid-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
