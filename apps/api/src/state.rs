use rolegrid_application::{
    AuthTokenService, MatrixService, ProjectService, RegistryService, SessionService, UserService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub session_service: SessionService,
    pub auth_token_service: AuthTokenService,
    pub project_service: ProjectService,
    pub registry_service: RegistryService,
    pub matrix_service: MatrixService,
    pub pool: PgPool,
    pub frontend_url: String,
}
