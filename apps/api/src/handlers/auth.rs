//! Authentication endpoints: registration, login, and the email token flows.

use axum::extract::{Extension, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::Json;
use tracing::warn;

use rolegrid_application::{LoginOutcome, RegisterParams};
use rolegrid_core::{AppError, CallerIdentity};
use rolegrid_domain::{AuthTokenType, SessionId, validate_password};

use crate::dto::{
    ApiResponse, ForgotPasswordRequest, LoginData, LoginRequest, RegisterRequest,
    ResendVerificationRequest, ResetPasswordRequest, UserResponse, VerifyEmailQuery,
};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Client IP (first hop of `X-Forwarded-For`) and user agent, if present.
fn client_context(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    (ip_address, user_agent)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let user = state
        .user_service
        .register(RegisterParams {
            email: request.email,
            password: request.password,
            full_name: request.full_name,
            phone: request.phone,
        })
        .await?;

    // The account exists either way; a failed email must not undo that.
    if let Err(error) = state.auth_token_service.send_email_verification(&user).await {
        warn!(user_id = %user.id, %error, "could not issue verification email");
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "account created; check your inbox to verify your email address",
            UserResponse::from(user),
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginData>>> {
    match state
        .user_service
        .check_credentials(&request.email, &request.password)
        .await?
    {
        LoginOutcome::Authenticated(user) => {
            let (ip_address, user_agent) = client_context(&headers);
            let issued = state
                .session_service
                .create_session(user.id, ip_address, user_agent)
                .await?;

            Ok(Json(ApiResponse::ok(
                "login successful",
                LoginData {
                    token: issued.token,
                    user: UserResponse::from(user),
                },
            )))
        }
        LoginOutcome::EmailNotVerified(user) => {
            if let Err(error) = state.auth_token_service.send_email_verification(&user).await {
                warn!(user_id = %user.id, %error, "could not reissue verification email");
            }
            Err(AppError::EmailNotVerified(
                "please verify your email address before logging in".to_owned(),
            )
            .into())
        }
        LoginOutcome::Failed => Err(AppError::InvalidCredentials.into()),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = state
        .session_service
        .logout(SessionId::from_uuid(caller.session_id()))
        .await?;

    let message = if deleted {
        "logged out"
    } else {
        "session was already closed"
    };
    Ok(Json(ApiResponse::message(message)))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    // The link carries both token and email; the service answers a
    // mismatch like a bad token, without consuming it.
    let token = state
        .auth_token_service
        .consume_token(&query.token, AuthTokenType::EmailVerification, &query.email)
        .await?;

    state.user_service.mark_email_verified(token.user_id).await?;

    let user = state
        .user_service
        .find_by_id(token.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "account no longer exists"))?;

    Ok(Json(ApiResponse::ok(
        "email address verified",
        UserResponse::from(user),
    )))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResendVerificationRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let user = state
        .user_service
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "no account with this email address"))?;

    if user.email_verified {
        return Err(AppError::duplicate(
            "ALREADY_VERIFIED",
            "this email address is already verified",
        )
        .into());
    }

    state.auth_token_service.send_email_verification(&user).await?;
    Ok(Json(ApiResponse::message("verification email sent")))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if let Some(user) = state.user_service.find_by_email(&request.email).await? {
        if let Err(error) = state.auth_token_service.send_password_reset(&user).await {
            warn!(user_id = %user.id, %error, "could not issue password reset email");
        }
    }

    // Same answer whether or not the account exists.
    Ok(Json(ApiResponse::message(
        "if an account with this email exists, a reset link is on its way",
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    // Reject a weak replacement before the single-use token is spent.
    validate_password(&request.password)?;

    let token = state
        .auth_token_service
        .consume_token(&request.token, AuthTokenType::PasswordReset, &request.email)
        .await?;

    state
        .user_service
        .change_password(token.user_id, &request.password)
        .await?;

    Ok(Json(ApiResponse::message(
        "password updated; log in with the new password",
    )))
}
