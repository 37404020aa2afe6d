use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::common::{created_response, message_response, success_response, validate_input};
use crate::auth::{bearer_token, user, AuthError, AuthUser};
use crate::errors::ServiceError;
use crate::services::users::{LoginCommand, RegisterCommand, Session};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50), custom = "validate_username")]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().len() != username.len() || username.contains(char::is_whitespace) {
        return Err(ValidationError::new("username_whitespace"));
    }
    Ok(())
}

/// Log in with either the username or the email
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
}

impl LoginRequest {
    fn login(&self) -> Option<String> {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: user::Model,
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.user,
            token: session.token.token,
            token_type: session.token.token_type,
            expires_in: session.token.expires_in,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let session = state
        .services
        .users
        .register(RegisterCommand {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;
    Ok(created_response(AuthResponse::from(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let login = payload
        .login()
        .ok_or_else(|| ServiceError::ValidationError("username or email is required".into()))?;
    let session = state
        .services
        .users
        .login(LoginCommand {
            login,
            password: payload.password,
        })
        .await?;
    Ok(success_response(AuthResponse::from(session)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = user::Model),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Response, ServiceError> {
    let current = state.services.users.get(auth_user.user_id).await?;
    Ok(success_response(current))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingAuth)?;
    state.services.users.logout(token).await?;
    Ok(message_response("Logged out"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_validation() {
        let ok = RegisterRequest {
            username: "somchai".into(),
            email: "somchai@example.com".into(),
            password: "secret1".into(),
            full_name: "Somchai".into(),
        };
        assert!(ok.validate().is_ok());

        let short = RegisterRequest {
            username: "ab".into(),
            password: "123".into(),
            ..ok
        };
        let errors = short.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn login_accepts_username_or_email() {
        let by_email: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"x"}"#).unwrap();
        assert_eq!(by_email.login().as_deref(), Some("a@b.co"));

        let neither: LoginRequest = serde_json::from_str(r#"{"password":"x"}"#).unwrap();
        assert_eq!(neither.login(), None);
    }
}
