//! Registration, login and the session middleware.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use fintrack_core::RepoError;
use serde::Deserialize;
use serde_json::{json, Value};

use super::password::{hash_password, verify_password};
use super::{blocking, ApiError, AppState};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authenticated user, added to request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
    pub token: String,
}

/// Rejects requests without a valid `Bearer` session token.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                return ApiError::Unauthorized(
                    "Authorization header must use Bearer scheme".to_string(),
                )
                .into_response()
            }
        },
        None => {
            return ApiError::Unauthorized("Authorization header required".to_string())
                .into_response()
        }
    };

    match state.sessions.validate(&token) {
        Some(session) => {
            request.extensions_mut().insert(CurrentUser {
                user_id: session.user_id,
                email: session.email,
                token,
            });
            next.run(request).await
        }
        None => ApiError::Unauthorized("Invalid or expired token".to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(body.name),
        non_blank(body.email),
        non_blank(body.password),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email and password are required".to_string(),
        ));
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let users = state.users();
    let user = blocking(move || {
        let hash = hash_password(&password)?;
        Ok::<_, ApiError>(users.register(&name, &email, &hash)?)
    })
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "sucesso": true,
            "mensagem": "User registered",
            "usuario": user.public(),
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(email), Some(password)) = (non_blank(body.email), non_blank(body.password)) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let users = state.users();
    let user = blocking(move || {
        let user = users.find_by_email(&email)?;
        Ok::<_, RepoError>(user.filter(|u| verify_password(&password, &u.password)))
    })
    .await?
    .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let token = state.sessions.create(&user.id, &user.email);
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "sucesso": true,
        "mensagem": "Login successful",
        "token": token,
        "usuario": user.public(),
    })))
}

/// Returns the user behind the session.
pub async fn verify(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let users = state.users();
    let user = blocking(move || users.find_by_id(&current.user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "sucesso": true,
        "usuario": user.public(),
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Json<Value> {
    state.sessions.revoke(&current.token);
    tracing::debug!(email = %current.email, "Session closed");
    Json(json!({
        "sucesso": true,
        "mensagem": "Logged out",
    }))
}
