//! Authentication endpoints and bearer-token middleware

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::Error;
use crate::db::AuthToken;

/// Credentials for register/login
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user account
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
}

/// Build auth routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state)
}

/// Create an account
async fn register(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), StatusCode> {
    match state.auth.register(&body.email, &body.password) {
        Ok(user) => Ok((
            StatusCode::CREATED,
            Json(UserResponse {
                id: user.id,
                email: user.email,
            }),
        )),
        Err(Error::Auth(_)) => Err(StatusCode::BAD_REQUEST),
        Err(e) => {
            tracing::warn!(error = %e, "register failed");
            Err(StatusCode::CONFLICT)
        }
    }
}

/// Log in, returning a fresh token pair
async fn login(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<AuthToken>, StatusCode> {
    match state.auth.login(&body.email, &body.password) {
        Ok(token) => Ok(Json(token)),
        Err(Error::Auth(_)) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Revoke every token of the calling user
async fn logout(State(state): State<Arc<ApiState>>, req: Request) -> StatusCode {
    let Some(access) = extract_bearer(&req) else {
        return StatusCode::UNAUTHORIZED;
    };

    match state.auth.verify_access(access) {
        Ok(user) => match state.auth.logout(&user.id) {
            Ok(_) => StatusCode::OK,
            Err(e) => {
                tracing::error!(error = %e, "logout failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        Err(_) => StatusCode::UNAUTHORIZED,
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware requiring a valid access token
pub async fn require_token(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(access) = extract_bearer(&req) else {
        tracing::debug!("no access token provided");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.auth.verify_access(access) {
        Ok(_) => Ok(next.run(req).await),
        Err(_) => {
            tracing::warn!("invalid access token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
