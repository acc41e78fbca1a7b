use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Extractor gating the admin endpoints.
///
/// Accepts either `Authorization: Basic <user:pass>` checked against the
/// configured admin credentials, or `Authorization: Bearer <secret-key>` for
/// service-to-service callers. There is no session state.
pub struct AdminUser;

pub struct AuthError(StatusCode, String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

fn unauthorized() -> AuthError {
    AuthError(StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(unauthorized)?;

        if let Some(token) = header.strip_prefix("Bearer ") {
            if token == state.config.secret_key {
                return Ok(AdminUser);
            }
        } else if let Some(encoded) = header.strip_prefix("Basic ") {
            let decoded = STANDARD.decode(encoded.trim()).map_err(|_| {
                AuthError(
                    StatusCode::BAD_REQUEST,
                    "Invalid Authorization header format.".to_string(),
                )
            })?;
            let credentials = String::from_utf8(decoded).map_err(|_| {
                AuthError(
                    StatusCode::BAD_REQUEST,
                    "Invalid Authorization header format.".to_string(),
                )
            })?;
            if let Some((username, password)) = credentials.split_once(':') {
                if username == state.config.admin_username
                    && password == state.config.admin_password
                {
                    return Ok(AdminUser);
                }
            }
        }

        warn!("Rejected admin request to {}", parts.uri.path());
        Err(unauthorized())
    }
}
