use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use finquest_api::{MeResponse, service};

use crate::AppConfig;
use crate::error::ApiErr;

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated user extracted from the `Authorization: Bearer <jwt>` header.
///
/// Tokens are issued by the identity provider; this server only verifies them.
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        let now = Utc::now().timestamp().max(0) as u64;

        let claims = service::resolve_bearer(header, &config.jwt_secret, now)
            .map_err(|e| ApiErr::from(e).into_response())?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

/// GET /api/auth/me: identity carried by the caller's token.
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
    })
}
