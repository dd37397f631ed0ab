use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

/// The authenticated caller. Organization roles are resolved per request via
/// [`crate::auth::access`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_system_admin: bool,
}

impl AuthUser {
    fn from_token(token: &str, secret: &str) -> Result<Self, AppError> {
        let claims = jwt::decode_token(token, secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(AuthUser {
            user_id: claims.sub,
            is_system_admin: claims.sys,
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Bearer token first, then the cookie set by the web client
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return AuthUser::from_token(token, &state.config.jwt_secret);
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get("access_token") {
            return AuthUser::from_token(cookie.value(), &state.config.jwt_secret);
        }

        Err(AppError::Unauthorized(
            "Missing authentication token".to_string(),
        ))
    }
}
