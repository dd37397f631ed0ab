use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{ACCESS_TOKEN_MINUTES, Claims, encode_token};
use crate::auth::password;
use crate::config::RegistrationMode;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{OrganizationWithRole, Role, User};
use crate::response::{ApiResponse, Message, message, ok};
use crate::routes::organizations::unique_slug;
use crate::state::SharedState;

const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub organization_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
    pub organizations: Vec<OrganizationWithRole>,
}

type AuthResult = Result<(CookieJar, Json<ApiResponse<AuthResponse>>), AppError>;

fn auth_cookies(access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue an access token and a fresh refresh token for `user`.
async fn issue_session(state: &SharedState, user: User) -> AuthResult {
    let claims = Claims::new(user.id, user.is_system_admin);
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_token();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &hash_token(&refresh),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        ok(AuthResponse {
            access_token,
            refresh_token: refresh,
            user,
        }),
    ))
}

/// Create an account plus a personal organization owned by it. The first
/// account becomes system admin; later ones need open registration.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult {
    let email = req.email.trim();
    let name = req.name.trim();
    if email.is_empty() || req.password.is_empty() || name.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    password::validate(&req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock serializes the bootstrap check against concurrent sign-ups
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let count = db::users::count_all(&mut *tx).await?;
    if count > 0 && state.config.registration == RegistrationMode::Closed {
        return Err(AppError::NotAuthorized(
            "Registration is disabled. Ask an organization owner to add you.".to_string(),
        ));
    }

    if db::users::find_by_email(&mut *tx, email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let user = db::users::create(&mut *tx, email, &pw_hash, name, count == 0).await?;

    let org_name = req
        .organization_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{name}'s Organization"));
    let slug = unique_slug(&mut *tx, &org_name).await?;
    let organization = db::organizations::create(&mut *tx, &org_name, &slug, None).await?;
    db::memberships::create(&mut *tx, organization.id, user.id, Role::Owner).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, system_admin = user.is_system_admin, "User registered");

    audit::log_event(
        &state.pool,
        Some(organization.id),
        user.id,
        "user.registered",
        "user",
        Some(user.id),
        None,
    )
    .await;

    if let Some(mailer) = state.system_mailer.clone() {
        let (to, to_name, base_url) = (
            user.email.clone(),
            user.name.clone(),
            state.config.base_url.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&to, &to_name, &base_url).await {
                tracing::error!("Failed to send welcome email: {e}");
            }
        });
    }

    issue_session(&state, user).await
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> AuthResult {
    if state.login_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, req.email.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }
    state.login_limiter.clear(&req.email);

    if let Err(e) = db::refresh_tokens::purge_expired(&state.pool, user.id).await {
        tracing::warn!("Failed to purge expired refresh tokens: {e}");
    }

    audit::log_event(&state.pool, None, user.id, "user.login", "user", Some(user.id), None).await;

    issue_session(&state, user).await
}

pub async fn refresh(State(state): State<SharedState>, jar: CookieJar) -> AuthResult {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &hash_token(&refresh_value))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    if stored.used || !db::refresh_tokens::claim(&state.pool, stored.id).await? {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoking all sessions.",
            stored.user_id
        );
        db::refresh_tokens::delete_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    issue_session(&state, user).await
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<Message>>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::refresh_tokens::delete_by_hash(&state.pool, &hash_token(cookie.value())).await?;
    }

    Ok((clear_auth_cookies(), message("Logged out successfully")))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<MeResponse>>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    let organizations = db::organizations::list_for_user(&state.pool, auth.user_id).await?;
    Ok(ok(MeResponse {
        user,
        organizations,
    }))
}

/// Always answers 200 so the response does not reveal whether the email exists.
pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let pool = state.pool.clone();
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();

    tokio::spawn(async move {
        let user = match db::users::find_by_email(&pool, req.email.trim()).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Password reset lookup failed: {e}");
                return;
            }
        };

        let token = generate_token();
        if let Err(e) = db::password_reset_tokens::create(
            &pool,
            user.id,
            &hash_token(&token),
            Utc::now() + Duration::hours(1),
        )
        .await
        {
            tracing::error!("Failed to store password reset token: {e}");
            return;
        }

        let reset_url = format!("{base_url}/reset-password?token={token}");
        match mailer {
            Some(mailer) => {
                if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                    tracing::error!("Failed to send password reset email: {e}");
                }
            }
            None => tracing::warn!("System SMTP not configured. Password reset link: {reset_url}"),
        }
    });

    Ok(message(
        "If that email is registered, a reset link has been sent.",
    ))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    password::validate(&req.password)?;

    let reset_token = db::password_reset_tokens::consume(&state.pool, &hash_token(&req.token))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, reset_token.user_id, &pw_hash).await?;

    // A reset logs out every session
    db::refresh_tokens::delete_all_for_user(&state.pool, reset_token.user_id).await?;

    Ok(message("Password reset successfully"))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult {
    password::validate(&req.new_password)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;
    db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;

    audit::log_event(
        &state.pool,
        None,
        user.id,
        "user.password_changed",
        "user",
        Some(user.id),
        None,
    )
    .await;

    issue_session(&state, user).await
}
