use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{AuditEvent, Member, Organization, OrganizationWithRole, Role};
use crate::response::{ApiResponse, Message, message, ok};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrganization {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMember {
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub role: Role,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<Vec<OrganizationWithRole>>>, AppError> {
    let organizations = db::organizations::list_for_user(&state.pool, auth.user_id).await?;
    Ok(ok(organizations))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateOrganization>,
) -> Result<Json<ApiResponse<OrganizationDetail>>, AppError> {
    let name = required(&req.name, "Name")?;

    let mut tx = state.pool.begin().await?;
    let slug = match req.slug.as_deref() {
        Some(slug) => {
            validate_slug(slug)?;
            if db::organizations::slug_exists(&mut *tx, slug).await? {
                return Err(AppError::Conflict(
                    "An organization with this slug already exists".to_string(),
                ));
            }
            slug.to_string()
        }
        None => unique_slug(&mut *tx, name).await?,
    };

    let organization =
        db::organizations::create(&mut *tx, name, &slug, req.description.as_deref())
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict("An organization with this slug already exists".to_string())
                }
                _ => AppError::Database(e),
            })?;
    db::memberships::create(&mut *tx, organization.id, auth.user_id, Role::Owner).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(organization.id),
        auth.user_id,
        "organization.created",
        "organization",
        Some(organization.id),
        None,
    )
    .await;

    Ok(ok(OrganizationDetail {
        organization,
        role: Role::Owner,
    }))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrganizationDetail>>, AppError> {
    let role = access::member_role(&state.pool, auth.user_id, id, "Organization").await?;
    let organization = db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(ok(OrganizationDetail { organization, role }))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrganization>,
) -> Result<Json<ApiResponse<OrganizationDetail>>, AppError> {
    let role = access::member_role(&state.pool, auth.user_id, id, "Organization").await?;
    access::require_owner_or_admin(role)?;
    let name = required(&req.name, "Name")?;

    let organization =
        db::organizations::update(&state.pool, id, name, req.description.as_deref()).await?;

    audit::log_event(
        &state.pool,
        Some(id),
        auth.user_id,
        "organization.updated",
        "organization",
        Some(id),
        None,
    )
    .await;

    Ok(ok(OrganizationDetail { organization, role }))
}

/// Owner only. Refused while any project in the organization is protected.
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let mut tx = state.pool.begin().await?;
    let role = access::member_role(&mut *tx, auth.user_id, id, "Organization").await?;
    access::require_owner(role)?;

    if db::projects::lock_and_check_protected(&mut *tx, id).await? {
        return Err(AppError::DataProtected(
            "Organization has projects protected by a pending sign-off".to_string(),
        ));
    }

    if !db::organizations::delete(&mut *tx, id).await? {
        return Err(AppError::NotFound("Organization not found".to_string()));
    }
    tx.commit().await?;

    tracing::info!(organization_id = %id, deleted_by = %auth.user_id, "Organization deleted");

    Ok(message("Deleted"))
}

pub async fn list_members(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Member>>>, AppError> {
    access::member_role(&state.pool, auth.user_id, id, "Organization").await?;
    let members = db::memberships::list_members(&state.pool, id).await?;
    Ok(ok(members))
}

/// Add an existing account to the organization. Only owners may grant `owner`.
pub async fn add_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMember>,
) -> Result<Json<ApiResponse<Member>>, AppError> {
    let caller_role = access::member_role(&state.pool, auth.user_id, id, "Organization").await?;
    access::require_owner_or_admin(caller_role)?;

    let role = req.role.unwrap_or(Role::Member);
    if role == Role::Owner {
        access::require_owner(caller_role)?;
    }

    let user = db::users::find_by_email(&state.pool, req.email.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("No account with this email".to_string()))?;

    let membership = db::memberships::create(&state.pool, id, user.id, role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("User is already a member of this organization".to_string())
            }
            _ => AppError::Database(e),
        })?;

    audit::log_event(
        &state.pool,
        Some(id),
        auth.user_id,
        "member.added",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "role": role })),
    )
    .await;

    Ok(ok(Member {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: membership.role,
        joined_at: membership.joined_at,
    }))
}

pub async fn remove_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    if user_id == auth.user_id {
        return Err(AppError::BadRequest("Cannot remove yourself".to_string()));
    }

    let mut tx = state.pool.begin().await?;
    let caller_role = access::member_role(&mut *tx, auth.user_id, id, "Organization").await?;
    access::require_owner_or_admin(caller_role)?;

    let target_role = access::member_role(&mut *tx, user_id, id, "Member").await?;
    if target_role == Role::Owner {
        access::require_owner(caller_role)?;
        if db::memberships::count_owners(&mut *tx, id).await? <= 1 {
            return Err(AppError::BadRequest(
                "Cannot remove the last owner".to_string(),
            ));
        }
    }

    db::memberships::delete(&mut *tx, id, user_id).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(id),
        auth.user_id,
        "member.removed",
        "user",
        Some(user_id),
        None,
    )
    .await;

    Ok(message("Member removed"))
}

pub async fn activity(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<AuditEvent>>>, AppError> {
    access::member_role(&state.pool, auth.user_id, id, "Organization").await?;
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let events = db::audit::list(&state.pool, id, limit, offset).await?;
    Ok(ok(events))
}

pub(crate) fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > 200 {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most 200 characters"
        )));
    }
    Ok(trimmed)
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 100 {
        return Err(AppError::BadRequest(
            "Slug must be between 1 and 100 characters".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::BadRequest(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    Ok(())
}

/// Slug derived from `name`, suffixed until it is free.
pub(crate) async fn unique_slug(conn: &mut PgConnection, name: &str) -> Result<String, AppError> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = "organization".to_string();
    }
    base.truncate(80);

    if !db::organizations::slug_exists(&mut *conn, &base).await? {
        return Ok(base);
    }
    loop {
        let suffix: [u8; 3] = rand::random();
        let candidate = format!("{base}-{}", hex::encode(suffix));
        if !db::organizations::slug_exists(&mut *conn, &candidate).await? {
            return Ok(candidate);
        }
    }
}
