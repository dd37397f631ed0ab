//! Organization-scoped role checks.

use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::Role;

/// The caller's role in `organization_id`.
///
/// Non-members get `NotFound` for `resource` so they cannot discover ids in
/// organizations they do not belong to.
pub async fn member_role<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    organization_id: Uuid,
    resource: &str,
) -> Result<Role, AppError> {
    let membership = db::memberships::find(executor, organization_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{resource} not found")))?;
    membership.role().map_err(AppError::Internal)
}

pub fn require_editor(role: Role) -> Result<(), AppError> {
    if role.can_edit() {
        Ok(())
    } else {
        Err(AppError::NotAuthorized(
            "Viewers have read-only access".to_string(),
        ))
    }
}

pub fn require_owner_or_admin(role: Role) -> Result<(), AppError> {
    if role.is_privileged() {
        Ok(())
    } else {
        Err(AppError::NotAuthorized(
            "Owner or admin access required".to_string(),
        ))
    }
}

pub fn require_owner(role: Role) -> Result<(), AppError> {
    if role == Role::Owner {
        Ok(())
    } else {
        Err(AppError::NotAuthorized("Owner access required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_requirements() {
        assert!(require_editor(Role::Member).is_ok());
        assert!(require_editor(Role::Viewer).is_err());
        assert!(require_owner_or_admin(Role::Admin).is_ok());
        assert!(require_owner_or_admin(Role::Member).is_err());
        assert!(require_owner(Role::Owner).is_ok());
        assert!(matches!(
            require_owner(Role::Admin),
            Err(AppError::NotAuthorized(_))
        ));
    }
}
