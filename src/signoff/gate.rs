//! Authorization for destructive operations on the project hierarchy.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::access;
use crate::db;
use crate::error::AppError;
use crate::models::Role;

/// Something whose deletion is governed by the owning project's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedEntity {
    Project(Uuid),
    Board(Uuid),
    Column(Uuid),
    Card(Uuid),
}

impl ProtectedEntity {
    pub fn label(&self) -> &'static str {
        match self {
            ProtectedEntity::Project(_) => "Project",
            ProtectedEntity::Board(_) => "Board",
            ProtectedEntity::Column(_) => "Column",
            ProtectedEntity::Card(_) => "Card",
        }
    }
}

/// The entity's owning project and the facts the delete policy needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ownership {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub data_protected: bool,
    pub created_by: Option<Uuid>,
    /// Cards only: the assignee is granted delete rights like the creator.
    pub assigned_to: Option<Uuid>,
}

/// Delete policy. A protected project refuses every delete, owners included.
pub fn decide(actor: Uuid, role: Role, ownership: &Ownership) -> Result<(), AppError> {
    if ownership.data_protected {
        return Err(AppError::DataProtected(
            "Project data is protected while a sign-off request is pending".to_string(),
        ));
    }

    match role {
        Role::Owner | Role::Admin => Ok(()),
        Role::Member
            if ownership.created_by == Some(actor) || ownership.assigned_to == Some(actor) =>
        {
            Ok(())
        }
        Role::Member => Err(AppError::NotAuthorized(
            "Members can only delete items they created or are assigned to".to_string(),
        )),
        Role::Viewer => Err(AppError::NotAuthorized(
            "Viewers cannot delete anything".to_string(),
        )),
    }
}

/// Resolve the owning project, hold its row lock for the rest of the
/// caller's transaction and apply [`decide`].
///
/// The caller performs the delete on the same connection before committing,
/// so a sign-off request cannot land between the check and the delete.
pub async fn authorize_delete(
    conn: &mut PgConnection,
    actor: Uuid,
    entity: ProtectedEntity,
) -> Result<Ownership, AppError> {
    let ownership = db::hierarchy::lock_owning_project(&mut *conn, entity)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", entity.label())))?;

    let role = access::member_role(&mut *conn, actor, ownership.organization_id, entity.label())
        .await?;

    if let Err(denied) = decide(actor, role, &ownership) {
        tracing::info!(
            actor = %actor,
            entity = ?entity,
            role = %role,
            kind = denied.kind(),
            "Delete denied"
        );
        return Err(denied);
    }

    Ok(ownership)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ownership(protected: bool, created_by: Option<Uuid>, assigned_to: Option<Uuid>) -> Ownership {
        Ownership {
            project_id: Uuid::now_v7(),
            organization_id: Uuid::now_v7(),
            data_protected: protected,
            created_by,
            assigned_to,
        }
    }

    #[test]
    fn protected_project_blocks_every_role() {
        let actor = Uuid::now_v7();
        let own = ownership(true, Some(actor), Some(actor));
        for role in [Role::Owner, Role::Admin, Role::Member, Role::Viewer] {
            let err = decide(actor, role, &own).unwrap_err();
            assert!(matches!(err, AppError::DataProtected(_)), "{role} was not blocked");
        }
    }

    #[test]
    fn privileged_roles_delete_anything_when_unprotected() {
        let actor = Uuid::now_v7();
        let own = ownership(false, Some(Uuid::now_v7()), None);
        assert!(decide(actor, Role::Owner, &own).is_ok());
        assert!(decide(actor, Role::Admin, &own).is_ok());
    }

    #[test]
    fn member_deletes_own_or_assigned_items_only() {
        let actor = Uuid::now_v7();
        let someone_else = Uuid::now_v7();

        assert!(decide(actor, Role::Member, &ownership(false, Some(actor), None)).is_ok());
        assert!(decide(actor, Role::Member, &ownership(false, Some(someone_else), Some(actor))).is_ok());

        let err = decide(actor, Role::Member, &ownership(false, Some(someone_else), None)).unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));

        let err = decide(actor, Role::Member, &ownership(false, None, None)).unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
    }

    #[test]
    fn viewer_never_deletes() {
        let actor = Uuid::now_v7();
        let err = decide(actor, Role::Viewer, &ownership(false, Some(actor), Some(actor))).unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
    }
}
