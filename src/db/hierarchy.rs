//! Walks from any node of the project hierarchy up to its project.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::signoff::gate::{Ownership, ProtectedEntity};

/// Resolve the owning project of `entity` and lock the project row until
/// commit, blocking concurrent sign-off writes.
///
/// Deleting the project itself takes `FOR UPDATE`: a share lock followed by
/// the `DELETE` deadlocks against a second delete of the same row. Children
/// only need `FOR SHARE OF p`.
pub async fn lock_owning_project<'e, E: PgExecutor<'e>>(
    executor: E,
    entity: ProtectedEntity,
) -> Result<Option<Ownership>, sqlx::Error> {
    let (sql, id) = match entity {
        ProtectedEntity::Project(id) => (
            "SELECT p.id AS project_id, p.organization_id, p.data_protected,
                    p.created_by, NULL::uuid AS assigned_to
             FROM projects p
             WHERE p.id = $1
             FOR UPDATE",
            id,
        ),
        ProtectedEntity::Board(id) => (
            "SELECT p.id AS project_id, p.organization_id, p.data_protected,
                    b.created_by, NULL::uuid AS assigned_to
             FROM boards b
             JOIN projects p ON p.id = b.project_id
             WHERE b.id = $1
             FOR SHARE OF p",
            id,
        ),
        ProtectedEntity::Column(id) => (
            "SELECT p.id AS project_id, p.organization_id, p.data_protected,
                    c.created_by, NULL::uuid AS assigned_to
             FROM board_columns c
             JOIN boards b ON b.id = c.board_id
             JOIN projects p ON p.id = b.project_id
             WHERE c.id = $1
             FOR SHARE OF p",
            id,
        ),
        ProtectedEntity::Card(id) => (
            "SELECT p.id AS project_id, p.organization_id, p.data_protected,
                    k.created_by, k.assigned_to
             FROM cards k
             JOIN board_columns c ON c.id = k.column_id
             JOIN boards b ON b.id = c.board_id
             JOIN projects p ON p.id = b.project_id
             WHERE k.id = $1
             FOR SHARE OF p",
            id,
        ),
    };

    sqlx::query_as::<_, Ownership>(sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Project and organization of a board, for membership checks on reads.
pub async fn board_scope<'e, E: PgExecutor<'e>>(
    executor: E,
    board_id: Uuid,
) -> Result<Option<(Uuid, Uuid)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT p.id, p.organization_id
         FROM boards b JOIN projects p ON p.id = b.project_id
         WHERE b.id = $1",
    )
    .bind(board_id)
    .fetch_optional(executor)
    .await
}

/// Board, project and organization of a column.
pub async fn column_scope<'e, E: PgExecutor<'e>>(
    executor: E,
    column_id: Uuid,
) -> Result<Option<(Uuid, Uuid, Uuid)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, Uuid, Uuid)>(
        "SELECT b.id, p.id, p.organization_id
         FROM board_columns c
         JOIN boards b ON b.id = c.board_id
         JOIN projects p ON p.id = b.project_id
         WHERE c.id = $1",
    )
    .bind(column_id)
    .fetch_optional(executor)
    .await
}
