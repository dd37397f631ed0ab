pub mod auth;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod organizations;
pub mod projects;
pub mod signoff;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Organizations
        .route(
            "/api/v1/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route(
            "/api/v1/organizations/{id}",
            get(organizations::get)
                .put(organizations::update)
                .delete(organizations::delete),
        )
        .route(
            "/api/v1/organizations/{id}/members",
            get(organizations::list_members).post(organizations::add_member),
        )
        .route(
            "/api/v1/organizations/{id}/members/{user_id}",
            delete(organizations::remove_member),
        )
        .route(
            "/api/v1/organizations/{id}/activity",
            get(organizations::activity),
        )
        // Projects
        .route(
            "/api/v1/organizations/{id}/projects",
            get(projects::list).post(projects::create),
        )
        .route(
            "/api/v1/organizations/{id}/projects/generate",
            post(projects::generate),
        )
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        // Sign-off
        .route(
            "/api/v1/projects/{id}/request-signoff",
            post(signoff::request),
        )
        .route(
            "/api/v1/projects/{id}/approve-signoff",
            post(signoff::approve),
        )
        .route(
            "/api/v1/projects/{id}/signoff-status",
            get(signoff::get_status),
        )
        .route(
            "/api/v1/projects/{id}/signoff-history",
            get(signoff::history),
        )
        .route("/api/v1/pending-signoffs", get(signoff::pending))
        // Boards
        .route(
            "/api/v1/projects/{id}/boards",
            get(boards::list).post(boards::create),
        )
        .route(
            "/api/v1/boards/{id}",
            get(boards::get).put(boards::update).delete(boards::delete),
        )
        // Columns
        .route(
            "/api/v1/boards/{id}/columns",
            get(columns::list).post(columns::create),
        )
        .route(
            "/api/v1/columns/{id}",
            put(columns::update).delete(columns::delete),
        )
        // Cards
        .route(
            "/api/v1/columns/{id}/cards",
            get(cards::list).post(cards::create),
        )
        .route(
            "/api/v1/cards/{id}",
            get(cards::get).put(cards::update).delete(cards::delete),
        )
}
