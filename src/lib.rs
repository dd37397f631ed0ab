pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod signoff;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::{GenerationRateLimiter, LoginRateLimiter};
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Result<Router, String> {
    let generator = ai::build_generator(&config.ai)?;
    tracing::info!(generator = generator.id(), "Project generator configured");

    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    let cors = cors_layer(&config.cors_origins);
    let max_body_size = config.max_body_size;
    let generation_limiter =
        GenerationRateLimiter::new(config.ai.rate_limit_per_minute, Duration::from_secs(60));

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        generator,
        system_mailer,
        login_limiter: LoginRateLimiter::new(),
        generation_limiter,
    });

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            sweeper.generation_limiter.cleanup();
        }
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state);

    Ok(app)
}

/// Browser origins allowed to call the API. Unparseable entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn health() -> &'static str {
    "ok"
}
