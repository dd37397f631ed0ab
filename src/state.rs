use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::ProjectGenerator;
use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::{GenerationRateLimiter, LoginRateLimiter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub generator: Arc<dyn ProjectGenerator>,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub login_limiter: LoginRateLimiter,
    pub generation_limiter: GenerationRateLimiter,
}
