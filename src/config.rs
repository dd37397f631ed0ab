use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub registration: RegistrationMode,
    pub max_body_size: usize,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
    pub ai: AiConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    /// Anyone may sign up and gets a personal organization.
    Open,
    /// Only the first (bootstrap) account may register.
    Closed,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    /// Generations allowed per user per minute.
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiProvider {
    Mock,
    OpenAi {
        api_key: String,
        model: String,
        base_url: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("WORKSPHERE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid WORKSPHERE_HOST: {e}"))?;

        let port: u16 = env_or("WORKSPHERE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid WORKSPHERE_PORT: {e}"))?;

        let base_url = env_or("WORKSPHERE_BASE_URL", &format!("http://{host}:{port}"));

        let registration = match env_or("WORKSPHERE_REGISTRATION", "open").as_str() {
            "closed" => RegistrationMode::Closed,
            _ => RegistrationMode::Open,
        };

        let max_body_size: usize = env_or("WORKSPHERE_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid WORKSPHERE_MAX_BODY_SIZE: {e}"))?;

        let cors_origins = parse_list(&env_or("WORKSPHERE_CORS_ORIGINS", ""));

        let log_level = env_or("WORKSPHERE_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("WORKSPHERE_SMTP_HOST").ok(),
            std::env::var("WORKSPHERE_SMTP_PORT").ok(),
            std::env::var("WORKSPHERE_SMTP_USER").ok(),
            std::env::var("WORKSPHERE_SMTP_PASS").ok(),
            std::env::var("WORKSPHERE_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid WORKSPHERE_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let provider = match env_or("WORKSPHERE_AI_PROVIDER", "mock").as_str() {
            "openai" => AiProvider::OpenAi {
                api_key: env_required("OPENAI_API_KEY")?,
                model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
                base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            },
            "mock" => AiProvider::Mock,
            other => return Err(format!("Invalid WORKSPHERE_AI_PROVIDER: {other}")),
        };

        let rate_limit_per_minute: u32 = env_or("WORKSPHERE_AI_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid WORKSPHERE_AI_RATE_LIMIT: {e}"))?;

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            registration,
            max_body_size,
            cors_origins,
            log_level,
            smtp,
            ai: AiConfig {
                provider,
                rate_limit_per_minute,
            },
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
