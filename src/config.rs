use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Endpoint and resilience settings for the external meal-generation service.
#[derive(Debug, Clone, Deserialize)]
pub struct MealApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub meal_api: MealApiConfig,
    pub cache_max_entries: usize,
    pub plan_cache_ttl_secs: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutriplan".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutriplan-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let meal_api = MealApiConfig {
            base_url: std::env::var("MODEL_API_URL")?,
            timeout_secs: env_parse("MODEL_API_TIMEOUT_SECS", 30),
            max_retries: env_parse("MODEL_API_MAX_RETRIES", 2),
            initial_backoff_ms: env_parse("MODEL_API_BACKOFF_MS", 500),
        };
        Ok(Self {
            database_url,
            jwt,
            meal_api,
            cache_max_entries: env_parse("CACHE_MAX_ENTRIES", 1000),
            plan_cache_ttl_secs: env_parse("PLAN_CACHE_TTL_SECS", 60),
        })
    }
}
