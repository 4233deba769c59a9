//! Environment-driven configuration.

use userman_auth::TokenConfig;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Access token lifetime, minutes.
    pub access_token_duration: i64,
    /// Refresh token lifetime, days.
    pub refresh_token_duration: i64,
    pub bcrypt_cost: u32,
    pub environment: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let environment = get_env("ENVIRONMENT", "development");

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production");
            }
            _ => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                "dev-secret".to_string()
            }
        };

        // DATABASE_URL wins; otherwise assemble from parts like the rest of
        // the deployment tooling expects.
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}&search_path=user_management,public",
                get_env("DB_USER", "root"),
                get_env("DB_PASSWORD", "password"),
                get_env("DB_HOST", "localhost"),
                get_env("DB_PORT", "5432"),
                get_env("DB_NAME", "user_management"),
                get_env("DB_SSL_MODE", "disable"),
            )
        });

        Ok(Self {
            port: get_env_parsed("PORT", 8080),
            database_url,
            jwt_secret,
            access_token_duration: get_env_parsed("ACCESS_TOKEN_DURATION", 15),
            refresh_token_duration: get_env_parsed("REFRESH_TOKEN_DURATION", 7),
            bcrypt_cost: get_env_parsed("BCRYPT_COST", 12),
            environment,
            allowed_origins: get_env_list("ALLOWED_ORIGINS", &["*"]),
        })
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            access_ttl_minutes: self.access_token_duration,
            refresh_ttl_days: self.refresh_token_duration,
        }
    }
}

fn get_env(key: &str, fallback: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn get_env_parsed<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn get_env_list(key: &str, fallback: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => fallback.iter().map(|s| s.to_string()).collect(),
    }
}
