//! Runtime configuration, read from the environment (and `.env` in development).

use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub currency: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub frontend_url: String,
    pub stripe: StripeConfig,
    pub log_filter: String,
}

const DEV_ORIGIN: &str = "http://localhost:5173";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        let bind_address = parse(
            "BIND_ADDRESS",
            var("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        )?;
        let database_url = var("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
        let max_connections = parse(
            "DATABASE_MAX_CONNECTIONS",
            var("DATABASE_MAX_CONNECTIONS").unwrap_or_else(|| "5".to_string()),
        )?;
        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::MissingVar("JWT_SECRET"))?;
        let token_ttl_hours: i64 = parse(
            "TOKEN_TTL_HOURS",
            var("TOKEN_TTL_HOURS").unwrap_or_else(|| "24".to_string()),
        )?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS", "must be positive".to_string()));
        }

        let environment = match var("APP_ENV").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => return Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        };

        let allowed_origins = match environment {
            Environment::Production => var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            Environment::Development => vec![DEV_ORIGIN.to_string()],
        };

        let frontend_url = var("FRONTEND_URL")
            .unwrap_or_else(|| DEV_ORIGIN.to_string())
            .trim_end_matches('/')
            .to_string();

        let stripe = StripeConfig {
            secret_key: var("STRIPE_SECRET_KEY"),
            webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
            api_base: var("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            currency: var("PAYMENT_CURRENCY").unwrap_or_else(|| "inr".to_string()).to_ascii_lowercase(),
        };

        let log_filter = var("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            bind_address,
            database_url,
            max_connections,
            jwt_secret,
            token_ttl_hours,
            environment,
            allowed_origins,
            frontend_url,
            stripe,
            log_filter,
        })
    }

    #[cfg(test)]
    pub fn from_map(vars: &std::collections::HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).map(|val| val.to_string()))
    }
}

fn parse<T>(key:&'static str, raw:String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(key, e.to_string()))
}
