//! Runtime configuration read from the environment (and `.env` via dotenvy).
//!
//! | Variable | Default |
//! |----------|---------|
//! | HOST | 0.0.0.0 |
//! | PORT | 8083 |
//! | DATABASE_URL | unset: in-memory storage |
//! | DB_MAX_CONNECTIONS | 10 |
//! | NATS_URL | unset: events are not published |
//! | EVENT_SUBJECT_PREFIX | washwish.orders |

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub nats_url: Option<String>,
    pub event_subject_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(&non_empty, "PORT", 8083)?,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: parse(&non_empty, "DB_MAX_CONNECTIONS", 10)?,
            nats_url: non_empty("NATS_URL"),
            event_subject_prefix: non_empty("EVENT_SUBJECT_PREFIX").unwrap_or_else(|| "washwish.orders".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid { var, reason: e.to_string() }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8083");
        assert!(cfg.database_url.is_none());
        assert!(cfg.nats_url.is_none());
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.event_subject_prefix, "washwish.orders");
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let cfg = config(&[("PORT", "9000"), ("DATABASE_URL", "postgres://localhost/washwish"), ("NATS_URL", "  ")]).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/washwish"));
        assert!(cfg.nats_url.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }
}
